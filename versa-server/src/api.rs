//! JSON API handlers for prompt administration

use crate::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use versa_core::prompt::{AgentType, NewPromptVersion, PromptKey, PromptRecord};
use versa_prompts::PromptManager;
use versa_storage::DatabaseStats;

/// Shared handler state
pub type AppState = Arc<PromptManager>;

/// Query parameters for active prompt listing
#[derive(Debug, Deserialize)]
pub struct ActiveQuery {
    pub agent_type: Option<String>,
}

/// Query parameters for version history
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

/// Body of a new version request
#[derive(Debug, Deserialize)]
pub struct CreateVersionRequest {
    pub content: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub activate: bool,
}

/// Health check endpoint
pub async fn health(State(manager): State<AppState>) -> Result<impl IntoResponse> {
    manager.storage().health_check().await?;

    Ok(Json(json!({
        "status": "healthy",
        "service": "versa",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Agent types with stored prompts, plus the configured allow-list
pub async fn agents_list(State(manager): State<AppState>) -> Result<Json<Value>> {
    let agent_types = manager.agent_types().await?;
    let allowed: Vec<&AgentType> = manager.catalog().agent_types().collect();

    Ok(Json(json!({
        "agent_types": agent_types,
        "allowed": allowed,
    })))
}

/// Prompt names stored for one agent type
pub async fn agent_prompts(
    State(manager): State<AppState>,
    Path(agent_type): Path<String>,
) -> Result<Json<Value>> {
    let prompt_names = manager.prompt_names(&agent_type).await?;

    Ok(Json(json!({
        "agent_type": AgentType::parse(&agent_type)?,
        "prompt_names": prompt_names,
    })))
}

/// Active prompts, optionally filtered by agent type
pub async fn prompts_list(
    State(manager): State<AppState>,
    Query(query): Query<ActiveQuery>,
) -> Result<Json<Value>> {
    let prompts = manager.list_active(query.agent_type.as_deref()).await?;

    Ok(Json(json!({
        "total": prompts.len(),
        "prompts": prompts,
    })))
}

pub async fn prompt_active(
    State(manager): State<AppState>,
    Path((agent_type, prompt_name)): Path<(String, String)>,
) -> Result<Json<PromptRecord>> {
    Ok(Json(manager.get_active(&agent_type, &prompt_name).await?))
}

pub async fn prompt_history(
    State(manager): State<AppState>,
    Path((agent_type, prompt_name)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>> {
    let versions = manager
        .list_history(&agent_type, &prompt_name, query.limit)
        .await?;

    Ok(Json(json!({
        "total": versions.len(),
        "versions": versions,
    })))
}

pub async fn prompt_version(
    State(manager): State<AppState>,
    Path((agent_type, prompt_name, version)): Path<(String, String, u32)>,
) -> Result<Json<PromptRecord>> {
    Ok(Json(
        manager
            .get_version(&agent_type, &prompt_name, version)
            .await?,
    ))
}

/// Save a new version; responds 201 with the stored record
pub async fn version_create(
    State(manager): State<AppState>,
    Path((agent_type, prompt_name)): Path<(String, String)>,
    Json(request): Json<CreateVersionRequest>,
) -> Result<(StatusCode, Json<PromptRecord>)> {
    let key = PromptKey::parse(&agent_type, &prompt_name)?;
    let new_version = NewPromptVersion::new(
        key,
        &request.content,
        request.description.as_deref(),
        request.created_by.as_deref(),
        request.activate,
    )?
    .with_variables(&request.variables)?;

    let record = manager.create_version(new_version).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn version_activate(
    State(manager): State<AppState>,
    Path((agent_type, prompt_name, version)): Path<(String, String, u32)>,
) -> Result<Json<PromptRecord>> {
    Ok(Json(
        manager
            .activate_version(&agent_type, &prompt_name, version)
            .await?,
    ))
}

/// Count one use of the active version
pub async fn usage_record(
    State(manager): State<AppState>,
    Path((agent_type, prompt_name)): Path<(String, String)>,
) -> Result<StatusCode> {
    manager.record_usage(&agent_type, &prompt_name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Plain-text export of all active prompts
pub async fn export(State(manager): State<AppState>) -> Result<impl IntoResponse> {
    let text = manager.export_active().await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

pub async fn system_stats(State(manager): State<AppState>) -> Result<Json<DatabaseStats>> {
    Ok(Json(manager.stats().await?))
}
