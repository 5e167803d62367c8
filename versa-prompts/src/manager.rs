//! Prompt version management functionality

use crate::{export, seeds::Seed, Error, Result};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use versa_core::{
    prompt::{AgentType, NewPromptVersion, PromptKey, PromptName, PromptRecord},
    Catalog,
};
use versa_storage::{DatabaseStats, StorageManager};

/// Outcome of seeding default prompts
#[derive(Debug, Clone, Default, Serialize)]
pub struct InitReport {
    pub created: Vec<PromptRecord>,
    pub skipped: Vec<PromptKey>,
}

/// Manager enforcing the prompt versioning rules
pub struct PromptManager {
    storage: Arc<StorageManager>,
    catalog: Catalog,
}

impl PromptManager {
    /// Create a new prompt manager with the default agent-type allow-list
    pub fn new(storage: Arc<StorageManager>) -> Self {
        Self::with_catalog(storage, Catalog::default())
    }

    /// Create a prompt manager restricted to the given allow-list
    pub fn with_catalog(storage: Arc<StorageManager>, catalog: Catalog) -> Self {
        Self { storage, catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn storage(&self) -> &Arc<StorageManager> {
        &self.storage
    }

    /// Check a write request against the allow-list and content rules
    fn validate_request(&self, request: &NewPromptVersion) -> Result<()> {
        self.catalog.check_key(&request.key)?;
        NewPromptVersion::validate_content(&request.content)?;
        Ok(())
    }

    /// Save a new version of a prompt.
    ///
    /// The version number is `max(existing) + 1`, or 1 for a new prompt.
    pub async fn create_version(&self, request: NewPromptVersion) -> Result<PromptRecord> {
        self.validate_request(&request)?;

        let record = self.storage.prompts().insert_version(&request).await?;

        info!(
            "Created prompt version {} (active: {}, by: {})",
            record.label(),
            record.is_active,
            record.created_by
        );
        Ok(record)
    }

    /// Save the first version of a prompt that does not exist yet
    pub async fn create_prompt(&self, request: NewPromptVersion) -> Result<PromptRecord> {
        self.validate_request(&request)?;

        match self.storage.prompts().insert_initial_version(&request).await? {
            Some(record) => {
                info!("Created new prompt {}", record.label());
                Ok(record)
            }
            None => Err(Error::validation(format!(
                "Prompt {} already exists; save a new version of it instead",
                request.key
            ))),
        }
    }

    /// Make `version` the single active version of the prompt
    pub async fn activate_version(
        &self,
        agent_type: &str,
        prompt_name: &str,
        version: u32,
    ) -> Result<PromptRecord> {
        let key = PromptKey::parse(agent_type, prompt_name)?;

        match self.storage.prompts().activate(&key, version).await? {
            Some(record) => {
                info!("Activated prompt version {}", record.label());
                Ok(record)
            }
            None => {
                warn!("Cannot activate {} v{}: no such version", key, version);
                Err(Error::not_found(format!("prompt version {} v{}", key, version)))
            }
        }
    }

    /// Get the active version of a prompt
    pub async fn get_active(&self, agent_type: &str, prompt_name: &str) -> Result<PromptRecord> {
        let key = PromptKey::parse(agent_type, prompt_name)?;

        match self.storage.prompts().find_active(&key).await? {
            Some(record) => Ok(record),
            None => {
                warn!("No active prompt for {}", key);
                Err(Error::not_found(format!("active version of {}", key)))
            }
        }
    }

    /// Get one specific version of a prompt
    pub async fn get_version(
        &self,
        agent_type: &str,
        prompt_name: &str,
        version: u32,
    ) -> Result<PromptRecord> {
        let key = PromptKey::parse(agent_type, prompt_name)?;

        self.storage
            .prompts()
            .find_version(&key, version)
            .await?
            .ok_or_else(|| Error::not_found(format!("prompt version {} v{}", key, version)))
    }

    /// Version history of a prompt, most recent first
    pub async fn list_history(
        &self,
        agent_type: &str,
        prompt_name: &str,
        limit: Option<u32>,
    ) -> Result<Vec<PromptRecord>> {
        let key = PromptKey::parse(agent_type, prompt_name)?;
        let history = self.storage.prompts().list_versions(&key, limit).await?;
        debug!("Loaded {} version(s) of {}", history.len(), key);
        Ok(history)
    }

    /// Count one live use of the active version
    pub async fn record_usage(&self, agent_type: &str, prompt_name: &str) -> Result<()> {
        let key = PromptKey::parse(agent_type, prompt_name)?;

        match self.storage.prompts().increment_usage(&key).await? {
            Some(record) => {
                debug!("Usage of {} is now {}", record.label(), record.usage_count);
                Ok(())
            }
            None => {
                warn!("Usage recorded for {} without an active version", key);
                Err(Error::not_found(format!("active version of {}", key)))
            }
        }
    }

    /// Every active prompt, optionally for one agent type
    pub async fn list_active(&self, agent_type: Option<&str>) -> Result<Vec<PromptRecord>> {
        let agent_type = agent_type.map(AgentType::parse).transpose()?;
        Ok(self
            .storage
            .prompts()
            .list_active(agent_type.as_ref())
            .await?)
    }

    /// Agent types that have at least one stored prompt
    pub async fn agent_types(&self) -> Result<Vec<AgentType>> {
        Ok(self.storage.prompts().list_agent_types().await?)
    }

    /// Prompt names stored for an agent type
    pub async fn prompt_names(&self, agent_type: &str) -> Result<Vec<PromptName>> {
        let agent_type = AgentType::parse(agent_type)?;
        Ok(self.storage.prompts().list_prompt_names(&agent_type).await?)
    }

    /// Write default prompts.
    ///
    /// Without `force`, prompts that already have any version are left
    /// alone, so running this twice creates nothing new. With `force`, every
    /// seed is saved as a new active version.
    pub async fn initialize(&self, seeds: &[Seed], force: bool) -> Result<InitReport> {
        info!("Initializing {} default prompt(s) (force: {})", seeds.len(), force);

        // Validate everything before the first write
        let requests = seeds
            .iter()
            .map(|seed| {
                let request = seed.to_request()?;
                self.catalog.check_key(&request.key)?;
                Ok(request)
            })
            .collect::<Result<Vec<_>>>()?;

        let prompts = self.storage.prompts();
        let mut report = InitReport::default();

        for request in requests {
            let created = if force {
                Some(prompts.insert_version(&request).await?)
            } else {
                prompts.insert_initial_version(&request).await?
            };

            match created {
                Some(record) => {
                    info!("Seeded {}", record.label());
                    report.created.push(record);
                }
                None => {
                    debug!("{} already exists, skipping", request.key);
                    report.skipped.push(request.key);
                }
            }
        }

        info!(
            "Initialization complete: {} created, {} skipped",
            report.created.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Plain-text export of every active prompt
    pub async fn export_active(&self) -> Result<String> {
        let records = self.storage.prompts().list_active(None).await?;
        info!("Exporting {} active prompt(s)", records.len());
        Ok(export::render_export(&records, Utc::now()))
    }

    /// Store-wide counters
    pub async fn stats(&self) -> Result<DatabaseStats> {
        Ok(self.storage.stats().await?)
    }
}
