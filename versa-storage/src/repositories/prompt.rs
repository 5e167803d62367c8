//! Prompt version repository implementation

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Sqlite, Transaction};
use std::future::Future;
use tracing::{debug, warn};
use versa_core::prompt::{AgentType, NewPromptVersion, PromptKey, PromptName, PromptRecord};

/// Attempts made when a concurrent writer claims the same version number
const MAX_INSERT_ATTEMPTS: usize = 3;

const RECORD_COLUMNS: &str = "agent_type, prompt_name, version, content, description, \
                              variables, created_by, created_at, usage_count, is_active";

/// Raw `prompt_versions` row
#[derive(Debug, FromRow)]
struct PromptRow {
    agent_type: String,
    prompt_name: String,
    version: i64,
    content: String,
    description: Option<String>,
    /// JSON array of placeholder names
    variables: String,
    created_by: String,
    created_at: DateTime<Utc>,
    usage_count: i64,
    is_active: bool,
}

impl TryFrom<PromptRow> for PromptRecord {
    type Error = Error;

    fn try_from(row: PromptRow) -> Result<Self> {
        Ok(PromptRecord {
            agent_type: AgentType::parse(&row.agent_type)?,
            prompt_name: PromptName::parse(&row.prompt_name)?,
            version: u32::try_from(row.version)
                .map_err(|_| Error::Conflict(format!("invalid version {}", row.version)))?,
            content: row.content,
            description: row.description,
            variables: serde_json::from_str(&row.variables)?,
            created_by: row.created_by,
            created_at: row.created_at,
            usage_count: u64::try_from(row.usage_count)
                .map_err(|_| Error::Conflict(format!("invalid usage count {}", row.usage_count)))?,
            is_active: row.is_active,
        })
    }
}

fn into_records(rows: Vec<PromptRow>) -> Result<Vec<PromptRecord>> {
    rows.into_iter().map(PromptRecord::try_from).collect()
}

/// Re-run `op` while it fails on a unique constraint, up to
/// [`MAX_INSERT_ATTEMPTS`] times in total.
async fn retry_on_version_clash<F, Fut>(key: &PromptKey, mut op: F) -> Result<PromptRecord>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PromptRecord>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(err) if err.is_unique_violation() && attempt < MAX_INSERT_ATTEMPTS => {
                warn!(
                    "Version number clash on {} (attempt {}), retrying",
                    key, attempt
                );
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Repository for versioned prompt rows
pub struct PromptRepository {
    pool: Pool<Sqlite>,
}

impl PromptRepository {
    /// Create a new prompt repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Append a new version to the request's key.
    ///
    /// The version number is computed inside the INSERT statement. When
    /// `request.activate` is set the siblings are deactivated in the same
    /// transaction.
    pub async fn insert_version(&self, request: &NewPromptVersion) -> Result<PromptRecord> {
        retry_on_version_clash(&request.key, || self.try_insert_version(request)).await
    }

    async fn try_insert_version(&self, request: &NewPromptVersion) -> Result<PromptRecord> {
        let variables = serde_json::to_string(&request.variables)?;
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, PromptRow>(&format!(
            r#"
            INSERT INTO prompt_versions (
                agent_type, prompt_name, version, content, description,
                variables, created_by, created_at, usage_count, is_active
            )
            SELECT ?1, ?2, COALESCE(MAX(version), 0) + 1, ?3, ?4, ?5, ?6, ?7, 0, 0
            FROM prompt_versions
            WHERE agent_type = ?1 AND prompt_name = ?2
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(request.key.agent_type.as_str())
        .bind(request.key.prompt_name.as_str())
        .bind(&request.content)
        .bind(&request.description)
        .bind(&variables)
        .bind(&request.created_by)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let row = if request.activate {
            Self::activate_in_tx(&mut tx, &request.key, inserted.version)
                .await?
                .ok_or_else(|| Error::Conflict(format!("{} vanished mid-insert", request.key)))?
        } else {
            inserted
        };

        tx.commit().await?;

        let record = PromptRecord::try_from(row)?;
        debug!("Inserted prompt version {}", record.label());
        Ok(record)
    }

    /// Insert version 1 only when the key has no versions yet.
    ///
    /// Returns `None` if the key already exists.
    pub async fn insert_initial_version(
        &self,
        request: &NewPromptVersion,
    ) -> Result<Option<PromptRecord>> {
        let variables = serde_json::to_string(&request.variables)?;
        let row = sqlx::query_as::<_, PromptRow>(&format!(
            r#"
            INSERT INTO prompt_versions (
                agent_type, prompt_name, version, content, description,
                variables, created_by, created_at, usage_count, is_active
            )
            SELECT ?1, ?2, 1, ?3, ?4, ?5, ?6, ?7, 0, ?8
            WHERE NOT EXISTS (
                SELECT 1 FROM prompt_versions WHERE agent_type = ?1 AND prompt_name = ?2
            )
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(request.key.agent_type.as_str())
        .bind(request.key.prompt_name.as_str())
        .bind(&request.content)
        .bind(&request.description)
        .bind(&variables)
        .bind(&request.created_by)
        .bind(Utc::now())
        .bind(request.activate)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PromptRecord::try_from).transpose()
    }

    /// Make `version` the only active version of `key`.
    ///
    /// Returns `None` and leaves every row untouched when the version does
    /// not exist.
    pub async fn activate(&self, key: &PromptKey, version: u32) -> Result<Option<PromptRecord>> {
        let mut tx = self.pool.begin().await?;

        match Self::activate_in_tx(&mut tx, key, i64::from(version)).await? {
            Some(row) => {
                tx.commit().await?;
                Ok(Some(PromptRecord::try_from(row)?))
            }
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }

    /// Deactivate siblings first so the single-active index never sees two rows
    async fn activate_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        key: &PromptKey,
        version: i64,
    ) -> Result<Option<PromptRow>> {
        sqlx::query(
            r#"
            UPDATE prompt_versions SET is_active = 0
            WHERE agent_type = ?1 AND prompt_name = ?2 AND is_active = 1 AND version <> ?3
            "#,
        )
        .bind(key.agent_type.as_str())
        .bind(key.prompt_name.as_str())
        .bind(version)
        .execute(&mut **tx)
        .await?;

        let row = sqlx::query_as::<_, PromptRow>(&format!(
            r#"
            UPDATE prompt_versions SET is_active = 1
            WHERE agent_type = ?1 AND prompt_name = ?2 AND version = ?3
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(key.agent_type.as_str())
        .bind(key.prompt_name.as_str())
        .bind(version)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row)
    }

    /// Find one version of a prompt
    pub async fn find_version(&self, key: &PromptKey, version: u32) -> Result<Option<PromptRecord>> {
        let row = sqlx::query_as::<_, PromptRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM prompt_versions \
             WHERE agent_type = ?1 AND prompt_name = ?2 AND version = ?3"
        ))
        .bind(key.agent_type.as_str())
        .bind(key.prompt_name.as_str())
        .bind(i64::from(version))
        .fetch_optional(&self.pool)
        .await?;

        row.map(PromptRecord::try_from).transpose()
    }

    /// Find the active version of a prompt
    pub async fn find_active(&self, key: &PromptKey) -> Result<Option<PromptRecord>> {
        let row = sqlx::query_as::<_, PromptRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM prompt_versions \
             WHERE agent_type = ?1 AND prompt_name = ?2 AND is_active = 1"
        ))
        .bind(key.agent_type.as_str())
        .bind(key.prompt_name.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PromptRecord::try_from).transpose()
    }

    /// All versions of a prompt, most recent first
    pub async fn list_versions(
        &self,
        key: &PromptKey,
        limit: Option<u32>,
    ) -> Result<Vec<PromptRecord>> {
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map(i64::from).unwrap_or(-1);

        let rows = sqlx::query_as::<_, PromptRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM prompt_versions \
             WHERE agent_type = ?1 AND prompt_name = ?2 \
             ORDER BY version DESC LIMIT ?3"
        ))
        .bind(key.agent_type.as_str())
        .bind(key.prompt_name.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    /// Highest version number stored for a prompt
    pub async fn latest_version(&self, key: &PromptKey) -> Result<Option<u32>> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(version) FROM prompt_versions WHERE agent_type = ?1 AND prompt_name = ?2",
        )
        .bind(key.agent_type.as_str())
        .bind(key.prompt_name.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(max.and_then(|v| u32::try_from(v).ok()))
    }

    /// Bump the usage counter of the active version
    pub async fn increment_usage(&self, key: &PromptKey) -> Result<Option<PromptRecord>> {
        let row = sqlx::query_as::<_, PromptRow>(&format!(
            r#"
            UPDATE prompt_versions SET usage_count = usage_count + 1
            WHERE agent_type = ?1 AND prompt_name = ?2 AND is_active = 1
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(key.agent_type.as_str())
        .bind(key.prompt_name.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PromptRecord::try_from).transpose()
    }

    /// Active versions, optionally restricted to one agent type
    pub async fn list_active(&self, agent_type: Option<&AgentType>) -> Result<Vec<PromptRecord>> {
        let rows = sqlx::query_as::<_, PromptRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM prompt_versions \
             WHERE is_active = 1 AND (?1 IS NULL OR agent_type = ?1) \
             ORDER BY agent_type, prompt_name"
        ))
        .bind(agent_type.map(AgentType::as_str))
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    /// Distinct agent types present in the store
    pub async fn list_agent_types(&self) -> Result<Vec<AgentType>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT agent_type FROM prompt_versions ORDER BY agent_type",
        )
        .fetch_all(&self.pool)
        .await?;

        names
            .iter()
            .map(|n| AgentType::parse(n).map_err(Error::from))
            .collect()
    }

    /// Distinct prompt names stored for an agent type
    pub async fn list_prompt_names(&self, agent_type: &AgentType) -> Result<Vec<PromptName>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT prompt_name FROM prompt_versions WHERE agent_type = ?1 ORDER BY prompt_name",
        )
        .bind(agent_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        names
            .iter()
            .map(|n| PromptName::parse(n).map_err(Error::from))
            .collect()
    }

    /// Number of active rows for one key (0 or 1 while the schema holds)
    pub async fn count_active_for(&self, key: &PromptKey) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM prompt_versions WHERE agent_type = ?1 AND prompt_name = ?2 AND is_active = 1",
        )
        .bind(key.agent_type.as_str())
        .bind(key.prompt_name.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Count stored versions
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prompt_versions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count distinct (agent_type, prompt_name) keys
    pub async fn count_prompts(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM (SELECT DISTINCT agent_type, prompt_name FROM prompt_versions)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count active versions
    pub async fn count_active(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM prompt_versions WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Sum of usage counters across every version
    pub async fn total_usage(&self) -> Result<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(usage_count), 0) FROM prompt_versions")
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }
}
