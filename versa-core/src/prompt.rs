//! Versioned prompt domain model
//!
//! A prompt is addressed by a [`PromptKey`] (agent type + prompt name) and
//! stored as an append-only sequence of [`PromptRecord`] versions. At most
//! one version per key is active at a time.
//!
//! # Examples
//!
//! Building a request for a new version:
//!
//! ```rust
//! use versa_core::prompt::NewPromptVersion;
//!
//! let request = NewPromptVersion::builder()
//!     .agent_type("knowledge")
//!     .prompt_name("rag_prompt")
//!     .content("Answer using only the supplied context: {context}")
//!     .description("Tighter grounding instructions")
//!     .variable("context")
//!     .activate(true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.created_by, "admin");
//! assert_eq!(request.key.to_string(), "knowledge.rag_prompt");
//! assert_eq!(request.variables, vec!["context"]);
//! ```

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum prompt content length, counted in characters after trimming
pub const MIN_CONTENT_CHARS: usize = 10;

/// Maximum prompt content length in characters
pub const MAX_CONTENT_CHARS: usize = 100_000;

/// Author recorded when the caller does not name one
pub const DEFAULT_CREATED_BY: &str = "admin";

const MIN_IDENTIFIER_CHARS: usize = 2;
const MAX_IDENTIFIER_CHARS: usize = 64;

/// Trim, lowercase and replace inner whitespace with underscores, then check
/// the identifier alphabet.
fn normalize_identifier(kind: &str, raw: &str) -> Result<String> {
    let normalized = raw
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    if normalized.is_empty() {
        return Err(Error::validation(format!("{} cannot be empty", kind)));
    }
    let len = normalized.chars().count();
    if len < MIN_IDENTIFIER_CHARS {
        return Err(Error::validation(format!(
            "{} must have at least {} characters",
            kind, MIN_IDENTIFIER_CHARS
        )));
    }
    if len > MAX_IDENTIFIER_CHARS {
        return Err(Error::validation(format!(
            "{} cannot exceed {} characters",
            kind, MAX_IDENTIFIER_CHARS
        )));
    }
    if !normalized.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(Error::validation(format!(
            "{} must start with a letter: '{}'",
            kind, normalized
        )));
    }
    if !normalized
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(Error::validation(format!(
            "{} can only contain lowercase letters, digits, hyphens and underscores: '{}'",
            kind, normalized
        )));
    }
    Ok(normalized)
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Normalize and validate a raw identifier
            pub fn parse(raw: &str) -> Result<Self> {
                normalize_identifier($kind, raw).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Logical consumer category owning a namespace of prompts
    /// (`conversational`, `knowledge`, `router`, ...)
    AgentType,
    "Agent type"
);

identifier!(
    /// Prompt identifier within an agent type (`system_prompt`, `rag_prompt`, ...)
    PromptName,
    "Prompt name"
);

/// Composite key addressing every version of one prompt
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PromptKey {
    pub agent_type: AgentType,
    pub prompt_name: PromptName,
}

impl PromptKey {
    pub fn new(agent_type: AgentType, prompt_name: PromptName) -> Self {
        Self {
            agent_type,
            prompt_name,
        }
    }

    /// Parse both halves of the key from raw strings
    pub fn parse(agent_type: &str, prompt_name: &str) -> Result<Self> {
        Ok(Self::new(
            AgentType::parse(agent_type)?,
            PromptName::parse(prompt_name)?,
        ))
    }
}

impl fmt::Display for PromptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.agent_type, self.prompt_name)
    }
}

/// Check template variable names and return them trimmed, in first-seen
/// order, without blanks or duplicates.
pub fn normalize_variables<I, S>(variables: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for raw in variables {
        let name = raw.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::validation(format!(
                "Template variable can only contain letters, digits and underscores: '{}'",
                name
            )));
        }
        if !normalized.iter().any(|existing| existing == name) {
            normalized.push(name.to_string());
        }
    }
    Ok(normalized)
}

/// One immutable version of a prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptRecord {
    pub agent_type: AgentType,
    pub prompt_name: PromptName,
    pub version: u32,
    pub content: String,
    pub description: Option<String>,
    /// Placeholder names the content expects, such as `context`
    #[serde(default)]
    pub variables: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub usage_count: u64,
    pub is_active: bool,
}

impl PromptRecord {
    pub fn key(&self) -> PromptKey {
        PromptKey::new(self.agent_type.clone(), self.prompt_name.clone())
    }

    /// Human readable reference such as `knowledge.rag_prompt v3`
    pub fn label(&self) -> String {
        format!("{}.{} v{}", self.agent_type, self.prompt_name, self.version)
    }
}

/// Validated request to append a new version to a prompt
#[derive(Debug, Clone, PartialEq)]
pub struct NewPromptVersion {
    pub key: PromptKey,
    pub content: String,
    pub description: Option<String>,
    pub variables: Vec<String>,
    pub created_by: String,
    pub activate: bool,
}

impl NewPromptVersion {
    /// Create a new version request with validation
    ///
    /// Content and description are stored trimmed; a blank description
    /// becomes `None` and a blank author becomes [`DEFAULT_CREATED_BY`].
    pub fn new(
        key: PromptKey,
        content: &str,
        description: Option<&str>,
        created_by: Option<&str>,
        activate: bool,
    ) -> Result<Self> {
        let content = Self::validate_content(content)?;

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let created_by = created_by
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CREATED_BY)
            .to_string();

        Ok(Self {
            key,
            content,
            description,
            variables: Vec::new(),
            created_by,
            activate,
        })
    }

    /// Declare the template variables used by the content
    pub fn with_variables<I, S>(mut self, variables: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.variables = normalize_variables(variables)?;
        Ok(self)
    }

    /// Create a builder for constructing a NewPromptVersion
    pub fn builder() -> NewPromptVersionBuilder {
        NewPromptVersionBuilder::new()
    }

    /// Validate prompt content and return its trimmed form
    pub fn validate_content(content: &str) -> Result<String> {
        let trimmed = content.trim();
        let chars = trimmed.chars().count();
        if chars < MIN_CONTENT_CHARS {
            return Err(Error::validation(format!(
                "Prompt content must have at least {} characters",
                MIN_CONTENT_CHARS
            )));
        }
        if chars > MAX_CONTENT_CHARS {
            return Err(Error::validation(format!(
                "Prompt content cannot exceed {} characters",
                MAX_CONTENT_CHARS
            )));
        }
        Ok(trimmed.to_string())
    }
}

/// Builder for creating NewPromptVersion instances
#[derive(Debug, Default)]
pub struct NewPromptVersionBuilder {
    agent_type: Option<String>,
    prompt_name: Option<String>,
    content: Option<String>,
    description: Option<String>,
    variables: Vec<String>,
    created_by: Option<String>,
    activate: bool,
}

impl NewPromptVersionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent_type<S: Into<String>>(mut self, agent_type: S) -> Self {
        self.agent_type = Some(agent_type.into());
        self
    }

    pub fn prompt_name<S: Into<String>>(mut self, prompt_name: S) -> Self {
        self.prompt_name = Some(prompt_name.into());
        self
    }

    pub fn key(mut self, key: &PromptKey) -> Self {
        self.agent_type = Some(key.agent_type.to_string());
        self.prompt_name = Some(key.prompt_name.to_string());
        self
    }

    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn variable<S: Into<String>>(mut self, name: S) -> Self {
        self.variables.push(name.into());
        self
    }

    pub fn created_by<S: Into<String>>(mut self, created_by: S) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Activate the new version as part of the same write
    pub fn activate(mut self, activate: bool) -> Self {
        self.activate = activate;
        self
    }

    /// Build the NewPromptVersion instance
    pub fn build(self) -> Result<NewPromptVersion> {
        let agent_type = self
            .agent_type
            .ok_or_else(|| Error::validation("Agent type is required"))?;
        let prompt_name = self
            .prompt_name
            .ok_or_else(|| Error::validation("Prompt name is required"))?;
        let content = self
            .content
            .ok_or_else(|| Error::validation("Prompt content is required"))?;

        NewPromptVersion::new(
            PromptKey::parse(&agent_type, &prompt_name)?,
            &content,
            self.description.as_deref(),
            self.created_by.as_deref(),
            self.activate,
        )?
        .with_variables(self.variables)
    }
}
