//! Prompt seeds used by initialization
//!
//! Seeds come from the built-in [`templates`](crate::templates) or from a
//! JSON file holding an array of objects:
//!
//! ```json
//! [
//!   {
//!     "agent_type": "memory",
//!     "prompt_name": "fact_extraction",
//!     "description": "Extract durable facts from a conversation",
//!     "variables": ["conversation"],
//!     "content": "List the facts about the user stated in: {conversation}"
//!   }
//! ]
//! ```

use crate::{templates, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use versa_core::prompt::{NewPromptVersion, PromptKey};

/// Author recorded for seeded versions
pub const SEED_AUTHOR: &str = "init_script";

/// A default prompt to write during initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub agent_type: String,
    pub prompt_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub variables: Vec<String>,
    pub content: String,
}

impl Seed {
    pub fn new(agent_type: &str, prompt_name: &str, description: &str, content: &str) -> Self {
        Self {
            agent_type: agent_type.to_string(),
            prompt_name: prompt_name.to_string(),
            description: Some(description.to_string()),
            variables: Vec::new(),
            content: content.to_string(),
        }
    }

    pub fn with_variables(mut self, variables: &[&str]) -> Self {
        self.variables = variables.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Turn the seed into an activating version request
    pub fn to_request(&self) -> Result<NewPromptVersion> {
        let key = PromptKey::parse(&self.agent_type, &self.prompt_name)?;
        Ok(NewPromptVersion::new(
            key,
            &self.content,
            self.description.as_deref(),
            Some(SEED_AUTHOR),
            true,
        )?
        .with_variables(&self.variables)?)
    }
}

/// Built-in defaults for the standard agent types
pub fn default_seeds() -> Vec<Seed> {
    vec![
        Seed::new(
            "conversational",
            "system_prompt",
            "System prompt for the conversational agent - initial version",
            templates::CONVERSATIONAL_SYSTEM_PROMPT,
        ),
        Seed::new(
            "knowledge",
            "system_prompt",
            "System prompt for the knowledge agent - initial version",
            templates::KNOWLEDGE_SYSTEM_PROMPT,
        ),
        Seed::new(
            "knowledge",
            "rag_prompt",
            "Template for RAG queries with document context",
            templates::KNOWLEDGE_RAG_PROMPT,
        )
        .with_variables(&["context", "question"]),
        Seed::new(
            "router",
            "routing_prompt",
            "Prompt for the routing decision",
            templates::ROUTER_ROUTING_PROMPT,
        )
        .with_variables(&["question", "has_documents"]),
        Seed::new(
            "web",
            "system_prompt",
            "System prompt for the web search agent - initial version",
            templates::WEB_SYSTEM_PROMPT,
        ),
        Seed::new(
            "memory",
            "fact_extraction",
            "Prompt for extracting facts from conversations",
            templates::MEMORY_FACT_EXTRACTION_PROMPT,
        )
        .with_variables(&["text"]),
    ]
}

/// Parse seeds from a JSON array
pub fn parse_seeds(json: &str) -> Result<Vec<Seed>> {
    serde_json::from_str(json).map_err(|e| Error::validation(format!("invalid seed file: {}", e)))
}

/// Read seeds from a JSON file
pub fn load_seeds<P: AsRef<Path>>(path: P) -> Result<Vec<Seed>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| {
        Error::validation(format!("cannot read seed file {}: {}", path.display(), e))
    })?;
    parse_seeds(&json)
}
