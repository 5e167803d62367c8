//! Allow-list of agent types accepted by the store

use crate::prompt::{AgentType, PromptKey};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Agent types known out of the box
pub const DEFAULT_AGENT_TYPES: &[&str] = &["conversational", "knowledge", "router", "web", "memory"];

/// Configurable allow-list for agent types.
///
/// An empty catalog accepts every well-formed agent type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    agent_types: BTreeSet<AgentType>,
}

impl Default for Catalog {
    fn default() -> Self {
        // The defaults are valid identifiers
        Self {
            agent_types: DEFAULT_AGENT_TYPES
                .iter()
                .filter_map(|raw| AgentType::parse(raw).ok())
                .collect(),
        }
    }
}

impl Catalog {
    /// Build a catalog from raw agent type names
    pub fn new<I, S>(agent_types: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let agent_types = agent_types
            .into_iter()
            .map(|raw| {
                AgentType::parse(raw.as_ref()).map_err(|e| {
                    Error::configuration(format!("invalid catalog entry '{}': {}", raw.as_ref(), e))
                })
            })
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self { agent_types })
    }

    /// Catalog accepting any agent type
    pub fn open() -> Self {
        Self {
            agent_types: BTreeSet::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.agent_types.is_empty()
    }

    pub fn contains(&self, agent_type: &AgentType) -> bool {
        self.is_open() || self.agent_types.contains(agent_type)
    }

    pub fn agent_types(&self) -> impl Iterator<Item = &AgentType> {
        self.agent_types.iter()
    }

    /// Reject agent types outside the allow-list
    pub fn check(&self, agent_type: &AgentType) -> Result<()> {
        if self.contains(agent_type) {
            return Ok(());
        }
        let allowed = self
            .agent_types
            .iter()
            .map(AgentType::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Err(Error::validation(format!(
            "Unknown agent type '{}' (allowed: {})",
            agent_type, allowed
        )))
    }

    pub fn check_key(&self, key: &PromptKey) -> Result<()> {
        self.check(&key.agent_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = Catalog::default();
        assert!(!catalog.is_open());
        for raw in DEFAULT_AGENT_TYPES {
            assert!(catalog.contains(&AgentType::parse(raw).unwrap()));
        }
        let unknown = AgentType::parse("billing").unwrap();
        let err = catalog.check(&unknown).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("billing"));
    }

    #[test]
    fn test_open_catalog_accepts_anything() {
        let catalog = Catalog::new(Vec::<String>::new()).unwrap();
        assert!(catalog.is_open());
        assert!(catalog.check(&AgentType::parse("billing").unwrap()).is_ok());
    }

    #[test]
    fn test_catalog_normalizes_entries() {
        let catalog = Catalog::new(["Fact Extractor", "router"]).unwrap();
        assert!(catalog.contains(&AgentType::parse("fact_extractor").unwrap()));
        assert_eq!(catalog.agent_types().count(), 2);
    }

    #[test]
    fn test_catalog_rejects_bad_entries() {
        let err = Catalog::new(["ok_agent", "!"]).unwrap_err();
        assert_eq!(err.category(), "configuration");
    }
}
