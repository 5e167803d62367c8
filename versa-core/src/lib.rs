//! Core domain models for the Versa prompt store
//!
//! This crate contains the prompt identifiers, version records, the
//! new-version request and the agent-type allow-list shared by the
//! storage, manager and server crates.

pub mod catalog;
pub mod error;
pub mod prompt;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use prompt::{AgentType, NewPromptVersion, PromptKey, PromptName, PromptRecord};
