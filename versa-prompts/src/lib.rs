//! Prompt version management for the Versa prompt store
//!
//! This crate enforces the versioning rules on top of the storage layer:
//! input validation, monotonically increasing version numbers, a single
//! active version per prompt, usage accounting, default seeding and text
//! export.

pub mod error;
pub mod export;
pub mod manager;
pub mod seeds;
pub mod templates;

pub use error::{Error, Result};
pub use manager::{InitReport, PromptManager};
pub use seeds::Seed;

/// Re-export core types for convenience
pub use versa_core as core;
pub use versa_storage as storage;
