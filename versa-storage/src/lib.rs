//! Persistence layer for the Versa prompt store
//!
//! This crate owns the SQLite connection pool, the schema migrations and
//! the repository for versioned prompt rows.

pub mod error;
pub mod manager;
pub mod repositories;

pub use error::{Error, Result};
pub use manager::{DatabaseConfig, DatabaseStats, StorageManager};

/// Re-export core types for convenience
pub use versa_core as core;
