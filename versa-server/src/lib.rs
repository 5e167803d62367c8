//! HTTP admin API and command line for the Versa prompt store
//!
//! This crate wires configuration, logging and storage together and exposes
//! the prompt manager over a JSON API.

pub mod api;
pub mod config;
pub mod error;
pub mod server;


pub use error::{Error, Result};

/// Re-export the library crates for convenience
pub use versa_core as core;
pub use versa_prompts as prompts;
pub use versa_storage as storage;
