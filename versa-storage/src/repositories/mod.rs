//! Repository implementations for persisted entities

pub mod prompt;

pub use prompt::PromptRepository;
