//! Prompt system for docchat.
//!
//! This crate provides:
//! - YAML-based prompt definitions with a built-in Indonesian default
//! - Handlebars template rendering of history, reference chunks and question

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{format_context, PromptAssembler};
pub use loader::{load_or_default, load_prompt, validate_prompt};
pub use types::{PromptBehavior, PromptDefinition};
