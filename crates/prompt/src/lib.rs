//! Prompt system for the manual assistant.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions compiled into the binary
//! - Workspace overrides under `.manualbot/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::render_prompt;
pub use loader::{list_prompts, load_prompt};
pub use types::PromptDefinition;
