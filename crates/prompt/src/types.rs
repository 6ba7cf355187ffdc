//! Prompt types for the manual assistant.
//!
//! Prompt text is data, not logic: every model call in the assistant renders
//! one of these definitions with a set of named variables.

use serde::{Deserialize, Serialize};

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier (e.g., "assistant.scope")
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Template string with Handlebars syntax
    pub template: String,
}
