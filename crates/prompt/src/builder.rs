//! Prompt rendering via Handlebars templates.

use crate::types::PromptDefinition;
use manualbot_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Render a prompt definition with the given variables.
///
/// Missing variables render as empty strings, which matches how classifier
/// prompts treat absent context (e.g., an empty chat history).
///
/// # Example
/// ```
/// use manualbot_prompt::{render_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// let def = PromptDefinition {
///     id: "test".to_string(),
///     title: "Test".to_string(),
///     api_version: "1.0".to_string(),
///     template: "Question: {{question}}".to_string(),
/// };
///
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "How do I log in?".to_string());
///
/// let rendered = render_prompt(&def, &vars).unwrap();
/// assert_eq!(rendered, "Question: How do I log in?");
/// ```
pub fn render_prompt(
    definition: &PromptDefinition,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    tracing::debug!("Rendering prompt: {}", definition.id);
    render_template(&definition.template, variables)
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text prompts
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
