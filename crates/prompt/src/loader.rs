//! Prompt loader for YAML prompt definitions.
//!
//! Five prompt definitions ship compiled into the binary. Each can be
//! overridden by placing a file with the same id in `.manualbot/prompts/`.

use crate::types::PromptDefinition;
use manualbot_core::{AppError, AppResult};
use std::path::Path;

/// Built-in prompt definitions, compiled into the binary.
const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (
        "assistant.scope",
        include_str!("../prompts/assistant.scope.yml"),
    ),
    (
        "assistant.score-doc",
        include_str!("../prompts/assistant.score-doc.yml"),
    ),
    (
        "assistant.rewrite",
        include_str!("../prompts/assistant.rewrite.yml"),
    ),
    (
        "assistant.generate",
        include_str!("../prompts/assistant.generate.yml"),
    ),
    (
        "assistant.score-answer",
        include_str!("../prompts/assistant.score-answer.yml"),
    ),
];

/// Load a prompt definition by ID.
///
/// A workspace file at `.manualbot/prompts/<id>.yml` takes precedence over
/// the built-in definition with the same id.
///
/// # Arguments
/// * `workspace_path` - Root workspace directory containing `.manualbot/`
/// * `prompt_id` - Prompt identifier (e.g., "assistant.scope")
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(".manualbot/prompts")
        .join(format!("{}.yml", prompt_id));

    let contents = if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);
        std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?
    } else {
        BUILTIN_PROMPTS
            .iter()
            .find(|(id, _)| *id == prompt_id)
            .map(|(_, yaml)| yaml.to_string())
            .ok_or_else(|| AppError::Prompt(format!("Unknown prompt id: {}", prompt_id)))?
    };

    let definition: PromptDefinition = serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt '{}': {}", prompt_id, e)))?;

    validate_prompt(&definition)?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt id mismatch: requested '{}', file declares '{}'",
            prompt_id, definition.id
        )));
    }

    tracing::debug!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List all available prompt IDs (built-in plus workspace overrides).
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = BUILTIN_PROMPTS.iter().map(|(id, _)| id.to_string()).collect();

    let prompts_dir = workspace_path.join(".manualbot/prompts");
    if prompts_dir.exists() {
        for entry in walkdir::WalkDir::new(&prompts_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !prompt_ids.iter().any(|id| id == stem) {
                        prompt_ids.push(stem.to_string());
                    }
                }
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.api_version.is_empty() {
        return Err(AppError::Prompt(
            "Prompt apiVersion cannot be empty".to_string(),
        ));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
