//! Ask command handler.
//!
//! Runs a single question through the assistant and prints the answer.

use clap::Args;
use manualbot_agent::{ChatMessage, TurnOutcome, TurnRequest};
use manualbot_core::{config::AppConfig, AppError, AppResult};
use std::path::PathBuf;

/// Ask a single question about the manual
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// JSON file with prior conversation history
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Output the full turn result as JSON
    #[arg(long)]
    pub json: bool,

    /// List the chapters the answer was grounded in
    #[arg(long)]
    pub sources: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let history = match &self.history {
            Some(path) => read_history(path)?,
            None => Vec::new(),
        };

        let assistant = super::build_assistant(config)?;
        let request = TurnRequest::with_history(&self.question, history);
        let outcome = assistant.run_turn(request).await?;

        self.print_outcome(&outcome)
    }

    fn print_outcome(&self, outcome: &TurnOutcome) -> AppResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(outcome)?);
            return Ok(());
        }

        println!("{}", outcome.answer);

        if self.sources && !outcome.documents.is_empty() {
            println!();
            println!("Sources:");
            for doc in &outcome.documents {
                if doc.images.is_empty() {
                    println!("  - chapter {}", doc.chapter);
                } else {
                    println!("  - chapter {} ({})", doc.chapter, doc.images.join(", "));
                }
            }
        }

        Ok(())
    }
}

/// Read a conversation history file (a JSON array of role/text messages).
fn read_history(path: &PathBuf) -> AppResult<Vec<ChatMessage>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read history file {:?}: {}", path, e)))?;

    serde_json::from_str(&contents)
        .map_err(|e| AppError::Config(format!("Failed to parse history file {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use manualbot_agent::Role;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_history() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        fs::write(
            &path,
            r#"[
                {"role": "user", "text": "How do I log in?"},
                {"role": "assistant", "text": "Use your email and password."}
            ]"#,
        )
        .unwrap();

        let history = read_history(&path).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[test]
    fn test_read_history_missing_file() {
        let path = PathBuf::from("/nonexistent/history.json");
        assert!(matches!(read_history(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn test_read_history_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(read_history(&path), Err(AppError::Config(_))));
    }
}
