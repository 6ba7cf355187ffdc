//! Chat command handler.
//!
//! Interactive read-answer loop over stdin. Each turn carries a window of
//! recent history so follow-up questions keep their context.

use clap::Args;
use manualbot_agent::{ChatMessage, TurnRequest};
use manualbot_core::{config::AppConfig, AppError, AppResult};
use std::io::{BufRead, Write};

/// Interactive chat session over the manual
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// List source chapters after each answer
    #[arg(long)]
    pub sources: bool,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting chat session");

        let assistant = super::build_assistant(config)?;
        let history_window = config.assistant.history_window;

        let mut history: Vec<ChatMessage> = Vec::new();
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        println!("Manual assistant ready. Type a question, or 'exit' to quit.");

        loop {
            print!("> ");
            stdout
                .flush()
                .map_err(|e| AppError::Other(format!("Failed to flush stdout: {}", e)))?;

            let mut line = String::new();
            let bytes = stdin
                .lock()
                .read_line(&mut line)
                .map_err(|e| AppError::Other(format!("Failed to read input: {}", e)))?;

            // EOF ends the session
            if bytes == 0 {
                break;
            }

            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if question == "exit" || question == "quit" {
                break;
            }

            let request = TurnRequest::with_history(question, history.clone());
            let outcome = match assistant.run_turn(request).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Turn failed: {}", e);
                    eprintln!("Error: {}", e);
                    continue;
                }
            };

            println!("{}", outcome.answer);

            if self.sources && !outcome.documents.is_empty() {
                let chapters: Vec<&str> = outcome
                    .documents
                    .iter()
                    .map(|d| d.chapter.as_str())
                    .collect();
                println!("[sources: {}]", chapters.join(", "));
            }

            history.push(ChatMessage::user(question));
            history.push(ChatMessage::assistant(&outcome.answer));
            trim_history(&mut history, history_window);
        }

        println!("Goodbye.");
        Ok(())
    }
}

/// Keep only the most recent `window` messages.
fn trim_history(history: &mut Vec<ChatMessage>, window: usize) {
    if history.len() > window {
        let excess = history.len() - window;
        history.drain(..excess);
    }
}
