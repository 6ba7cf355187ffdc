//! Command handlers for the Manualbot CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod ingest;
pub mod prompts;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use ingest::IngestCommand;
pub use prompts::PromptsCommand;
pub use stats::StatsCommand;

use manualbot_agent::{AssistantSettings, ManualAssistant, PromptSet};
use manualbot_core::{config::AppConfig, AppResult};
use manualbot_llm::create_client;
use manualbot_retrieval::{create_provider, IndexRetriever};
use std::sync::Arc;

/// Assemble a `ManualAssistant` from configuration.
///
/// Shared by the `ask` and `chat` commands: creates the LLM client and the
/// index-backed retriever, loads the prompt set (built-ins plus workspace
/// overrides), and reads the scope summary.
pub(crate) fn build_assistant(config: &AppConfig) -> AppResult<ManualAssistant> {
    let llm = create_client(&config.llm.provider, Some(&config.llm.endpoint))?;

    let embedding_provider = create_provider(&config.embedding)?;
    let retriever = IndexRetriever::open(
        &config.index_path(),
        embedding_provider,
        config.retrieval.top_k,
    )?;

    let prompts = PromptSet::load(&config.workspace)?;
    let settings = AssistantSettings::from_config(config)?;

    Ok(ManualAssistant::new(
        llm,
        Arc::new(retriever),
        prompts,
        settings,
    ))
}
