//! Turn orchestration for the manual assistant.
//!
//! This crate wires the assistant's decision graph together: scope
//! classification, retrieval, per-document relevance filtering, bounded
//! query rewriting, grounded generation, and answer verification. The
//! collaborators (LLM client, document retriever) are injected as trait
//! objects so the orchestration logic can be tested without a model or an
//! index.

pub mod assistant;
pub mod graph;
pub mod state;
pub mod verdict;

// Re-export main types
pub use assistant::{AssistantSettings, ManualAssistant, PromptSet};
pub use graph::{next_step, Step, MAX_RETRIES};
pub use state::{ChatMessage, Role, TurnOutcome, TurnRequest, TurnState};
pub use verdict::{parse_verdict, Verdict};

#[cfg(test)]
mod tests;
