//! Per-turn conversation state.
//!
//! One `TurnState` instance exists per user turn. It is created from the
//! turn request, mutated in place by each orchestration step, and discarded
//! once a terminal step has produced the answer. Nothing persists across
//! turns except the history the caller carries forward.

use manualbot_retrieval::ManualSection;
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Get the lowercase role name used in prompt transcripts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message of the recent conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Input to one turn of the assistant.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// The user's current question
    pub user_message: String,

    /// Recent conversation history, oldest first
    pub history: Vec<ChatMessage>,
}

impl TurnRequest {
    /// Create a turn request without history.
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            history: Vec::new(),
        }
    }

    /// Create a turn request with history.
    pub fn with_history(user_message: impl Into<String>, history: Vec<ChatMessage>) -> Self {
        Self {
            user_message: user_message.into(),
            history,
        }
    }
}

/// Output of one turn: the answer plus the sections it was grounded in.
///
/// `documents` is exposed for citation/UI purposes only; it is empty for
/// refusals and fallback answers.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub answer: String,
    pub documents: Vec<ManualSection>,
}

/// Mutable state threaded through every orchestration step of one turn.
#[derive(Debug)]
pub struct TurnState {
    /// The current question; immutable for the duration of the run
    pub user_message: String,

    /// Read-only context for classification and generation prompts
    pub history: Vec<ChatMessage>,

    /// The string sent to the document retriever; starts as `user_message`
    /// and may be overwritten by the rewrite step. Never empty when
    /// retrieval runs.
    pub query: String,

    /// Scope decision from the entry classifier
    pub in_scope: bool,

    /// Retrieved-and-filtered sections; replaced, never appended to
    pub documents: Vec<ManualSection>,

    /// The current cycle failed and a rewrite is required
    pub needs_rewrite: bool,

    /// Failed-cycle counter; monotonically non-decreasing, never reset
    pub retries: u32,

    /// Final answer; set only by terminal steps
    pub answer: Option<String>,
}

impl TurnState {
    /// Create fresh state for one turn.
    pub fn new(request: TurnRequest) -> Self {
        let query = request.user_message.clone();
        Self {
            user_message: request.user_message,
            history: request.history,
            query,
            in_scope: false,
            documents: Vec::new(),
            needs_rewrite: false,
            retries: 0,
            answer: None,
        }
    }

    /// Record a failed cycle: clear the document set, flag a rewrite, and
    /// bump the retry counter.
    ///
    /// Both failure paths (empty filtered set and rejected answer) go through
    /// here so the retry bookkeeping cannot drift between them. The answer
    /// quality check passes its fallback answer; the filtering step passes
    /// `None`.
    pub fn record_failure(&mut self, fallback_answer: Option<String>) {
        self.documents.clear();
        self.needs_rewrite = true;
        self.retries += 1;

        if let Some(answer) = fallback_answer {
            self.answer = Some(answer);
        }
    }
}
