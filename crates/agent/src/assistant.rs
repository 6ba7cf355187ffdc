//! The manual assistant orchestrator.
//!
//! `ManualAssistant` drives the step graph for one turn at a time: gate the
//! question, retrieve and filter manual sections, generate a grounded
//! answer, and verify it, with a bounded rewrite loop around the retrieval
//! cycle. All model and retrieval calls go through the injected collaborator
//! traits; transport failures from either are fatal for the turn and
//! propagate to the caller.

use crate::graph::{self, Step};
use crate::state::{Role, TurnOutcome, TurnRequest, TurnState};
use crate::verdict::{parse_verdict, Verdict};
use manualbot_core::config::AppConfig;
use manualbot_core::{AppError, AppResult};
use manualbot_llm::{LlmClient, LlmRequest};
use manualbot_prompt::{load_prompt, render_prompt, PromptDefinition};
use manualbot_retrieval::{DocumentRetriever, ManualSection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;

/// The five prompt definitions used by the orchestration steps.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub scope: PromptDefinition,
    pub score_doc: PromptDefinition,
    pub rewrite: PromptDefinition,
    pub generate: PromptDefinition,
    pub score_answer: PromptDefinition,
}

impl PromptSet {
    /// Load all assistant prompts (built-ins plus workspace overrides).
    pub fn load(workspace: &Path) -> AppResult<Self> {
        Ok(Self {
            scope: load_prompt(workspace, "assistant.scope")?,
            score_doc: load_prompt(workspace, "assistant.score-doc")?,
            rewrite: load_prompt(workspace, "assistant.rewrite")?,
            generate: load_prompt(workspace, "assistant.generate")?,
            score_answer: load_prompt(workspace, "assistant.score-answer")?,
        })
    }
}

/// Behavior settings resolved once at assistant construction.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    /// Model identifier passed to the LLM client
    pub model: String,

    /// Static scope summary text, shared read-only across turns
    pub scope_summary: String,

    /// Fixed refusal for out-of-scope questions
    pub out_of_scope_message: String,

    /// Fixed support-contact fallback message
    pub contact_message: String,

    /// Affirmative classifier token
    pub yes_token: String,

    /// Negative classifier token
    pub no_token: String,

    /// Bound on failed cycles
    pub max_retries: u32,
}

impl AssistantSettings {
    /// Build settings from the application configuration.
    ///
    /// Reads the scope summary file once; the text is then shared immutably
    /// by every turn the assistant runs.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let summary_path = config.summary_path();
        let scope_summary = std::fs::read_to_string(&summary_path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read scope summary {:?}: {}",
                summary_path, e
            ))
        })?;

        Ok(Self {
            model: config.llm.model.clone(),
            scope_summary,
            out_of_scope_message: config.assistant.out_of_scope_message.clone(),
            contact_message: config.assistant.contact_message.clone(),
            yes_token: config.assistant.yes_token.clone(),
            no_token: config.assistant.no_token.clone(),
            max_retries: config.assistant.max_retries,
        })
    }
}

/// Orchestrator for one-question-one-answer turns over the product manual.
pub struct ManualAssistant {
    llm: Arc<dyn LlmClient>,
    retriever: Arc<dyn DocumentRetriever>,
    prompts: PromptSet,
    settings: AssistantSettings,
}

impl ManualAssistant {
    /// Create a new assistant from its collaborators and settings.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        retriever: Arc<dyn DocumentRetriever>,
        prompts: PromptSet,
        settings: AssistantSettings,
    ) -> Self {
        Self {
            llm,
            retriever,
            prompts,
            settings,
        }
    }

    /// Run one turn to completion.
    ///
    /// Every run terminates within the retry bound: each pass through the
    /// rewrite loop strictly increases `retries`, and the routing checks the
    /// bound before re-entering the loop.
    pub async fn run_turn(&self, request: TurnRequest) -> AppResult<TurnOutcome> {
        let turn_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("turn", %turn_id);
        self.run_steps(request).instrument(span).await
    }

    async fn run_steps(&self, request: TurnRequest) -> AppResult<TurnOutcome> {
        if request.user_message.trim().is_empty() {
            return Err(AppError::Turn("Empty user message".to_string()));
        }

        let mut state = TurnState::new(request);
        let mut step = Step::ClassifyScope;

        while step != Step::Done {
            tracing::debug!(?step, retries = state.retries, "Executing step");

            match step {
                Step::ClassifyScope => self.classify_scope(&mut state).await?,
                Step::Retrieve => self.retrieve(&mut state).await?,
                Step::ScoreDocuments => self.score_documents(&mut state).await?,
                Step::RewriteQuery => self.rewrite_query(&mut state).await?,
                Step::NoDocs => {
                    state.answer = Some(self.settings.contact_message.clone());
                }
                Step::Generate => self.generate(&mut state).await?,
                Step::ScoreAnswer => self.score_answer(&mut state).await?,
                Step::Done => break,
            }

            step = graph::next_step(step, &state, self.settings.max_retries);
        }

        let answer = state
            .answer
            .ok_or_else(|| AppError::Turn("Turn terminated without an answer".to_string()))?;

        tracing::info!(
            retries = state.retries,
            documents = state.documents.len(),
            "Turn completed"
        );

        Ok(TurnOutcome {
            answer,
            documents: state.documents,
        })
    }

    /// Entry gate: decide whether the question concerns the manual at all.
    ///
    /// Out-of-scope questions terminate immediately with the fixed refusal;
    /// no retrieval or generation happens for them.
    async fn classify_scope(&self, state: &mut TurnState) -> AppResult<()> {
        let user_context = state
            .history
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = HashMap::new();
        vars.insert("summary".to_string(), self.settings.scope_summary.clone());
        vars.insert("user_context".to_string(), user_context);
        vars.insert("user_message".to_string(), state.user_message.clone());

        let response = self.complete(&self.prompts.scope, &vars).await?;

        match self.verdict(&response) {
            Verdict::Negative => {
                tracing::info!("Question classified as out of scope");
                state.in_scope = false;
                state.answer = Some(self.settings.out_of_scope_message.clone());
                state.documents.clear();
            }
            _ => {
                state.in_scope = true;
            }
        }

        Ok(())
    }

    /// Fetch raw candidate sections for the current query.
    async fn retrieve(&self, state: &mut TurnState) -> AppResult<()> {
        state.documents = self.retriever.search(&state.query).await?;
        tracing::debug!(candidates = state.documents.len(), "Retrieved candidates");
        Ok(())
    }

    /// Filter candidates through the per-document relevance classifier.
    ///
    /// Candidates are scored independently and concurrently; kept sections
    /// preserve the candidate order. An empty kept set records a failed
    /// cycle.
    async fn score_documents(&self, state: &mut TurnState) -> AppResult<()> {
        let candidates = std::mem::take(&mut state.documents);

        let checks = candidates.iter().map(|doc| {
            let mut vars = HashMap::new();
            vars.insert("user_message".to_string(), state.user_message.clone());
            vars.insert("document".to_string(), doc.text.clone());

            async move {
                let response = self.complete(&self.prompts.score_doc, &vars).await?;
                Ok::<bool, AppError>(self.verdict(&response).accepts())
            }
        });

        let verdicts = futures::future::try_join_all(checks).await?;

        let kept: Vec<ManualSection> = candidates
            .into_iter()
            .zip(verdicts)
            .filter(|(_, keep)| *keep)
            .map(|(doc, _)| doc)
            .collect();

        if kept.is_empty() {
            tracing::info!("No relevant sections kept, recording failed cycle");
            state.record_failure(None);
        } else {
            tracing::debug!(kept = kept.len(), "Sections passed relevance filter");
            state.needs_rewrite = false;
            state.documents = kept;
        }

        Ok(())
    }

    /// Reformulate the query after a failed cycle.
    ///
    /// An empty rewrite keeps the previous query so retrieval never runs
    /// with an empty string.
    async fn rewrite_query(&self, state: &mut TurnState) -> AppResult<()> {
        let mut vars = HashMap::new();
        vars.insert("summary".to_string(), self.settings.scope_summary.clone());
        vars.insert("user_message".to_string(), state.user_message.clone());
        vars.insert("last_query".to_string(), state.query.clone());

        let response = self.complete(&self.prompts.rewrite, &vars).await?;
        let rewritten = response.trim();

        if rewritten.is_empty() {
            tracing::warn!("Rewrite produced an empty query, keeping previous query");
        } else {
            tracing::debug!(query = rewritten, "Query rewritten");
            state.query = rewritten.to_string();
        }

        Ok(())
    }

    /// Produce a grounded answer from the filtered sections.
    async fn generate(&self, state: &mut TurnState) -> AppResult<()> {
        let documents = state
            .documents
            .iter()
            .map(|doc| doc.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut vars = HashMap::new();
        vars.insert(
            "contact_message".to_string(),
            self.settings.contact_message.clone(),
        );
        vars.insert("documents".to_string(), documents);
        vars.insert("user_context".to_string(), transcript(state));
        vars.insert("user_message".to_string(), state.user_message.clone());

        let response = self.complete(&self.prompts.generate, &vars).await?;
        state.answer = Some(response);

        Ok(())
    }

    /// Quality gate: does the generated answer satisfy the question?
    ///
    /// A rejected answer is replaced with the contact fallback and the turn
    /// re-enters the rewrite loop, subject to the shared retry bound.
    async fn score_answer(&self, state: &mut TurnState) -> AppResult<()> {
        let documents = state
            .documents
            .iter()
            .map(|doc| doc.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let answer = state
            .answer
            .clone()
            .ok_or_else(|| AppError::Turn("Answer scoring reached without an answer".to_string()))?;

        let mut vars = HashMap::new();
        vars.insert("documents".to_string(), documents);
        vars.insert("user_message".to_string(), state.user_message.clone());
        vars.insert("answer".to_string(), answer);

        let response = self.complete(&self.prompts.score_answer, &vars).await?;

        match self.verdict(&response) {
            Verdict::Negative => {
                tracing::info!("Generated answer rejected by quality check");
                state.record_failure(Some(self.settings.contact_message.clone()));
            }
            _ => {
                state.needs_rewrite = false;
            }
        }

        Ok(())
    }

    /// Render a prompt and run it through the LLM.
    async fn complete(
        &self,
        prompt: &PromptDefinition,
        vars: &HashMap<String, String>,
    ) -> AppResult<String> {
        let rendered = render_prompt(prompt, vars)?;
        let request = LlmRequest::new(rendered, &self.settings.model);
        let response = self.llm.complete(&request).await?;
        Ok(response.content)
    }

    fn verdict(&self, response: &str) -> Verdict {
        parse_verdict(response, &self.settings.yes_token, &self.settings.no_token)
    }
}

/// Render the full conversation transcript for the generation prompt.
fn transcript(state: &TurnState) -> String {
    state
        .history
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}
