//! Orchestration scenarios with scripted collaborators.
//!
//! These tests drive full turns through `ManualAssistant` using scripted
//! LLM and retriever doubles, checking the routing behavior that matters:
//! the out-of-scope gate, the happy path, the retry bound, the quality
//! check loop, and failure propagation.

use crate::assistant::{AssistantSettings, ManualAssistant, PromptSet};
use crate::graph::MAX_RETRIES;
use crate::state::{ChatMessage, TurnRequest};
use async_trait::async_trait;
use manualbot_core::{AppError, AppResult};
use manualbot_llm::{LlmClient, LlmRequest, LlmResponse};
use manualbot_retrieval::{DocumentRetriever, ManualSection};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

const OUT_OF_SCOPE: &str = "I can only answer questions about the product manual.";
const CONTACT: &str = "Please contact our support team for help.";

/// LLM double that replays a scripted sequence of responses and records
/// every rendered prompt it receives.
struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let content = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Llm("Scripted responses exhausted".to_string()))?;
        Ok(LlmResponse::new(content, &request.model))
    }
}

/// Retriever double that replays scripted result sets and records queries.
struct ScriptedRetriever {
    results: Mutex<VecDeque<Vec<ManualSection>>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedRetriever {
    fn new(results: Vec<Vec<ManualSection>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentRetriever for ScriptedRetriever {
    async fn search(&self, query: &str) -> AppResult<Vec<ManualSection>> {
        self.queries.lock().unwrap().push(query.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Retrieval("Scripted results exhausted".to_string()))
    }
}

fn section(chapter: &str, text: &str) -> ManualSection {
    ManualSection::new(chapter, text, vec![])
}

fn prompt(id: &str, template: &str) -> manualbot_prompt::PromptDefinition {
    manualbot_prompt::PromptDefinition {
        id: id.to_string(),
        title: id.to_string(),
        api_version: "1.0".to_string(),
        template: template.to_string(),
    }
}

/// Minimal prompt templates that surface the variables each step binds, so
/// assertions can inspect what the steps actually sent.
fn prompts() -> PromptSet {
    PromptSet {
        scope: prompt("assistant.scope", "SCOPE {{user_message}}"),
        score_doc: prompt(
            "assistant.score-doc",
            "SCORE {{document}} FOR {{user_message}}",
        ),
        rewrite: prompt("assistant.rewrite", "REWRITE {{last_query}}"),
        generate: prompt(
            "assistant.generate",
            "GENERATE {{documents}} FOR {{user_message}} CONTEXT {{user_context}}",
        ),
        score_answer: prompt("assistant.score-answer", "CHECK {{answer}}"),
    }
}

fn settings() -> AssistantSettings {
    AssistantSettings {
        model: "test-model".to_string(),
        scope_summary: "A manual about the product".to_string(),
        out_of_scope_message: OUT_OF_SCOPE.to_string(),
        contact_message: CONTACT.to_string(),
        yes_token: "yes".to_string(),
        no_token: "no".to_string(),
        max_retries: MAX_RETRIES,
    }
}

fn assistant(
    llm: Arc<ScriptedLlm>,
    retriever: Arc<ScriptedRetriever>,
) -> ManualAssistant {
    ManualAssistant::new(llm, retriever, prompts(), settings())
}

#[tokio::test]
async fn test_out_of_scope_refuses_without_retrieval() {
    let llm = Arc::new(ScriptedLlm::new(&["no"]));
    let retriever = Arc::new(ScriptedRetriever::new(vec![]));
    let bot = assistant(llm.clone(), retriever.clone());

    let outcome = bot
        .run_turn(TurnRequest::new("What's the weather today?"))
        .await
        .unwrap();

    assert_eq!(outcome.answer, OUT_OF_SCOPE);
    assert!(outcome.documents.is_empty());
    assert_eq!(llm.calls(), 1);
    assert!(retriever.queries().is_empty());
}

#[tokio::test]
async fn test_happy_path_single_cycle() {
    // scope yes, both docs relevant, answer generated and accepted
    let llm = Arc::new(ScriptedLlm::new(&[
        "yes",
        "yes",
        "yes",
        "Press the red button on the left panel.",
        "yes",
    ]));
    let retriever = Arc::new(ScriptedRetriever::new(vec![vec![
        section("2.1", "The red button starts the device"),
        section("2.2", "The panel layout"),
    ]]));
    let bot = assistant(llm.clone(), retriever.clone());

    let outcome = bot
        .run_turn(TurnRequest::new("How do I start the device?"))
        .await
        .unwrap();

    assert_eq!(outcome.answer, "Press the red button on the left panel.");
    assert_eq!(outcome.documents.len(), 2);
    assert_eq!(llm.calls(), 5);
    assert_eq!(retriever.queries(), vec!["How do I start the device?"]);
}

#[tokio::test]
async fn test_document_filter_preserves_order() {
    let llm = Arc::new(ScriptedLlm::new(&[
        "yes", // scope
        "yes", // doc A
        "no",  // doc B
        "yes", // doc C
        "Answer grounded in A and C.",
        "yes",
    ]));
    let retriever = Arc::new(ScriptedRetriever::new(vec![vec![
        section("1.1", "Section A"),
        section("1.2", "Section B"),
        section("1.3", "Section C"),
    ]]));
    let bot = assistant(llm.clone(), retriever.clone());

    let outcome = bot.run_turn(TurnRequest::new("question")).await.unwrap();

    let chapters: Vec<&str> = outcome
        .documents
        .iter()
        .map(|d| d.chapter.as_str())
        .collect();
    assert_eq!(chapters, vec!["1.1", "1.3"]);

    // The generation prompt carries only the kept sections
    let generate_prompt = &llm.prompts()[4];
    assert!(generate_prompt.contains("Section A"));
    assert!(!generate_prompt.contains("Section B"));
    assert!(generate_prompt.contains("Section C"));
}

#[tokio::test]
async fn test_retrieval_exhaustion_falls_back_to_contact() {
    // Two retrieve+filter passes fail, one rewrite in between, then the
    // retry bound routes to the contact fallback.
    let llm = Arc::new(ScriptedLlm::new(&[
        "yes",                        // scope
        "no",                         // first pass: doc rejected
        "device startup procedure",   // rewrite
        "no",                         // second pass: doc rejected
    ]));
    let retriever = Arc::new(ScriptedRetriever::new(vec![
        vec![section("3.1", "Unrelated section")],
        vec![section("3.2", "Still unrelated")],
    ]));
    let bot = assistant(llm.clone(), retriever.clone());

    let outcome = bot
        .run_turn(TurnRequest::new("How do I start it?"))
        .await
        .unwrap();

    assert_eq!(outcome.answer, CONTACT);
    assert!(outcome.documents.is_empty());
    assert_eq!(llm.calls(), 4);
    assert_eq!(
        retriever.queries(),
        vec!["How do I start it?", "device startup procedure"]
    );
}

#[tokio::test]
async fn test_rejected_answer_regenerates_after_rewrite() {
    let llm = Arc::new(ScriptedLlm::new(&[
        "yes",           // scope
        "yes",           // doc relevant
        "A vague draft", // generate
        "no",            // answer rejected
        "better query",  // rewrite
        "yes",           // doc relevant again
        "A precise answer.",
        "yes", // answer accepted
    ]));
    let retriever = Arc::new(ScriptedRetriever::new(vec![
        vec![section("4.1", "First candidate")],
        vec![section("4.2", "Second candidate")],
    ]));
    let bot = assistant(llm.clone(), retriever.clone());

    let outcome = bot.run_turn(TurnRequest::new("question")).await.unwrap();

    assert_eq!(outcome.answer, "A precise answer.");
    assert_eq!(outcome.documents.len(), 1);
    assert_eq!(outcome.documents[0].chapter, "4.2");
    assert_eq!(llm.calls(), 8);
    assert_eq!(retriever.queries(), vec!["question", "better query"]);
}

#[tokio::test]
async fn test_rejected_answer_at_bound_falls_back_to_contact() {
    // One empty filter pass plus one rejected answer hits the bound.
    let llm = Arc::new(ScriptedLlm::new(&[
        "yes",     // scope
        "no",      // first pass: doc rejected
        "retry q", // rewrite
        "yes",     // second pass: doc kept
        "A weak answer",
        "no", // answer rejected, bound reached
    ]));
    let retriever = Arc::new(ScriptedRetriever::new(vec![
        vec![section("5.1", "Off-topic")],
        vec![section("5.2", "On-topic")],
    ]));
    let bot = assistant(llm.clone(), retriever.clone());

    let outcome = bot.run_turn(TurnRequest::new("question")).await.unwrap();

    assert_eq!(outcome.answer, CONTACT);
    assert!(outcome.documents.is_empty());
    assert_eq!(llm.calls(), 6);
}

#[tokio::test]
async fn test_ambiguous_scope_response_proceeds() {
    // Anything that is not an explicit negative counts as in scope
    let llm = Arc::new(ScriptedLlm::new(&[
        "I think this is about the manual",
        "yes",
        "An answer.",
        "yes",
    ]));
    let retriever = Arc::new(ScriptedRetriever::new(vec![vec![section(
        "6.1",
        "Relevant section",
    )]]));
    let bot = assistant(llm.clone(), retriever.clone());

    let outcome = bot.run_turn(TurnRequest::new("question")).await.unwrap();
    assert_eq!(outcome.answer, "An answer.");
}

#[tokio::test]
async fn test_empty_rewrite_keeps_previous_query() {
    let llm = Arc::new(ScriptedLlm::new(&[
        "yes", // scope
        "no",  // first pass fails
        "   ", // rewrite comes back blank
        "no",  // second pass fails
    ]));
    let retriever = Arc::new(ScriptedRetriever::new(vec![
        vec![section("7.1", "A")],
        vec![section("7.2", "B")],
    ]));
    let bot = assistant(llm.clone(), retriever.clone());

    let outcome = bot.run_turn(TurnRequest::new("original query")).await.unwrap();

    assert_eq!(outcome.answer, CONTACT);
    assert_eq!(retriever.queries(), vec!["original query", "original query"]);
}

#[tokio::test]
async fn test_history_reaches_classification_and_generation() {
    let llm = Arc::new(ScriptedLlm::new(&["yes", "yes", "Answer.", "yes"]));
    let retriever = Arc::new(ScriptedRetriever::new(vec![vec![section(
        "8.1",
        "Section",
    )]]));
    let bot = assistant(llm.clone(), retriever.clone());

    let history = vec![
        ChatMessage::user("How do I log in?"),
        ChatMessage::assistant("Use your email and password."),
    ];
    bot.run_turn(TurnRequest::with_history("And how do I log out?", history))
        .await
        .unwrap();

    let prompts = llm.prompts();
    // Scope prompt binds the current question
    assert!(prompts[0].contains("And how do I log out?"));
    // Generation prompt carries the full transcript
    assert!(prompts[2].contains("user: How do I log in?"));
    assert!(prompts[2].contains("assistant: Use your email and password."));
}

#[tokio::test]
async fn test_empty_user_message_is_an_error() {
    let llm = Arc::new(ScriptedLlm::new(&[]));
    let retriever = Arc::new(ScriptedRetriever::new(vec![]));
    let bot = assistant(llm.clone(), retriever.clone());

    let result = bot.run_turn(TurnRequest::new("   ")).await;
    assert!(matches!(result, Err(AppError::Turn(_))));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_retriever_failure_propagates() {
    // Scripted retriever with no queued results errors on the first search
    let llm = Arc::new(ScriptedLlm::new(&["yes"]));
    let retriever = Arc::new(ScriptedRetriever::new(vec![]));
    let bot = assistant(llm.clone(), retriever.clone());

    let result = bot.run_turn(TurnRequest::new("question")).await;
    assert!(matches!(result, Err(AppError::Retrieval(_))));
}

#[tokio::test]
async fn test_llm_failure_propagates() {
    let llm = Arc::new(ScriptedLlm::new(&[]));
    let retriever = Arc::new(ScriptedRetriever::new(vec![]));
    let bot = assistant(llm.clone(), retriever.clone());

    let result = bot.run_turn(TurnRequest::new("question")).await;
    assert!(matches!(result, Err(AppError::Llm(_))));
}

#[tokio::test]
async fn test_repeat_runs_are_deterministic() {
    for _ in 0..2 {
        let llm = Arc::new(ScriptedLlm::new(&[
            "yes",
            "yes",
            "Same answer every time.",
            "yes",
        ]));
        let retriever = Arc::new(ScriptedRetriever::new(vec![vec![section(
            "9.1", "Section",
        )]]));
        let bot = assistant(llm.clone(), retriever.clone());

        let outcome = bot.run_turn(TurnRequest::new("question")).await.unwrap();
        assert_eq!(outcome.answer, "Same answer every time.");
        assert_eq!(llm.calls(), 4);
    }
}
