//! The orchestration step graph.
//!
//! The turn state machine is represented as an explicit set of named steps
//! with a pure transition function over `(Step, &TurnState)`. Keeping the
//! routing free of collaborator calls makes every decision point unit
//! testable in isolation.
//!
//! ```text
//! ClassifyScope ──out of scope──▶ Done
//!       │
//!       ▼
//!   Retrieve ◀────────── RewriteQuery
//!       │                      ▲
//!       ▼                      │
//! ScoreDocuments ──fail, under bound
//!       │  │
//!       │  └──fail, bound hit──▶ NoDocs ──▶ Done
//!       ▼
//!   Generate ──▶ ScoreAnswer ──pass──▶ Done
//!                     │
//!                     └──fail──▶ (same routing as ScoreDocuments)
//! ```

use crate::state::TurnState;

/// Default bound on failed cycles before the support-contact fallback.
pub const MAX_RETRIES: u32 = 2;

/// A named step of the orchestration graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Entry gate: is the question about the manual at all?
    ClassifyScope,
    /// Fetch raw candidate sections for the current query
    Retrieve,
    /// Filter candidates through the per-document relevance classifier
    ScoreDocuments,
    /// Reformulate the query after a failed cycle
    RewriteQuery,
    /// Terminal fallback when retrieval is exhausted
    NoDocs,
    /// Produce a grounded answer from the filtered sections
    Generate,
    /// Quality gate on the generated answer
    ScoreAnswer,
    /// Terminal marker
    Done,
}

/// Compute the next step from the current step and turn state.
///
/// Pure function: all collaborator effects happen inside the steps
/// themselves; this only reads the state they left behind.
pub fn next_step(step: Step, state: &TurnState, max_retries: u32) -> Step {
    match step {
        Step::ClassifyScope => {
            if state.in_scope {
                Step::Retrieve
            } else {
                Step::Done
            }
        }
        Step::Retrieve => Step::ScoreDocuments,
        Step::ScoreDocuments => route_after_scoring(state, max_retries),
        Step::RewriteQuery => Step::Retrieve,
        Step::NoDocs => Step::Done,
        Step::Generate => Step::ScoreAnswer,
        Step::ScoreAnswer => {
            if state.needs_rewrite {
                route_after_scoring(state, max_retries)
            } else {
                Step::Done
            }
        }
        Step::Done => Step::Done,
    }
}

/// Shared routing decision after a scoring step.
///
/// Used by both failure paths (empty filtered set, rejected answer) so the
/// bound check cannot drift between them: the retry bound is checked first,
/// then the rewrite flag, otherwise generation proceeds.
fn route_after_scoring(state: &TurnState, max_retries: u32) -> Step {
    if state.retries >= max_retries {
        Step::NoDocs
    } else if state.needs_rewrite {
        Step::RewriteQuery
    } else {
        Step::Generate
    }
}
