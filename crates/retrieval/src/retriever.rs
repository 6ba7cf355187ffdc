//! Document retriever abstraction.

use crate::types::ManualSection;
use manualbot_core::AppResult;

/// Trait for document retrieval backends.
///
/// Given a query string, a retriever returns an ordered sequence of candidate
/// manual sections. An empty result is valid; the orchestrator's filtering
/// and rewrite logic decides what happens next.
#[async_trait::async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Search for candidate sections matching the query.
    ///
    /// Results are ordered by descending relevance as judged by the backend.
    async fn search(&self, query: &str) -> AppResult<Vec<ManualSection>>;
}
