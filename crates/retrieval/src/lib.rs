//! Manual section retrieval.
//!
//! This crate provides the `DocumentRetriever` abstraction used by the
//! assistant, plus the bundled implementation backed by a SQLite vector
//! index over embedded manual sections:
//! - `ingest` builds the index from a manual manifest
//! - `IndexRetriever` embeds a query and returns the top-k sections by
//!   cosine similarity

pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod retriever;
pub mod types;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider};
pub use ingest::{ingest, read_manifest};
pub use retriever::DocumentRetriever;
pub use types::{IndexStats, IngestStats, Manifest, ManifestSection, ManualSection};

use manualbot_core::{AppError, AppResult};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// SQLite-backed document retriever.
///
/// Embeds the query with the configured provider and ranks stored sections
/// by cosine similarity. `rusqlite::Connection` is not `Sync`, so it sits
/// behind a mutex; retrieval runs one search at a time per retriever.
pub struct IndexRetriever {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    provider: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl IndexRetriever {
    /// Open (or create) the section index at `db_path`.
    pub fn open(
        db_path: &Path,
        provider: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> AppResult<Self> {
        let conn = index::init_index(db_path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: db_path.to_path_buf(),
            provider,
            top_k,
        })
    }

    /// Get statistics about the underlying index.
    pub fn stats(&self) -> AppResult<IndexStats> {
        let conn = self.lock_conn()?;
        index::get_stats(&conn, &self.db_path)
    }

    fn lock_conn(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Retrieval("Section index lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl DocumentRetriever for IndexRetriever {
    async fn search(&self, query: &str) -> AppResult<Vec<ManualSection>> {
        tracing::debug!("Searching section index for: {}", query);

        let query_embedding = self.provider.embed(query).await?;

        let results = {
            let conn = self.lock_conn()?;
            index::search_sections(&conn, &query_embedding, self.top_k)?
        };

        Ok(results.into_iter().map(|(section, _score)| section).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use crate::types::ManifestSection;
    use std::collections::BTreeMap;
    use tempfile::NamedTempFile;

    async fn populated_retriever(temp_file: &NamedTempFile) -> IndexRetriever {
        let provider = Arc::new(TrigramProvider::new(128));

        let mut manifest: Manifest = BTreeMap::new();
        manifest.insert(
            "1.6".to_string(),
            ManifestSection {
                text: "Authorization describes the login process for the system".to_string(),
                images: vec![],
            },
        );
        manifest.insert(
            "1.12.9".to_string(),
            ManifestSection {
                text: "Deleting a profile describes removing a user profile".to_string(),
                images: vec!["img/delete.png".to_string()],
            },
        );

        {
            let conn = index::init_index(temp_file.path()).unwrap();
            ingest::ingest(&conn, provider.as_ref(), &manifest, false)
                .await
                .unwrap();
        }

        IndexRetriever::open(temp_file.path(), provider, 2).unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_sections() {
        let temp_file = NamedTempFile::new().unwrap();
        let retriever = populated_retriever(&temp_file).await;

        let results = retriever.search("how to delete a profile").await.unwrap();
        assert_eq!(results.len(), 2);
        // The profile-deletion section should rank first for this query
        assert_eq!(results[0].chapter, "1.12.9");
        assert_eq!(results[0].images, vec!["img/delete.png"]);
    }

    #[tokio::test]
    async fn test_search_empty_index() {
        let temp_file = NamedTempFile::new().unwrap();
        let provider = Arc::new(TrigramProvider::new(128));
        let retriever = IndexRetriever::open(temp_file.path(), provider, 4).unwrap();

        let results = retriever.search("anything").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let temp_file = NamedTempFile::new().unwrap();
        let retriever = populated_retriever(&temp_file).await;

        let stats = retriever.stats().unwrap();
        assert_eq!(stats.sections_count, 2);
        assert!(stats.db_size_bytes > 0);
    }
}
