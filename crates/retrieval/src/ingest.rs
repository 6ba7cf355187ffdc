//! Manual manifest ingestion.
//!
//! Reads a manifest (chapter → {text, images}), embeds each section, and
//! upserts it into the SQLite index keyed by chapter. Sections whose content
//! hash is unchanged are skipped, so re-ingestion is cheap and idempotent.

use crate::embeddings::EmbeddingProvider;
use crate::index;
use crate::types::{IngestStats, Manifest, ManualSection};
use chrono::Utc;
use manualbot_core::{AppError, AppResult};
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Instant;

/// Read a manual manifest from a JSON file.
pub fn read_manifest(path: &Path) -> AppResult<Manifest> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Retrieval(format!("Failed to read manifest {:?}: {}", path, e)))?;

    let manifest: Manifest = serde_json::from_str(&contents)
        .map_err(|e| AppError::Retrieval(format!("Failed to parse manifest {:?}: {}", path, e)))?;

    if manifest.is_empty() {
        return Err(AppError::Retrieval(format!(
            "Manifest {:?} contains no sections",
            path
        )));
    }

    Ok(manifest)
}

/// Ingest a manifest into the section index.
///
/// # Arguments
/// * `conn` - Open connection to the section index
/// * `provider` - Embedding provider for section texts
/// * `manifest` - Parsed manual manifest
/// * `reset` - Clear the index before ingesting
pub async fn ingest(
    conn: &Connection,
    provider: &dyn EmbeddingProvider,
    manifest: &Manifest,
    reset: bool,
) -> AppResult<IngestStats> {
    let start = Instant::now();

    tracing::info!(
        "Starting ingest of {} sections (provider: {})",
        manifest.len(),
        provider.provider_name()
    );

    if reset {
        index::reset_index(conn)?;
    }

    let mut sections_embedded = 0u32;
    let mut sections_skipped = 0u32;

    for (chapter, entry) in manifest {
        let hash = content_hash(&entry.text, &entry.images);

        if !reset {
            if let Some(stored_hash) = index::find_content_hash(conn, chapter)? {
                if stored_hash == hash {
                    tracing::debug!("Section {} unchanged, skipping", chapter);
                    sections_skipped += 1;
                    continue;
                }
            }
        }

        let embedding = provider.embed(&entry.text).await?;
        let section = ManualSection::new(chapter.clone(), entry.text.clone(), entry.images.clone());

        index::upsert_section(conn, &section, &embedding, &hash, &Utc::now().to_rfc3339())?;
        sections_embedded += 1;
    }

    let duration = start.elapsed();

    tracing::info!(
        "Ingest completed: {} embedded, {} skipped in {:.2}s",
        sections_embedded,
        sections_skipped,
        duration.as_secs_f64()
    );

    Ok(IngestStats {
        sections_total: manifest.len() as u32,
        sections_embedded,
        sections_skipped,
        duration_secs: duration.as_secs_f64(),
    })
}

/// Compute a SHA-256 hash over a section's text and image references.
fn content_hash(text: &str, images: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    for image in images {
        hasher.update(b"\0");
        hasher.update(image.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
