//! SQLite-backed vector index for manual sections.

use crate::types::{IndexStats, ManualSection};
use manualbot_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Initialize the SQLite section index.
pub fn init_index(db_path: &Path) -> AppResult<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Retrieval(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Retrieval(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sections (
            chapter TEXT PRIMARY KEY,
            text TEXT NOT NULL,
            images TEXT NOT NULL,
            embedding BLOB NOT NULL,
            content_hash TEXT NOT NULL,
            ingested_at TEXT NOT NULL
        );
        "#,
    )
    .map_err(|e| AppError::Retrieval(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Initialized section index at {:?}", db_path);
    Ok(conn)
}

/// Insert or replace a section with its embedding.
pub fn upsert_section(
    conn: &Connection,
    section: &ManualSection,
    embedding: &[f32],
    content_hash: &str,
    ingested_at: &str,
) -> AppResult<()> {
    let images_json = serde_json::to_string(&section.images)
        .map_err(|e| AppError::Retrieval(format!("Failed to serialize images: {}", e)))?;

    conn.execute(
        "INSERT OR REPLACE INTO sections (chapter, text, images, embedding, content_hash, ingested_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            section.chapter,
            section.text,
            images_json,
            embedding_to_bytes(embedding),
            content_hash,
            ingested_at,
        ],
    )
    .map_err(|e| AppError::Retrieval(format!("Failed to upsert section: {}", e)))?;

    Ok(())
}

/// Look up the stored content hash for a chapter, if present.
pub fn find_content_hash(conn: &Connection, chapter: &str) -> AppResult<Option<String>> {
    conn.query_row(
        "SELECT content_hash FROM sections WHERE chapter = ?1",
        params![chapter],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| AppError::Retrieval(format!("Failed to query content hash: {}", e)))
}

/// Query the index for the top-k most similar sections.
///
/// Returns sections ordered by descending cosine similarity.
pub fn search_sections(
    conn: &Connection,
    query_embedding: &[f32],
    top_k: usize,
) -> AppResult<Vec<(ManualSection, f32)>> {
    let mut stmt = conn
        .prepare("SELECT chapter, text, images, embedding FROM sections")
        .map_err(|e| AppError::Retrieval(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let images_json: String = row.get(2)?;
            let embedding_bytes: Vec<u8> = row.get(3)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                images_json,
                embedding_bytes,
            ))
        })
        .map_err(|e| AppError::Retrieval(format!("Failed to query sections: {}", e)))?;

    let mut results: Vec<(ManualSection, f32)> = Vec::new();

    for row in rows {
        let (chapter, text, images_json, embedding_bytes) =
            row.map_err(|e| AppError::Retrieval(format!("Failed to read section row: {}", e)))?;

        let images: Vec<String> = serde_json::from_str(&images_json)
            .map_err(|e| AppError::Retrieval(format!("Failed to parse images: {}", e)))?;
        let embedding = bytes_to_embedding(&embedding_bytes)?;

        let score = cosine_similarity(query_embedding, &embedding);
        results.push((ManualSection::new(chapter, text, images), score));
    }

    // Sort by score descending
    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(top_k);

    tracing::debug!(
        "Retrieved {} sections (requested top-{})",
        results.len(),
        top_k
    );

    Ok(results)
}

/// Get statistics for the index.
pub fn get_stats(conn: &Connection, db_path: &Path) -> AppResult<IndexStats> {
    let sections_count: u32 = conn
        .query_row("SELECT COUNT(*) FROM sections", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u32)
        })
        .map_err(|e| AppError::Retrieval(format!("Failed to count sections: {}", e)))?;

    let last_ingested_at: Option<String> = conn
        .query_row("SELECT MAX(ingested_at) FROM sections", [], |row| {
            row.get(0)
        })
        .map_err(|e| AppError::Retrieval(format!("Failed to query ingestion time: {}", e)))?;

    let db_size_bytes = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    Ok(IndexStats {
        sections_count,
        db_size_bytes,
        last_ingested_at,
    })
}

/// Reset the index (delete all sections).
pub fn reset_index(conn: &Connection) -> AppResult<()> {
    conn.execute("DELETE FROM sections", [])
        .map_err(|e| AppError::Retrieval(format!("Failed to delete sections: {}", e)))?;

    tracing::info!("Reset section index");
    Ok(())
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Retrieval(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        embedding.push(value);
    }

    Ok(embedding)
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
