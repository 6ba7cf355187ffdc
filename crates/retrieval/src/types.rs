//! Document types for manual retrieval.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A section of the product manual.
///
/// The chapter identifier (e.g., "1.4.2") is the section's natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualSection {
    /// Chapter identifier (e.g., "1.4.2")
    pub chapter: String,

    /// Section text
    pub text: String,

    /// Image path references associated with the section
    #[serde(default)]
    pub images: Vec<String>,
}

impl ManualSection {
    /// Create a new manual section.
    pub fn new(
        chapter: impl Into<String>,
        text: impl Into<String>,
        images: Vec<String>,
    ) -> Self {
        Self {
            chapter: chapter.into(),
            text: text.into(),
            images,
        }
    }
}

/// One entry of a manual manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSection {
    /// Section text
    pub text: String,

    /// Image path references
    #[serde(default)]
    pub images: Vec<String>,
}

/// A manual manifest: chapter identifier mapped to section content.
///
/// A `BTreeMap` keeps ingestion order deterministic across runs.
pub type Manifest = BTreeMap<String, ManifestSection>;

/// Statistics from one ingest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Total sections present in the manifest
    pub sections_total: u32,

    /// Sections embedded and written to the index
    pub sections_embedded: u32,

    /// Sections skipped because their content was unchanged
    pub sections_skipped: u32,

    /// Wall-clock duration of the run in seconds
    pub duration_secs: f64,
}

/// Statistics about the section index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of sections stored in the index
    pub sections_count: u32,

    /// Size of the database file in bytes
    pub db_size_bytes: u64,

    /// Most recent ingestion timestamp (RFC 3339), if any
    pub last_ingested_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_deserialization() {
        let json = r#"{
            "1.1": {"text": "Introduction to the system", "images": []},
            "1.2": {"text": "Logging in", "images": ["img/login.png"]}
        }"#;

        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest["1.2"].images, vec!["img/login.png"]);
    }

    #[test]
    fn test_manifest_images_default_to_empty() {
        let json = r#"{"2.1": {"text": "No images here"}}"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert!(manifest["2.1"].images.is_empty());
    }
}
