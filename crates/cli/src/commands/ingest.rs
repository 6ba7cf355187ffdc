//! Ingest command handler.
//!
//! Builds or refreshes the section index from a manual manifest.

use clap::Args;
use manualbot_core::{config::AppConfig, AppResult};
use manualbot_retrieval::{create_provider, index, ingest, read_manifest, IngestStats};
use std::path::PathBuf;

/// Ingest a manual manifest into the section index
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Path to the manifest JSON file (chapter -> {text, images})
    pub manifest: PathBuf,

    /// Clear the index before ingesting
    #[arg(long)]
    pub reset: bool,

    /// Output ingest statistics as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    /// Execute the ingest command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let manifest = read_manifest(&self.manifest)?;
        let provider = create_provider(&config.embedding)?;

        let conn = index::init_index(&config.index_path())?;
        let stats = ingest(&conn, provider.as_ref(), &manifest, self.reset).await?;

        self.print_stats(&stats)
    }

    fn print_stats(&self, stats: &IngestStats) -> AppResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(stats)?);
        } else {
            println!(
                "Ingested {} of {} sections ({} unchanged) in {:.1}s",
                stats.sections_embedded,
                stats.sections_total,
                stats.sections_skipped,
                stats.duration_secs
            );
        }
        Ok(())
    }
}
