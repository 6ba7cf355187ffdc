//! Stats command handler.
//!
//! Shows section index statistics.

use clap::Args;
use manualbot_core::{config::AppConfig, AppResult};
use manualbot_retrieval::index;

/// Show section index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output statistics as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    /// Execute the stats command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let db_path = config.index_path();
        let conn = index::init_index(&db_path)?;
        let stats = index::get_stats(&conn, &db_path)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("Section index: {:?}", db_path);
        println!("  Sections: {}", stats.sections_count);
        println!("  Size: {} bytes", stats.db_size_bytes);
        match &stats.last_ingested_at {
            Some(ts) => println!("  Last ingested: {}", ts),
            None => println!("  Last ingested: never"),
        }

        Ok(())
    }
}
