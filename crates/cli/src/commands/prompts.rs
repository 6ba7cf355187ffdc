//! Prompts command handler.
//!
//! Lists the available prompt definitions: the five built-ins plus any
//! workspace overrides under `.manualbot/prompts/`.

use clap::Args;
use manualbot_core::{config::AppConfig, AppResult};
use manualbot_prompt::{list_prompts, load_prompt};

/// List available prompt definitions
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output prompt ids as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the full template of one prompt instead of listing ids
    #[arg(long)]
    pub show: Option<String>,
}

impl PromptsCommand {
    /// Execute the prompts command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing prompts command");

        if let Some(ref prompt_id) = self.show {
            let definition = load_prompt(&config.workspace, prompt_id)?;
            println!("{} ({})", definition.id, definition.title);
            println!();
            println!("{}", definition.template);
            return Ok(());
        }

        let ids = list_prompts(&config.workspace)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&ids)?);
        } else {
            for id in ids {
                println!("{}", id);
            }
        }

        Ok(())
    }
}
