//! Configuration management for the manual assistant.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config files (.manualbot/config.yaml)
//! - Environment variables (MANUALBOT_*)
//! - Command-line flags
//!
//! The configuration is workspace-centric, with most state stored in `.manualbot/`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Default out-of-scope refusal shown when a question is not about the manual.
pub const DEFAULT_OUT_OF_SCOPE_MESSAGE: &str = "This question was determined to be unrelated to \
the user manual. Please try again or contact our technical support department.";

/// Default support-contact fallback shown when no grounded answer could be produced.
pub const DEFAULT_CONTACT_MESSAGE: &str = "No answer to your question was found in the user \
manual. If you need qualified assistance, please call the support hotline, send an email, or \
submit a request through the website.\n\
CONTACT INFORMATION\n\
Technical support\n\
support@example.com";

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// CLI behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .manualbot/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider settings
    pub llm: LlmSettings,

    /// Embedding provider settings
    pub embedding: EmbeddingSettings,

    /// Retrieval settings
    pub retrieval: RetrievalSettings,

    /// Assistant behavior settings
    pub assistant: AssistantConfig,
}

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider identifier (currently "ollama")
    pub provider: String,

    /// Provider endpoint URL
    pub endpoint: String,

    /// Model identifier
    pub model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider identifier ("ollama" or "trigram")
    pub provider: String,

    /// Provider endpoint URL (used by the ollama provider)
    pub endpoint: String,

    /// Embedding model identifier
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Number of candidate sections returned per search
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Assistant behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Maximum failed cycles before the support-contact fallback
    pub max_retries: u32,

    /// Number of recent messages carried between chat turns
    pub history_window: usize,

    /// Affirmative token expected from classifier prompts
    pub yes_token: String,

    /// Negative token expected from classifier prompts
    pub no_token: String,

    /// Fixed refusal for out-of-scope questions
    pub out_of_scope_message: String,

    /// Fixed support-contact fallback message
    pub contact_message: String,

    /// Path to the scope summary file, relative to the workspace
    pub summary_file: PathBuf,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            history_window: 6,
            yes_token: "yes".to_string(),
            no_token: "no".to_string(),
            out_of_scope_message: DEFAULT_OUT_OF_SCOPE_MESSAGE.to_string(),
            contact_message: DEFAULT_CONTACT_MESSAGE.to_string(),
            summary_file: PathBuf::from("manual_summary.txt"),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmFileSection>,
    embedding: Option<EmbeddingFileSection>,
    retrieval: Option<RetrievalFileSection>,
    assistant: Option<AssistantFileSection>,
    logging: Option<LoggingFileSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LlmFileSection {
    provider: Option<String>,
    endpoint: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EmbeddingFileSection {
    provider: Option<String>,
    endpoint: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RetrievalFileSection {
    #[serde(rename = "topK")]
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AssistantFileSection {
    #[serde(rename = "maxRetries")]
    max_retries: Option<u32>,
    #[serde(rename = "historyWindow")]
    history_window: Option<usize>,
    #[serde(rename = "yesToken")]
    yes_token: Option<String>,
    #[serde(rename = "noToken")]
    no_token: Option<String>,
    #[serde(rename = "outOfScopeMessage")]
    out_of_scope_message: Option<String>,
    #[serde(rename = "contactMessage")]
    contact_message: Option<String>,
    #[serde(rename = "summaryFile")]
    summary_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingFileSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            retrieval: RetrievalSettings::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, config file, and environment variables.
    ///
    /// Environment variables:
    /// - `MANUALBOT_WORKSPACE`: Override workspace path
    /// - `MANUALBOT_CONFIG`: Path to config file
    /// - `MANUALBOT_PROVIDER`: LLM provider
    /// - `MANUALBOT_MODEL`: Model identifier
    /// - `MANUALBOT_ENDPOINT`: LLM endpoint URL
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("MANUALBOT_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("MANUALBOT_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".manualbot/config.yaml")
        };

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("MANUALBOT_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("MANUALBOT_MODEL") {
            config.llm.model = model;
        }

        if let Ok(endpoint) = std::env::var("MANUALBOT_ENDPOINT") {
            config.llm.endpoint = endpoint;
        }

        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(endpoint) = llm.endpoint {
                self.llm.endpoint = endpoint;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
        }

        if let Some(embedding) = file.embedding {
            if let Some(provider) = embedding.provider {
                self.embedding.provider = provider;
            }
            if let Some(endpoint) = embedding.endpoint {
                self.embedding.endpoint = endpoint;
            }
            if let Some(model) = embedding.model {
                self.embedding.model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                self.embedding.dimensions = dimensions;
            }
        }

        if let Some(retrieval) = file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                self.retrieval.top_k = top_k;
            }
        }

        if let Some(assistant) = file.assistant {
            if let Some(max_retries) = assistant.max_retries {
                self.assistant.max_retries = max_retries;
            }
            if let Some(history_window) = assistant.history_window {
                self.assistant.history_window = history_window;
            }
            if let Some(yes_token) = assistant.yes_token {
                self.assistant.yes_token = yes_token;
            }
            if let Some(no_token) = assistant.no_token {
                self.assistant.no_token = no_token;
            }
            if let Some(message) = assistant.out_of_scope_message {
                self.assistant.out_of_scope_message = message;
            }
            if let Some(message) = assistant.contact_message {
                self.assistant.contact_message = message;
            }
            if let Some(summary_file) = assistant.summary_file {
                self.assistant.summary_file = PathBuf::from(summary_file);
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .manualbot directory.
    pub fn manualbot_dir(&self) -> PathBuf {
        self.workspace.join(".manualbot")
    }

    /// Get the path to the section index database.
    pub fn index_path(&self) -> PathBuf {
        self.manualbot_dir().join("index.sqlite")
    }

    /// Get the absolute path to the scope summary file.
    pub fn summary_path(&self) -> PathBuf {
        if self.assistant.summary_file.is_absolute() {
            self.assistant.summary_file.clone()
        } else {
            self.workspace.join(&self.assistant.summary_file)
        }
    }

    /// Ensure the .manualbot directory exists.
    pub fn ensure_manualbot_dir(&self) -> AppResult<()> {
        let dir = self.manualbot_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .manualbot directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        let known_llm_providers = ["ollama"];
        if !known_llm_providers.contains(&self.llm.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown LLM provider: {}. Supported: {}",
                self.llm.provider,
                known_llm_providers.join(", ")
            )));
        }

        let known_embedding_providers = ["ollama", "trigram"];
        if !known_embedding_providers.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                known_embedding_providers.join(", ")
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.assistant.max_retries, 2);
        assert_eq!(config.assistant.yes_token, "yes");
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_manualbot_dir() {
        let config = AppConfig::default();
        assert!(config.manualbot_dir().ends_with(".manualbot"));
        assert!(config.index_path().ends_with(".manualbot/index.sqlite"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("mistral".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.llm.provider, "ollama");
        assert_eq!(overridden.llm.model, "mistral");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(
            &config_path,
            r#"
llm:
  model: mistral
retrieval:
  topK: 8
assistant:
  maxRetries: 3
  yesToken: "da"
  noToken: "net"
"#,
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.merge_yaml(&config_path).unwrap();

        assert_eq!(config.llm.model, "mistral");
        // Unset fields keep their defaults
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.assistant.max_retries, 3);
        assert_eq!(config.assistant.yes_token, "da");
        assert_eq!(config.assistant.no_token, "net");
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_defaults() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_summary_path_relative_to_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/tmp/ws");
        assert_eq!(
            config.summary_path(),
            PathBuf::from("/tmp/ws/manual_summary.txt")
        );
    }
}
