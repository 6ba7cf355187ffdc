//! LLM provider factory.
//!
//! This module provides a factory for creating LLM clients based on
//! application configuration.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use manualbot_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier (currently "ollama")
/// * `endpoint` - Optional custom endpoint URL
///
/// # Returns
/// An `Arc`-wrapped trait object implementing `LlmClient`
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown.
pub fn create_client(provider: &str, endpoint: Option<&str>) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let client = OllamaClient::with_base_url(base_url);
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!(
            "Unknown LLM provider: {}",
            provider
        ))),
    }
}
