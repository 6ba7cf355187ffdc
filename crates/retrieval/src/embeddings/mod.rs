//! Embedding generation for manual sections.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
