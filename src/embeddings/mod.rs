//! Query embedding
//!
//! Turns query text into a fixed-dimension vector through an external
//! embedding service:
//! - OpenAI (`/embeddings`)
//! - Ollama (`/api/embeddings`)
//!
//! # Examples
//!
//! ```rust,no_run
//! use kbrag::config::AppConfig;
//! use kbrag::embeddings::EmbeddingClient;
//! use kbrag::embeddings::QueryEmbedder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let client = EmbeddingClient::from_config(&config)?;
//!
//!     let embedding = client.embed("What is the refund policy?").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;

use std::sync::Arc;

use async_trait::async_trait;

pub use cache::CachedEmbedder;
pub use client::EmbeddingClient;

use crate::config::AppConfig;
use crate::errors::Result;

/// Converts query text into an embedding vector
#[async_trait]
pub trait QueryEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Build the configured embedder, wrapped in a cache when one is enabled
pub fn create_query_embedder(config: &AppConfig) -> Result<Arc<dyn QueryEmbedder>> {
    let client = EmbeddingClient::from_config(config)?;
    let capacity = config.embeddings.cache_capacity;
    if capacity == 0 {
        return Ok(Arc::new(client));
    }
    Ok(Arc::new(CachedEmbedder::new(Arc::new(client), capacity)))
}
