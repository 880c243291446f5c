//! Text embedding clients.

use anyhow::{anyhow, Result};

pub mod openai;
pub mod qdrant;

pub use openai::OpenAiEmbedder;
pub use qdrant::QdrantEmbedder;

/// Maps text to a fixed-length vector.
///
/// Implementations are constructed once and shared read-only across
/// requests, so they must be safe to call concurrently.
pub trait Embedder: Send + Sync {
    /// Embeds a single piece of text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

pub(crate) fn single(mut embeddings: Vec<Vec<f32>>, service: &str) -> Result<Vec<f32>> {
    anyhow::ensure!(
        embeddings.len() <= 1,
        "{service} returned {} embeddings for one input",
        embeddings.len()
    );
    let vector = embeddings
        .pop()
        .ok_or_else(|| anyhow!("{service} returned no embedding"))?;
    anyhow::ensure!(!vector.is_empty(), "{service} returned an empty embedding");
    Ok(vector)
}
