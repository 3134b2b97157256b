// Embedding provider trait: the swap-ready abstraction.
//
// Scoring only ever talks to `dyn EmbeddingProvider`, so a local ONNX model,
// a remote API, or a deterministic test stub can be swapped in without
// touching the engine. Implementations only embed ready-made chunks; the
// shared `embed` method handles missing text, chunking, and mean pooling.

use anyhow::Result;
use async_trait::async_trait;

use super::chunk::{chunk_text, DEFAULT_CHUNK_CHARS};
use super::vector::mean_embedding;

/// Trait for turning text into fixed-dimension dense vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Identifier of the underlying model, for logs and run metadata.
    fn model_name(&self) -> &str;

    /// Maximum chunk length in characters accepted by `embed_chunks`.
    fn chunk_chars(&self) -> usize {
        DEFAULT_CHUNK_CHARS
    }

    /// Embed each chunk independently, returning vectors in input order.
    async fn embed_chunks(&self, chunks: &[String]) -> Result<Vec<Vec<f64>>>;

    /// Embed arbitrary-length text into a single vector.
    ///
    /// Missing or blank text yields the zero vector without calling the
    /// model. Otherwise newlines become spaces, the text is split into
    /// word-bounded chunks, and the chunk vectors are averaged.
    async fn embed(&self, text: Option<&str>) -> Result<Vec<f64>> {
        let dim = self.dimension();
        let text = match text {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Ok(vec![0.0; dim]),
        };

        let flattened = text.replace(['\r', '\n'], " ");
        let chunks = chunk_text(&flattened, self.chunk_chars());
        let vectors = self.embed_chunks(&chunks).await?;

        if vectors.len() != chunks.len() {
            anyhow::bail!(
                "{} returned {} vectors for {} chunks",
                self.model_name(),
                vectors.len(),
                chunks.len()
            );
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            anyhow::bail!(
                "{} returned a {}-dim vector, expected {}",
                self.model_name(),
                bad.len(),
                dim
            );
        }

        Ok(mean_embedding(&vectors, dim))
    }
}
