// Deterministic feature-hashing embedder.
//
// Not a neural model: every normalized token is hashed with blake3 into one
// of `dim` signed buckets and the result is L2-normalized. Texts sharing
// vocabulary land close together, texts sharing none are near-orthogonal.
// Runs offline with no model files, and gives bit-identical vectors across
// runs, which is what the test suite and dry runs need.

use anyhow::Result;
use async_trait::async_trait;

use super::chunk::DEFAULT_CHUNK_CHARS;
use super::traits::EmbeddingProvider;
use crate::text::normalize::normalize;

/// Default dimension, matching the local MiniLM model.
pub const DEFAULT_HASHING_DIM: usize = 384;

/// Offline embedder based on signed feature hashing of tokens.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
    chunk_chars: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }

    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }

    /// Embed one piece of text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f64> {
        let mut vec = vec![0.0_f64; self.dim];
        if self.dim == 0 {
            return vec;
        }

        for token in normalize(text).split_whitespace() {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();

            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&bytes[..8]);
            let idx = (u64::from_le_bytes(bucket_bytes) % self.dim as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vec[idx] += sign;
        }

        let norm = vec.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for x in &mut vec {
                *x /= norm;
            }
        }
        vec
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIM)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        "feature-hashing"
    }

    fn chunk_chars(&self) -> usize {
        self.chunk_chars
    }

    async fn embed_chunks(&self, chunks: &[String]) -> Result<Vec<Vec<f64>>> {
        Ok(chunks.iter().map(|c| self.embed_text(c)).collect())
    }
}
