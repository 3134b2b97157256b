// Local sentence embeddings with all-MiniLM-L6-v2 via ONNX Runtime.
//
// Text is tokenized, run through the BERT encoder, and mean-pooled over the
// attention mask into a 384-dimensional vector. No API calls, no rate
// limits. The model's context window is small, so the tokenizer truncates at
// 256 tokens and the provider asks for ~1000-character chunks.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::debug;

use super::traits::EmbeddingProvider;

/// Embedding dimension for all-MiniLM-L6-v2.
pub const ONNX_EMBEDDING_DIM: usize = 384;

/// Token limit applied by the tokenizer.
const MAX_TOKENS: usize = 256;

/// Chunk budget that keeps typical English prose under `MAX_TOKENS`.
pub const ONNX_CHUNK_CHARS: usize = 1000;

const MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Sentence embedder backed by a local ONNX model.
///
/// The session sits behind a Mutex because inference needs `&mut Session`;
/// both halves are Arc'd so they can move into `spawn_blocking`.
pub struct OnnxEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    chunk_chars: usize,
}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    ///
    /// Run `biorank download-model` first if they don't exist.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        for path in [&model_path, &tokenizer_path] {
            if !path.exists() {
                anyhow::bail!(
                    "Embedding model file not found: {}\nRun `biorank download-model` to download it.",
                    path.display()
                );
            }
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load embedding model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure tokenizer truncation: {}", e))?;

        debug!(model_dir = %model_dir.display(), "Loaded ONNX embedding model");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            chunk_chars: ONNX_CHUNK_CHARS,
        })
    }

    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbedder {
    fn dimension(&self) -> usize {
        ONNX_EMBEDDING_DIM
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn chunk_chars(&self) -> usize {
        self.chunk_chars
    }

    /// CPU-bound inference runs on the blocking pool to keep the runtime free.
    async fn embed_chunks(&self, chunks: &[String]) -> Result<Vec<Vec<f64>>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let chunks = chunks.to_vec();

        tokio::task::spawn_blocking(move || infer(&session, &tokenizer, &chunks))
            .await
            .context("Embedding task panicked")?
    }
}

/// Padded model inputs for one batch, flattened row-major.
struct BatchInputs {
    batch_size: usize,
    seq_len: usize,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

/// Right-pad every encoding to the longest one (BERT pad id is 0).
fn pad_batch(encodings: &[Encoding]) -> BatchInputs {
    let batch_size = encodings.len();
    let seq_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
    let total = batch_size * seq_len;

    let mut inputs = BatchInputs {
        batch_size,
        seq_len,
        input_ids: Vec::with_capacity(total),
        attention_mask: Vec::with_capacity(total),
        token_type_ids: vec![0; total],
    };

    for enc in encodings {
        let pad = seq_len - enc.get_ids().len();
        inputs.input_ids.extend(enc.get_ids().iter().map(|&id| id as i64));
        inputs.input_ids.extend(std::iter::repeat_n(0i64, pad));
        inputs
            .attention_mask
            .extend(enc.get_attention_mask().iter().map(|&m| m as i64));
        inputs.attention_mask.extend(std::iter::repeat_n(0i64, pad));
    }

    inputs
}

/// Average token states over the attention mask, one vector per row.
///
/// `hidden` is `[batch, seq_len, dim]` flattened. Rows with an empty mask
/// come out as zero vectors.
fn mean_pool(hidden: &[f32], mask: &[i64], batch_size: usize, seq_len: usize, dim: usize) -> Vec<Vec<f64>> {
    (0..batch_size)
        .map(|row| {
            let mut sum = vec![0.0_f64; dim];
            let mut weight = 0.0_f64;

            for tok in 0..seq_len {
                let m = mask[row * seq_len + tok] as f64;
                if m <= 0.0 {
                    continue;
                }
                weight += m;
                let offset = (row * seq_len + tok) * dim;
                for (k, slot) in sum.iter_mut().enumerate() {
                    *slot += hidden[offset + k] as f64 * m;
                }
            }

            if weight > 0.0 {
                for slot in &mut sum {
                    *slot /= weight;
                }
            }
            sum
        })
        .collect()
}

/// Tokenize, run the encoder, and mean-pool. Called from spawn_blocking.
fn infer(session: &Mutex<Session>, tokenizer: &Tokenizer, texts: &[String]) -> Result<Vec<Vec<f64>>> {
    let encodings = texts
        .iter()
        .map(|t| {
            tokenizer
                .encode(t.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
        })
        .collect::<Result<Vec<_>>>()?;

    let batch = pad_batch(&encodings);
    if batch.seq_len == 0 {
        return Ok(vec![vec![0.0; ONNX_EMBEDDING_DIM]; batch.batch_size]);
    }

    let shape = [batch.batch_size as i64, batch.seq_len as i64];
    let input_ids = Tensor::from_array((shape, batch.input_ids))
        .context("Failed to create input_ids tensor")?;
    let attention_mask = Tensor::from_array((shape, batch.attention_mask.clone()))
        .context("Failed to create attention_mask tensor")?;
    let token_type_ids = Tensor::from_array((shape, batch.token_type_ids))
        .context("Failed to create token_type_ids tensor")?;

    // last_hidden_state: [batch, seq_len, 384]
    let hidden = {
        let mut session = session
            .lock()
            .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

        let outputs = session
            .run(ort::inputs! {
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids
            })
            .context("Embedding inference failed")?;

        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract embedding output tensor")?;
        data.to_vec()
    };

    let expected = batch.batch_size * batch.seq_len * ONNX_EMBEDDING_DIM;
    if hidden.len() != expected {
        anyhow::bail!(
            "Unexpected embedding output size {} (expected {})",
            hidden.len(),
            expected
        );
    }

    debug!(batch_size = batch.batch_size, seq_len = batch.seq_len, "Computed ONNX embeddings");

    Ok(mean_pool(
        &hidden,
        &batch.attention_mask,
        batch.batch_size,
        batch.seq_len,
        ONNX_EMBEDDING_DIM,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pool_ignores_masked_tokens() {
        // One row, three tokens, dim 2; the last token is padding.
        let hidden = [1.0_f32, 2.0, 3.0, 4.0, 100.0, 100.0];
        let mask = [1_i64, 1, 0];
        let pooled = mean_pool(&hidden, &mask, 1, 3, 2);
        assert_eq!(pooled, vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn test_mean_pool_empty_mask_is_zero() {
        let hidden = [5.0_f32, 5.0];
        let pooled = mean_pool(&hidden, &[0], 1, 1, 2);
        assert_eq!(pooled, vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn test_mean_pool_multiple_rows() {
        // Two rows, two tokens, dim 1.
        let hidden = [1.0_f32, 3.0, 10.0, 0.0];
        let mask = [1_i64, 1, 1, 0];
        let pooled = mean_pool(&hidden, &mask, 2, 2, 1);
        assert_eq!(pooled, vec![vec![2.0], vec![10.0]]);
    }

    #[test]
    fn test_load_missing_dir_fails() {
        let dir = std::env::temp_dir().join("biorank-test-no-model");
        let err = OnnxEmbedder::load(&dir).err().expect("load should fail");
        assert!(err.to_string().contains("download-model"));
    }
}
