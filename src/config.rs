use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::embeddings::chunk::DEFAULT_CHUNK_CHARS;
use crate::embeddings::openai::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_DIM, DEFAULT_OPENAI_MODEL};

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderBackend {
    /// Local ONNX MiniLM model (default); no API key, no rate limits
    Onnx,
    /// OpenAI embeddings API; requires OPENAI_API_KEY
    OpenAi,
    /// Deterministic feature hashing; offline, no model files
    Hashing,
}

impl EmbedderBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            EmbedderBackend::Onnx => "onnx",
            EmbedderBackend::OpenAi => "openai",
            EmbedderBackend::Hashing => "hashing",
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// Secrets come from env vars (never hardcoded). The .env file is loaded
/// automatically at startup via dotenvy. Taxonomies and weights are not
/// here; they live in the run config JSON.
pub struct Config {
    /// Which embedder to use (default: Onnx)
    pub embedder: EmbedderBackend,
    /// Base directory for model files
    pub model_dir: PathBuf,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    /// Vector length returned by the OpenAI model (1536 for ada-002)
    pub embedding_dim: usize,
    pub openai_rps: f64,
    /// Chunk budget override in characters; `None` keeps the backend's default
    pub chunk_chars: Option<usize>,
    /// Where result files are written
    pub output_dir: PathBuf,
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{name}={raw} is invalid: {e}")),
        _ => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default; `require_embedder` checks the chosen
    /// backend has what it needs.
    pub fn load() -> Result<Self> {
        let embedder = match env::var("BIORANK_EMBEDDER").as_deref() {
            Ok("openai") => EmbedderBackend::OpenAi,
            Ok("hashing") => EmbedderBackend::Hashing,
            Ok("onnx") | Ok("") | Err(_) => EmbedderBackend::Onnx,
            Ok(other) => anyhow::bail!(
                "BIORANK_EMBEDDER={other} is not supported (expected onnx, openai, or hashing)"
            ),
        };

        let model_dir = env::var("BIORANK_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::embeddings::download::default_model_dir());

        Ok(Self {
            embedder,
            model_dir,
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: env::var("BIORANK_OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            embedding_dim: parse_var("BIORANK_EMBEDDING_DIM")
                .context("Invalid embedding dimension")?
                .unwrap_or(DEFAULT_OPENAI_DIM),
            openai_rps: parse_var("BIORANK_OPENAI_RPS")
                .context("Invalid OpenAI rate")?
                .unwrap_or(5.0),
            chunk_chars: parse_var("BIORANK_CHUNK_CHARS").context("Invalid chunk size")?,
            output_dir: env::var("BIORANK_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./output")),
        })
    }

    /// Chunk budget for the OpenAI backend.
    pub fn openai_chunk_chars(&self) -> usize {
        self.chunk_chars.unwrap_or(DEFAULT_CHUNK_CHARS)
    }

    /// Check that the OpenAI API key is configured.
    pub fn require_openai(&self) -> Result<()> {
        if self.openai_api_key.is_empty() {
            anyhow::bail!(
                "OPENAI_API_KEY not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Validate that the chosen embedder backend has what it needs.
    /// For ONNX: model files must exist (or user should run download-model).
    /// For OpenAI: API key must be set.
    pub fn require_embedder(&self) -> Result<()> {
        if self.chunk_chars == Some(0) {
            anyhow::bail!("BIORANK_CHUNK_CHARS must be at least 1");
        }
        match self.embedder {
            EmbedderBackend::Onnx => {
                if !crate::embeddings::download::embedding_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "Embedding model files not found in {}\n\
                         Run `biorank download-model` to download them.\n\
                         Or set BIORANK_EMBEDDER=openai to use the OpenAI API instead.",
                        self.model_dir.display()
                    );
                }
                Ok(())
            }
            EmbedderBackend::OpenAi => {
                self.require_openai()?;
                if self.embedding_dim == 0 {
                    anyhow::bail!("BIORANK_EMBEDDING_DIM must be at least 1");
                }
                Ok(())
            }
            EmbedderBackend::Hashing => Ok(()),
        }
    }
}
