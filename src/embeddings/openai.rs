// OpenAI embeddings API implementation.
//
// Posts chunks to `{base_url}/v1/embeddings` and returns one vector per
// chunk. Request starts are paced by a shared RateLimiter and transient
// failures (429, 5xx, timeouts) are retried with backoff. Any OpenAI-compatible
// endpoint works by pointing `base_url` elsewhere.
//
// API docs: https://platform.openai.com/docs/api-reference/embeddings

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::chunk::DEFAULT_CHUNK_CHARS;
use super::rate_limit::{with_retry, ApiStatusError, RateLimiter, RetryPolicy};
use super::traits::EmbeddingProvider;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-ada-002";
/// Output dimension of `text-embedding-ada-002`.
pub const DEFAULT_OPENAI_DIM: usize = 1536;

/// Connection settings for [`OpenAiEmbedder`].
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    pub requests_per_second: f64,
    pub chunk_chars: usize,
}

impl OpenAiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            dimension: DEFAULT_OPENAI_DIM,
            requests_per_second: 5.0,
            chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }
}

/// Remote embedder backed by the OpenAI embeddings endpoint.
pub struct OpenAiEmbedder {
    client: Client,
    settings: OpenAiSettings,
    rate_limiter: RateLimiter,
    retry: RetryPolicy,
}

impl OpenAiEmbedder {
    pub fn new(settings: OpenAiSettings) -> Result<Self> {
        if settings.api_key.is_empty() {
            anyhow::bail!("OpenAI API key is empty");
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;
        let rate_limiter = RateLimiter::new(settings.requests_per_second);

        Ok(Self {
            client,
            settings,
            rate_limiter,
            retry: RetryPolicy::default(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/embeddings",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    async fn request(&self, chunks: &[String]) -> Result<Vec<Vec<f64>>> {
        let request = EmbeddingRequest {
            model: &self.settings.model,
            input: chunks,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to call OpenAI embeddings API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::Error::new(ApiStatusError { status, body }))
                .context("OpenAI embeddings request rejected");
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI embeddings response")?;

        order_by_index(parsed.data, chunks.len())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn dimension(&self) -> usize {
        self.settings.dimension
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }

    fn chunk_chars(&self) -> usize {
        self.settings.chunk_chars
    }

    async fn embed_chunks(&self, chunks: &[String]) -> Result<Vec<Vec<f64>>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = with_retry(&self.rate_limiter, self.retry, || self.request(chunks)).await?;

        debug!(
            chunks = chunks.len(),
            model = %self.settings.model,
            "Embedded chunks via OpenAI"
        );
        Ok(vectors)
    }
}

/// Put response vectors back in request order and check nothing is missing.
fn order_by_index(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f64>>> {
    data.sort_by_key(|d| d.index);
    let in_order = data.iter().enumerate().all(|(i, d)| d.index == i);
    if data.len() != expected || !in_order {
        anyhow::bail!(
            "OpenAI returned {} embeddings for {} inputs",
            data.len(),
            expected
        );
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

// --- OpenAI API request/response types ---

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f64>,
}
