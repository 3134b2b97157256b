// Dense text embeddings: trait-based abstraction for swappable providers.
//
// The EmbeddingProvider trait is the only thing the scoring engine sees.
// OnnxEmbedder runs all-MiniLM-L6-v2 locally, OpenAiEmbedder calls the
// OpenAI embeddings API, and HashingEmbedder is a deterministic offline
// stand-in used by tests and dry runs.

pub mod chunk;
pub mod download;
pub mod hashing;
pub mod onnx;
pub mod openai;
pub mod rate_limit;
pub mod traits;
pub mod vector;
