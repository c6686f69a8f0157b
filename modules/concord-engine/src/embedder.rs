use ai_client::{truncate_to_char_boundary, EmbedAgent, OpenAi};
use anyhow::Result;

/// Longest input sent to the provider per article, in bytes.
const MAX_EMBED_INPUT_BYTES: usize = 24_000;

// --- TextEmbedder trait ---

/// Embedding service contract: one vector per input text, in input order.
#[async_trait::async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// OpenAI-compatible embeddings (`/embeddings`).
pub struct Embedder {
    client: OpenAi,
}

impl Embedder {
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        let mut client = OpenAi::new(api_key).with_embedding_model(model);
        if let Some(url) = base_url {
            client = client.with_base_url(url);
        }
        Self { client }
    }

    pub fn model(&self) -> &str {
        self.client.embedding_model()
    }
}

#[async_trait::async_trait]
impl TextEmbedder for Embedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let texts = texts
            .into_iter()
            .map(|t| truncate_to_char_boundary(&t, MAX_EMBED_INPUT_BYTES).to_string())
            .collect();
        self.client.embed_batch(texts).await
    }
}
