use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// EmbedAgent Trait
// =============================================================================

/// A provider that turns text into dense vectors.
///
/// `embed_batch` returns exactly one vector per input, in input order.
#[async_trait]
pub trait EmbedAgent: Send + Sync {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}
