use serde::{Deserialize, Serialize};

// =============================================================================
// Embeddings
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingData {
    #[serde(default)]
    pub index: usize,
    pub embedding: Vec<f32>,
}

impl EmbeddingResponse {
    /// Vectors ordered by the provider's `index` field.
    ///
    /// Fails unless there is exactly one vector per requested input.
    pub fn into_ordered(mut self, expected: usize) -> Result<Vec<Vec<f32>>, String> {
        if self.data.len() != expected {
            return Err(format!(
                "expected {expected} embeddings, got {}",
                self.data.len()
            ));
        }
        self.data.sort_by_key(|d| d.index);
        if self.data.iter().enumerate().any(|(i, d)| d.index != i) {
            return Err("embedding indices are not a permutation of the inputs".to_string());
        }
        Ok(self.data.into_iter().map(|d| d.embedding).collect())
    }
}
