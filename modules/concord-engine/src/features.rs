//! Article feature extraction.
//!
//! Two interchangeable strategies selected by configuration: a keyword
//! classifier with no external dependency, and embedding vectors from the
//! embedding service.

use std::sync::Arc;

use tracing::{debug, info};

use concord_common::{Article, ClusteringConfig, ConcordError, StrategyKind};

use crate::embedder::TextEmbedder;

/// Title hits count this many times more than content hits.
const TITLE_WEIGHT: usize = 3;

/// Per-article signal produced by an extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleFeatures {
    /// Winning vocabulary term per article; `None` means no term matched.
    Topics {
        terms: Vec<String>,
        assignments: Vec<Option<usize>>,
    },
    /// One dense vector per article, all of the same dimension.
    Vectors(Vec<Vec<f64>>),
}

/// The active feature extraction strategy.
pub enum ArticleFeatureExtractor {
    Keyword(KeywordExtractor),
    Embedding(EmbeddingExtractor),
}

impl ArticleFeatureExtractor {
    /// Build the strategy named by `config.strategy`. The embedder is only
    /// needed (and only checked for) when the embedding strategy is selected.
    pub fn from_config(
        config: &ClusteringConfig,
        embedder: Option<Arc<dyn TextEmbedder>>,
    ) -> Result<Self, ConcordError> {
        match config.strategy {
            StrategyKind::Keyword => Ok(Self::Keyword(KeywordExtractor::new(
                config.vocabulary.clone(),
            ))),
            StrategyKind::Embedding => {
                let embedder = embedder.ok_or_else(|| {
                    ConcordError::Config("embedding strategy selected without an embedder".into())
                })?;
                Ok(Self::Embedding(EmbeddingExtractor::new(embedder)))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArticleFeatureExtractor::Keyword(_) => "keyword",
            ArticleFeatureExtractor::Embedding(_) => "embedding",
        }
    }

    pub async fn extract(&self, articles: &[Article]) -> Result<ArticleFeatures, ConcordError> {
        match self {
            ArticleFeatureExtractor::Keyword(k) => Ok(k.extract(articles)),
            ArticleFeatureExtractor::Embedding(e) => e.extract(articles).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Keyword strategy
// ---------------------------------------------------------------------------

/// Single-pass classifier over a fixed vocabulary. Deterministic.
pub struct KeywordExtractor {
    vocabulary: Vec<String>,
}

impl KeywordExtractor {
    pub fn new(vocabulary: Vec<String>) -> Self {
        Self { vocabulary }
    }

    /// `3 × title occurrences + content occurrences`, case-insensitive.
    pub fn score(term: &str, article: &Article) -> usize {
        let term = term.to_lowercase();
        TITLE_WEIGHT * count_occurrences(&article.title.to_lowercase(), &term)
            + count_occurrences(&article.content.to_lowercase(), &term)
    }

    /// Index of the best-scoring term. Ties keep the earlier term; all-zero
    /// scores yield `None`.
    pub fn classify(&self, article: &Article) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (i, term) in self.vocabulary.iter().enumerate() {
            let score = Self::score(term, article);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((i, score));
            }
        }
        best.map(|(i, _)| i)
    }

    pub fn extract(&self, articles: &[Article]) -> ArticleFeatures {
        ArticleFeatures::Topics {
            terms: self.vocabulary.clone(),
            assignments: articles.iter().map(|a| self.classify(a)).collect(),
        }
    }
}

/// Non-overlapping substring occurrences.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

// ---------------------------------------------------------------------------
// Embedding strategy
// ---------------------------------------------------------------------------

/// Feature vectors from the embedding service. Articles that already carry
/// a stored vector reuse it; the rest go out in a single batch call.
pub struct EmbeddingExtractor {
    embedder: Arc<dyn TextEmbedder>,
}

impl EmbeddingExtractor {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self { embedder }
    }

    pub async fn extract(&self, articles: &[Article]) -> Result<ArticleFeatures, ConcordError> {
        let missing: Vec<usize> = articles
            .iter()
            .enumerate()
            .filter(|(_, a)| a.embedding.as_ref().map_or(true, Vec::is_empty))
            .map(|(i, _)| i)
            .collect();

        let mut fresh = Vec::new();
        if !missing.is_empty() {
            let texts = missing.iter().map(|&i| articles[i].embedding_text()).collect();
            fresh = self
                .embedder
                .embed_batch(texts)
                .await
                .map_err(ConcordError::embedding)?;
            if fresh.len() != missing.len() {
                return Err(ConcordError::Embedding(format!(
                    "requested {} embeddings, received {}",
                    missing.len(),
                    fresh.len()
                )));
            }
            info!(
                embedded = missing.len(),
                reused = articles.len() - missing.len(),
                "Computed article embeddings"
            );
        }

        let mut fresh = fresh.into_iter();
        let mut vectors = Vec::with_capacity(articles.len());
        for article in articles {
            let vector = match &article.embedding {
                Some(stored) if !stored.is_empty() => stored.clone(),
                _ => fresh.next().unwrap_or_default(),
            };
            vectors.push(vector.into_iter().map(f64::from).collect::<Vec<f64>>());
        }

        let dim = vectors.first().map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().position(|v| v.len() != dim || v.is_empty()) {
            return Err(ConcordError::Embedding(format!(
                "article {} has a {}-dimensional vector, expected {dim}",
                articles[bad].id,
                vectors[bad].len()
            )));
        }
        debug!(articles = vectors.len(), dim, "Article vectors ready");

        Ok(ArticleFeatures::Vectors(vectors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{article, FixedEmbedder};

    fn vocabulary() -> Vec<String> {
        ["tech", "AI", "sport"].into_iter().map(String::from).collect()
    }

    #[test]
    fn title_hits_outweigh_content_hits() {
        let a = article("AI rules", "tech tech");
        assert_eq!(KeywordExtractor::score("AI", &a), 3);
        assert_eq!(KeywordExtractor::score("tech", &a), 2);
        assert_eq!(KeywordExtractor::new(vocabulary()).classify(&a), Some(1));
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let a = article("Sports roundup", "SPORTing news");
        assert_eq!(KeywordExtractor::score("sport", &a), 4);
    }

    #[test]
    fn ties_keep_earlier_term() {
        let a = article("tech and sport", "");
        assert_eq!(KeywordExtractor::new(vocabulary()).classify(&a), Some(0));
    }

    #[test]
    fn no_match_is_none() {
        let a = article("Weather report", "Clouds tomorrow");
        assert_eq!(KeywordExtractor::new(vocabulary()).classify(&a), None);
    }

    #[test]
    fn keyword_extraction_is_deterministic() {
        let articles = vec![
            article("AI breakthrough", "models"),
            article("Local sports team wins", "the final"),
            article("Weather", "sunny"),
        ];
        let extractor = KeywordExtractor::new(vocabulary());
        assert_eq!(extractor.extract(&articles), extractor.extract(&articles));
    }

    #[tokio::test]
    async fn reuses_stored_vectors() {
        let mut stored = article("Stored", "body");
        stored.embedding = Some(vec![0.5, 0.5]);
        let fresh = article("Fresh", "body");
        let embedder = Arc::new(FixedEmbedder::new(2).on_text("Fresh\nbody", vec![1.0, 0.0]));
        let extractor = EmbeddingExtractor::new(embedder.clone());

        let features = extractor.extract(&[stored, fresh]).await.unwrap();

        assert_eq!(
            features,
            ArticleFeatures::Vectors(vec![vec![0.5, 0.5], vec![1.0, 0.0]])
        );
        assert_eq!(embedder.calls(), vec![vec!["Fresh\nbody".to_string()]]);
    }

    #[tokio::test]
    async fn skips_service_when_all_vectors_stored() {
        let mut a = article("Stored", "body");
        a.embedding = Some(vec![1.0]);
        let embedder = Arc::new(FixedEmbedder::new(1));
        EmbeddingExtractor::new(embedder.clone())
            .extract(&[a])
            .await
            .unwrap();
        assert!(embedder.calls().is_empty());
    }

    #[tokio::test]
    async fn service_failure_is_embedding_error() {
        let embedder = Arc::new(FixedEmbedder::new(4).failing());
        let err = EmbeddingExtractor::new(embedder)
            .extract(&[article("A", "b")])
            .await
            .unwrap_err();
        assert!(matches!(err, ConcordError::Embedding(_)));
    }

    #[tokio::test]
    async fn mismatched_dimensions_are_rejected() {
        let mut stored = article("Stored", "body");
        stored.embedding = Some(vec![1.0, 0.0, 0.0]);
        let embedder = Arc::new(FixedEmbedder::new(4));
        let err = EmbeddingExtractor::new(embedder)
            .extract(&[stored, article("Fresh", "body")])
            .await
            .unwrap_err();
        assert!(matches!(err, ConcordError::Embedding(_)));
    }

    #[test]
    fn embedding_strategy_requires_embedder() {
        let config = ClusteringConfig {
            strategy: StrategyKind::Embedding,
            ..ClusteringConfig::default()
        };
        assert!(matches!(
            ArticleFeatureExtractor::from_config(&config, None),
            Err(ConcordError::Config(_))
        ));
        let keyword = ArticleFeatureExtractor::from_config(&ClusteringConfig::default(), None).unwrap();
        assert_eq!(keyword.name(), "keyword");
    }
}
