use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// TOML-backed engine configuration.
/// Secrets (API keys, DB URL) stay as env vars. Every field has a default,
/// so an absent file behaves like an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub consensus: ConsensusConfig,
    pub clustering: ClusteringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsensusConfig {
    /// Upper bound on the number of voter segments.
    pub max_clusters: usize,
    /// Fixed k-means seed. Unset means a fresh OS-seeded RNG per run.
    pub seed: Option<u64>,
    pub max_iterations: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            max_clusters: 3,
            seed: None,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Keyword,
    Embedding,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusteringConfig {
    pub strategy: StrategyKind,
    /// Upper bound on the number of embedding clusters.
    pub max_clusters: usize,
    pub seed: Option<u64>,
    pub max_iterations: usize,
    /// Topic terms for the keyword strategy, in priority order.
    pub vocabulary: Vec<String>,
    pub embedding_model: String,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Keyword,
            max_clusters: 5,
            seed: None,
            max_iterations: 100,
            vocabulary: ["tech", "AI", "economy", "sport", "politics", "health"]
                .into_iter()
                .map(String::from)
                .collect(),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

impl FileConfig {
    fn validate(&self) -> Result<()> {
        if self.consensus.max_clusters == 0 {
            anyhow::bail!("consensus.max_clusters must be at least 1");
        }
        if self.clustering.max_clusters == 0 {
            anyhow::bail!("clustering.max_clusters must be at least 1");
        }
        if self.clustering.vocabulary.iter().any(|t| t.trim().is_empty()) {
            anyhow::bail!("clustering.vocabulary must not contain empty terms");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.consensus.max_clusters, 3);
        assert_eq!(config.clustering.max_clusters, 5);
        assert_eq!(config.clustering.strategy, StrategyKind::Keyword);
        assert_eq!(config.clustering.vocabulary.len(), 6);
        assert!(config.consensus.seed.is_none());
    }

    #[test]
    fn parses_embedding_strategy() {
        let config = parse_config(
            r#"
            [consensus]
            seed = 7

            [clustering]
            strategy = "embedding"
            max_clusters = 8
            embedding_model = "text-embedding-3-large"
            "#,
        )
        .unwrap();
        assert_eq!(config.consensus.seed, Some(7));
        assert_eq!(config.clustering.strategy, StrategyKind::Embedding);
        assert_eq!(config.clustering.max_clusters, 8);
        assert_eq!(config.clustering.embedding_model, "text-embedding-3-large");
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(parse_config("[clustering]\nthreshold = 0.5\n").is_err());
    }

    #[test]
    fn rejects_zero_cluster_cap() {
        assert!(parse_config("[consensus]\nmax_clusters = 0\n").is_err());
    }
}
