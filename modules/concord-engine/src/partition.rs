//! Turns extracted features into article groups ready to materialize.

use tracing::debug;

use concord_common::{Article, ClusteringConfig};

use crate::features::ArticleFeatures;
use crate::kmeans::KMeans;

/// Group key for articles no vocabulary term matched.
pub const OTHER_GROUP: &str = "other";

/// A non-empty set of articles (indices into the selected batch) that will
/// become one story cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleGroup {
    pub key: String,
    pub title: String,
    pub summary: Option<String>,
    pub members: Vec<usize>,
}

/// Partition the batch. Empty groups are dropped; every article lands in
/// exactly one returned group.
pub fn partition_articles(
    features: ArticleFeatures,
    articles: &[Article],
    config: &ClusteringConfig,
) -> Vec<ArticleGroup> {
    match features {
        ArticleFeatures::Topics { terms, assignments } => keyword_groups(&terms, &assignments),
        ArticleFeatures::Vectors(vectors) => vector_groups(&vectors, articles, config),
    }
}

/// Groups come out in vocabulary order, with `other` last.
fn keyword_groups(terms: &[String], assignments: &[Option<usize>]) -> Vec<ArticleGroup> {
    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); terms.len() + 1];
    for (article, term) in assignments.iter().enumerate() {
        buckets[term.unwrap_or(terms.len())].push(article);
    }

    buckets
        .into_iter()
        .enumerate()
        .filter(|(_, members)| !members.is_empty())
        .map(|(i, members)| {
            let key = terms.get(i).map_or(OTHER_GROUP, String::as_str).to_string();
            ArticleGroup {
                title: format!("{} News", capitalize(&key)),
                summary: Some(format!(
                    "A collection of {} articles about {key}",
                    members.len()
                )),
                key,
                members,
            }
        })
        .collect()
}

/// k-means with `k = min(max_clusters, articles)`. Each group is titled
/// after its first member article.
fn vector_groups(vectors: &[Vec<f64>], articles: &[Article], config: &ClusteringConfig) -> Vec<ArticleGroup> {
    let k = config.max_clusters.max(1).min(vectors.len());
    let partition = KMeans::new(k)
        .with_seed(config.seed)
        .with_max_iterations(config.max_iterations)
        .fit(vectors);
    debug!(articles = vectors.len(), k, iterations = partition.iterations, "Articles partitioned");

    partition
        .members()
        .into_iter()
        .enumerate()
        .filter(|(_, members)| !members.is_empty())
        .map(|(cluster, members)| ArticleGroup {
            key: format!("cluster-{cluster}"),
            title: articles[members[0]].title.clone(),
            summary: None,
            members,
        })
        .collect()
}

fn capitalize(term: &str) -> String {
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
