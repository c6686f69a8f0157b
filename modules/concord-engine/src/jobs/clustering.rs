use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use concord_common::{ClusteringConfig, ConcordError, DataStore, JobSummary};

use crate::features::ArticleFeatureExtractor;
use crate::materialize::ClusterMaterializer;
use crate::partition::partition_articles;

/// Groups the unclustered article backlog into new story clusters.
///
/// Selection is always "currently unclustered", so a run that fails part
/// way through only leaves the remaining articles for the next run.
pub struct ClusteringJob {
    store: Arc<dyn DataStore>,
    extractor: ArticleFeatureExtractor,
    config: ClusteringConfig,
}

impl ClusteringJob {
    pub fn new(
        store: Arc<dyn DataStore>,
        extractor: ArticleFeatureExtractor,
        config: ClusteringConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            config,
        }
    }

    pub async fn run(&self) -> Result<JobSummary, ConcordError> {
        info!(strategy = self.extractor.name(), "ClusteringJob.start");

        let mut articles = self
            .store
            .fetch_unclustered_articles()
            .await
            .map_err(ConcordError::store)?;
        articles.retain(|a| a.story_cluster_id.is_none());

        if articles.is_empty() {
            info!("No unclustered articles found");
            return Ok(JobSummary::empty());
        }
        info!(articles = articles.len(), "Found unclustered articles");

        let mut seen = HashSet::with_capacity(articles.len());
        if let Some(dup) = articles.iter().find(|a| !seen.insert(a.id)) {
            return Err(ConcordError::Validation(format!(
                "article {} selected more than once",
                dup.id
            )));
        }

        let features = self.extractor.extract(&articles).await?;
        let groups = partition_articles(features, &articles, &self.config);
        info!(groups = groups.len(), "Articles partitioned");

        let stats = ClusterMaterializer::new(self.store.as_ref())
            .materialize(&groups, &articles)
            .await?;

        info!(
            articles = articles.len(),
            clusters_created = stats.clusters_created,
            groups_skipped = stats.groups_skipped,
            "Clustering complete"
        );

        Ok(JobSummary {
            processed_count: articles.len(),
            group_count: stats.clusters_created,
        })
    }
}
