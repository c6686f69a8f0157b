use tracing::{info, warn};
use uuid::Uuid;

use concord_common::{Article, ConcordError, DataStore};

use crate::partition::ArticleGroup;

/// Counts from one materialization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeStats {
    pub clusters_created: usize,
    pub groups_skipped: usize,
    pub articles_assigned: usize,
}

/// Persists article groups as story clusters, one group at a time.
///
/// Fails fast: the first store error aborts the pass. Groups written before
/// the failure stay written, and their articles drop out of the next run's
/// selection.
pub struct ClusterMaterializer<'a> {
    store: &'a dyn DataStore,
}

impl<'a> ClusterMaterializer<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    pub async fn materialize(
        &self,
        groups: &[ArticleGroup],
        articles: &[Article],
    ) -> Result<MaterializeStats, ConcordError> {
        let mut stats = MaterializeStats::default();

        for group in groups {
            if group.members.is_empty() {
                continue;
            }
            let article_ids: Vec<Uuid> = group.members.iter().map(|&i| articles[i].id).collect();

            let created = self
                .store
                .materialize_group(&group.title, group.summary.as_deref(), &article_ids)
                .await
                .map_err(ConcordError::store)?;

            match created {
                Some(cluster_id) => {
                    stats.clusters_created += 1;
                    stats.articles_assigned += article_ids.len();
                    info!(
                        group = group.key.as_str(),
                        articles = article_ids.len(),
                        %cluster_id,
                        "Group assigned to story cluster"
                    );
                }
                None => {
                    stats.groups_skipped += 1;
                    warn!(
                        group = group.key.as_str(),
                        articles = article_ids.len(),
                        "Group members already clustered, skipping"
                    );
                }
            }
        }

        Ok(stats)
    }
}
