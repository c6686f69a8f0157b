// Data Store contract consumed by both jobs.
//
// The engine only reads and writes through this trait, so the jobs can run
// against Postgres in production and against in-memory fakes in tests.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{Article, Comment};

#[async_trait]
pub trait DataStore: Send + Sync {
    // --- Article clustering ---

    /// Every article whose story cluster is still unassigned.
    async fn fetch_unclustered_articles(&self) -> Result<Vec<Article>>;

    /// Insert a new story cluster and return its id.
    async fn create_story_cluster(&self, title: &str, summary: Option<&str>) -> Result<Uuid>;

    /// Point the given articles at `cluster_id`. Articles that already belong
    /// to a cluster are left untouched. Returns the number of rows assigned.
    async fn update_articles_cluster(&self, article_ids: &[Uuid], cluster_id: Uuid) -> Result<u64>;

    /// Create a cluster for `article_ids` and assign them to it.
    ///
    /// The default is two sequential writes: a failure between them leaves an
    /// empty cluster behind and the articles eligible for the next run.
    /// Stores that can do better (a single transaction that skips groups whose
    /// members were already claimed) override this. `None` means nothing was
    /// created because no listed article was still unclustered.
    async fn materialize_group(
        &self,
        title: &str,
        summary: Option<&str>,
        article_ids: &[Uuid],
    ) -> Result<Option<Uuid>> {
        let cluster_id = self.create_story_cluster(title, summary).await?;
        self.update_articles_cluster(article_ids, cluster_id).await?;
        Ok(Some(cluster_id))
    }

    // --- Consensus scoring ---

    /// All comments on a story, each with its embedded vote list.
    async fn fetch_comments_with_votes(&self, story_id: Uuid) -> Result<Vec<Comment>>;

    /// Overwrite a comment's consensus score and cluster label.
    async fn update_comment_consensus(&self, comment_id: Uuid, score: f64, label: &str) -> Result<()>;
}
