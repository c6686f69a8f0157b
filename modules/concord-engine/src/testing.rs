// Test doubles for the engine's two collaborator traits.
//
// - MockStore (DataStore) - stateful in-memory store with write recording
//   and fault injection
// - FixedEmbedder (TextEmbedder) - deterministic hash-based vectors
//
// Plus builders for articles, comments and votes.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use concord_common::{Article, Comment, DataStore, StoryCluster, Vote};

use crate::embedder::TextEmbedder;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// An unclustered article with a fresh id.
pub fn article(title: &str, content: &str) -> Article {
    Article {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: content.to_string(),
        published_at: Utc::now(),
        source: "Test Wire".to_string(),
        embedding: None,
        story_cluster_id: None,
    }
}

/// Comments for `story_id` built from a voter × comment grid.
/// A cell of 0 means "no vote"; returns the comments and the voter ids.
pub fn comments_from_grid(story_id: Uuid, grid: &[Vec<i16>]) -> (Vec<Comment>, Vec<Uuid>) {
    let width = grid.first().map_or(0, Vec::len);
    let voters: Vec<Uuid> = (0..grid.len()).map(|_| Uuid::new_v4()).collect();
    let comments = (0..width)
        .map(|col| {
            let id = Uuid::new_v4();
            let votes = grid
                .iter()
                .zip(&voters)
                .filter(|(row, _)| row[col] != 0)
                .map(|(row, &user_id)| Vote {
                    user_id,
                    comment_id: id,
                    value: row[col],
                })
                .collect();
            Comment {
                id,
                story_id,
                votes,
            }
        })
        .collect();
    (comments, voters)
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockStoreInner {
    articles: Vec<Article>,
    clusters: Vec<StoryCluster>,
    comments: HashMap<Uuid, Vec<Comment>>,
    consensus: HashMap<Uuid, (f64, String)>,
    writes: Vec<String>,
    fail_fetches: bool,
    fail_article_updates: bool,
    fail_consensus_after: Option<usize>,
    consensus_writes: usize,
    transactional: bool,
}

/// Stateful in-memory store. Thread-safe via interior Mutex.
///
/// By default `materialize_group` performs the two sequential writes of the
/// trait's default; `.transactional()` switches to claim-or-skip semantics
/// like the Postgres store.
pub struct MockStore {
    inner: Mutex<MockStoreInner>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockStoreInner::default()),
        }
    }

    pub fn with_articles(self, articles: Vec<Article>) -> Self {
        self.inner.lock().unwrap().articles.extend(articles);
        self
    }

    pub fn with_comments(self, story_id: Uuid, comments: Vec<Comment>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .comments
            .entry(story_id)
            .or_default()
            .extend(comments);
        self
    }

    /// Make every fetch return an error.
    pub fn failing_fetches(self) -> Self {
        self.inner.lock().unwrap().fail_fetches = true;
        self
    }

    /// Make `update_articles_cluster` return an error.
    pub fn failing_article_updates(self) -> Self {
        self.inner.lock().unwrap().fail_article_updates = true;
        self
    }

    /// Let `n` consensus updates succeed, then fail every later one.
    pub fn failing_consensus_updates_after(self, n: usize) -> Self {
        self.inner.lock().unwrap().fail_consensus_after = Some(n);
        self
    }

    pub fn transactional(self) -> Self {
        self.inner.lock().unwrap().transactional = true;
        self
    }

    /// Clear injected faults, e.g. to simulate a recovered dependency.
    pub fn heal(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_fetches = false;
        inner.fail_article_updates = false;
        inner.fail_consensus_after = None;
    }

    pub fn clusters(&self) -> Vec<StoryCluster> {
        self.inner.lock().unwrap().clusters.clone()
    }

    pub fn cluster_of(&self, article_id: Uuid) -> Option<Uuid> {
        self.inner
            .lock()
            .unwrap()
            .articles
            .iter()
            .find(|a| a.id == article_id)
            .and_then(|a| a.story_cluster_id)
    }

    pub fn unclustered_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .articles
            .iter()
            .filter(|a| a.story_cluster_id.is_none())
            .count()
    }

    pub fn consensus_for(&self, comment_id: Uuid) -> Option<(f64, String)> {
        self.inner.lock().unwrap().consensus.get(&comment_id).cloned()
    }

    /// Names of write calls, in call order.
    pub fn writes(&self) -> Vec<String> {
        self.inner.lock().unwrap().writes.clone()
    }
}

impl MockStoreInner {
    fn create_cluster(&mut self, title: &str, summary: Option<&str>) -> Uuid {
        self.writes.push("create_story_cluster".to_string());
        let cluster = StoryCluster {
            id: Uuid::new_v4(),
            title: title.to_string(),
            summary: summary.map(str::to_string),
            created_at: Utc::now(),
        };
        let id = cluster.id;
        self.clusters.push(cluster);
        id
    }

    fn assign(&mut self, article_ids: &[Uuid], cluster_id: Uuid) -> Result<u64> {
        self.writes.push("update_articles_cluster".to_string());
        if self.fail_article_updates {
            bail!("mock: article update failed");
        }
        let mut assigned = 0;
        for article in self.articles.iter_mut() {
            if article.story_cluster_id.is_none() && article_ids.contains(&article.id) {
                article.story_cluster_id = Some(cluster_id);
                assigned += 1;
            }
        }
        Ok(assigned)
    }
}

#[async_trait]
impl DataStore for MockStore {
    async fn fetch_unclustered_articles(&self) -> Result<Vec<Article>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_fetches {
            bail!("mock: fetch failed");
        }
        Ok(inner
            .articles
            .iter()
            .filter(|a| a.story_cluster_id.is_none())
            .cloned()
            .collect())
    }

    async fn create_story_cluster(&self, title: &str, summary: Option<&str>) -> Result<Uuid> {
        Ok(self.inner.lock().unwrap().create_cluster(title, summary))
    }

    async fn update_articles_cluster(&self, article_ids: &[Uuid], cluster_id: Uuid) -> Result<u64> {
        self.inner.lock().unwrap().assign(article_ids, cluster_id)
    }

    async fn materialize_group(
        &self,
        title: &str,
        summary: Option<&str>,
        article_ids: &[Uuid],
    ) -> Result<Option<Uuid>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.transactional {
            let claimable = inner
                .articles
                .iter()
                .any(|a| a.story_cluster_id.is_none() && article_ids.contains(&a.id));
            if !claimable {
                return Ok(None);
            }
            if inner.fail_article_updates {
                bail!("mock: transaction rolled back");
            }
        }
        let cluster_id = inner.create_cluster(title, summary);
        inner.assign(article_ids, cluster_id)?;
        Ok(Some(cluster_id))
    }

    async fn fetch_comments_with_votes(&self, story_id: Uuid) -> Result<Vec<Comment>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_fetches {
            bail!("mock: fetch failed");
        }
        Ok(inner.comments.get(&story_id).cloned().unwrap_or_default())
    }

    async fn update_comment_consensus(&self, comment_id: Uuid, score: f64, label: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.writes.push("update_comment_consensus".to_string());
        if let Some(limit) = inner.fail_consensus_after {
            if inner.consensus_writes >= limit {
                bail!("mock: consensus update failed");
            }
        }
        inner.consensus_writes += 1;
        inner.consensus.insert(comment_id, (score, label.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FixedEmbedder
// ---------------------------------------------------------------------------

/// Deterministic embedder for testing. Registered texts get exact vectors;
/// unmatched texts get a unique hash-based unit vector.
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
    fail: bool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FixedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            dimension,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Register a text→vector mapping for controlled similarity.
    pub fn on_text(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    /// Make every batch call return an error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Inputs of every batch call received so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn hash_vector(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut vec = vec![0.0f32; self.dimension];
        for v in vec.iter_mut() {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            *v = ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0;
        }
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vec.iter_mut() {
                *v /= norm;
            }
        }
        vec
    }
}

#[async_trait]
impl TextEmbedder for FixedEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.calls.lock().unwrap().push(texts.clone());
        if self.fail {
            bail!("mock: embedding service unavailable");
        }
        Ok(texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(t.as_str())
                    .cloned()
                    .unwrap_or_else(|| self.hash_vector(t))
            })
            .collect())
    }
}
