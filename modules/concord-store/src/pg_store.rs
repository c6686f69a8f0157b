use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use concord_common::{Article, Comment, DataStore, Vote};

/// Postgres-backed Data Store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: Uuid,
    title: String,
    content: String,
    published_at: DateTime<Utc>,
    source: String,
    embedding: Option<Vec<f32>>,
    story_cluster_id: Option<Uuid>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            title: row.title,
            content: row.content,
            published_at: row.published_at,
            source: row.source,
            embedding: row.embedding,
            story_cluster_id: row.story_cluster_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VoteRow {
    user_id: Uuid,
    comment_id: Uuid,
    value: i16,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to Postgres")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DataStore for PgStore {
    async fn fetch_unclustered_articles(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, content, published_at, source, embedding, story_cluster_id
            FROM articles
            WHERE story_cluster_id IS NULL
            ORDER BY published_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("fetch_unclustered_articles")?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn create_story_cluster(&self, title: &str, summary: Option<&str>) -> Result<Uuid> {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO story_clusters (title, summary) VALUES ($1, $2) RETURNING id",
        )
        .bind(title)
        .bind(summary)
        .fetch_one(&self.pool)
        .await
        .context("create_story_cluster")?;
        Ok(id)
    }

    async fn update_articles_cluster(&self, article_ids: &[Uuid], cluster_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE articles SET story_cluster_id = $1
            WHERE id = ANY($2) AND story_cluster_id IS NULL
            "#,
        )
        .bind(cluster_id)
        .bind(article_ids)
        .execute(&self.pool)
        .await
        .context("update_articles_cluster")?;
        Ok(result.rows_affected())
    }

    /// Single transaction: lock the members that are still unclustered,
    /// create the cluster only if any remain, and assign just those.
    async fn materialize_group(
        &self,
        title: &str,
        summary: Option<&str>,
        article_ids: &[Uuid],
    ) -> Result<Option<Uuid>> {
        let mut tx = self.pool.begin().await.context("materialize_group: begin")?;

        let claimable: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM articles
            WHERE id = ANY($1) AND story_cluster_id IS NULL
            FOR UPDATE
            "#,
        )
        .bind(article_ids)
        .fetch_all(&mut *tx)
        .await
        .context("materialize_group: claim")?;

        if claimable.is_empty() {
            tx.rollback().await.context("materialize_group: rollback")?;
            return Ok(None);
        }
        let claimable: Vec<Uuid> = claimable.into_iter().map(|(id,)| id).collect();

        let (cluster_id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO story_clusters (title, summary) VALUES ($1, $2) RETURNING id",
        )
        .bind(title)
        .bind(summary)
        .fetch_one(&mut *tx)
        .await
        .context("materialize_group: create cluster")?;

        sqlx::query("UPDATE articles SET story_cluster_id = $1 WHERE id = ANY($2)")
            .bind(cluster_id)
            .bind(&claimable)
            .execute(&mut *tx)
            .await
            .context("materialize_group: assign")?;

        tx.commit().await.context("materialize_group: commit")?;

        debug!(
            %cluster_id,
            requested = article_ids.len(),
            assigned = claimable.len(),
            "Group materialized"
        );
        Ok(Some(cluster_id))
    }

    async fn fetch_comments_with_votes(&self, story_id: Uuid) -> Result<Vec<Comment>> {
        let comment_ids: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM comments WHERE story_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await
        .context("fetch_comments_with_votes: comments")?;

        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let votes = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT v.user_id, v.comment_id, v.value
            FROM votes v
            JOIN comments c ON c.id = v.comment_id
            WHERE c.story_id = $1
            ORDER BY v.created_at ASC, v.user_id ASC
            "#,
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await
        .context("fetch_comments_with_votes: votes")?;

        let mut by_comment: HashMap<Uuid, Vec<Vote>> = HashMap::new();
        for row in votes {
            by_comment.entry(row.comment_id).or_default().push(Vote {
                user_id: row.user_id,
                comment_id: row.comment_id,
                value: row.value,
            });
        }

        Ok(comment_ids
            .into_iter()
            .map(|(id,)| Comment {
                id,
                story_id,
                votes: by_comment.remove(&id).unwrap_or_default(),
            })
            .collect())
    }

    async fn update_comment_consensus(&self, comment_id: Uuid, score: f64, label: &str) -> Result<()> {
        sqlx::query("UPDATE comments SET consensus_score = $1, cluster_label = $2 WHERE id = $3")
            .bind(score)
            .bind(label)
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .context("update_comment_consensus")?;
        Ok(())
    }
}
