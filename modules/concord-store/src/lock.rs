use anyhow::{Context, Result};
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tracing::{debug, warn};

/// Session-level Postgres advisory lock, one per job scope.
///
/// Held on a dedicated pooled connection. `release` unlocks and returns the
/// connection; dropping without releasing closes the connection instead,
/// which also frees the lock server-side.
pub struct JobLock {
    scope: String,
    conn: Option<PoolConnection<Postgres>>,
}

impl JobLock {
    /// Scope for the consensus job on one story.
    pub fn consensus_scope(story_id: uuid::Uuid) -> String {
        format!("consensus:{story_id}")
    }

    /// Scope for article clustering, which runs over the whole backlog.
    pub const CLUSTERING_SCOPE: &'static str = "clustering";

    /// Try to take the lock for `scope`. `None` if another session holds it.
    pub async fn try_acquire(pool: &PgPool, scope: &str) -> Result<Option<Self>> {
        let mut conn = pool.acquire().await.context("JobLock: acquire connection")?;
        let (locked,): (bool,) =
            sqlx::query_as("SELECT pg_try_advisory_lock(hashtextextended($1, 0))")
                .bind(scope)
                .fetch_one(&mut *conn)
                .await
                .context("JobLock: pg_try_advisory_lock")?;

        if !locked {
            debug!(scope, "Advisory lock busy");
            return Ok(None);
        }
        debug!(scope, "Advisory lock acquired");
        Ok(Some(Self {
            scope: scope.to_string(),
            conn: Some(conn),
        }))
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub async fn release(mut self) -> Result<()> {
        if let Some(mut conn) = self.conn.take() {
            let unlocked = sqlx::query("SELECT pg_advisory_unlock(hashtextextended($1, 0))")
                .bind(&self.scope)
                .execute(&mut *conn)
                .await;
            if let Err(e) = unlocked {
                // Never hand a session that may still hold the lock back to the pool.
                drop(conn.detach());
                return Err(e).context("JobLock: pg_advisory_unlock");
            }
            debug!(scope = self.scope.as_str(), "Advisory lock released");
        }
        Ok(())
    }
}

impl Drop for JobLock {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            warn!(scope = self.scope.as_str(), "JobLock dropped without release, closing connection");
            drop(conn.detach());
        }
    }
}
