use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

/// Apply pending schema migrations. Migrations are embedded at compile time.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations complete");
    Ok(())
}
