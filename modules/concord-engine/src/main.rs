use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use concord_common::{file_config, AppConfig, ConcordError, FileConfig, JobSummary, StrategyKind};
use concord_engine::{ArticleFeatureExtractor, ClusteringJob, ConsensusJob, Embedder, TextEmbedder};
use concord_store::{migrate, JobLock, PgStore};

#[derive(Parser)]
#[command(name = "concord", about = "Opinion consensus and topic clustering jobs")]
struct Cli {
    /// Path to config TOML file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Run without taking the per-scope advisory lock
    #[arg(long)]
    no_lock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recompute consensus scores for every comment on one story
    Consensus { story_id: Uuid },
    /// Group all unclustered articles into new story clusters
    Cluster,
    /// Apply database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let file_config = match &cli.config {
        Some(path) => {
            info!(config = %path.display(), "Loading config");
            file_config::load_config(path)?
        }
        None => FileConfig::default(),
    };
    let config = AppConfig::from_env()?;
    let store = PgStore::connect(&config.database_url).await?;

    match cli.command {
        Command::Migrate => migrate(store.pool()).await?,
        Command::Consensus { story_id } => {
            let scope = JobLock::consensus_scope(story_id);
            let lock = take_lock(&store, &scope, cli.no_lock).await?;
            let job = ConsensusJob::new(Arc::new(store.clone()), file_config.consensus.clone());
            let result = job.run(story_id).await;
            finish(lock, result).await?;
        }
        Command::Cluster => {
            let embedder = match file_config.clustering.strategy {
                StrategyKind::Keyword => None,
                StrategyKind::Embedding => {
                    let embedder: Arc<dyn TextEmbedder> = Arc::new(Embedder::new(
                        config.require_openai_api_key()?,
                        &file_config.clustering.embedding_model,
                        config.embedding_base_url.as_deref(),
                    ));
                    Some(embedder)
                }
            };
            let extractor = ArticleFeatureExtractor::from_config(&file_config.clustering, embedder)?;

            let lock = take_lock(&store, JobLock::CLUSTERING_SCOPE, cli.no_lock).await?;
            let job = ClusteringJob::new(
                Arc::new(store.clone()),
                extractor,
                file_config.clustering.clone(),
            );
            let result = job.run().await;
            finish(lock, result).await?;
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn take_lock(store: &PgStore, scope: &str, skip: bool) -> Result<Option<JobLock>, ConcordError> {
    if skip {
        return Ok(None);
    }
    match JobLock::try_acquire(store.pool(), scope)
        .await
        .map_err(ConcordError::store)?
    {
        Some(lock) => {
            info!(scope = lock.scope(), "Job lock acquired");
            Ok(Some(lock))
        }
        None => Err(ConcordError::LockConflict(scope.to_string())),
    }
}

/// Release the lock, then print the summary or surface the job's error.
async fn finish(lock: Option<JobLock>, result: Result<JobSummary, ConcordError>) -> Result<()> {
    let released = match lock {
        Some(lock) => lock.release().await,
        None => Ok(()),
    };
    let summary = settle(released, result)?;
    info!(%summary, "Job finished");
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

/// The job's outcome always wins. A failed unlock is only logged, since the
/// lock is freed when its session closes.
fn settle(
    released: Result<()>,
    result: Result<JobSummary, ConcordError>,
) -> Result<JobSummary, ConcordError> {
    if let Err(e) = released {
        warn!(error = %format!("{e:#}"), "Failed to release job lock");
    }
    result
}
