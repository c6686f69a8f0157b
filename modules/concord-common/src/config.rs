use crate::error::ConcordError;

/// Application configuration loaded from environment variables.
/// Contains only secrets and env-specific values; clustering parameters
/// live in the TOML `FileConfig`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Database
    pub database_url: String,

    // Embedding service
    pub openai_api_key: Option<String>,
    pub embedding_base_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConcordError> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| ConcordError::Config("DATABASE_URL must be set".into()))?,
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            embedding_base_url: non_empty_var("EMBEDDING_BASE_URL"),
        };

        config.log_keys();
        Ok(config)
    }

    /// The embedding key, required only when the embedding strategy is active.
    pub fn require_openai_api_key(&self) -> Result<&str, ConcordError> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            ConcordError::Config(
                "OPENAI_API_KEY must be set when clustering.strategy = \"embedding\"".into(),
            )
        })
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  DATABASE_URL: {}", redact_url(&self.database_url));
        tracing::info!("  OPENAI_API_KEY: {}", preview_opt(&self.openai_api_key));
        tracing::info!("  EMBEDDING_BASE_URL: {}", preview_opt(&self.embedding_base_url));
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn preview(val: &str) -> String {
    let n = val.char_indices().nth(5).map(|(i, _)| i).unwrap_or(val.len());
    format!("{}...({} chars)", &val[..n], val.len())
}

fn preview_opt(val: &Option<String>) -> String {
    match val {
        Some(v) if !v.is_empty() => preview(v),
        _ => "<not set>".to_string(),
    }
}

/// Strip credentials from a connection URL for logging.
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
