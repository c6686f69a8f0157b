use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConcordError {
    #[error("Data store error: {0}")]
    Store(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Job lock conflict: another {0} run is in progress")]
    LockConflict(String),
}

impl ConcordError {
    /// Wrap a Data Store failure, keeping the full context chain in the message.
    pub fn store(err: anyhow::Error) -> Self {
        ConcordError::Store(format!("{err:#}"))
    }

    /// Wrap an embedding service failure, keeping the full context chain in the message.
    pub fn embedding(err: anyhow::Error) -> Self {
        ConcordError::Embedding(format!("{err:#}"))
    }

    /// True for failures of an external collaborator (store or embedding service).
    pub fn is_dependency(&self) -> bool {
        matches!(self, ConcordError::Store(_) | ConcordError::Embedding(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn store_error_keeps_context_chain() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("connection reset"));
        let err = err.context("fetch_unclustered_articles").unwrap_err();
        let wrapped = ConcordError::store(err);
        assert_eq!(
            wrapped.to_string(),
            "Data store error: fetch_unclustered_articles: connection reset"
        );
        assert!(wrapped.is_dependency());
    }

    #[test]
    fn validation_is_not_a_dependency_error() {
        assert!(!ConcordError::Validation("vote value 2".into()).is_dependency());
    }
}
