use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the trend pipeline.
///
/// Per-document problems are absorbed by the pipeline unless strict mode is
/// on; only structural misuse (a missing source key, a broken config) reaches
/// callers in the default mode.
#[derive(Debug, Error)]
pub enum TrendError {
    /// Both title and body are empty.
    #[error("document '{id}' has neither a title nor a body")]
    MalformedDocument { id: String },

    #[error("source '{0}' is not present in the aggregation input")]
    MissingSource(String),

    #[error("source '{0}' has no documents")]
    EmptyCorpus(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TrendResult<T> = Result<T, TrendError>;
