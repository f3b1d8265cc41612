use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read zones file at {path}: {source}")]
    ZonesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse zones file: {0}")]
    ZonesFileParse(#[from] serde_yaml::Error),

    #[error("zones catalog validation failed: {0}")]
    Validation(String),
}

/// The backing zone or branch source could not answer.
///
/// Wraps whatever the adapter failed with; the core never inspects it.
#[derive(Debug, Error)]
#[error("zone repository unavailable: {source}")]
pub struct RepositoryUnavailable {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl RepositoryUnavailable {
    pub fn new<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            source: source.into(),
        }
    }
}
