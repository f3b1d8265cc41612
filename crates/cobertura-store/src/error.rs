use cobertura_core::{ConfigError, RepositoryUnavailable};
use thiserror::Error;

/// Errors returned by the zone store client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network failure, timeout or non-2xx status from the store.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid store base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A zone the store returned cannot be turned into a valid coverage zone.
    #[error("store returned invalid zone '{zone}': {reason}")]
    InvalidZone { zone: String, reason: String },

    /// A branch record is missing data or has an out-of-range location.
    #[error("store returned invalid branch {branch_id}: {reason}")]
    InvalidBranch { branch_id: i64, reason: String },

    #[error(transparent)]
    Catalog(#[from] ConfigError),
}

impl From<StoreError> for RepositoryUnavailable {
    fn from(err: StoreError) -> Self {
        RepositoryUnavailable::new(err)
    }
}
