//! Error taxonomy for one ingest invocation.
//!
//! Only [`CredentialError`] aborts an invocation. Everything else is scoped to
//! a single city and ends up as a [`crate::model::ErrorEntry`].

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Failure to obtain the provider API key.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("secret '{name}' not found")]
    NotFound { name: String },

    #[error("failed to read secret '{name}' from {}: {source}", .path.display())]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("secret '{name}' is not a JSON key/value object: {reason}")]
    Malformed { name: String, reason: String },

    #[error("secret '{name}' has no string field '{key}'")]
    MissingKey { name: String, key: String },
}

/// Failure while fetching one city's observation from the provider.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network timeout after {0:?} fetching weather")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("invalid JSON in provider response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FetchError {
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Network(err)
        }
    }
}

/// Failure while persisting one record.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write s3://{bucket}/{key}: {source}")]
    Backend {
        bucket: String,
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("invalid object key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: object_store::path::Error,
    },

    #[error("failed to open storage for bucket '{bucket}': {reason}")]
    Setup { bucket: String, reason: String },
}

/// Anything that can go wrong for a single city. Never fatal for the invocation.
#[derive(Error, Debug)]
pub enum CityError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
