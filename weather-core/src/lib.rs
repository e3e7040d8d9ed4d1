//! Core library for scheduled weather ingestion.
//!
//! This crate defines:
//! - Configuration (environment + optional TOML file)
//! - Credential retrieval, the OpenWeather client and object storage writes
//! - The orchestrator that ties them together for one invocation
//!
//! It is used by `weather-ingest`, but can also be embedded in other runners.

use std::sync::Arc;

pub mod client;
pub mod config;
pub mod error;
pub mod key;
pub mod model;
pub mod orchestrator;
pub mod secret;
pub mod storage;

pub use client::{OpenWeatherClient, WeatherFetcher};
pub use config::{Config, ConfigFile};
pub use error::{CityError, CredentialError, FetchError, StorageError};
pub use key::build_key;
pub use model::{ErrorEntry, InvocationResult, WeatherRecord, WrittenEntry};
pub use orchestrator::{IngestSettings, Orchestrator};
pub use secret::{ApiKey, FileSecretStore, SecretProvider, SecretStore, StaticSecretStore};
pub use storage::{BlobStore, ObjectStoreBlobStore, StorageBackend, StorageWriter};

/// Wire up the production components described by `config`.
pub fn orchestrator_from_config(config: &Config) -> anyhow::Result<Orchestrator> {
    let secrets = FileSecretStore::new(config.secrets_dir()?);
    let fetcher = OpenWeatherClient::new(config.api_url.clone())?;
    let blobs = ObjectStoreBlobStore::new(config.storage_backend());

    Ok(Orchestrator::new(
        IngestSettings::from(config),
        SecretProvider::new(Arc::new(secrets), config.secret_name.clone()),
        Box::new(fetcher),
        StorageWriter::new(Arc::new(blobs)),
    ))
}
