//! One ingest invocation: credential, then fetch/key/write for each city in turn.

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    client::WeatherFetcher,
    error::{CityError, CredentialError},
    key::build_key,
    model::{ErrorEntry, InvocationResult, WrittenEntry},
    secret::{ApiKey, SecretProvider},
    storage::StorageWriter,
};

/// What an orchestrator needs to know about where things go.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub bucket: String,
    pub base_path: String,
    pub cities: Vec<String>,
}

impl From<&crate::Config> for IngestSettings {
    fn from(config: &crate::Config) -> Self {
        Self {
            bucket: config.bucket.clone(),
            base_path: config.base_path.clone(),
            cities: config.cities.clone(),
        }
    }
}

#[derive(Debug)]
pub struct Orchestrator {
    settings: IngestSettings,
    secrets: SecretProvider,
    fetcher: Box<dyn WeatherFetcher>,
    writer: StorageWriter,
}

impl Orchestrator {
    pub fn new(
        settings: IngestSettings,
        secrets: SecretProvider,
        fetcher: Box<dyn WeatherFetcher>,
        writer: StorageWriter,
    ) -> Self {
        Self {
            settings,
            secrets,
            fetcher,
            writer,
        }
    }

    /// Entry point for a scheduled trigger. The event payload is not inspected.
    pub async fn handle(&self, _event: &Value) -> Result<InvocationResult, CredentialError> {
        self.run().await
    }

    /// Run one invocation.
    ///
    /// Fails only if the API key cannot be obtained, in which case no city is
    /// touched. Per-city failures are reported in the result instead.
    pub async fn run(&self) -> Result<InvocationResult, CredentialError> {
        let api_key = self.secrets.get_api_key().await?;

        let mut written = Vec::new();
        let mut errors = Vec::new();

        for city in &self.settings.cities {
            match self.ingest_city(city, &api_key).await {
                Ok(key) => {
                    info!(city = %city, key = %key, "wrote observation");
                    written.push(WrittenEntry {
                        city: city.clone(),
                        s3_key: key,
                    });
                }
                Err(err) => {
                    warn!(city = %city, error = %err, "city failed");
                    errors.push(ErrorEntry {
                        city: city.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        let result = InvocationResult::new(self.settings.bucket.clone(), written, errors);
        info!(
            bucket = %result.bucket,
            success = result.count_success,
            errors = result.count_errors,
            "invocation finished"
        );

        Ok(result)
    }

    async fn ingest_city(&self, city: &str, api_key: &ApiKey) -> Result<String, CityError> {
        let record = self.fetcher.fetch(city, api_key).await?;

        let key = build_key(&self.settings.base_path, city, Utc::now());
        self.writer.write(&self.settings.bucket, &key, &record).await?;

        Ok(key)
    }
}
