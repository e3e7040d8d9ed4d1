use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::{error::FetchError, model::WeatherRecord, secret::ApiKey};

pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Fixed network timeout for one provider request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    async fn fetch(&self, city: &str, api_key: &ApiKey) -> Result<WeatherRecord, FetchError>;
}

/// Current-weather client for the OpenWeather API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_url: String,
    timeout: Duration,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_timeout(api_url, FETCH_TIMEOUT)
    }

    pub fn with_timeout(api_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Network)?;

        Ok(Self {
            api_url: api_url.into(),
            timeout,
            http,
        })
    }

    async fn fetch_payload(&self, city: &str, api_key: &ApiKey) -> Result<Value, FetchError> {
        debug!(city, url = %self.api_url, "requesting current weather");

        let res = self
            .http
            .get(&self.api_url)
            .query(&[("q", city), ("appid", api_key.expose()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| FetchError::from_transport(e, self.timeout))?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| FetchError::from_transport(e, self.timeout))?;

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherClient {
    async fn fetch(&self, city: &str, api_key: &ApiKey) -> Result<WeatherRecord, FetchError> {
        let payload = self.fetch_payload(city, api_key).await?;
        Ok(WeatherRecord::from_payload(city, payload, Utc::now()))
    }
}
