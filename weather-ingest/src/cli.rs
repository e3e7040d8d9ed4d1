use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use inquire::Password;
use serde_json::{Map, Value};
use tracing::info;
use weather_core::{
    Config, FileSecretStore, build_key,
    config::{DEFAULT_BASE_PATH, DEFAULT_SECRET_NAME, default_secrets_dir},
    orchestrator_from_config,
    secret::API_KEY_FIELD,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-ingest", version, about = "Fetch current weather and store it in object storage")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one invocation and print the summary as JSON.
    Run {
        /// Config file; defaults to the platform config dir if present.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Trigger event (JSON file) passed through to the handler.
        #[arg(long)]
        event: Option<PathBuf>,
    },

    /// Store the OpenWeather API key in the file secret store.
    Configure {
        /// Secret name, e.g. "openweather/api".
        #[arg(long, env = "SECRET_NAME", default_value = DEFAULT_SECRET_NAME)]
        secret_name: String,

        /// Secret store directory.
        #[arg(long, env = "SECRETS_DIR")]
        secrets_dir: Option<PathBuf>,
    },

    /// Print the storage key a write for `city` would use.
    Key {
        /// City name as configured.
        city: String,

        /// RFC 3339 timestamp; if absent, means "now".
        #[arg(long)]
        at: Option<String>,

        #[arg(long, env = "BASE_PATH", default_value = DEFAULT_BASE_PATH)]
        base_path: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Run { config, event } => {
                let config = Config::load(config.as_deref())?;
                let event = match event {
                    Some(path) => read_event(&path).await?,
                    None => Value::Object(Map::new()),
                };

                info!(bucket = %config.bucket, cities = config.cities.len(), "starting invocation");

                let orchestrator = orchestrator_from_config(&config)?;
                let result = orchestrator
                    .handle(&event)
                    .await
                    .context("Invocation aborted: could not obtain API key")?;

                println!("{}", serde_json::to_string(&result)?);
            }
            Command::Configure {
                secret_name,
                secrets_dir,
            } => {
                let dir = match secrets_dir {
                    Some(dir) => dir,
                    None => default_secrets_dir()?,
                };

                let api_key = Password::new("OpenWeather API key:")
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;
                if api_key.trim().is_empty() {
                    return Err(anyhow!("API key must not be empty"));
                }

                let mut secret = Map::new();
                secret.insert(API_KEY_FIELD.to_string(), Value::String(api_key.trim().to_string()));

                let path = FileSecretStore::new(dir)
                    .store_secret(&secret_name, &secret)
                    .await?;
                println!("Stored secret '{secret_name}' at {}", path.display());
            }
            Command::Key {
                city,
                at,
                base_path,
            } => {
                let at = match at {
                    Some(raw) => parse_timestamp(&raw)?,
                    None => Utc::now(),
                };
                println!("{}", build_key(&base_path, &city, at));
            }
        }

        Ok(())
    }
}

async fn read_event(path: &std::path::Path) -> anyhow::Result<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read event file: {}", path.display()))?;

    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse event file: {}", path.display()))
}

fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp '{raw}', expected RFC 3339"))
}
