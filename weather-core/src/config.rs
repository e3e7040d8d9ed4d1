use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{client::DEFAULT_API_URL, storage::StorageBackend};

pub const DEFAULT_SECRET_NAME: &str = "openweather/api";
pub const DEFAULT_BASE_PATH: &str = "raw";
pub const DEFAULT_CITY: &str = "Riyadh";

/// Optional on-disk configuration. Every field can also come from the environment.
///
/// Example TOML:
/// ```toml
/// bucket = "my-weather-bucket"
/// cities = ["Riyadh", "New York"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub bucket: Option<String>,
    pub secret_name: Option<String>,
    pub base_path: Option<String>,
    pub cities: Option<Vec<String>>,
    pub api_url: Option<String>,
    pub secrets_dir: Option<PathBuf>,
    pub local_storage_dir: Option<PathBuf>,
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Resolved configuration for one process. Built once and passed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bucket: String,
    pub secret_name: String,
    pub base_path: String,
    pub cities: Vec<String>,
    pub api_url: String,
    pub secrets_dir: Option<PathBuf>,
    pub local_storage_dir: Option<PathBuf>,
}

impl Config {
    /// Load from an explicit config file, or the platform default one if it
    /// exists, with environment variables taking precedence.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => ConfigFile::read(path)?,
            None => {
                let default = Self::config_file_path()?;
                if default.exists() {
                    ConfigFile::read(&default)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        Self::resolve(file, |name| std::env::var(name).ok())
    }

    /// Environment only.
    pub fn from_env() -> Result<Self> {
        Self::resolve(ConfigFile::default(), |name| std::env::var(name).ok())
    }

    /// Merge `file` with variables from `lookup` (which win) and apply defaults.
    pub fn resolve<F>(file: ConfigFile, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket = lookup("BUCKET")
            .or(file.bucket)
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No target bucket configured.\n\
                     Hint: set the BUCKET environment variable or `bucket` in the config file."
                )
            })?;

        let cities = match lookup("CITIES") {
            Some(raw) => parse_cities(&raw),
            None => file
                .cities
                .map(|list| list.iter().flat_map(|c| parse_cities(c)).collect())
                .unwrap_or_else(|| vec![DEFAULT_CITY.to_string()]),
        };

        Ok(Self {
            bucket,
            secret_name: lookup("SECRET_NAME")
                .or(file.secret_name)
                .unwrap_or_else(|| DEFAULT_SECRET_NAME.to_string()),
            base_path: lookup("BASE_PATH")
                .or(file.base_path)
                .map(|base| base.trim_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()),
            cities,
            api_url: lookup("WEATHER_API_URL")
                .or(file.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            secrets_dir: lookup("SECRETS_DIR").map(PathBuf::from).or(file.secrets_dir),
            local_storage_dir: lookup("LOCAL_STORAGE_DIR")
                .map(PathBuf::from)
                .or(file.local_storage_dir),
        })
    }

    /// Directory for the file secret store.
    pub fn secrets_dir(&self) -> Result<PathBuf> {
        match &self.secrets_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_secrets_dir(),
        }
    }

    pub fn storage_backend(&self) -> StorageBackend {
        match &self.local_storage_dir {
            Some(dir) => StorageBackend::Local(dir.clone()),
            None => StorageBackend::S3,
        }
    }

    /// Path to the default config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}

pub fn default_secrets_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("secrets"))
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-ingest", "weather-ingest")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_cities(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
