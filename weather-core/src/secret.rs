//! Credential retrieval.
//!
//! A [`SecretStore`] hands out named secrets as JSON key/value maps; the
//! [`SecretProvider`] pulls the provider API key out of one of them.

use std::{
    collections::HashMap,
    fmt::{self, Debug},
    path::PathBuf,
    sync::Arc,
};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::CredentialError;

/// Field of the secret object that holds the OpenWeather API key.
pub const API_KEY_FIELD: &str = "OPENWEATHER_API_KEY";

/// Provider API key. Redacted in `Debug` so it cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[async_trait]
pub trait SecretStore: Send + Sync + Debug {
    async fn get_secret(&self, name: &str) -> Result<Map<String, Value>, CredentialError>;
}

fn parse_secret(name: &str, contents: &str) -> Result<Map<String, Value>, CredentialError> {
    let value: Value = serde_json::from_str(contents).map_err(|e| CredentialError::Malformed {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(CredentialError::Malformed {
            name: name.to_string(),
            reason: format!("expected an object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Secrets stored as JSON files: `openweather/api` lives at `{root}/openweather/api.json`.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    root: PathBuf,
}

impl FileSecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn secret_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", name.trim_start_matches('/')))
    }

    /// Write (or replace) a secret, creating parent directories as needed.
    pub async fn store_secret(
        &self,
        name: &str,
        secret: &Map<String, Value>,
    ) -> Result<PathBuf, CredentialError> {
        let path = self.secret_path(name);
        let io_err = |source| CredentialError::Io {
            name: name.to_string(),
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let body = serde_json::to_string_pretty(secret).map_err(|e| CredentialError::Malformed {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        tokio::fs::write(&path, body).await.map_err(io_err)?;

        Ok(path)
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self, name: &str) -> Result<Map<String, Value>, CredentialError> {
        let path = self.secret_path(name);
        debug!(secret = name, path = %path.display(), "reading secret file");

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CredentialError::NotFound { name: name.to_string() });
            }
            Err(source) => {
                return Err(CredentialError::Io {
                    name: name.to_string(),
                    path,
                    source,
                });
            }
        };

        parse_secret(name, &contents)
    }
}

/// In-memory secrets keyed by name, each holding the raw secret string.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, secret_string: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), secret_string.into());
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_secret(&self, name: &str) -> Result<Map<String, Value>, CredentialError> {
        let contents = self
            .secrets
            .get(name)
            .ok_or_else(|| CredentialError::NotFound { name: name.to_string() })?;

        parse_secret(name, contents)
    }
}

/// Resolves the provider API key from a named secret.
#[derive(Debug, Clone)]
pub struct SecretProvider {
    store: Arc<dyn SecretStore>,
    secret_name: String,
}

impl SecretProvider {
    pub fn new(store: Arc<dyn SecretStore>, secret_name: impl Into<String>) -> Self {
        Self {
            store,
            secret_name: secret_name.into(),
        }
    }

    pub async fn get_api_key(&self) -> Result<ApiKey, CredentialError> {
        let secret = self.store.get_secret(&self.secret_name).await?;

        secret
            .get(API_KEY_FIELD)
            .and_then(Value::as_str)
            .map(ApiKey::new)
            .ok_or_else(|| CredentialError::MissingKey {
                name: self.secret_name.clone(),
                key: API_KEY_FIELD.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(store: StaticSecretStore) -> SecretProvider {
        SecretProvider::new(Arc::new(store), "openweather/api")
    }

    #[tokio::test]
    async fn returns_api_key() {
        let store = StaticSecretStore::new()
            .with_secret("openweather/api", r#"{"OPENWEATHER_API_KEY":"abc123"}"#);

        let key = provider(store).get_api_key().await.unwrap();
        assert_eq!(key.expose(), "abc123");
    }

    #[tokio::test]
    async fn missing_secret_is_not_found() {
        let err = provider(StaticSecretStore::new()).get_api_key().await.unwrap_err();
        assert!(matches!(err, CredentialError::NotFound { .. }));
    }

    #[tokio::test]
    async fn non_object_secret_is_malformed() {
        let store = StaticSecretStore::new().with_secret("openweather/api", "just-a-key");
        let err = provider(store).get_api_key().await.unwrap_err();
        assert!(matches!(err, CredentialError::Malformed { .. }));

        let store = StaticSecretStore::new().with_secret("openweather/api", "[1, 2]");
        let err = provider(store).get_api_key().await.unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[tokio::test]
    async fn wrong_field_is_missing_key() {
        let store = StaticSecretStore::new().with_secret("openweather/api", r#"{"API_KEY":"x"}"#);
        let err = provider(store).get_api_key().await.unwrap_err();
        assert!(matches!(err, CredentialError::MissingKey { .. }));

        let store =
            StaticSecretStore::new().with_secret("openweather/api", r#"{"OPENWEATHER_API_KEY":42}"#);
        let err = provider(store).get_api_key().await.unwrap_err();
        assert!(matches!(err, CredentialError::MissingKey { .. }));
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret");
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
    }

    #[tokio::test]
    async fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path());

        let mut secret = Map::new();
        secret.insert(API_KEY_FIELD.to_string(), Value::String("from-file".to_string()));
        let path = store.store_secret("openweather/api", &secret).await.unwrap();
        assert_eq!(path, dir.path().join("openweather").join("api.json"));

        let provider = SecretProvider::new(Arc::new(store), "openweather/api");
        assert_eq!(provider.get_api_key().await.unwrap().expose(), "from-file");
    }

    #[tokio::test]
    async fn file_store_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path());

        let err = store.get_secret("nope").await.unwrap_err();
        assert!(matches!(err, CredentialError::NotFound { .. }));
    }
}
