use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::repository::{ProgressRepository, QuestionRepository, Storage, StorageError};

mod mapping;
mod progress_repo;
mod question_repo;

/// Default location of the question store API.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpInitError {
    #[error("invalid store url {raw:?}: {source}")]
    InvalidUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },

    #[error("store url must use http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

/// Where and how to reach the question store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStoreConfig {
    base_url: Url,
    timeout: Duration,
}

impl HttpStoreConfig {
    /// Parse a base URL. A trailing slash is added so endpoint paths join under it.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the URL cannot be parsed or is not http(s).
    pub fn new(base_url: &str) -> Result<Self, HttpInitError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Point at another store, keeping the timeout.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the URL cannot be parsed or is not http(s).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, HttpInitError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Read `QUIZ_API_URL` and `QUIZ_TIMEOUT_SECS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if either variable holds an invalid value.
    pub fn from_env() -> Result<Self, HttpInitError> {
        let base = std::env::var("QUIZ_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let mut config = Self::new(&base)?;
        if let Ok(raw) = std::env::var("QUIZ_TIMEOUT_SECS") {
            config.timeout = parse_timeout(&raw)?;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn parse_base_url(raw: &str) -> Result<Url, HttpInitError> {
    let mut url = Url::parse(raw.trim()).map_err(|source| HttpInitError::InvalidUrl {
        raw: raw.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(HttpInitError::UnsupportedScheme(url.scheme().to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Parse a positive number of seconds.
///
/// # Errors
///
/// Returns `HttpInitError::InvalidTimeout` for zero or non-numeric input.
pub fn parse_timeout(raw: &str) -> Result<Duration, HttpInitError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| HttpInitError::InvalidTimeout(raw.to_string()))
}

/// Question store reached over its REST API.
#[derive(Clone)]
pub struct HttpRepository {
    client: Client,
    base: Url,
}

impl HttpRepository {
    /// Build the HTTP client. No request is sent until the first call.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError::Client` if the client cannot be constructed.
    pub fn connect(config: &HttpStoreConfig) -> Result<Self, HttpInitError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base: config.base_url.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, StorageError> {
        self.base
            .join(path)
            .map_err(|e| StorageError::Connection(format!("bad endpoint {path}: {e}")))
    }

    /// Liveness ping that keeps the backing process alive.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the ping fails.
    pub async fn heartbeat(&self) -> Result<(), StorageError> {
        let response = self
            .client
            .post(self.endpoint("heartbeat")?)
            .send()
            .await
            .map_err(mapping::transport)?;
        mapping::check_status(response)?;
        Ok(())
    }
}

impl Storage {
    /// Build a `Storage` backed by the HTTP question store.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the client cannot be constructed.
    pub fn http(config: &HttpStoreConfig) -> Result<Self, HttpInitError> {
        Ok(Self::from_http(HttpRepository::connect(config)?))
    }

    #[must_use]
    pub fn from_http(repo: HttpRepository) -> Self {
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self {
            questions,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpRepository>();
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = HttpStoreConfig::new("http://localhost:8000/api").unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:8000/api/");

        let repo = HttpRepository::connect(&config).unwrap();
        assert_eq!(
            repo.endpoint("wrong-questions/3").unwrap().as_str(),
            "http://localhost:8000/api/wrong-questions/3"
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            HttpStoreConfig::new("ftp://example.com/"),
            Err(HttpInitError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            HttpStoreConfig::new("not a url"),
            Err(HttpInitError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn switching_base_url_keeps_timeout() {
        let config = HttpStoreConfig::new(DEFAULT_BASE_URL)
            .unwrap()
            .with_timeout(Duration::from_secs(30))
            .with_base_url("https://quiz.example.com/v2")
            .unwrap();
        assert_eq!(config.base_url().as_str(), "https://quiz.example.com/v2/");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.with_base_url("mailto:a@b.c").is_err());
    }

    #[test]
    fn timeout_must_be_positive() {
        assert_eq!(parse_timeout(" 3 ").unwrap(), Duration::from_secs(3));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("soon").is_err());
    }
}
