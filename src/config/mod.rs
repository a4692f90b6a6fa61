//! Client configuration (layered: code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;

use crate::error::{LmsError, Result};
use crate::storage::FileStorageConfig;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
pub const DEFAULT_IDENTITY_PATH: &str = "/auth/me";

/// Settings for talking to the LMS backend.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use lms_client::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://lms.example.edu/api")
///     .timeout(Duration::from_secs(10))
///     .build();
/// assert_eq!(config.refresh_path, "/auth/refresh");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    #[builder(into)]
    pub base_url: String,
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
    /// Directory holding the durable session file.
    #[builder(into, default = FileStorageConfig::default_dir())]
    pub storage_dir: PathBuf,
    #[builder(into, default = DEFAULT_REFRESH_PATH.to_string())]
    pub refresh_path: String,
    #[builder(into, default = DEFAULT_IDENTITY_PATH.to_string())]
    pub identity_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().base_url(DEFAULT_BASE_URL).build()
    }
}

impl ClientConfig {
    /// Load from environment variables (`LMS_API_BASE_URL`,
    /// `LMS_HTTP_TIMEOUT_SECS`, `LMS_STORAGE_DIR`), reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();

        if let Ok(url) = std::env::var("LMS_API_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(raw) = std::env::var("LMS_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                LmsError::Configuration(format!("LMS_HTTP_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(dir) = std::env::var("LMS_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            LmsError::Configuration(format!("invalid base URL {}: {e}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LmsError::Configuration(format!(
                "base URL must be http or https: {}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(LmsError::Configuration(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
