//! Configuration types for the PaperDesk client.
//!
//! Everything the client needs to talk to the service and pace the upload
//! workflow lives in [`ClientConfig`], built via its [`ClientConfigBuilder`].
//! The base URL is never hardcoded: it comes from the caller or from the
//! `PAPERDESK_API_URL` environment variable.

use crate::error::PaperDeskError;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the service base URL.
pub const API_URL_ENV: &str = "PAPERDESK_API_URL";

/// Environment variable overriding the persisted session file location.
pub const SESSION_FILE_ENV: &str = "PAPERDESK_SESSION_FILE";

/// Configuration for a PaperDesk client.
///
/// # Example
/// ```rust
/// use paperdesk_client::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:8000")
///     .ocr_delay_ms(0)
///     .extraction_delay_ms(0)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "http://localhost:8000");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL without trailing slash, e.g. `https://api.example.org`.
    pub base_url: String,

    /// Where the bearer token is persisted. Default: `<config dir>/paperdesk/session.json`.
    pub session_path: PathBuf,

    /// Pacing delay shown while the "Conducting OCR" stage is active. Default: 700.
    ///
    /// No OCR happens client-side; the delay only paces the visible stages.
    pub ocr_delay_ms: u64,

    /// Pacing delay shown while the "Extracting Text" stage is active. Default: 700.
    pub extraction_delay_ms: u64,

    /// Delay between a completed upload and the navigation signal. Default: 1200.
    pub navigation_delay_ms: u64,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            session_path: default_session_path(),
            ocr_delay_ms: 700,
            extraction_delay_ms: 700,
            navigation_delay_ms: 1200,
            user_agent: format!("paperdesk-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from `PAPERDESK_API_URL` and, when set,
    /// `PAPERDESK_SESSION_FILE`.
    pub fn from_env() -> Result<Self, PaperDeskError> {
        let url = std::env::var(API_URL_ENV).map_err(|_| {
            PaperDeskError::InvalidConfig(format!(
                "{API_URL_ENV} is not set; point it at the PaperDesk service"
            ))
        })?;
        let mut builder = Self::builder().base_url(url);
        if let Ok(path) = std::env::var(SESSION_FILE_ENV) {
            if !path.is_empty() {
                builder = builder.session_path(path);
            }
        }
        builder.build()
    }

    pub fn ocr_delay(&self) -> Duration {
        Duration::from_millis(self.ocr_delay_ms)
    }

    pub fn extraction_delay(&self) -> Duration {
        Duration::from_millis(self.extraction_delay_ms)
    }

    pub fn navigation_delay(&self) -> Duration {
        Duration::from_millis(self.navigation_delay_ms)
    }

    /// Join `path` onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.session_path = path.into();
        self
    }

    pub fn ocr_delay_ms(mut self, ms: u64) -> Self {
        self.config.ocr_delay_ms = ms;
        self
    }

    pub fn extraction_delay_ms(mut self, ms: u64) -> Self {
        self.config.extraction_delay_ms = ms;
        self
    }

    pub fn navigation_delay_ms(mut self, ms: u64) -> Self {
        self.config.navigation_delay_ms = ms;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, PaperDeskError> {
        let c = &self.config;
        if c.base_url.is_empty() {
            return Err(PaperDeskError::InvalidConfig(format!(
                "base URL is empty; set {API_URL_ENV} or pass --api-url"
            )));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(PaperDeskError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.session_path.as_os_str().is_empty() {
            return Err(PaperDeskError::InvalidConfig(
                "session path must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// `<config dir>/paperdesk/session.json`, falling back to the working
/// directory on platforms without a config dir.
pub fn default_session_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("paperdesk")
        .join("session.json")
}
