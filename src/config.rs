//! Configuration for the document console and its HTTP backend.
//!
//! The only value most deployments touch is the backend base URL. The
//! backend historically served delete and raw download from a separate
//! address; that split is kept as an optional override
//! ([`ConsoleConfig::files_service_url`]) rather than baked into the client.

use crate::error::ConsoleError;
use reqwest::Url;

/// Default backend address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8008";

/// Default accepted upload extension.
pub const DEFAULT_EXTENSION: &str = ".pdf";

/// Configuration for a [`crate::console::DocumentConsole`] and
/// [`crate::backend::HttpBackend`].
///
/// Built via [`ConsoleConfig::builder()`] or [`ConsoleConfig::default()`].
///
/// # Example
/// ```rust
/// use doc_console::ConsoleConfig;
///
/// let config = ConsoleConfig::builder()
///     .base_url("http://docs.internal:8008")
///     .timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.files_service_url().as_str(), "http://docs.internal:8008/");
/// ```
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Address of the document service. Default: `http://localhost:8008`.
    pub base_url: Url,

    /// Address used for delete and raw download. Default: `base_url`.
    pub files_url: Option<Url>,

    /// File-name suffix an upload must carry. Default: `.pdf`.
    ///
    /// Compared case-sensitively, matching the backend's own check.
    pub accepted_extension: String,

    /// Per-request timeout in seconds. Default: none (transport default).
    pub timeout_secs: Option<u64>,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL"),
            files_url: None,
            accepted_extension: DEFAULT_EXTENSION.to_string(),
            timeout_secs: None,
            user_agent: format!("doc-console/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ConsoleConfig {
    pub fn builder() -> ConsoleConfigBuilder {
        ConsoleConfigBuilder {
            config: Self::default(),
            base_url: None,
            files_url: None,
        }
    }

    /// Address for delete and raw download.
    pub fn files_service_url(&self) -> &Url {
        self.files_url.as_ref().unwrap_or(&self.base_url)
    }

    /// Whether `name` carries the accepted extension.
    pub fn accepts(&self, name: &str) -> bool {
        name.ends_with(&self.accepted_extension)
    }
}

/// Builder for [`ConsoleConfig`].
#[derive(Debug)]
pub struct ConsoleConfigBuilder {
    config: ConsoleConfig,
    base_url: Option<String>,
    files_url: Option<String>,
}

impl ConsoleConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn files_service_url(mut self, url: impl Into<String>) -> Self {
        self.files_url = Some(url.into());
        self
    }

    pub fn accepted_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.accepted_extension = ext.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating URLs and the extension.
    pub fn build(mut self) -> Result<ConsoleConfig, ConsoleError> {
        if let Some(raw) = self.base_url.take() {
            self.config.base_url = parse_http_url("base URL", &raw)?;
        }
        if let Some(raw) = self.files_url.take() {
            self.config.files_url = Some(parse_http_url("files service URL", &raw)?);
        }
        let ext = &self.config.accepted_extension;
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConsoleError::InvalidConfig(format!(
                "accepted extension must look like '.pdf', got '{ext}'"
            )));
        }
        if self.config.timeout_secs == Some(0) {
            return Err(ConsoleError::InvalidConfig(
                "timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

fn parse_http_url(what: &str, raw: &str) -> Result<Url, ConsoleError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConsoleError::InvalidConfig(format!("{what} '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConsoleError::InvalidConfig(format!(
            "{what} '{raw}' must use http or https, not {other}"
        ))),
    }
}
