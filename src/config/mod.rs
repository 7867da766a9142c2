use crate::error::{OutscraperError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Mirrors of the API, tried in order.
pub const API_URLS: [&str; 3] = [
    "https://api.app.outscraper.com",
    "https://api.app.outscraper.cloud",
    "https://api.outscraper.net",
];

/// Top-level configuration of the command-line tool
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Per-client settings, fixed at construction
#[derive(Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_api_urls")]
    pub api_urls: Vec<String>,

    /// Pause between archive polls and between mirror passes.
    #[serde(default = "default_requests_pause_ms")]
    pub requests_pause_ms: u64,

    #[serde(default = "default_max_ttl_secs")]
    pub max_ttl_secs: u64,

    /// Extra passes over the mirror list after the first one fails.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_client_name")]
    pub client_name: String,
}

/// How the command-line tool renders results
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub pretty: bool,

    #[serde(default)]
    pub dir: Option<PathBuf>,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_api_urls() -> Vec<String> {
    API_URLS.iter().map(|u| u.to_string()).collect()
}
fn default_requests_pause_ms() -> u64 {
    5_000
}
fn default_max_ttl_secs() -> u64 {
    60 * 60
}
fn default_max_retries() -> u32 {
    2
}
fn default_timeout_secs() -> u64 {
    // synchronous calls hold the connection open until the scrape is done
    600
}
fn default_client_name() -> String {
    format!("Rust SDK {}", env!("CARGO_PKG_VERSION"))
}
fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_urls: default_api_urls(),
            requests_pause_ms: default_requests_pause_ms(),
            max_ttl_secs: default_max_ttl_secs(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            client_name: default_client_name(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key.is_empty() { "" } else { "***" };
        f.debug_struct("ClientConfig")
            .field("api_key", &key)
            .field("api_urls", &self.api_urls)
            .field("requests_pause_ms", &self.requests_pause_ms)
            .field("max_ttl_secs", &self.max_ttl_secs)
            .field("max_retries", &self.max_retries)
            .field("timeout_secs", &self.timeout_secs)
            .field("client_name", &self.client_name)
            .finish()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            dir: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_requests_pause(mut self, pause: Duration) -> Self {
        self.requests_pause_ms = pause.as_millis() as u64;
        self
    }

    pub fn with_max_ttl(mut self, ttl: Duration) -> Self {
        self.max_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_api_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.api_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn requests_pause(&self) -> Duration {
        Duration::from_millis(self.requests_pause_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Number of archive polls that fit in the TTL.
    pub fn poll_budget(&self) -> u64 {
        self.max_ttl_secs.saturating_mul(1_000) / self.requests_pause_ms.max(1)
    }

    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(OutscraperError::Config("API key is empty".into()));
        }
        if self.requests_pause_ms == 0 {
            return Err(OutscraperError::Config(
                "requests pause must be greater than zero".into(),
            ));
        }
        if self.api_urls.is_empty() {
            return Err(OutscraperError::Config("no API URLs configured".into()));
        }
        for raw in &self.api_urls {
            let parsed = Url::parse(raw)
                .map_err(|e| OutscraperError::Config(format!("bad API URL {raw:?}: {e}")))?;
            if parsed.cannot_be_a_base() {
                return Err(OutscraperError::Config(format!(
                    "API URL {raw:?} cannot be used as a base"
                )));
            }
        }
        Ok(())
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::Environment::with_prefix("OUTSCRAPER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("client.api_urls")
                    .try_parsing(true),
            )
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}
