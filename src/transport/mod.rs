//! Wire layer: one request in, one raw response out.
//!
//! `HttpTransport` walks the configured mirrors in order. A mirror that
//! cannot be reached or answers 5xx is skipped; when every mirror failed the
//! whole list is tried again, `max_retries` more times, with the configured
//! pause between passes.

use crate::config::ClientConfig;
use crate::endpoints::HttpMethod;
use crate::error::{OutscraperError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, warn};
use url::Url;

// ── Request / response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    /// Sent as the query string.
    pub params: Map<String, Value>,
    /// Sent as a JSON body.
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            params: Map::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            params: Map::new(),
            body: Some(body),
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| OutscraperError::decode(path, e))
    }
}

/// Flatten parameters the way the service reads its query string: lists
/// repeat the key, nulls and empty lists are left out.
pub fn encode_query(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(v) = scalar_to_string(item) {
                        pairs.push((key.clone(), v));
                    }
                }
            }
            other => {
                if let Some(v) = scalar_to_string(other) {
                    pairs.push((key.clone(), v));
                }
            }
        }
    }
    pairs
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}

// ── Transport trait ───────────────────────────────────────────────────────────

/// Swappable wire layer.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse>;
}

// ── reqwest transport ─────────────────────────────────────────────────────────

pub struct HttpTransport {
    inner: reqwest::Client,
    api_urls: Vec<String>,
    pause: Duration,
    max_retries: u32,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(&config.api_key)
                .map_err(|_| OutscraperError::Config("API key is not a valid header value".into()))?,
        );
        headers.insert(
            HeaderName::from_static("client"),
            HeaderValue::from_str(&config.client_name)
                .map_err(|_| OutscraperError::Config("client name is not a valid header value".into()))?,
        );

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .gzip(true)
            .build()
            .map_err(|e| OutscraperError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            api_urls: config
                .api_urls
                .iter()
                .map(|u| u.trim_end_matches('/').to_string())
                .collect(),
            pause: config.requests_pause(),
            max_retries: config.max_retries,
        })
    }

    fn url_for(&self, base: &str, request: &ApiRequest) -> Result<Url> {
        let mut url = Url::parse(&format!("{base}{}", request.path))
            .map_err(|e| OutscraperError::Config(format!("bad URL {base}{}: {e}", request.path)))?;

        let pairs = encode_query(&request.params);
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    async fn send_once(&self, url: Url, request: &ApiRequest) -> Result<RawResponse> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.inner.request(method, url.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| OutscraperError::network(url.as_str(), e))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| OutscraperError::network(url.as_str(), e))?;

        Ok(RawResponse { status, body })
    }

    /// One walk over the mirror list.
    async fn try_mirrors(&self, request: &ApiRequest) -> Result<RawResponse> {
        let mut last_error = String::from("no API URLs configured");

        for base in &self.api_urls {
            let url = self.url_for(base, request)?;
            debug!("{} {}", request.method.as_str(), url);

            match self.send_once(url, request).await {
                Ok(resp) if resp.status >= 500 => {
                    warn!("{} answered {}, trying next mirror", base, resp.status);
                    last_error = format!("HTTP {} from {}", resp.status, base);
                }
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    warn!("{} unreachable: {}", base, e);
                    last_error = e.to_string();
                }
            }
        }

        Err(OutscraperError::AllUrlsFailed {
            attempts: 1,
            last_error,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse> {
        let strategy = FixedInterval::new(self.pause).take(self.max_retries as usize);
        let mut passes = 0u32;

        let result = RetryIf::start(
            strategy,
            || {
                passes += 1;
                if passes > 1 {
                    warn!("all mirrors failed for {}, pass {}", request.path, passes);
                }
                self.try_mirrors(request)
            },
            |e: &OutscraperError| e.is_transient(),
        )
        .await;

        result.map_err(|e| match e {
            OutscraperError::AllUrlsFailed { last_error, .. } => OutscraperError::AllUrlsFailed {
                attempts: passes,
                last_error,
            },
            other => other,
        })
    }
}
