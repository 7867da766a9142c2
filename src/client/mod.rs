pub mod call;

use crate::businesses::BusinessesApi;
use crate::config::ClientConfig;
use crate::endpoints::Endpoint;
use crate::error::{OutscraperError, Result};
use crate::models::{ArchiveRecord, EndpointResult, QueuedRequest, TaskPage};
use crate::transport::{ApiRequest, HttpTransport, RawResponse, Transport};
use crate::utils::Timer;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub use call::{CallPlan, EndpointCall};

// ── Client ────────────────────────────────────────────────────────────────────

/// Entry point to every Outscraper service.
///
/// ```no_run
/// # async fn demo() -> outscraper::Result<()> {
/// use outscraper::{OutscraperClient, endpoints::catalog};
///
/// let client = OutscraperClient::new("SECRET_API_KEY")?;
/// let places = client
///     .call(&catalog::GOOGLE_MAPS_SEARCH)
///     .query("restaurants brooklyn usa")
///     .param("limit", 5)
///     .send()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OutscraperClient {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl OutscraperClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new(api_key))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            transport: Arc::new(transport),
            config,
        })
    }

    /// Use a custom wire layer; the config still drives polling.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a request against any endpoint of the catalog.
    pub fn call(&self, endpoint: &'static Endpoint) -> EndpointCall<'_> {
        EndpointCall::new(self, endpoint)
    }

    pub fn businesses(&self) -> BusinessesApi<'_> {
        BusinessesApi::new(self)
    }

    pub(crate) async fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        self.transport.execute(request).await
    }

    /// Send a request and read the answer as a success payload.
    pub(crate) async fn send_json(&self, request: &ApiRequest) -> Result<Value> {
        let resp = self.send(request).await?;
        if !resp.is_success() {
            return Err(OutscraperError::Status {
                status: resp.status,
                path: request.path.clone(),
            });
        }
        resp.json(&request.path)
    }

    // ── Endpoint responses ────────────────────────────────────────────────────

    pub(crate) async fn submit(&self, plan: CallPlan) -> Result<EndpointResult> {
        let body = self.send_json(&plan.request).await?;
        check_envelope(&body)?;

        if !plan.wait_async {
            return Ok(EndpointResult::Data(take_data(body)));
        }

        let id = body.get("id").and_then(Value::as_str).map(str::to_string);
        match id {
            Some(id) if plan.return_handle => {
                info!("{} queued as {}", plan.request.path, id);
                Ok(EndpointResult::Queued(QueuedRequest { id, raw: body }))
            }
            Some(id) => {
                info!("{} queued as {}, waiting for results", plan.request.path, id);
                let record = self.wait_request_archive(&id).await?;
                Ok(EndpointResult::Data(record.data))
            }
            // The service answered inline after all.
            None if body.get("data").is_some() => {
                debug!("{} answered inline", plan.request.path);
                Ok(EndpointResult::Data(take_data(body)))
            }
            None => Err(OutscraperError::MissingJobId {
                path: plan.request.path,
            }),
        }
    }

    // ── Request archive ───────────────────────────────────────────────────────

    /// Fetch a request's current state from the archive.
    pub async fn get_request_archive(&self, request_id: &str) -> Result<ArchiveRecord> {
        let request = ApiRequest::get(format!("/requests/{request_id}"));
        let body = self.send_json(&request).await?;
        serde_json::from_value(body).map_err(|e| OutscraperError::decode(&request.path, e))
    }

    /// Poll the archive until the request leaves `Pending`.
    ///
    /// Sleeps `requests_pause` before every poll and gives up after
    /// `max_ttl / requests_pause` polls. A transient fetch error is retried
    /// once, after one more pause.
    pub async fn wait_request_archive(&self, request_id: &str) -> Result<ArchiveRecord> {
        let budget = self.config.poll_budget();
        let pause = self.config.requests_pause();
        let _timer = Timer::start(format!("waiting for request {request_id}"));

        for attempt in 1..=budget {
            sleep(pause).await;

            let record = match self.get_request_archive(request_id).await {
                Ok(record) => record,
                Err(e) if e.is_transient() => {
                    warn!("Archive fetch for {} failed ({}), retrying once", request_id, e);
                    sleep(pause).await;
                    self.get_request_archive(request_id).await?
                }
                Err(e) => return Err(e),
            };

            if !record.is_pending() {
                info!(
                    "Request {} finished with {:?} after {} polls",
                    request_id, record.status, attempt
                );
                return Ok(record);
            }
            debug!("Request {} pending (poll {}/{})", request_id, attempt, budget);
        }

        Err(OutscraperError::Timeout {
            request_id: request_id.to_string(),
            attempts: budget,
        })
    }

    // ── Platform ──────────────────────────────────────────────────────────────

    /// Requests of the account, filtered by `kind` ("running" or "finished").
    pub async fn get_requests_history(&self, kind: &str, skip: u32, page_size: u32) -> Result<Value> {
        let request = ApiRequest::get("/requests")
            .param("type", kind)
            .param("skip", skip)
            .param("pageSize", page_size);
        self.send_json(&request).await
    }

    /// Tasks created through the web UI, newest first.
    pub async fn get_tasks(&self, query: &str, last_id: &str, page_size: u32) -> Result<TaskPage> {
        let request = ApiRequest::get("/tasks")
            .param("query", query)
            .param("lastId", last_id)
            .param("pageSize", page_size);
        let body = self.send_json(&request).await?;

        if let Some(message) = body.get("errorMessage") {
            return Err(OutscraperError::Api {
                message: value_text(message),
            });
        }
        serde_json::from_value(body).map_err(|e| OutscraperError::decode("/tasks", e))
    }
}

// ── Envelope helpers ──────────────────────────────────────────────────────────

/// `{"error": true, "errorMessage": ".."}` marks a failed call.
pub(crate) fn check_envelope(body: &Value) -> Result<()> {
    if body.get("error").is_some_and(is_truthy) {
        let message = body
            .get("errorMessage")
            .map(value_text)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(OutscraperError::Api { message });
    }
    Ok(())
}

fn take_data(body: Value) -> Vec<Value> {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![other],
        },
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
