use super::OutscraperClient;
use crate::endpoints::{AsyncParam, Endpoint, HttpMethod};
use crate::error::{OutscraperError, Result};
use crate::models::EndpointResult;
use crate::transport::ApiRequest;
use crate::utils::{OneOrMany, as_list, format_direction_query};
use serde_json::{Map, Value};

/// Builder for one endpoint call. Parameters use snake_case names; unknown
/// names are rejected when the call is planned.
#[derive(Clone)]
pub struct EndpointCall<'a> {
    client: &'a OutscraperClient,
    endpoint: &'static Endpoint,
    queries: Vec<String>,
    params: Map<String, Value>,
    async_request: Option<bool>,
}

/// A resolved call: the request to send and what to do with the answer.
#[derive(Debug, Clone, PartialEq)]
pub struct CallPlan {
    pub request: ApiRequest,
    /// The answer is a job handle rather than data.
    pub wait_async: bool,
    /// Hand the job handle back instead of polling for it.
    pub return_handle: bool,
}

impl<'a> EndpointCall<'a> {
    pub(crate) fn new(client: &'a OutscraperClient, endpoint: &'static Endpoint) -> Self {
        Self {
            client,
            endpoint,
            queries: Vec::new(),
            params: Map::new(),
            async_request: None,
        }
    }

    pub fn endpoint(&self) -> &'static Endpoint {
        self.endpoint
    }

    /// One query or a batch of them; repeated calls append.
    pub fn query(mut self, query: impl Into<OneOrMany<String>>) -> Self {
        self.queries.extend(as_list(query));
        self
    }

    /// One directions route given as its waypoints. A route may also be passed
    /// to `query` as a single string, e.g. `"Brooklyn | Queens"`.
    pub fn route<S: AsRef<str>>(mut self, waypoints: &[S]) -> Self {
        self.queries.push(format_direction_query(waypoints));
        self
    }

    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Merge a whole parameter map, e.g. one read from the command line.
    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn fields(self, fields: impl Into<OneOrMany<String>>) -> Self {
        self.param("fields", as_list(fields))
    }

    /// Return the job handle at once instead of waiting for results.
    pub fn async_request(mut self, enabled: bool) -> Self {
        self.async_request = Some(enabled);
        self
    }

    /// Run the task through the web UI; the job handle is returned.
    pub fn ui(self, enabled: bool) -> Self {
        self.param("ui", enabled)
    }

    pub fn webhook(self, url: impl Into<String>) -> Self {
        self.param("webhook", url.into())
    }

    pub fn plan(&self) -> Result<CallPlan> {
        let endpoint = self.endpoint;
        if self.queries.is_empty() {
            return Err(OutscraperError::InvalidArgument(format!(
                "{} needs at least one query",
                endpoint.name
            )));
        }

        let queries = endpoint.format_queries(&self.queries)?;
        let params = endpoint.resolve(&self.params)?;
        let async_request = self.async_request.unwrap_or(endpoint.async_by_default);
        let ui = params.get("ui").is_some_and(|v| v == &Value::Bool(true));

        let return_handle = async_request || ui;
        let wait_async = return_handle || endpoint.queues(queries.len(), &params);

        let async_value = match endpoint.async_param {
            AsyncParam::Computed => Some(wait_async),
            AsyncParam::Requested => Some(async_request),
            AsyncParam::Omitted => None,
        };
        let remote = endpoint.to_remote(queries, &params, async_value);

        let request = match endpoint.method {
            HttpMethod::Get => ApiRequest::get(endpoint.path).with_params(remote),
            HttpMethod::Post => ApiRequest::post(endpoint.path, Value::Object(remote)),
        };

        Ok(CallPlan {
            request,
            wait_async,
            return_handle,
        })
    }

    pub async fn send(self) -> Result<EndpointResult> {
        let plan = self.plan()?;
        self.client.submit(plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{ScriptedTransport, client_with};
    use crate::endpoints::catalog;
    use serde_json::json;
    use std::sync::Arc;

    fn client() -> OutscraperClient {
        client_with(Arc::new(ScriptedTransport::default()), 5, 3600)
    }

    #[test]
    fn test_query_accepts_one_or_many() {
        let client = client();
        let plan = client
            .call(&catalog::GEOCODING)
            .query("Brooklyn")
            .query(vec!["Queens", "Bronx"])
            .plan()
            .unwrap();
        assert_eq!(plan.request.params["query"], json!(["Brooklyn", "Queens", "Bronx"]));
    }

    #[test]
    fn test_missing_query_is_rejected() {
        let client = client();
        let err = client.call(&catalog::GEOCODING).plan().unwrap_err();
        assert!(matches!(err, OutscraperError::InvalidArgument(_)));
    }

    #[test]
    fn test_ui_forces_handle() {
        let client = client();
        let plan = client
            .call(&catalog::GOOGLE_MAPS_REVIEWS)
            .query("place")
            .ui(true)
            .plan()
            .unwrap();
        assert!(plan.wait_async);
        assert!(plan.return_handle);
        assert_eq!(plan.request.params["ui"], true);
        assert_eq!(plan.request.params["async"], true);
    }

    #[test]
    fn test_ui_on_endpoint_without_ui_is_rejected() {
        let client = client();
        let err = client
            .call(&catalog::EMAILS_AND_CONTACTS)
            .query("outscraper.com")
            .ui(true)
            .plan()
            .unwrap_err();
        assert!(err.to_string().contains("ui"));
    }

    #[test]
    fn test_fixed_async_endpoint_omits_flag() {
        let client = client();
        let plan = client
            .call(&catalog::EMAILS_AND_CONTACTS)
            .query("outscraper.com")
            .plan()
            .unwrap();
        assert!(plan.wait_async);
        assert!(!plan.return_handle);
        assert!(!plan.request.params.contains_key("async"));
    }

    #[test]
    fn test_requested_flag_is_sent_verbatim() {
        let client = client();
        let plan = client
            .call(&catalog::GOOGLE_SEARCH)
            .query(vec!["a", "b"])
            .plan()
            .unwrap();
        assert!(plan.wait_async);
        assert_eq!(plan.request.params["async"], false);
    }

    #[test]
    fn test_async_by_default_endpoint() {
        let client = client();
        let plan = client
            .call(&catalog::YELLOWPAGES_SEARCH)
            .query("restaurants")
            .plan()
            .unwrap();
        assert!(plan.return_handle);

        let plan = client
            .call(&catalog::YELLOWPAGES_SEARCH)
            .query("restaurants")
            .async_request(false)
            .plan()
            .unwrap();
        assert!(!plan.return_handle);
        assert!(!plan.wait_async);
    }

    #[test]
    fn test_post_endpoint_carries_body() {
        let client = client();
        let plan = client
            .call(&catalog::GOOGLE_MAPS_SEARCH)
            .query("bars ny usa")
            .param("limit", 3)
            .plan()
            .unwrap();
        assert_eq!(plan.request.method, HttpMethod::Post);
        assert!(plan.request.params.is_empty());
        let body = plan.request.body.unwrap();
        assert_eq!(body["query"], json!(["bars ny usa"]));
        assert_eq!(body["organizationsPerQueryLimit"], 3);
        assert!(body.get("limit").is_none());
    }

    #[test]
    fn test_route_joins_waypoints() {
        let client = client();
        let plan = client
            .call(&catalog::GOOGLE_MAPS_DIRECTIONS)
            .route(&["29.696596, 76.994928", " 30.7159662444353, 76.8053887016268"])
            .plan()
            .unwrap();
        assert_eq!(
            plan.request.params["query"],
            json!(["29.696596, 76.994928    30.7159662444353, 76.8053887016268"])
        );
    }

    #[test]
    fn test_directions_query_is_read_as_one_route() {
        let client = client();
        let plan = client
            .call(&catalog::GOOGLE_MAPS_DIRECTIONS)
            .query("29.696596, 76.994928 | 30.7159662444353, 76.8053887016268")
            .plan()
            .unwrap();
        assert_eq!(
            plan.request.params["query"],
            json!(["29.696596, 76.994928    30.7159662444353, 76.8053887016268"])
        );
        assert!(!plan.wait_async);

        let err = client
            .call(&catalog::GOOGLE_MAPS_DIRECTIONS)
            .query(vec!["29.696596, 76.994928", "30.7159662444353, 76.8053887016268"])
            .plan()
            .unwrap_err();
        assert!(matches!(err, OutscraperError::InvalidArgument(_)));
    }

    #[test]
    fn test_async_request_short_circuits_every_endpoint() {
        let client = client();
        let batch: Vec<String> = (0..200).map(|i| format!("origin {i} | destination {i}")).collect();

        for ep in catalog::ALL {
            let plan = client
                .call(ep)
                .query(batch.clone())
                .async_request(true)
                .plan()
                .unwrap_or_else(|e| panic!("{}: {e}", ep.name));

            assert!(plan.return_handle, "{}", ep.name);
            assert!(plan.wait_async, "{}", ep.name);

            let sent = match &plan.request.body {
                Some(body) => body.get("async").cloned(),
                None => plan.request.params.get("async").cloned(),
            };
            match ep.async_param {
                AsyncParam::Computed | AsyncParam::Requested => {
                    assert_eq!(sent, Some(Value::Bool(true)), "{}", ep.name)
                }
                AsyncParam::Omitted => assert_eq!(sent, None, "{}", ep.name),
            }
        }
    }

    #[test]
    fn test_fields_are_comma_joined() {
        let client = client();
        let plan = client
            .call(&catalog::GEOCODING)
            .query("Brooklyn")
            .fields(["latitude", "longitude"])
            .plan()
            .unwrap();
        assert_eq!(plan.request.params["fields"], "latitude,longitude");
    }
}
