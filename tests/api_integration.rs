//! HTTP-level behaviour of the client against a local mock server:
//! mirror failover, envelopes, archive polling and business pagination.

use std::time::Duration;

use futures_util::TryStreamExt;
use outscraper::endpoints::catalog;
use outscraper::{
    Business, BusinessQuery, ClientConfig, EndpointResult, OutscraperClient, OutscraperError,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Nothing listens on port 1, so connections are refused at once.
const DEAD_MIRROR: &str = "http://127.0.0.1:1";

fn client_for(urls: &[&str]) -> OutscraperClient {
    let config = ClientConfig::new("test-key")
        .with_api_urls(urls.iter().copied())
        .with_requests_pause(Duration::from_millis(10))
        .with_max_ttl(Duration::from_secs(2));
    OutscraperClient::with_config(config).expect("client")
}

#[tokio::test]
async fn refused_mirror_fails_over_to_next() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocoding"))
        .and(query_param("query", "Brooklyn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"latitude": 40.6782, "longitude": -73.9442}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&[DEAD_MIRROR, &server.uri()]);
    let result = assert_ok!(client.call(&catalog::GEOCODING).query("Brooklyn").send().await);

    assert_eq!(result.data().map(<[serde_json::Value]>::len), Some(1));
}

#[tokio::test]
async fn requests_carry_auth_and_client_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/google-search-v3"))
        .and(header("x-api-key", "test-key"))
        .and(header_exists("client"))
        .and(query_param("query", "bitcoin"))
        .and(query_param("pagesPerQuery", "1"))
        .and(query_param("async", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [[]]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&[&server.uri()]);
    assert_ok!(client.call(&catalog::GOOGLE_SEARCH).query("bitcoin").send().await);
}

#[tokio::test]
async fn batch_queries_repeat_the_query_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/whitepages-phones"))
        .and(query_param("query", "+1 281 236 8208"))
        .and(query_param("query", "+1 281 236 2248"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "batch-1", "status": "Pending"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&[&server.uri()]);
    let result = assert_ok!(
        client
            .call(&catalog::WHITEPAGES_PHONES)
            .query(vec!["+1 281 236 8208", "+1 281 236 2248"])
            .async_request(true)
            .send()
            .await
    );
    assert_eq!(result.request_id(), Some("batch-1"));
}

#[tokio::test]
async fn every_mirror_failing_reports_all_passes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocoding"))
        .respond_with(ResponseTemplate::new(503))
        // Two mirrors, one pass plus two retries.
        .expect(6)
        .mount(&server)
        .await;

    let uri = server.uri();
    let client = client_for(&[&uri, &uri]);
    let err = assert_err!(client.call(&catalog::GEOCODING).query("Brooklyn").send().await);

    match err {
        OutscraperError::AllUrlsFailed { attempts, last_error } => {
            assert_eq!(attempts, 3);
            assert!(last_error.contains("503"), "{last_error}");
        }
        other => panic!("expected AllUrlsFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn client_errors_do_not_fail_over() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&first)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&second)
        .await;

    let client = client_for(&[&first.uri(), &second.uri()]);
    let err = assert_err!(client.call(&catalog::GEOCODING).query("Brooklyn").send().await);
    assert!(matches!(err, OutscraperError::Status { status: 401, .. }));
}

#[tokio::test]
async fn error_envelope_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/company-insights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": true,
            "errorMessage": "Please add credits to your account"
        })))
        .mount(&server)
        .await;

    let client = client_for(&[&server.uri()]);
    let err = assert_err!(
        client
            .call(&catalog::COMPANY_INSIGHTS)
            .query("outscraper.com")
            .send()
            .await
    );
    assert_eq!(err.to_string(), "error: Please add credits to your account");
}

#[tokio::test]
async fn queued_request_is_polled_to_completion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/emails-and-contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "req-7", "status": "Pending"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/requests/req-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "req-7", "status": "Pending"})))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/requests/req-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "req-7",
            "status": "Success",
            "data": [{"query": "outscraper.com", "emails": [{"value": "service@outscraper.com"}]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&[&server.uri()]);
    let result = assert_ok!(
        client
            .call(&catalog::EMAILS_AND_CONTACTS)
            .query("outscraper.com")
            .send()
            .await
    );

    let EndpointResult::Data(data) = result else {
        panic!("expected data");
    };
    assert_eq!(data[0]["emails"][0]["value"], "service@outscraper.com");
}

#[tokio::test]
async fn polling_gives_up_after_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/requests/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Pending"})))
        .mount(&server)
        .await;

    let config = ClientConfig::new("test-key")
        .with_api_urls([server.uri()])
        .with_requests_pause(Duration::from_millis(200))
        .with_max_ttl(Duration::from_secs(1));
    let client = OutscraperClient::with_config(config).expect("client");

    let err = assert_err!(client.wait_request_archive("slow").await);
    assert!(matches!(err, OutscraperError::Timeout { attempts: 5, .. }));
}

#[tokio::test]
async fn businesses_iterate_across_pages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/businesses"))
        .and(body_partial_json(json!({"cursor": "X"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"os_id": "c", "name": "Lucali"}],
            "next_cursor": null,
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/businesses"))
        .and(body_partial_json(json!({"limit": 2, "filters": {"country_code": "US"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"os_id": "a", "name": "Joe's"}, {"os_id": "b", "rating": 4.5, "reviews": 12}],
            "next_cursor": "X",
            "has_more": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&[&server.uri()]);
    let mut filters = serde_json::Map::new();
    filters.insert("country_code".into(), json!("US"));
    let query = BusinessQuery::new().raw_filters(filters).limit(2);

    let all: Vec<Business> = assert_ok!(client.businesses().iter_search(query).try_collect().await);

    let ids: Vec<_> = all.iter().filter_map(|b| b.os_id.as_deref()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert_eq!(all[1].to_value(), json!({"os_id": "b", "rating": 4.5, "reviews": 12}));
}
