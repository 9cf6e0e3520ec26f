//! Client behaviour against a mock Graph server over real HTTP.

use ads_core::{HttpMethod, RequestSpec};
use ads_transport::{
    BackoffPolicy, CancelToken, Client, ClientConfig, FixedJitter, PageOptions,
    RemediationCategory, TransportError,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, max_retries: u32) -> Client {
    let config = ClientConfig::new()
        .with_base_url(&server.uri())
        .expect("mock server uri")
        .with_access_token("EAAB-test")
        .with_max_retries(max_retries)
        .with_timeout(Duration::from_secs(5))
        .with_backoff(BackoffPolicy::new(
            Duration::from_millis(1),
            Duration::from_millis(5),
        ));
    Client::new(config)
        .expect("client build")
        .with_jitter(Arc::new(FixedJitter(0.0)))
}

#[tokio::test]
async fn get_sends_fields_and_bearer_and_reads_usage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/act_1/campaigns"))
        .and(query_param("fields", "id,name,status"))
        .and(query_param("effective_status", "[\"ACTIVE\"]"))
        .and(header("Authorization", "Bearer EAAB-test"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-app-usage", r#"{"call_count":12,"total_time":3,"total_cputime":2}"#)
                .set_body_json(json!({"data": [{"id": "1", "name": "Q3", "status": "ACTIVE"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let spec = RequestSpec::new(HttpMethod::Get, "act_1/campaigns")
        .unwrap()
        .with_fields(["id", "name", "status"])
        .with_param("effective_status", "[\"ACTIVE\"]");
    let response = client(&server, 0)
        .execute(&spec, &CancelToken::new())
        .await
        .expect("request should succeed");

    assert_eq!(response.status, 200);
    assert_eq!(response.attempts, 1);
    assert_eq!(response.payload["data"][0]["name"], "Q3");
    let usage = response.rate_limit.expect("usage header parsed");
    assert_eq!(usage.peak_usage(), Some(12.0));
}

#[tokio::test]
async fn post_sends_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v21.0/act_1/adsets"))
        .and(body_string_contains("name=Prospecting"))
        .and(body_string_contains("daily_budget=5000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "2385"})))
        .expect(1)
        .mount(&server)
        .await;

    let spec = RequestSpec::new(HttpMethod::Post, "act_1/adsets")
        .unwrap()
        .with_param("name", "Prospecting")
        .with_param("daily_budget", "5000");
    let response = client(&server, 0)
        .execute(&spec, &CancelToken::new())
        .await
        .expect("create should succeed");
    assert_eq!(response.payload["id"], "2385");
}

#[tokio::test]
async fn throttled_request_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/me/adaccounts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "(#17) User request limit reached",
                "type": "OAuthException",
                "code": 17,
                "fbtrace_id": "Throttle1"
            }
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v21.0/me/adaccounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let spec = RequestSpec::new(HttpMethod::Get, "me/adaccounts").unwrap();
    let response = client(&server, 3)
        .execute(&spec, &CancelToken::new())
        .await
        .expect("third attempt should succeed");
    assert_eq!(response.attempts, 3);
}

#[tokio::test]
async fn permission_error_surfaces_classified_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v21.0/act_1/ads"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "message": "(#200) Requires ads_management permission",
                "type": "OAuthException",
                "code": 200,
                "fbtrace_id": "Perm1"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let spec = RequestSpec::new(HttpMethod::Post, "act_1/ads")
        .unwrap()
        .with_param("name", "Spring");
    let err = client(&server, 3)
        .execute(&spec, &CancelToken::new())
        .await
        .unwrap_err();

    let TransportError::Api(classified) = err else {
        panic!("expected a classified API error");
    };
    assert_eq!(classified.category(), RemediationCategory::Permission);
    assert_eq!(classified.fbtrace_id.as_deref(), Some("Perm1"));
    assert!(!classified.retryable);
    assert_eq!(classified.diagnostics["path"], "act_1/ads");
}

#[tokio::test]
async fn server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/act_1/insights"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let spec = RequestSpec::new(HttpMethod::Get, "act_1/insights").unwrap();
    let err = client(&server, 2)
        .execute(&spec, &CancelToken::new())
        .await
        .unwrap_err();

    match err {
        TransportError::RetryExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert_eq!(last.error_type, "UnparsedResponse");
            assert_eq!(last.status, 503);
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn follows_next_links_across_pages() {
    let server = MockServer::start().await;
    let next = format!("{}/v21.0/act_1/ads?after=p2", server.uri());
    Mock::given(method("GET"))
        .and(path("/v21.0/act_1/ads"))
        .and(query_param("fields", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "1"}, {"id": "2"}],
            "paging": {"cursors": {"after": "p2"}, "next": next}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v21.0/act_1/ads"))
        .and(query_param("after", "p2"))
        .and(header("Authorization", "Bearer EAAB-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "3"}],
            "paging": {"cursors": {"before": "p2"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let spec = RequestSpec::new(HttpMethod::Get, "act_1/ads")
        .unwrap()
        .with_fields(["id"]);
    let paged = client(&server, 0)
        .execute_paged(&spec, &PageOptions::default(), &CancelToken::new())
        .await
        .expect("paging should succeed");

    let ids: Vec<_> = paged.data.iter().map(|v| v["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["1", "2", "3"]);
    assert_eq!(paged.pages, 2);
    assert!(!paged.truncated);
}

#[tokio::test]
async fn deadline_cancels_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/act_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "act_1"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let cancel = CancelToken::new();
    cancel.cancel_after(Duration::from_millis(50));
    let spec = RequestSpec::new(HttpMethod::Get, "act_1").unwrap();
    let err = client(&server, 3).execute(&spec, &cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.kind(), "cancelled");
}
