use std::time::Duration;

use assert_matches::assert_matches;
use falgate_fal::{FalApi, FalApiError, FalConfig, UpstreamProvider};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> FalApi {
    let config = FalConfig::with_requests_url("test-key", format!("{}/requests", server.uri()));
    FalApi::new(&config).unwrap()
}

#[tokio::test]
async fn submit_posts_payload_with_key_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fal-ai/nano-banana-pro"))
        .and(header("Authorization", "Key test-key"))
        .and(body_json(json!({ "prompt": "a cat", "num_images": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "request_id": "job-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server);
    let response = api
        .submit(
            &format!("{}/fal-ai/nano-banana-pro", server.uri()),
            &json!({ "prompt": "a cat", "num_images": 1 }),
        )
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.job_id().as_deref(), Some("job-1"));
}

#[tokio::test]
async fn error_status_is_returned_not_raised() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/edit"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({ "detail": "at least one image url is required" })),
        )
        .mount(&server)
        .await;

    let api = client_for(&server);
    let response = api
        .submit(&format!("{}/edit", server.uri()), &json!({ "prompt": "x" }))
        .await
        .unwrap();

    assert_eq!(response.status, 422);
    assert!(!response.is_success());
    assert_eq!(response.body["detail"], "at least one image url is required");
}

#[tokio::test]
async fn non_json_body_is_kept_as_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/requests/job-1/status"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let response = client_for(&server).status("job-1").await.unwrap();
    assert_eq!(response.status, 502);
    assert_eq!(response.body, json!("Bad Gateway"));
}

#[tokio::test]
async fn status_and_result_use_request_paths() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/requests/job-1/status"))
        .and(header("Authorization", "Key test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "COMPLETED" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/requests/job-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "images": [{ "url": "https://cdn/x.png" }] })),
        )
        .mount(&server)
        .await;

    let api = client_for(&server);
    let status = api.status("job-1").await.unwrap();
    assert_eq!(status.body["status"], "COMPLETED");

    let result = api.result("job-1").await.unwrap();
    assert_eq!(result.body["images"][0]["url"], "https://cdn/x.png");
}

#[tokio::test]
async fn slow_upstream_is_a_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/requests/job-1/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "IN_QUEUE" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = FalConfig::with_requests_url("test-key", format!("{}/requests", server.uri()));
    config.timeout_secs = 1;
    let api = FalApi::new(&config).unwrap();

    let err = api.status("job-1").await.unwrap_err();
    assert!(err.is_timeout());
    assert_matches!(err, FalApiError::Request(_));
}
