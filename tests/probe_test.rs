use gpu_inference_api::core::topology::health::StatusMatcher;
use gpu_inference_api::{ApiError, HealthProbe};
use httpmock::prelude::*;
use std::time::Duration;

fn probe() -> HealthProbe {
    HealthProbe::new(Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_probe_accepts_healthy_service() {
    let server = MockServer::start();
    let health_mock = server.mock(|when, then| {
        when.method(GET).path("/health");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({ "status": "healthy" }));
    });

    let result = probe().check(&server.url("/health")).await;

    health_mock.assert();
    assert!(result.unwrap().is_healthy());
}

#[tokio::test]
async fn test_probe_rejects_server_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/health");
        then.status(500).body("boom");
    });

    let err = probe().check(&server.url("/health")).await.unwrap_err();

    assert!(matches!(err, ApiError::HealthCheckError { .. }));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_probe_rejects_unhealthy_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/health");
        then.status(200)
            .json_body(serde_json::json!({ "status": "degraded" }));
    });

    let err = probe().check(&server.url("/health")).await.unwrap_err();

    assert!(err.to_string().contains("degraded"));
}

#[tokio::test]
async fn test_probe_rejects_non_json_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/health");
        then.status(200).body("OK");
    });

    let err = probe().check(&server.url("/health")).await.unwrap_err();

    assert!(matches!(err, ApiError::HealthCheckError { .. }));
}

#[tokio::test]
async fn test_probe_custom_matcher() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/health");
        then.status(202).json_body(serde_json::json!({ "status": "healthy" }));
    });

    let strict = probe().with_matcher(StatusMatcher::parse("200").unwrap());
    assert!(strict.check(&server.url("/health")).await.is_err());

    let relaxed = probe().with_matcher(StatusMatcher::parse("200,202").unwrap());
    assert!(relaxed.check(&server.url("/health")).await.is_ok());
}

#[tokio::test]
async fn test_probe_rejects_invalid_url() {
    let err = probe().check("localhost:8080/health").await.unwrap_err();

    assert!(matches!(err, ApiError::InvalidConfigValueError { .. }));
}
