use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use gpu_inference_api::{router, AppState, LocalModelStore, ServiceConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_config() -> ServiceConfig {
    ServiceConfig {
        model_bucket: "gpu-inference-models-dev".to_string(),
        ..ServiceConfig::default()
    }
}

async fn send(app: Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Vec<u8>)> {
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, bytes.to_vec()))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_returns_exact_body() -> anyhow::Result<()> {
    let app = router(AppState::new(test_config()));

    let (status, body) = send(app, get("/health")).await?;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body)?;
    assert_eq!(body, json!({ "status": "healthy" }));
    Ok(())
}

#[tokio::test]
async fn test_root_describes_service() -> anyhow::Result<()> {
    let app = router(AppState::new(test_config()));

    let (status, body) = send(app, get("/")).await?;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body)?;
    assert_eq!(body["service"], "GPU Inference API");
    assert_eq!(body["status"], "running");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[tokio::test]
async fn test_ready_with_local_model_directory() -> anyhow::Result<()> {
    let models = TempDir::new()?;
    let state = AppState::new(test_config())
        .with_store(Arc::new(LocalModelStore::new(models.path())));

    let (status, body) = send(router(state), get("/ready")).await?;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body)?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["model_bucket"], "gpu-inference-models-dev");
    assert_eq!(body["region"], "us-west-2");
    Ok(())
}

#[tokio::test]
async fn test_ready_with_missing_model_directory() -> anyhow::Result<()> {
    let models = TempDir::new()?;
    let state = AppState::new(test_config())
        .with_store(Arc::new(LocalModelStore::new(models.path().join("absent"))));

    let (status, body) = send(router(state), get("/ready")).await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = serde_json::from_slice(&body)?;
    assert_eq!(body["status"], "not_ready");
    assert!(body["error"].as_str().unwrap_or_default().contains("absent"));
    Ok(())
}

#[tokio::test]
async fn test_predict_echoes_input() -> anyhow::Result<()> {
    let app = router(AppState::new(test_config()));

    let (status, body) = send(
        app,
        post_json("/predict", r#"{"prompt": "hello", "max_tokens": 16}"#),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body)?;
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Inference endpoint ready for model deployment");
    assert_eq!(body["input_received"], json!({ "prompt": "hello", "max_tokens": 16 }));
    assert_eq!(body["note"], "Deploy your model to S3 and update this endpoint");
    Ok(())
}

#[tokio::test]
async fn test_predict_rejects_non_object_body() -> anyhow::Result<()> {
    let app = router(AppState::new(test_config()));

    let (status, _) = send(app, post_json("/predict", "[1, 2, 3]")).await?;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn test_predict_rejects_malformed_json() -> anyhow::Result<()> {
    let app = router(AppState::new(test_config()));

    let (status, _) = send(app, post_json("/predict", "{\"prompt\": ")).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_metrics_counts_requests() -> anyhow::Result<()> {
    let app = router(AppState::new(test_config()));

    for _ in 0..3 {
        let (status, _) = send(app.clone(), get("/health")).await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(app, get("/metrics")).await?;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body)?;
    // 計數在回應送出後才更新，/metrics 自己不算在內
    assert_eq!(body["requests_total"], 3);
    assert_eq!(body["gpu_utilization"], 0.0);
    assert!(body["average_latency_ms"].as_f64().unwrap_or(-1.0) >= 0.0);
    assert!(body.get("started_at").is_some());
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_not_found() -> anyhow::Result<()> {
    let app = router(AppState::new(test_config()));

    let (status, _) = send(app, get("/models")).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
