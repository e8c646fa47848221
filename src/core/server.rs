//! HTTP surface of the inference service.
//!
//! `/health` is what the load balancer and the container health check
//! probe; it never touches the model store so a slow bucket cannot take
//! targets out of rotation.

use crate::config::ServiceConfig;
use crate::core::metrics::RequestMetrics;
use crate::domain::model::{
    HealthResponse, MetricsSnapshot, PredictResponse, ReadinessResponse, ServiceInfo,
};
use crate::domain::ports::{ConfigProvider, ModelStore};
use crate::utils::error::Result;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub metrics: Arc<RequestMetrics>,
    pub store: Option<Arc<dyn ModelStore>>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config: Arc::new(config),
            metrics: Arc::new(RequestMetrics::default()),
            store: None,
        }
    }

    pub fn with_metrics(mut self, metrics: RequestMetrics) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ModelStore>) -> Self {
        self.store = Some(store);
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .with_state(state)
}

async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    state.metrics.record(elapsed);
    tracing::debug!(
        "{} {} -> {} in {:?}",
        method,
        path,
        response.status().as_u16(),
        elapsed
    );
    response
}

async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::running())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let mut response = ReadinessResponse {
        status: "ready".to_string(),
        model_bucket: state.config.model_bucket().to_string(),
        region: state.config.region().to_string(),
        error: None,
    };

    if let Some(store) = &state.store {
        if let Err(e) = store.check_ready().await {
            tracing::warn!("⚠️ Model store {} not ready: {}", store.describe(), e);
            response.status = "not_ready".to_string();
            response.error = Some(e.to_string());
            return (StatusCode::SERVICE_UNAVAILABLE, Json(response));
        }
    }

    (StatusCode::OK, Json(response))
}

async fn predict(Json(payload): Json<Map<String, Value>>) -> Json<PredictResponse> {
    tracing::info!("Received prediction request with {} fields", payload.len());
    tracing::debug!("Prediction payload: {:?}", payload);

    Json(PredictResponse::placeholder(payload))
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("❌ Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("❌ Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Binds the configured address and serves until Ctrl-C or SIGTERM.
pub async fn serve(state: AppState) -> Result<()> {
    let config = state.config.clone();
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;

    tracing::info!("🚀 Starting GPU Inference API");
    tracing::info!("Model bucket: {}", config.model_bucket());
    tracing::info!("AWS region: {}", config.region());
    tracing::info!("Port: {}", config.port());
    if let Some(store) = &state.store {
        tracing::info!("📦 Model store: {}", store.describe());
    }

    let metrics = state.metrics.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    metrics.monitor().log_stats("Shutdown");
    tracing::info!("👋 Shutting down GPU Inference API");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ApiError;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt;

    struct FailingStore;

    #[async_trait]
    impl ModelStore for FailingStore {
        fn describe(&self) -> String {
            "s3://missing-bucket".to_string()
        }

        async fn check_ready(&self) -> Result<()> {
            Err(ApiError::ModelStoreError {
                message: "NoSuchBucket".to_string(),
            })
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ready_without_store() {
        let config = ServiceConfig {
            model_bucket: "gpu-inference-models".to_string(),
            ..ServiceConfig::default()
        };
        let app = router(AppState::new(config));

        let (status, body) = get_json(app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["model_bucket"], "gpu-inference-models");
        assert_eq!(body["region"], "us-west-2");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_ready_reports_store_failure() {
        let app = router(AppState::new(ServiceConfig::default()).with_store(Arc::new(FailingStore)));

        let (status, body) = get_json(app, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not_ready");
        assert!(body["error"].as_str().unwrap().contains("NoSuchBucket"));
    }

    #[tokio::test]
    async fn test_health_ignores_store_failure() {
        let app = router(AppState::new(ServiceConfig::default()).with_store(Arc::new(FailingStore)));

        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "status": "healthy" }));
    }
}
