use crate::utils::monitor::ProcessStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "GPU Inference API";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub status: String,
}

impl ServiceInfo {
    pub fn running() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            version: SERVICE_VERSION.to_string(),
            status: "running".to_string(),
        }
    }
}

/// `/health` 回應，內容固定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessResponse {
    pub status: String,
    pub model_bucket: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    pub status: String,
    pub message: String,
    pub input_received: serde_json::Map<String, serde_json::Value>,
    pub note: String,
}

impl PredictResponse {
    pub fn placeholder(input: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            status: "success".to_string(),
            message: "Inference endpoint ready for model deployment".to_string(),
            input_received: input,
            note: "Deploy your model to S3 and update this endpoint".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub gpu_utilization: f64,
    pub average_latency_ms: f64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessStats>,
}
