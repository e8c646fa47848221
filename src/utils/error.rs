use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Topology error in '{resource}': {message}")]
    TopologyError { resource: String, message: String },

    #[error("Unresolved references: {}", references.join(", "))]
    UnresolvedReferenceError { references: Vec<String> },

    #[error("Model store unavailable: {message}")]
    ModelStoreError { message: String },

    #[error("Health check failed: {message}")]
    HealthCheckError { message: String },
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Topology,
    Storage,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::ConfigError { .. }
            | ApiError::MissingConfigError { .. }
            | ApiError::ConfigValidationError { .. }
            | ApiError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ApiError::HttpError(_) | ApiError::HealthCheckError { .. } => ErrorCategory::Network,
            ApiError::TopologyError { .. } | ApiError::UnresolvedReferenceError { .. } => {
                ErrorCategory::Topology
            }
            ApiError::ModelStoreError { .. } | ApiError::IoError(_) => ErrorCategory::Storage,
            ApiError::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Storage => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Topology => ErrorSeverity::High,
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ApiError::HttpError(_) | ApiError::HealthCheckError { .. } => {
                "Check that the service is running and reachable on the configured port"
            }
            ApiError::IoError(_) => "Check file paths and permissions",
            ApiError::SerializationError(_) => "Check that the JSON input is well-formed",
            ApiError::ConfigError { .. } | ApiError::MissingConfigError { .. } => {
                "Set the missing environment variable or command line flag"
            }
            ApiError::ConfigValidationError { .. } | ApiError::InvalidConfigValueError { .. } => {
                "Fix the reported field in the stack configuration or environment"
            }
            ApiError::TopologyError { .. } => {
                "Check resource names and dependencies in the deployment plan"
            }
            ApiError::UnresolvedReferenceError { .. } => {
                "Provide values for every referenced resource attribute"
            }
            ApiError::ModelStoreError { .. } => {
                "Verify MODEL_BUCKET / MODEL_DIR and the task role's S3 permissions"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Network => format!("Service unreachable: {}", self),
            ErrorCategory::Topology => format!("Deployment plan is invalid: {}", self),
            ErrorCategory::Storage => format!("Storage problem: {}", self),
            ErrorCategory::Internal => format!("Internal error: {}", self),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Configuration => StatusCode::BAD_REQUEST,
            ErrorCategory::Network | ErrorCategory::Storage => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCategory::Topology | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 對應 CLI 結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!("❌ Request failed: {} (Category: {:?})", self, self.category());
        let body = serde_json::json!({ "detail": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = ApiError::InvalidConfigValueError {
            field: "scaling.max".to_string(),
            value: "0".to_string(),
            reason: "Value must be at least 1".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.user_friendly_message().contains("scaling.max"));
    }

    #[test]
    fn test_model_store_error_maps_to_503() {
        let err = ApiError::ModelStoreError {
            message: "bucket not found".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_unresolved_references_are_listed() {
        let err = ApiError::UnresolvedReferenceError {
            references: vec!["alb.dns_name".to_string(), "vpc.id".to_string()],
        };
        assert_eq!(err.to_string(), "Unresolved references: alb.dns_name, vpc.id");
    }
}
