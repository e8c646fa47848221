#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ApiError, Result};
use crate::utils::validation::{
    validate_aws_region, validate_non_empty_string, validate_path, validate_positive_number,
    validate_s3_bucket_name, Validate,
};
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Runtime settings of the inference service, read from the task environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    pub model_bucket: String,
    pub region: String,
    pub port: u16,
    pub host: String,
    pub model_dir: Option<String>,
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_bucket: String::new(),
            region: DEFAULT_REGION.to_string(),
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_string(),
            model_dir: None,
            log_format: LogFormat::Compact,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 從任意 key/value 來源建立設定 (測試時不必動到行程環境變數)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ApiError::InvalidConfigValueError {
                    field: "PORT".to_string(),
                    value: raw.clone(),
                    reason: format!("Not a valid port number: {}", e),
                })?,
            None => DEFAULT_PORT,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("compact") => LogFormat::Compact,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ApiError::InvalidConfigValueError {
                    field: "LOG_FORMAT".to_string(),
                    value: other.to_string(),
                    reason: "Expected 'compact' or 'json'".to_string(),
                })
            }
        };

        Ok(Self {
            model_bucket: lookup("MODEL_BUCKET").unwrap_or_default(),
            region: lookup("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            port,
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            model_dir: lookup("MODEL_DIR").filter(|dir| !dir.is_empty()),
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ConfigProvider for ServiceConfig {
    fn model_bucket(&self) -> &str {
        &self.model_bucket
    }

    fn region(&self) -> &str {
        &self.region
    }

    fn port(&self) -> u16 {
        self.port
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("PORT", self.port, 1)?;
        validate_aws_region("AWS_REGION", &self.region)?;
        validate_non_empty_string("HOST", &self.host)?;

        // 未設定 bucket 時允許空字串
        if !self.model_bucket.is_empty() {
            validate_s3_bucket_name("MODEL_BUCKET", &self.model_bucket)?;
        }

        if let Some(dir) = &self.model_dir {
            validate_path("MODEL_DIR", dir)?;
        }

        tracing::debug!("✅ Service configuration validation passed");
        Ok(())
    }
}
