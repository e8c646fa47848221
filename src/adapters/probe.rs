use crate::core::topology::health::StatusMatcher;
use crate::domain::model::HealthResponse;
use crate::utils::error::{ApiError, Result};
use crate::utils::validation::validate_url;
use reqwest::Client;
use std::time::Duration;

/// Probes a running instance's `/health` endpoint the way the load balancer does.
pub struct HealthProbe {
    client: Client,
    matcher: StatusMatcher,
}

impl HealthProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            matcher: StatusMatcher::default(),
        })
    }

    pub fn with_matcher(mut self, matcher: StatusMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub async fn check(&self, url: &str) -> Result<HealthResponse> {
        validate_url("url", url)?;

        tracing::debug!("Probing health endpoint: {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        tracing::debug!("Health endpoint status: {}", status);

        if !self.matcher.matches(status) {
            return Err(ApiError::HealthCheckError {
                message: format!("{} returned HTTP {}", url, status),
            });
        }

        let body = response.text().await?;
        let health: HealthResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::HealthCheckError {
                message: format!("Unexpected response body from {}: {}", url, e),
            })?;

        if !health.is_healthy() {
            return Err(ApiError::HealthCheckError {
                message: format!("{} reported status '{}'", url, health.status),
            });
        }

        Ok(health)
    }
}
