use crate::config::toml_config::HealthCheckConfig;
use crate::utils::error::{ApiError, Result};
use serde::Serialize;

/// HTTP status matcher in target-group syntax: `200`, `200,204` or `200-299`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMatcher {
    ranges: Vec<(u16, u16)>,
}

impl StatusMatcher {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| ApiError::InvalidConfigValueError {
            field: "health_check.matcher".to_string(),
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        let mut ranges = Vec::new();
        for part in raw.split(',').map(str::trim) {
            let (low, high) = match part.split_once('-') {
                Some((low, high)) => (low.trim(), high.trim()),
                None => (part, part),
            };
            let low: u16 = low.parse().map_err(|_| invalid("Expected an HTTP status code"))?;
            let high: u16 = high.parse().map_err(|_| invalid("Expected an HTTP status code"))?;
            if !(200..=499).contains(&low) || !(200..=499).contains(&high) || low > high {
                return Err(invalid("Codes must be ascending and within 200-499"));
            }
            ranges.push((low, high));
        }
        Ok(Self { ranges })
    }

    pub fn matches(&self, status: u16) -> bool {
        self.ranges
            .iter()
            .any(|(low, high)| (*low..=*high).contains(&status))
    }
}

impl Default for StatusMatcher {
    fn default() -> Self {
        Self {
            ranges: vec![(200, 299)],
        }
    }
}

/// Target group health check; only targets passing it receive traffic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHealthCheck {
    pub enabled: bool,
    pub path: String,
    pub protocol: String,
    pub port: String,
    pub healthy_threshold: u32,
    pub unhealthy_threshold: u32,
    pub timeout: u32,
    pub interval: u32,
    pub matcher: String,
}

impl TargetHealthCheck {
    pub fn from_config(config: &HealthCheckConfig, port: u16) -> Self {
        Self {
            enabled: true,
            path: config.path.clone(),
            protocol: "HTTP".to_string(),
            port: port.to_string(),
            healthy_threshold: config.healthy_threshold,
            unhealthy_threshold: config.unhealthy_threshold,
            timeout: config.timeout_secs,
            interval: config.interval_secs,
            matcher: config.matcher.clone(),
        }
    }

    /// 連續失敗多久後目標會被移出 (秒)
    pub fn seconds_to_unhealthy(&self) -> u32 {
        self.unhealthy_threshold * self.interval
    }
}

/// Container-level health check run by the ECS agent inside the task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerHealthCheck {
    pub command: Vec<String>,
    pub interval: u32,
    pub timeout: u32,
    pub retries: u32,
    pub start_period: u32,
}

impl ContainerHealthCheck {
    pub fn probe_command(binary: &str, config: &HealthCheckConfig, port: u16) -> Self {
        Self {
            command: vec![
                "CMD".to_string(),
                binary.to_string(),
                "healthcheck".to_string(),
                "--url".to_string(),
                format!("http://localhost:{}{}", port, config.path),
                "--timeout-secs".to_string(),
                config.timeout_secs.to_string(),
                "--matcher".to_string(),
                config.matcher.clone(),
            ],
            interval: config.interval_secs,
            timeout: config.timeout_secs,
            retries: config.container_retries,
            start_period: config.container_start_period_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matcher_range() {
        let matcher = StatusMatcher::parse("200-299").unwrap();
        assert!(matcher.matches(200));
        assert!(matcher.matches(299));
        assert!(!matcher.matches(300));
        assert!(!matcher.matches(503));
    }

    #[test]
    fn test_matcher_list() {
        let matcher = StatusMatcher::parse("200, 204").unwrap();
        assert!(matcher.matches(204));
        assert!(!matcher.matches(201));
    }

    #[test]
    fn test_matcher_rejects_garbage() {
        assert!(StatusMatcher::parse("ok").is_err());
        assert!(StatusMatcher::parse("299-200").is_err());
        assert!(StatusMatcher::parse("100-199").is_err());
    }

    #[test]
    fn test_target_health_check_from_defaults() {
        let check = TargetHealthCheck::from_config(&HealthCheckConfig::default(), 8080);
        assert_eq!(check.path, "/health");
        assert_eq!(check.port, "8080");
        assert_eq!(check.seconds_to_unhealthy(), 90);
    }

    #[test]
    fn test_container_probe_uses_healthcheck_subcommand() {
        let check = ContainerHealthCheck::probe_command(
            "/usr/local/bin/gpu-inference-api",
            &HealthCheckConfig::default(),
            8080,
        );
        assert_eq!(check.command[2], "healthcheck");
        assert_eq!(check.command[4], "http://localhost:8080/health");
        assert_eq!(check.command.last().map(String::as_str), Some("200-299"));
        assert_eq!(check.retries, 3);
        assert_eq!(check.start_period, 60);
    }
}
