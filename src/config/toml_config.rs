use crate::core::topology::cidr::Ipv4Cidr;
use crate::core::topology::health::StatusMatcher;
use crate::core::topology::instance::InstanceSpec;
use crate::utils::error::{ApiError, Result};
use crate::utils::validation::{
    validate_aws_region, validate_http_path, validate_non_empty_string, validate_positive_number,
    validate_range, validate_resource_name, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// CloudWatch Logs 可接受的保留天數
pub const LOG_RETENTION_DAYS: &[u32] = &[
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922,
    3288, 3653,
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StackConfig {
    pub stack: StackSection,
    pub network: NetworkConfig,
    pub compute: ComputeConfig,
    pub service: ServiceSection,
    pub scaling: ScalingConfig,
    pub health_check: HealthCheckConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StackSection {
    pub project: String,
    pub environment: String,
    pub region: String,
    pub availability_zones: Vec<String>,
    pub resource_prefix: String,
}

impl Default for StackSection {
    fn default() -> Self {
        Self {
            project: "gpu-inference-api".to_string(),
            environment: "dev".to_string(),
            region: "us-west-2".to_string(),
            availability_zones: vec!["us-west-2a".to_string(), "us-west-2b".to_string()],
            resource_prefix: "gpu-inference".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    pub vpc_cidr: String,
    pub public_subnets: Vec<String>,
    pub private_subnets: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            vpc_cidr: "10.0.0.0/16".to_string(),
            public_subnets: vec!["10.0.1.0/24".to_string(), "10.0.2.0/24".to_string()],
            private_subnets: vec!["10.0.11.0/24".to_string(), "10.0.12.0/24".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComputeConfig {
    pub instance_type: String,
    pub ami_name_filter: String,
    pub volume_size_gb: u32,
    pub volume_type: String,
    pub capacity_target_percent: u32,
    pub instance_warmup_secs: u32,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            instance_type: "g4dn.xlarge".to_string(),
            ami_name_filter: "amzn2-ami-ecs-gpu-hvm-*-x86_64-ebs".to_string(),
            volume_size_gb: 100,
            volume_type: "gp3".to_string(),
            capacity_target_percent: 80,
            instance_warmup_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceSection {
    pub image: String,
    pub container_name: String,
    pub container_port: u16,
    pub cpu: u32,
    pub memory_mb: u32,
    pub gpus: u32,
    pub desired_count: u32,
    pub deployment_maximum_percent: u32,
    pub deployment_minimum_healthy_percent: u32,
    pub health_check_grace_period_secs: u32,
    /// Path of this binary inside the image, used for the container health check.
    pub healthcheck_binary: String,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            image: "gpu-inference-api:latest".to_string(),
            container_name: "gpu-inference-api".to_string(),
            container_port: 8080,
            cpu: 2048,
            memory_mb: 8192,
            gpus: 1,
            desired_count: 1,
            deployment_maximum_percent: 200,
            deployment_minimum_healthy_percent: 50,
            health_check_grace_period_secs: 60,
            healthcheck_binary: "/usr/local/bin/gpu-inference-api".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScalingConfig {
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub desired_capacity: u32,
    pub cpu_target_percent: f64,
    pub memory_target_percent: f64,
    pub scale_in_cooldown_secs: u32,
    pub scale_out_cooldown_secs: u32,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            min_capacity: 1,
            max_capacity: 3,
            desired_capacity: 1,
            cpu_target_percent: 70.0,
            memory_target_percent: 80.0,
            scale_in_cooldown_secs: 300,
            scale_out_cooldown_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HealthCheckConfig {
    pub path: String,
    pub healthy_threshold: u32,
    pub unhealthy_threshold: u32,
    pub timeout_secs: u32,
    pub interval_secs: u32,
    pub matcher: String,
    pub deregistration_delay_secs: u32,
    pub container_retries: u32,
    pub container_start_period_secs: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            path: "/health".to_string(),
            healthy_threshold: 2,
            unhealthy_threshold: 3,
            timeout_secs: 5,
            interval_secs: 30,
            matcher: "200-299".to_string(),
            deregistration_delay_secs: 30,
            container_retries: 3,
            container_start_period_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub versioning: bool,
    pub sse_algorithm: String,
    pub noncurrent_version_expiration_days: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            versioning: true,
            sse_algorithm: "AES256".to_string(),
            noncurrent_version_expiration_days: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_retention_days: u32,
    pub evaluation_periods: u32,
    pub cpu_alarm_threshold: f64,
    pub memory_alarm_threshold: f64,
    pub alb_5xx_threshold: f64,
    pub unhealthy_host_threshold: f64,
    pub alarm_actions: Vec<String>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_retention_days: 7,
            evaluation_periods: 2,
            cpu_alarm_threshold: 80.0,
            memory_alarm_threshold: 85.0,
            alb_5xx_threshold: 10.0,
            unhealthy_host_threshold: 0.0,
            alarm_actions: Vec::new(),
        }
    }
}

impl StackConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ApiError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ApiError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${STACK_ENV})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| ApiError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn environment(&self) -> &str {
        &self.stack.environment
    }

    /// `<prefix>-<suffix>`，資源邏輯名稱
    pub fn logical_name(&self, suffix: &str) -> String {
        format!("{}-{}", self.stack.resource_prefix, suffix)
    }

    /// `<prefix>-<suffix>-<environment>`，用於 Name 標籤
    pub fn display_name(&self, suffix: &str) -> String {
        format!(
            "{}-{}-{}",
            self.stack.resource_prefix, suffix, self.stack.environment
        )
    }

    fn validate_stack(&self) -> Result<()> {
        validate_non_empty_string("stack.project", &self.stack.project)?;
        validate_non_empty_string("stack.environment", &self.stack.environment)?;
        // 前綴會成為每個資源名稱的一部分，必須能被引用語法辨識
        validate_resource_name("stack.resource_prefix", &self.stack.resource_prefix)?;
        validate_aws_region("stack.region", &self.stack.region)?;

        if self.stack.availability_zones.len() < 2 {
            return Err(ApiError::ConfigValidationError {
                field: "stack.availability_zones".to_string(),
                message: "An application load balancer needs at least two availability zones"
                    .to_string(),
            });
        }
        let mut seen_zones = std::collections::HashSet::new();
        for zone in &self.stack.availability_zones {
            if !seen_zones.insert(zone.as_str()) {
                return Err(ApiError::ConfigValidationError {
                    field: "stack.availability_zones".to_string(),
                    message: format!("Availability zone '{}' is listed more than once", zone),
                });
            }
            if !zone.starts_with(&self.stack.region) {
                return Err(ApiError::InvalidConfigValueError {
                    field: "stack.availability_zones".to_string(),
                    value: zone.clone(),
                    reason: format!("Zone is not in region {}", self.stack.region),
                });
            }
        }
        Ok(())
    }

    fn validate_network(&self) -> Result<()> {
        let zones = self.stack.availability_zones.len();
        for (field, subnets) in [
            ("network.public_subnets", &self.network.public_subnets),
            ("network.private_subnets", &self.network.private_subnets),
        ] {
            if subnets.len() != zones {
                return Err(ApiError::ConfigValidationError {
                    field: field.to_string(),
                    message: format!(
                        "Expected one subnet per availability zone ({}), found {}",
                        zones,
                        subnets.len()
                    ),
                });
            }
        }

        let vpc = Ipv4Cidr::parse("network.vpc_cidr", &self.network.vpc_cidr)?;
        let mut seen: Vec<(String, Ipv4Cidr)> = Vec::new();
        for raw in self
            .network
            .public_subnets
            .iter()
            .chain(self.network.private_subnets.iter())
        {
            let subnet = Ipv4Cidr::parse("network.subnets", raw)?;
            if !vpc.contains(&subnet) {
                return Err(ApiError::InvalidConfigValueError {
                    field: "network.subnets".to_string(),
                    value: raw.clone(),
                    reason: format!("Subnet is outside the VPC range {}", vpc),
                });
            }
            if let Some((other, _)) = seen.iter().find(|(_, existing)| existing.overlaps(&subnet)) {
                return Err(ApiError::InvalidConfigValueError {
                    field: "network.subnets".to_string(),
                    value: raw.clone(),
                    reason: format!("Subnet overlaps {}", other),
                });
            }
            seen.push((raw.clone(), subnet));
        }
        Ok(())
    }

    fn validate_compute(&self) -> Result<()> {
        validate_non_empty_string("compute.instance_type", &self.compute.instance_type)?;
        validate_range("compute.volume_size_gb", self.compute.volume_size_gb, 30, 16384)?;
        validate_range(
            "compute.capacity_target_percent",
            self.compute.capacity_target_percent,
            1,
            100,
        )?;

        match InstanceSpec::lookup(&self.compute.instance_type) {
            Some(spec) => spec.ensure_fits(
                self.service.cpu,
                self.service.memory_mb,
                self.service.gpus,
            )?,
            None => tracing::warn!(
                "⚠️ Unknown instance type '{}', skipping task capacity check",
                self.compute.instance_type
            ),
        }
        Ok(())
    }

    fn validate_service(&self) -> Result<()> {
        validate_non_empty_string("service.image", &self.service.image)?;
        validate_non_empty_string("service.container_name", &self.service.container_name)?;
        validate_positive_number("service.container_port", self.service.container_port, 1)?;
        validate_positive_number("service.cpu", self.service.cpu, 128)?;
        validate_positive_number("service.memory_mb", self.service.memory_mb, 128)?;
        validate_range(
            "service.deployment_minimum_healthy_percent",
            self.service.deployment_minimum_healthy_percent,
            0,
            100,
        )?;
        validate_range(
            "service.deployment_maximum_percent",
            self.service.deployment_maximum_percent,
            100,
            200,
        )?;
        validate_range(
            "service.desired_count",
            self.service.desired_count,
            self.scaling.min_capacity,
            self.scaling.max_capacity,
        )?;
        Ok(())
    }

    fn validate_scaling(&self) -> Result<()> {
        let scaling = &self.scaling;
        validate_positive_number("scaling.min_capacity", scaling.min_capacity, 1)?;
        validate_positive_number("scaling.max_capacity", scaling.max_capacity, scaling.min_capacity)?;
        validate_range(
            "scaling.desired_capacity",
            scaling.desired_capacity,
            scaling.min_capacity,
            scaling.max_capacity,
        )?;

        for (field, value) in [
            ("scaling.cpu_target_percent", scaling.cpu_target_percent),
            ("scaling.memory_target_percent", scaling.memory_target_percent),
        ] {
            if !(value > 0.0 && value <= 100.0) {
                return Err(ApiError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "Target must be within (0, 100]".to_string(),
                });
            }
        }

        validate_positive_number("scaling.scale_in_cooldown_secs", scaling.scale_in_cooldown_secs, 1)?;
        validate_positive_number(
            "scaling.scale_out_cooldown_secs",
            scaling.scale_out_cooldown_secs,
            1,
        )?;
        Ok(())
    }

    fn validate_health_check(&self) -> Result<()> {
        let hc = &self.health_check;
        validate_http_path("health_check.path", &hc.path)?;
        StatusMatcher::parse(&hc.matcher)?;
        validate_range("health_check.healthy_threshold", hc.healthy_threshold, 2, 10)?;
        validate_range("health_check.unhealthy_threshold", hc.unhealthy_threshold, 2, 10)?;
        validate_range("health_check.interval_secs", hc.interval_secs, 5, 300)?;
        validate_range("health_check.timeout_secs", hc.timeout_secs, 2, 120)?;
        if hc.timeout_secs >= hc.interval_secs {
            return Err(ApiError::InvalidConfigValueError {
                field: "health_check.timeout_secs".to_string(),
                value: hc.timeout_secs.to_string(),
                reason: format!("Timeout must be shorter than the interval ({}s)", hc.interval_secs),
            });
        }
        validate_range(
            "health_check.deregistration_delay_secs",
            hc.deregistration_delay_secs,
            0,
            3600,
        )?;
        validate_range("health_check.container_retries", hc.container_retries, 1, 10)?;
        Ok(())
    }

    fn validate_storage_and_monitoring(&self) -> Result<()> {
        validate_positive_number(
            "storage.noncurrent_version_expiration_days",
            self.storage.noncurrent_version_expiration_days,
            1,
        )?;
        if !["AES256", "aws:kms"].contains(&self.storage.sse_algorithm.as_str()) {
            return Err(ApiError::InvalidConfigValueError {
                field: "storage.sse_algorithm".to_string(),
                value: self.storage.sse_algorithm.clone(),
                reason: "Valid algorithms: AES256, aws:kms".to_string(),
            });
        }

        if !LOG_RETENTION_DAYS.contains(&self.monitoring.log_retention_days) {
            return Err(ApiError::InvalidConfigValueError {
                field: "monitoring.log_retention_days".to_string(),
                value: self.monitoring.log_retention_days.to_string(),
                reason: "Not a retention period CloudWatch Logs accepts".to_string(),
            });
        }
        validate_positive_number("monitoring.evaluation_periods", self.monitoring.evaluation_periods, 1)?;
        Ok(())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        self.validate_stack()?;
        self.validate_network()?;
        self.validate_scaling()?;
        self.validate_service()?;
        self.validate_compute()?;
        self.validate_health_check()?;
        self.validate_storage_and_monitoring()?;
        Ok(())
    }
}

impl Validate for StackConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
