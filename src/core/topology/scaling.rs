//! Auto-scaling descriptors for the ECS service and its GPU instance group.
//!
//! The managed scaler owns the actual decisions; [`ScalingPolicy::recommend`]
//! mirrors its target-tracking arithmetic so the configured thresholds can be
//! reasoned about and tested before deploying.

use crate::config::toml_config::ScalingConfig;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PredefinedMetric {
    #[serde(rename = "ECSServiceAverageCPUUtilization")]
    ServiceAverageCpu,
    #[serde(rename = "ECSServiceAverageMemoryUtilization")]
    ServiceAverageMemory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingDirection {
    Out,
    In,
    Hold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetTrackingPolicy {
    pub predefined_metric_type: PredefinedMetric,
    pub target_value: f64,
    pub scale_in_cooldown: u32,
    pub scale_out_cooldown: u32,
}

impl TargetTrackingPolicy {
    /// `targetTrackingScalingPolicyConfiguration` block of an application auto-scaling policy.
    pub fn to_configuration(&self) -> Value {
        json!({
            "predefinedMetricSpecification": {
                "predefinedMetricType": self.predefined_metric_type,
            },
            "targetValue": self.target_value,
            "scaleInCooldown": self.scale_in_cooldown,
            "scaleOutCooldown": self.scale_out_cooldown,
        })
    }

    /// Capacity this policy alone would ask for, before clamping.
    pub fn desired_capacity(&self, current: u32, observed_percent: f64) -> u32 {
        if current == 0 {
            return if observed_percent > self.target_value { 1 } else { 0 };
        }
        let ratio = observed_percent / self.target_value;
        (f64::from(current) * ratio).ceil() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityBounds {
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub desired_capacity: u32,
}

impl CapacityBounds {
    /// 未驗證的設定可能 min > max，此時以 max 為上限
    pub fn clamp(&self, capacity: u32) -> u32 {
        capacity.max(self.min_capacity).min(self.max_capacity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalingPolicy {
    pub bounds: CapacityBounds,
    pub cpu: TargetTrackingPolicy,
    pub memory: TargetTrackingPolicy,
}

impl ScalingPolicy {
    pub fn from_config(config: &ScalingConfig) -> Self {
        let policy = |metric, target| TargetTrackingPolicy {
            predefined_metric_type: metric,
            target_value: target,
            scale_in_cooldown: config.scale_in_cooldown_secs,
            scale_out_cooldown: config.scale_out_cooldown_secs,
        };

        Self {
            bounds: CapacityBounds {
                min_capacity: config.min_capacity,
                max_capacity: config.max_capacity,
                desired_capacity: config.desired_capacity,
            },
            cpu: policy(PredefinedMetric::ServiceAverageCpu, config.cpu_target_percent),
            memory: policy(
                PredefinedMetric::ServiceAverageMemory,
                config.memory_target_percent,
            ),
        }
    }

    /// Capacity the target-tracking policies converge on.
    ///
    /// Any policy may scale out; scale in only happens when every policy
    /// agrees, and never below the largest per-policy request.
    pub fn recommend(&self, current: u32, cpu_percent: f64, memory_percent: f64) -> u32 {
        let cpu = self.cpu.desired_capacity(current, cpu_percent);
        let memory = self.memory.desired_capacity(current, memory_percent);
        let wanted = cpu.max(memory);

        let scale_out = wanted > current;
        let scale_in = cpu < current && memory < current;
        let next = if scale_out || scale_in { wanted } else { current };
        self.bounds.clamp(next)
    }

    pub fn direction(&self, current: u32, cpu_percent: f64, memory_percent: f64) -> ScalingDirection {
        let next = self.recommend(current, cpu_percent, memory_percent);
        match next.cmp(&current) {
            std::cmp::Ordering::Greater => ScalingDirection::Out,
            std::cmp::Ordering::Less => ScalingDirection::In,
            std::cmp::Ordering::Equal => ScalingDirection::Hold,
        }
    }

    /// 擴縮後需要等待的冷卻時間 (秒)
    pub fn cooldown_secs(&self, direction: ScalingDirection) -> u32 {
        match direction {
            ScalingDirection::Out => self.cpu.scale_out_cooldown.max(self.memory.scale_out_cooldown),
            ScalingDirection::In => self.cpu.scale_in_cooldown.max(self.memory.scale_in_cooldown),
            ScalingDirection::Hold => 0,
        }
    }
}
