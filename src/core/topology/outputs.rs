use super::refs::{self, console_reference, reference};
use crate::utils::error::{ApiError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// A stack output as the engine should report it, e.g. the public API endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackOutput {
    pub name: String,
    pub value: Value,
}

impl StackOutput {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn referenced_resources(&self) -> BTreeSet<String> {
        refs::referenced_resources(&self.value)
    }

    /// 以引擎回報的屬性值取代所有引用
    pub fn resolve(&self, values: &HashMap<String, String>) -> Result<Value> {
        resolve_value(&self.value, values)
    }
}

fn resolve_value(value: &Value, values: &HashMap<String, String>) -> Result<Value> {
    match value {
        Value::String(template) => Ok(Value::String(refs::resolve(template, values)?)),
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_value(item, values))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

/// Resolves every output, collecting all unresolved references into one error.
pub fn resolve_outputs(
    outputs: &[StackOutput],
    values: &HashMap<String, String>,
) -> Result<Vec<(String, Value)>> {
    let mut resolved = Vec::with_capacity(outputs.len());
    let mut missing: Vec<String> = Vec::new();

    for output in outputs {
        match output.resolve(values) {
            Ok(value) => resolved.push((output.name.clone(), value)),
            Err(ApiError::UnresolvedReferenceError { references }) => {
                for reference in references {
                    if !missing.contains(&reference) {
                        missing.push(reference);
                    }
                }
            }
            Err(other) => return Err(other),
        }
    }

    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(ApiError::UnresolvedReferenceError { references: missing })
    }
}

/// Logical names the outputs point at.
pub struct OutputTargets<'a> {
    pub vpc: &'a str,
    pub public_subnets: &'a [String],
    pub private_subnets: &'a [String],
    pub bucket: &'a str,
    pub load_balancer: &'a str,
    pub cluster: &'a str,
    pub service: &'a str,
    pub log_group: &'a str,
}

pub fn stack_outputs(region: &str, targets: &OutputTargets<'_>) -> Vec<StackOutput> {
    let ids = |names: &[String]| -> Value {
        Value::Array(
            names
                .iter()
                .map(|name| Value::String(reference(name, "id")))
                .collect(),
        )
    };

    vec![
        StackOutput::new("vpc_id", reference(targets.vpc, "id")),
        StackOutput::new("public_subnet_ids", ids(targets.public_subnets)),
        StackOutput::new("private_subnet_ids", ids(targets.private_subnets)),
        StackOutput::new("model_bucket_name", reference(targets.bucket, "id")),
        StackOutput::new("model_bucket_arn", reference(targets.bucket, "arn")),
        StackOutput::new(
            "api_endpoint",
            format!("http://{}", reference(targets.load_balancer, "dns_name")),
        ),
        StackOutput::new("alb_dns_name", reference(targets.load_balancer, "dns_name")),
        StackOutput::new("ecs_cluster_name", reference(targets.cluster, "name")),
        StackOutput::new("ecs_cluster_arn", reference(targets.cluster, "arn")),
        StackOutput::new("ecs_service_name", reference(targets.service, "name")),
        StackOutput::new("log_group_name", reference(targets.log_group, "name")),
        StackOutput::new(
            "cloudwatch_dashboard_url",
            format!(
                "https://console.aws.amazon.com/cloudwatch/home?region={}#dashboards:name=ECS-{}",
                region,
                reference(targets.cluster, "name")
            ),
        ),
        StackOutput::new(
            "cloudwatch_logs_url",
            format!(
                "https://console.aws.amazon.com/cloudwatch/home?region={}#logsV2:log-groups/log-group/{}",
                region,
                console_reference(targets.log_group, "name")
            ),
        ),
    ]
}
