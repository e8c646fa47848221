//! `${resource.attribute}` references between resources.
//!
//! Values the engine only knows after creation (ids, ARNs, DNS names) are
//! written as references. An optional `:console` filter percent-encodes `/`
//! the way the CloudWatch console expects it in URL fragments.

use crate::utils::error::{ApiError, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z0-9_-]+)\.([A-Za-z0-9_]+)(?::([a-z]+))?\}")
            .expect("reference pattern is a valid regex")
    })
}

pub fn reference(resource: &str, attribute: &str) -> String {
    format!("${{{}.{}}}", resource, attribute)
}

pub fn console_reference(resource: &str, attribute: &str) -> String {
    format!("${{{}.{}:console}}", resource, attribute)
}

/// Names of all resources referenced anywhere inside `value`.
pub fn referenced_resources(value: &Value) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    collect(value, &mut found);
    found
}

fn collect(value: &Value, found: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            for caps in reference_pattern().captures_iter(s) {
                found.insert(caps[1].to_string());
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect(item, found)),
        Value::Object(map) => map.values().for_each(|item| collect(item, found)),
        _ => {}
    }
}

fn apply_filter(value: &str, filter: Option<&str>) -> String {
    match filter {
        Some("console") => value.replace('/', "$252F"),
        _ => value.to_string(),
    }
}

/// Substitutes every reference in `template` from `values` (keyed `resource.attribute`).
pub fn resolve(template: &str, values: &HashMap<String, String>) -> Result<String> {
    let mut missing = Vec::new();
    let resolved = reference_pattern().replace_all(template, |caps: &Captures| {
        let key = format!("{}.{}", &caps[1], &caps[2]);
        match values.get(&key) {
            Some(value) => apply_filter(value, caps.get(3).map(|m| m.as_str())),
            None => {
                missing.push(key);
                caps[0].to_string()
            }
        }
    });

    if missing.is_empty() {
        Ok(resolved.into_owned())
    } else {
        Err(ApiError::UnresolvedReferenceError { references: missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_format() {
        assert_eq!(reference("gpu-inference-vpc", "id"), "${gpu-inference-vpc.id}");
        assert_eq!(
            console_reference("gpu-inference-log-group", "name"),
            "${gpu-inference-log-group.name:console}"
        );
    }

    #[test]
    fn test_referenced_resources_walks_nested_values() {
        let value = json!({
            "vpcId": "${gpu-inference-vpc.id}",
            "subnets": ["${subnet-a.id}", "${subnet-b.id}"],
            "nested": { "arn": "prefix-${gpu-inference-models.arn}/*" },
            "port": 8080
        });

        let found = referenced_resources(&value);
        let names: Vec<&str> = found.iter().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["gpu-inference-models", "gpu-inference-vpc", "subnet-a", "subnet-b"]
        );
    }

    #[test]
    fn test_resolve_substitutes_and_encodes() {
        let mut values = HashMap::new();
        values.insert("alb.dns_name".to_string(), "alb-123.elb.amazonaws.com".to_string());
        values.insert("logs.name".to_string(), "/ecs/gpu-inference-api-dev".to_string());

        assert_eq!(
            resolve("http://${alb.dns_name}", &values).unwrap(),
            "http://alb-123.elb.amazonaws.com"
        );
        assert_eq!(
            resolve("#log-group/${logs.name:console}", &values).unwrap(),
            "#log-group/$252Fecs$252Fgpu-inference-api-dev"
        );
    }

    #[test]
    fn test_resolve_reports_all_missing_references() {
        let err = resolve("${a.id}-${b.arn}", &HashMap::new()).unwrap_err();
        match err {
            ApiError::UnresolvedReferenceError { references } => {
                assert_eq!(references, vec!["a.id".to_string(), "b.arn".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
