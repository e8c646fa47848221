use gpu_inference_api::core::topology::outputs::resolve_outputs;
use gpu_inference_api::core::topology::ResourceKind;
use gpu_inference_api::{ApiError, Plan, StackConfig};
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn default_plan() -> Plan {
    Plan::build(&StackConfig::default()).expect("default stack should build")
}

fn position(order: &[&str], name: &str) -> usize {
    order
        .iter()
        .position(|n| *n == name)
        .unwrap_or_else(|| panic!("{} missing from creation order", name))
}

#[test]
fn test_default_plan_declares_whole_stack() {
    let plan = default_plan();

    assert_eq!(plan.project, "gpu-inference-api");
    assert_eq!(plan.stack, "dev");
    assert_eq!(plan.region, "us-west-2");
    assert_eq!(plan.of_kind(ResourceKind::Subnet).count(), 4);
    assert_eq!(plan.of_kind(ResourceKind::SecurityGroup).count(), 2);
    assert_eq!(plan.of_kind(ResourceKind::ScalingPolicy).count(), 2);
    assert_eq!(plan.of_kind(ResourceKind::MetricAlarm).count(), 4);
    assert_eq!(plan.of_kind(ResourceKind::EcsService).count(), 1);
}

#[test]
fn test_service_scaling_bounds_and_targets() {
    let plan = default_plan();

    let target = plan.get("gpu-inference-scaling-target").unwrap();
    assert_eq!(target.properties["minCapacity"], 1);
    assert_eq!(target.properties["maxCapacity"], 3);

    let cpu = plan.get("gpu-inference-cpu-scaling-policy").unwrap();
    let cpu_cfg = &cpu.properties["targetTrackingScalingPolicyConfiguration"];
    assert_eq!(cpu_cfg["targetValue"], 70.0);
    assert_eq!(cpu_cfg["scaleInCooldown"], 300);
    assert_eq!(cpu_cfg["scaleOutCooldown"], 60);

    let memory = plan.get("gpu-inference-memory-scaling-policy").unwrap();
    let memory_cfg = &memory.properties["targetTrackingScalingPolicyConfiguration"];
    assert_eq!(memory_cfg["targetValue"], 80.0);
    assert_eq!(
        memory_cfg["predefinedMetricSpecification"]["predefinedMetricType"],
        "ECSServiceAverageMemoryUtilization"
    );
}

#[test]
fn test_target_group_probes_health_endpoint() {
    let plan = default_plan();

    let tg = plan.get("gpu-inference-tg").unwrap();
    let check = &tg.properties["healthCheck"];
    assert_eq!(check["path"], "/health");
    assert_eq!(check["matcher"], "200-299");
    assert_eq!(check["healthyThreshold"], 2);
    assert_eq!(check["unhealthyThreshold"], 3);
    assert_eq!(check["interval"], 30);
    assert_eq!(check["timeout"], 5);
}

#[test]
fn test_container_health_check_uses_binary() {
    let plan = default_plan();

    let task = plan.get("gpu-inference-task").unwrap();
    let container = &task.properties["containerDefinitions"][0];
    let command = container["healthCheck"]["command"].as_array().unwrap();
    assert_eq!(command[0], "CMD");
    assert_eq!(command[1], "/usr/local/bin/gpu-inference-api");
    assert_eq!(command[2], "healthcheck");
    assert_eq!(container["resourceRequirements"][0]["type"], "GPU");
    assert_eq!(container["portMappings"][0]["containerPort"], 8080);
}

#[test]
fn test_instances_only_reachable_from_load_balancer() {
    let plan = default_plan();

    let ecs_sg = plan.get("gpu-inference-ecs-sg").unwrap();
    let ingress = ecs_sg.properties["ingress"].as_array().unwrap();
    assert_eq!(ingress.len(), 1);
    assert_eq!(ingress[0]["fromPort"], 8080);
    assert_eq!(
        ingress[0]["securityGroups"][0],
        "${gpu-inference-alb-sg.id}"
    );
    assert!(ingress[0].get("cidrBlocks").is_none());
}

#[test]
fn test_creation_order_respects_dependencies() {
    let plan = default_plan();
    let order: Vec<&str> = plan
        .creation_order()
        .unwrap()
        .into_iter()
        .map(|r| r.name.as_str())
        .collect();

    assert_eq!(order.len(), plan.len());
    assert!(position(&order, "gpu-inference-vpc") < position(&order, "gpu-inference-public-subnet-1"));
    assert!(position(&order, "gpu-inference-public-subnet-1") < position(&order, "gpu-inference-alb"));
    assert!(position(&order, "gpu-inference-alb-listener") < position(&order, "gpu-inference-service"));
    assert!(position(&order, "gpu-inference-cluster") < position(&order, "gpu-inference-launch-template"));
    assert!(position(&order, "gpu-inference-service") < position(&order, "gpu-inference-scaling-target"));
}

#[test]
fn test_waves_group_independent_resources() {
    let plan = default_plan();
    let waves = plan.waves().unwrap();

    let total: usize = waves.iter().map(|w| w.len()).sum();
    assert_eq!(total, plan.len());

    let first: Vec<&str> = waves[0].iter().map(|r| r.name.as_str()).collect();
    assert!(first.contains(&"gpu-inference-vpc"));
    assert!(first.contains(&"gpu-inference-models"));
    assert!(!first.contains(&"gpu-inference-igw"));

    // 每個資源的依賴都在更早的批次
    let mut wave_of = HashMap::new();
    for (i, wave) in waves.iter().enumerate() {
        for resource in wave {
            wave_of.insert(resource.name.clone(), i);
        }
    }
    for resource in &plan.resources {
        for dep in resource.dependencies() {
            assert!(wave_of[&dep] < wave_of[&resource.name]);
        }
    }
}

#[test]
fn test_outputs_resolve_from_engine_values() {
    let plan = default_plan();
    assert_eq!(plan.outputs.len(), 13);

    let mut values = HashMap::new();
    for resource in &plan.resources {
        for attribute in ["id", "arn", "name", "dns_name"] {
            values.insert(
                format!("{}.{}", resource.name, attribute),
                format!("{}-{}", resource.name, attribute),
            );
        }
    }
    values.insert(
        "gpu-inference-log-group.name".to_string(),
        "/ecs/gpu-inference-api-dev".to_string(),
    );
    values.insert(
        "gpu-inference-alb.dns_name".to_string(),
        "gpu-inference-alb-123.us-west-2.elb.amazonaws.com".to_string(),
    );

    let resolved: HashMap<String, serde_json::Value> =
        resolve_outputs(&plan.outputs, &values).unwrap().into_iter().collect();

    assert_eq!(
        resolved["api_endpoint"],
        "http://gpu-inference-alb-123.us-west-2.elb.amazonaws.com"
    );
    assert_eq!(resolved["log_group_name"], "/ecs/gpu-inference-api-dev");
    assert!(resolved["cloudwatch_logs_url"]
        .as_str()
        .unwrap()
        .ends_with("$252Fecs$252Fgpu-inference-api-dev"));
    assert_eq!(resolved["public_subnet_ids"].as_array().unwrap().len(), 2);
}

#[test]
fn test_unresolved_outputs_are_reported() {
    let plan = default_plan();

    let err = resolve_outputs(&plan.outputs, &HashMap::new()).unwrap_err();

    match err {
        ApiError::UnresolvedReferenceError { references } => {
            assert!(references.contains(&"gpu-inference-vpc.id".to_string()));
            assert!(references.contains(&"gpu-inference-alb.dns_name".to_string()));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_prod_stack_from_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[stack]
environment = "prod"

[scaling]
min_capacity = 2
max_capacity = 6
desired_capacity = 2

[service]
desired_count = 2
"#
    )
    .unwrap();

    let config = StackConfig::from_file(file.path()).unwrap();
    let plan = Plan::build(&config).unwrap();

    assert_eq!(plan.stack, "prod");
    let cluster = plan.get("gpu-inference-cluster").unwrap();
    assert_eq!(cluster.properties["name"], "gpu-inference-cluster-prod");
    let tags = plan.get("gpu-inference-vpc").unwrap().tags().unwrap();
    assert_eq!(tags["Environment"], "prod");
    assert_eq!(tags["ManagedBy"], "Pulumi");

    let target = plan.get("gpu-inference-scaling-target").unwrap();
    assert_eq!(target.properties["maxCapacity"], 6);
    let service = plan.get("gpu-inference-service").unwrap();
    assert_eq!(service.properties["desiredCount"], 2);
}

#[test]
fn test_invalid_stack_is_rejected() {
    let mut config = StackConfig::default();
    config.scaling.min_capacity = 4;

    assert!(Plan::build(&config).is_err());
}

#[test]
fn test_unreferenceable_prefix_is_rejected_before_build() {
    // 名稱中的 '.' 會讓 ${name.attr} 引用解析錯誤
    let mut config = StackConfig::default();
    config.stack.resource_prefix = "gpu.inference".to_string();

    let err = Plan::build(&config).unwrap_err();
    assert!(matches!(err, ApiError::InvalidConfigValueError { .. }));
    assert!(err.to_string().contains("stack.resource_prefix"));
}

#[test]
fn test_single_zone_listed_twice_is_rejected() {
    let mut config = StackConfig::default();
    config.stack.availability_zones = vec!["us-west-2a".to_string(), "us-west-2a".to_string()];

    let err = Plan::build(&config).unwrap_err();
    assert!(err.to_string().contains("more than once"));
}

#[test]
fn test_plan_serializes_with_type_tokens() {
    let plan = default_plan();
    let value = serde_json::to_value(&plan).unwrap();

    let vpc = value["resources"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "gpu-inference-vpc")
        .unwrap();
    assert_eq!(vpc["type"], "aws:ec2/vpc:Vpc");
    assert!(vpc.get("dependsOn").is_none());
}
