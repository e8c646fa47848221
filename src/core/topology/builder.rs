//! Turns a [`StackConfig`] into the full resource plan of the stack.

use super::health::{ContainerHealthCheck, TargetHealthCheck};
use super::outputs::{stack_outputs, OutputTargets};
use super::refs::reference;
use super::scaling::ScalingPolicy;
use super::{Plan, Resource, ResourceKind};
use crate::config::toml_config::StackConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use base64::Engine;
use serde_json::{json, Map, Value};

const ANYWHERE: &str = "0.0.0.0/0";
const ECS_TASK_EXECUTION_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy";
const ECS_INSTANCE_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AmazonEC2ContainerServiceforEC2Role";
const SSM_INSTANCE_POLICY: &str = "arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore";

struct PlanBuilder<'a> {
    config: &'a StackConfig,
    resources: Vec<Resource>,
}

impl<'a> PlanBuilder<'a> {
    fn new(config: &'a StackConfig) -> Self {
        Self {
            config,
            resources: Vec::new(),
        }
    }

    fn name(&self, suffix: &str) -> String {
        self.config.logical_name(suffix)
    }

    fn common_tags(&self) -> Map<String, Value> {
        let mut tags = Map::new();
        tags.insert("Environment".into(), self.config.environment().into());
        tags.insert("Project".into(), self.config.stack.project.clone().into());
        tags.insert("ManagedBy".into(), "Pulumi".into());
        tags
    }

    fn named_tags(&self, suffix: &str) -> Value {
        let mut tags = self.common_tags();
        tags.insert("Name".into(), self.config.display_name(suffix).into());
        Value::Object(tags)
    }

    /// 加入資源；可加標籤的資源若未指定 tags 則套用共用標籤
    fn add(&mut self, mut resource: Resource) -> String {
        if resource.kind.taggable() {
            if let Value::Object(props) = &mut resource.properties {
                if !props.contains_key("tags") {
                    props.insert("tags".into(), Value::Object(self.common_tags()));
                }
            }
        }
        let name = resource.name.clone();
        self.resources.push(resource);
        name
    }

    fn network(&mut self) -> Network {
        let config = self.config;
        let vpc = self.add(Resource::new(
            self.name("vpc"),
            ResourceKind::Vpc,
            json!({
                "cidrBlock": config.network.vpc_cidr,
                "enableDnsHostnames": true,
                "enableDnsSupport": true,
                "tags": self.named_tags("vpc"),
            }),
        ));

        let igw = self.add(Resource::new(
            self.name("igw"),
            ResourceKind::InternetGateway,
            json!({
                "vpcId": reference(&vpc, "id"),
                "tags": self.named_tags("igw"),
            }),
        ));

        let zones = &config.stack.availability_zones;
        let mut public_subnets = Vec::new();
        for (i, (cidr, zone)) in config.network.public_subnets.iter().zip(zones).enumerate() {
            let n = i + 1;
            public_subnets.push(self.add(Resource::new(
                self.name(&format!("public-subnet-{}", n)),
                ResourceKind::Subnet,
                json!({
                    "vpcId": reference(&vpc, "id"),
                    "cidrBlock": cidr,
                    "availabilityZone": zone,
                    "mapPublicIpOnLaunch": true,
                    "tags": self.named_tags(&format!("public-{}", n)),
                }),
            )));
        }

        let mut private_subnets = Vec::new();
        for (i, (cidr, zone)) in config.network.private_subnets.iter().zip(zones).enumerate() {
            let n = i + 1;
            private_subnets.push(self.add(Resource::new(
                self.name(&format!("private-subnet-{}", n)),
                ResourceKind::Subnet,
                json!({
                    "vpcId": reference(&vpc, "id"),
                    "cidrBlock": cidr,
                    "availabilityZone": zone,
                    "tags": self.named_tags(&format!("private-{}", n)),
                }),
            )));
        }

        let eip = self.add(Resource::new(
            self.name("nat-eip"),
            ResourceKind::ElasticIp,
            json!({ "domain": "vpc", "tags": self.named_tags("nat-eip") }),
        ));

        // NAT 放在第一個 public subnet
        let nat = self.add(Resource::new(
            self.name("nat-gateway"),
            ResourceKind::NatGateway,
            json!({
                "allocationId": reference(&eip, "id"),
                "subnetId": reference(&public_subnets[0], "id"),
                "tags": self.named_tags("nat"),
            }),
        ));

        self.route_table(
            "public",
            &vpc,
            json!({ "cidrBlock": ANYWHERE, "gatewayId": reference(&igw, "id") }),
            &public_subnets,
        );
        self.route_table(
            "private",
            &vpc,
            json!({ "cidrBlock": ANYWHERE, "natGatewayId": reference(&nat, "id") }),
            &private_subnets,
        );

        Network {
            vpc,
            public_subnets,
            private_subnets,
        }
    }

    fn route_table(&mut self, tier: &str, vpc: &str, route: Value, subnets: &[String]) {
        let table = self.add(Resource::new(
            self.name(&format!("{}-rt", tier)),
            ResourceKind::RouteTable,
            json!({
                "vpcId": reference(vpc, "id"),
                "routes": [route],
                "tags": self.named_tags(&format!("{}-rt", tier)),
            }),
        ));

        for (i, subnet) in subnets.iter().enumerate() {
            self.add(Resource::new(
                self.name(&format!("{}-rt-assoc-{}", tier, i + 1)),
                ResourceKind::RouteTableAssociation,
                json!({
                    "subnetId": reference(subnet, "id"),
                    "routeTableId": reference(&table, "id"),
                }),
            ));
        }
    }

    fn security_groups(&mut self, vpc: &str) -> (String, String) {
        let egress_all = json!([{
            "protocol": "-1",
            "fromPort": 0,
            "toPort": 0,
            "cidrBlocks": [ANYWHERE],
            "description": "Allow all outbound traffic",
        }]);

        let alb_sg = self.add(Resource::new(
            self.name("alb-sg"),
            ResourceKind::SecurityGroup,
            json!({
                "vpcId": reference(vpc, "id"),
                "description": "Security group for GPU inference API load balancer",
                "ingress": [
                    { "protocol": "tcp", "fromPort": 80, "toPort": 80, "cidrBlocks": [ANYWHERE], "description": "Allow HTTP from anywhere" },
                    { "protocol": "tcp", "fromPort": 443, "toPort": 443, "cidrBlocks": [ANYWHERE], "description": "Allow HTTPS from anywhere" },
                ],
                "egress": egress_all,
                "tags": self.named_tags("alb-sg"),
            }),
        ));

        let port = self.config.service.container_port;
        let ecs_sg = self.add(Resource::new(
            self.name("ecs-sg"),
            ResourceKind::SecurityGroup,
            json!({
                "vpcId": reference(vpc, "id"),
                "description": "Security group for GPU inference ECS instances",
                "ingress": [{
                    "protocol": "tcp",
                    "fromPort": port,
                    "toPort": port,
                    "securityGroups": [reference(&alb_sg, "id")],
                    "description": "Allow traffic from ALB only",
                }],
                "egress": egress_all,
                "tags": self.named_tags("ecs-sg"),
            }),
        ));

        (alb_sg, ecs_sg)
    }

    fn model_bucket(&mut self) -> String {
        let config = self.config;
        let storage = &config.storage;
        let bucket = self.add(Resource::new(
            self.name("models"),
            ResourceKind::Bucket,
            json!({ "tags": self.named_tags("models") }),
        ));

        let status = if storage.versioning { "Enabled" } else { "Suspended" };
        self.add(Resource::new(
            self.name("models-versioning"),
            ResourceKind::BucketVersioning,
            json!({
                "bucket": reference(&bucket, "id"),
                "versioningConfiguration": { "status": status },
            }),
        ));

        self.add(Resource::new(
            self.name("models-encryption"),
            ResourceKind::BucketEncryption,
            json!({
                "bucket": reference(&bucket, "id"),
                "rules": [{
                    "applyServerSideEncryptionByDefault": { "sseAlgorithm": storage.sse_algorithm },
                    "bucketKeyEnabled": true,
                }],
            }),
        ));

        self.add(Resource::new(
            self.name("models-public-access-block"),
            ResourceKind::BucketPublicAccessBlock,
            json!({
                "bucket": reference(&bucket, "id"),
                "blockPublicAcls": true,
                "blockPublicPolicy": true,
                "ignorePublicAcls": true,
                "restrictPublicBuckets": true,
            }),
        ));

        self.add(Resource::new(
            self.name("models-lifecycle"),
            ResourceKind::BucketLifecycle,
            json!({
                "bucket": reference(&bucket, "id"),
                "rules": [{
                    "id": "delete-old-versions",
                    "status": "Enabled",
                    "noncurrentVersionExpiration": {
                        "noncurrentDays": storage.noncurrent_version_expiration_days,
                    },
                }],
            }),
        ));

        bucket
    }

    fn role(&mut self, suffix: &str, service_principal: &str) -> String {
        self.add(Resource::new(
            self.name(suffix),
            ResourceKind::IamRole,
            json!({
                "assumeRolePolicy": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": { "Service": service_principal },
                        "Action": "sts:AssumeRole",
                    }],
                },
            }),
        ))
    }

    fn attach(&mut self, suffix: &str, role: &str, policy_arn: String) {
        self.add(Resource::new(
            self.name(suffix),
            ResourceKind::RolePolicyAttachment,
            json!({ "role": reference(role, "name"), "policyArn": policy_arn }),
        ));
    }

    fn iam(&mut self, bucket: &str) -> Iam {
        let execution_role = self.role("task-execution-role", "ecs-tasks.amazonaws.com");
        self.attach(
            "task-execution-policy",
            &execution_role,
            ECS_TASK_EXECUTION_POLICY.to_string(),
        );

        let task_role = self.role("task-role", "ecs-tasks.amazonaws.com");

        // 模型 bucket 唯讀
        let bucket_arn = reference(bucket, "arn");
        let s3_policy = self.add(Resource::new(
            self.name("s3-policy"),
            ResourceKind::IamPolicy,
            json!({
                "policy": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": ["s3:GetObject", "s3:ListBucket"],
                        "Resource": [bucket_arn, format!("{}/*", bucket_arn)],
                    }],
                },
            }),
        ));
        self.attach("s3-policy-attachment", &task_role, reference(&s3_policy, "arn"));

        let logs_policy = self.add(Resource::new(
            self.name("cloudwatch-policy"),
            ResourceKind::IamPolicy,
            json!({
                "policy": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": [
                            "logs:CreateLogGroup",
                            "logs:CreateLogStream",
                            "logs:PutLogEvents",
                            "logs:DescribeLogStreams",
                        ],
                        "Resource": "arn:aws:logs:*:*:*",
                    }],
                },
            }),
        ));
        self.attach(
            "cloudwatch-policy-attachment",
            &task_role,
            reference(&logs_policy, "arn"),
        );

        let instance_role = self.role("ec2-instance-role", "ec2.amazonaws.com");
        self.attach(
            "ec2-policy-attachment",
            &instance_role,
            ECS_INSTANCE_POLICY.to_string(),
        );
        self.attach(
            "ec2-ssm-policy-attachment",
            &instance_role,
            SSM_INSTANCE_POLICY.to_string(),
        );

        let instance_profile = self.add(Resource::new(
            self.name("instance-profile"),
            ResourceKind::InstanceProfile,
            json!({ "role": reference(&instance_role, "name") }),
        ));

        Iam {
            execution_role,
            task_role,
            instance_profile,
        }
    }

    fn compute(&mut self, network: &Network, ecs_sg: &str, iam: &Iam) -> Compute {
        let config = self.config;
        let cluster_name = config.display_name("cluster");
        let cluster = self.add(Resource::new(
            self.name("cluster"),
            ResourceKind::EcsCluster,
            json!({
                "name": cluster_name,
                "settings": [{ "name": "containerInsights", "value": "enabled" }],
                "tags": self.named_tags("cluster"),
            }),
        ));

        let launch_template = self.add(
            Resource::new(
                self.name("launch-template"),
                ResourceKind::LaunchTemplate,
                json!({
                    "imageId": {
                        "fn::invoke": {
                            "function": "aws:ec2/getAmi:getAmi",
                            "arguments": {
                                "mostRecent": true,
                                "owners": ["amazon"],
                                "filters": [
                                    { "name": "name", "values": [config.compute.ami_name_filter] },
                                    { "name": "virtualization-type", "values": ["hvm"] },
                                ],
                            },
                            "return": "id",
                        },
                    },
                    "instanceType": config.compute.instance_type,
                    "iamInstanceProfile": { "arn": reference(&iam.instance_profile, "arn") },
                    "vpcSecurityGroupIds": [reference(ecs_sg, "id")],
                    "userData": encoded_user_data(&cluster_name),
                    "blockDeviceMappings": [{
                        "deviceName": "/dev/xvda",
                        "ebs": {
                            "volumeSize": config.compute.volume_size_gb,
                            "volumeType": config.compute.volume_type,
                            "deleteOnTermination": "true",
                            "encrypted": "true",
                        },
                    }],
                    "monitoring": { "enabled": true },
                    "tagSpecifications": [
                        { "resourceType": "instance", "tags": self.named_tags("instance") },
                        { "resourceType": "volume", "tags": self.named_tags("volume") },
                    ],
                    "tags": self.named_tags("launch-template"),
                }),
            )
            // user data 內嵌 cluster 名稱
            .depends_on(cluster.clone()),
        );

        let scaling = &config.scaling;
        let asg = self.add(Resource::new(
            self.name("asg"),
            ResourceKind::AutoScalingGroup,
            json!({
                "vpcZoneIdentifiers": network
                    .private_subnets
                    .iter()
                    .map(|s| reference(s, "id"))
                    .collect::<Vec<_>>(),
                "desiredCapacity": scaling.desired_capacity,
                "minSize": scaling.min_capacity,
                "maxSize": scaling.max_capacity,
                "healthCheckType": "EC2",
                "healthCheckGracePeriod": config.compute.instance_warmup_secs,
                "launchTemplate": { "id": reference(&launch_template, "id"), "version": "$Latest" },
                "tags": [
                    { "key": "Name", "value": config.display_name("asg"), "propagateAtLaunch": true },
                    { "key": "AmazonECSManaged", "value": "true", "propagateAtLaunch": true },
                ],
            }),
        ));

        let capacity_provider = self.add(Resource::new(
            self.name("capacity-provider"),
            ResourceKind::CapacityProvider,
            json!({
                "autoScalingGroupProvider": {
                    "autoScalingGroupArn": reference(&asg, "arn"),
                    "managedScaling": {
                        "status": "ENABLED",
                        "targetCapacity": config.compute.capacity_target_percent,
                        "minimumScalingStepSize": 1,
                        "maximumScalingStepSize": 1,
                    },
                    "managedTerminationProtection": "DISABLED",
                },
            }),
        ));

        self.add(Resource::new(
            self.name("cluster-capacity-providers"),
            ResourceKind::ClusterCapacityProviders,
            json!({
                "clusterName": reference(&cluster, "name"),
                "capacityProviders": [reference(&capacity_provider, "name")],
                "defaultCapacityProviderStrategies": [{
                    "capacityProvider": reference(&capacity_provider, "name"),
                    "weight": 1,
                    "base": 1,
                }],
            }),
        ));

        Compute { cluster }
    }

    fn task_definition(&mut self, bucket: &str, iam: &Iam) -> (String, String) {
        let config = self.config;
        let service = &config.service;

        let log_group = self.add(Resource::new(
            self.name("log-group"),
            ResourceKind::LogGroup,
            json!({
                "name": format!("/ecs/{}-{}", config.stack.project, config.environment()),
                "retentionInDays": config.monitoring.log_retention_days,
            }),
        ));

        let health_check = ContainerHealthCheck::probe_command(
            &service.healthcheck_binary,
            &config.health_check,
            service.container_port,
        );

        let container = json!({
            "name": service.container_name,
            "image": service.image,
            "cpu": service.cpu,
            "memory": service.memory_mb,
            "essential": true,
            "portMappings": [{
                "containerPort": service.container_port,
                "hostPort": service.container_port,
                "protocol": "tcp",
            }],
            "environment": [
                { "name": "MODEL_BUCKET", "value": reference(bucket, "id") },
                { "name": "AWS_REGION", "value": config.stack.region },
                { "name": "PORT", "value": service.container_port.to_string() },
                { "name": "LOG_FORMAT", "value": "json" },
            ],
            "command": ["serve"],
            "logConfiguration": {
                "logDriver": "awslogs",
                "options": {
                    "awslogs-group": reference(&log_group, "name"),
                    "awslogs-region": config.stack.region,
                    "awslogs-stream-prefix": config.stack.resource_prefix,
                },
            },
            "resourceRequirements": [{ "type": "GPU", "value": service.gpus.to_string() }],
            "healthCheck": health_check,
        });

        let task = self.add(Resource::new(
            self.name("task"),
            ResourceKind::TaskDefinition,
            json!({
                "family": service.container_name,
                "networkMode": "bridge",
                "requiresCompatibilities": ["EC2"],
                "cpu": service.cpu.to_string(),
                "memory": service.memory_mb.to_string(),
                "executionRoleArn": reference(&iam.execution_role, "arn"),
                "taskRoleArn": reference(&iam.task_role, "arn"),
                "containerDefinitions": [container],
            }),
        ));

        (task, log_group)
    }

    fn load_balancer(&mut self, network: &Network, alb_sg: &str) -> LoadBalancing {
        let config = self.config;
        let alb = self.add(Resource::new(
            self.name("alb"),
            ResourceKind::LoadBalancer,
            json!({
                "loadBalancerType": "application",
                "subnets": network
                    .public_subnets
                    .iter()
                    .map(|s| reference(s, "id"))
                    .collect::<Vec<_>>(),
                "securityGroups": [reference(alb_sg, "id")],
                "enableDeletionProtection": false,
                "enableHttp2": true,
                "tags": self.named_tags("alb"),
            }),
        ));

        let port = config.service.container_port;
        let health_check = TargetHealthCheck::from_config(&config.health_check, port);
        tracing::debug!(
            "🩺 Targets leave rotation after {}s of failed {} checks",
            health_check.seconds_to_unhealthy(),
            health_check.path
        );
        let target_group = self.add(Resource::new(
            self.name("tg"),
            ResourceKind::TargetGroup,
            json!({
                "port": port,
                "protocol": "HTTP",
                "vpcId": reference(&network.vpc, "id"),
                "targetType": "instance",
                "deregistrationDelay": config.health_check.deregistration_delay_secs,
                "healthCheck": health_check,
                "tags": self.named_tags("tg"),
            }),
        ));

        let listener = self.add(Resource::new(
            self.name("alb-listener"),
            ResourceKind::Listener,
            json!({
                "loadBalancerArn": reference(&alb, "arn"),
                "port": 80,
                "protocol": "HTTP",
                "defaultActions": [{
                    "type": "forward",
                    "targetGroupArn": reference(&target_group, "arn"),
                }],
            }),
        ));

        LoadBalancing {
            alb,
            target_group,
            listener,
        }
    }

    fn service(&mut self, cluster: &str, task: &str, lb: &LoadBalancing) -> String {
        let config = self.config;
        let service = &config.service;
        self.add(
            Resource::new(
                self.name("service"),
                ResourceKind::EcsService,
                json!({
                    "cluster": reference(cluster, "arn"),
                    "taskDefinition": reference(task, "arn"),
                    "desiredCount": service.desired_count,
                    "launchType": "EC2",
                    "schedulingStrategy": "REPLICA",
                    "deploymentMaximumPercent": service.deployment_maximum_percent,
                    "deploymentMinimumHealthyPercent": service.deployment_minimum_healthy_percent,
                    "deploymentCircuitBreaker": { "enable": true, "rollback": true },
                    "loadBalancers": [{
                        "targetGroupArn": reference(&lb.target_group, "arn"),
                        "containerName": service.container_name,
                        "containerPort": service.container_port,
                    }],
                    "healthCheckGracePeriodSeconds": service.health_check_grace_period_secs,
                }),
            )
            // target group 必須先掛上 listener
            .depends_on(lb.listener.clone()),
        )
    }

    fn autoscaling(&mut self, cluster: &str, service: &str) {
        let policy = ScalingPolicy::from_config(&self.config.scaling);
        let target = self.add(Resource::new(
            self.name("scaling-target"),
            ResourceKind::ScalingTarget,
            json!({
                "maxCapacity": policy.bounds.max_capacity,
                "minCapacity": policy.bounds.min_capacity,
                "resourceId": format!(
                    "service/{}/{}",
                    reference(cluster, "name"),
                    reference(service, "name")
                ),
                "scalableDimension": "ecs:service:DesiredCount",
                "serviceNamespace": "ecs",
            }),
        ));

        for (suffix, tracking) in [("cpu", &policy.cpu), ("memory", &policy.memory)] {
            self.add(Resource::new(
                self.name(&format!("{}-scaling-policy", suffix)),
                ResourceKind::ScalingPolicy,
                json!({
                    "policyType": "TargetTrackingScaling",
                    "resourceId": reference(&target, "resourceId"),
                    "scalableDimension": reference(&target, "scalableDimension"),
                    "serviceNamespace": reference(&target, "serviceNamespace"),
                    "targetTrackingScalingPolicyConfiguration": tracking.to_configuration(),
                }),
            ));
        }
    }

    fn alarms(&mut self, cluster: &str, service: &str, lb: &LoadBalancing) {
        let config = self.config;
        let monitoring = &config.monitoring;
        let service_dimensions = json!({
            "ClusterName": reference(cluster, "name"),
            "ServiceName": reference(service, "name"),
        });

        let alarms = [
            AlarmSpec {
                suffix: "cpu-alarm",
                metric_name: "CPUUtilization",
                namespace: "AWS/ECS",
                period: 300,
                statistic: "Average",
                threshold: monitoring.cpu_alarm_threshold,
                description: format!("Alert when CPU exceeds {}%", monitoring.cpu_alarm_threshold),
                dimensions: service_dimensions.clone(),
            },
            AlarmSpec {
                suffix: "memory-alarm",
                metric_name: "MemoryUtilization",
                namespace: "AWS/ECS",
                period: 300,
                statistic: "Average",
                threshold: monitoring.memory_alarm_threshold,
                description: format!(
                    "Alert when memory exceeds {}%",
                    monitoring.memory_alarm_threshold
                ),
                dimensions: service_dimensions,
            },
            AlarmSpec {
                suffix: "unhealthy-target-alarm",
                metric_name: "UnHealthyHostCount",
                namespace: "AWS/ApplicationELB",
                period: 60,
                statistic: "Average",
                threshold: monitoring.unhealthy_host_threshold,
                description: "Alert when there are unhealthy targets".to_string(),
                dimensions: json!({
                    "TargetGroup": reference(&lb.target_group, "arnSuffix"),
                    "LoadBalancer": reference(&lb.alb, "arnSuffix"),
                }),
            },
            AlarmSpec {
                suffix: "alb-5xx-alarm",
                metric_name: "HTTPCode_Target_5XX_Count",
                namespace: "AWS/ApplicationELB",
                period: 300,
                statistic: "Sum",
                threshold: monitoring.alb_5xx_threshold,
                description: "Alert when ALB returns too many 5XX errors".to_string(),
                dimensions: json!({ "LoadBalancer": reference(&lb.alb, "arnSuffix") }),
            },
        ];

        for alarm in alarms {
            self.add(Resource::new(
                self.name(alarm.suffix),
                ResourceKind::MetricAlarm,
                json!({
                    "comparisonOperator": "GreaterThanThreshold",
                    "evaluationPeriods": monitoring.evaluation_periods,
                    "metricName": alarm.metric_name,
                    "namespace": alarm.namespace,
                    "period": alarm.period,
                    "statistic": alarm.statistic,
                    "threshold": alarm.threshold,
                    "alarmDescription": alarm.description,
                    "alarmActions": monitoring.alarm_actions,
                    "dimensions": alarm.dimensions,
                }),
            ));
        }
    }
}

struct Network {
    vpc: String,
    public_subnets: Vec<String>,
    private_subnets: Vec<String>,
}

struct Iam {
    execution_role: String,
    task_role: String,
    instance_profile: String,
}

struct Compute {
    cluster: String,
}

struct LoadBalancing {
    alb: String,
    target_group: String,
    listener: String,
}

struct AlarmSpec {
    suffix: &'static str,
    metric_name: &'static str,
    namespace: &'static str,
    period: u32,
    statistic: &'static str,
    threshold: f64,
    description: String,
    dimensions: Value,
}

/// ECS agent configuration for GPU instances joining `cluster_name`.
pub fn user_data_script(cluster_name: &str) -> String {
    format!(
        "#!/bin/bash\n\
         echo ECS_CLUSTER={} >> /etc/ecs/ecs.config\n\
         echo ECS_ENABLE_GPU_SUPPORT=true >> /etc/ecs/ecs.config\n\
         echo ECS_ENABLE_CONTAINER_METADATA=true >> /etc/ecs/ecs.config\n\
         echo ECS_ENABLE_TASK_IAM_ROLE=true >> /etc/ecs/ecs.config\n\
         echo ECS_ENABLE_TASK_IAM_ROLE_NETWORK_HOST=true >> /etc/ecs/ecs.config\n",
        cluster_name
    )
}

fn encoded_user_data(cluster_name: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(user_data_script(cluster_name))
}

impl Plan {
    /// Validates `config` and declares every resource of the stack.
    pub fn build(config: &StackConfig) -> Result<Plan> {
        config.validate()?;

        let mut builder = PlanBuilder::new(config);
        let network = builder.network();
        let (alb_sg, ecs_sg) = builder.security_groups(&network.vpc);
        let bucket = builder.model_bucket();
        let iam = builder.iam(&bucket);
        let compute = builder.compute(&network, &ecs_sg, &iam);
        let (task, log_group) = builder.task_definition(&bucket, &iam);
        let lb = builder.load_balancer(&network, &alb_sg);
        let service = builder.service(&compute.cluster, &task, &lb);
        builder.autoscaling(&compute.cluster, &service);
        builder.alarms(&compute.cluster, &service, &lb);

        let outputs = stack_outputs(
            &config.stack.region,
            &OutputTargets {
                vpc: &network.vpc,
                public_subnets: &network.public_subnets,
                private_subnets: &network.private_subnets,
                bucket: &bucket,
                load_balancer: &lb.alb,
                cluster: &compute.cluster,
                service: &service,
                log_group: &log_group,
            },
        );

        let plan = Plan {
            project: config.stack.project.clone(),
            stack: config.environment().to_string(),
            region: config.stack.region.clone(),
            resources: builder.resources,
            outputs,
        };
        plan.validate()?;

        tracing::debug!(
            "🧱 Built plan for stack '{}' with {} resources",
            plan.stack,
            plan.len()
        );
        Ok(plan)
    }
}
