//! Deployment topology of the inference API stack.
//!
//! A [`Plan`] is the list of cloud resource descriptors handed to the
//! infrastructure engine, plus the stack outputs it should report. Nothing
//! here talks to AWS; the engine owns creation, diffing and rollback.

pub mod builder;
pub mod cidr;
pub mod graph;
pub mod health;
pub mod instance;
pub mod outputs;
pub mod refs;
pub mod scaling;

use crate::utils::error::{ApiError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub use outputs::StackOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    #[serde(rename = "aws:ec2/vpc:Vpc")]
    Vpc,
    #[serde(rename = "aws:ec2/internetGateway:InternetGateway")]
    InternetGateway,
    #[serde(rename = "aws:ec2/subnet:Subnet")]
    Subnet,
    #[serde(rename = "aws:ec2/eip:Eip")]
    ElasticIp,
    #[serde(rename = "aws:ec2/natGateway:NatGateway")]
    NatGateway,
    #[serde(rename = "aws:ec2/routeTable:RouteTable")]
    RouteTable,
    #[serde(rename = "aws:ec2/routeTableAssociation:RouteTableAssociation")]
    RouteTableAssociation,
    #[serde(rename = "aws:ec2/securityGroup:SecurityGroup")]
    SecurityGroup,
    #[serde(rename = "aws:s3/bucketV2:BucketV2")]
    Bucket,
    #[serde(rename = "aws:s3/bucketVersioningV2:BucketVersioningV2")]
    BucketVersioning,
    #[serde(rename = "aws:s3/bucketServerSideEncryptionConfigurationV2:BucketServerSideEncryptionConfigurationV2")]
    BucketEncryption,
    #[serde(rename = "aws:s3/bucketPublicAccessBlock:BucketPublicAccessBlock")]
    BucketPublicAccessBlock,
    #[serde(rename = "aws:s3/bucketLifecycleConfigurationV2:BucketLifecycleConfigurationV2")]
    BucketLifecycle,
    #[serde(rename = "aws:iam/role:Role")]
    IamRole,
    #[serde(rename = "aws:iam/policy:Policy")]
    IamPolicy,
    #[serde(rename = "aws:iam/rolePolicyAttachment:RolePolicyAttachment")]
    RolePolicyAttachment,
    #[serde(rename = "aws:iam/instanceProfile:InstanceProfile")]
    InstanceProfile,
    #[serde(rename = "aws:ecs/cluster:Cluster")]
    EcsCluster,
    #[serde(rename = "aws:ec2/launchTemplate:LaunchTemplate")]
    LaunchTemplate,
    #[serde(rename = "aws:autoscaling/group:Group")]
    AutoScalingGroup,
    #[serde(rename = "aws:ecs/capacityProvider:CapacityProvider")]
    CapacityProvider,
    #[serde(rename = "aws:ecs/clusterCapacityProviders:ClusterCapacityProviders")]
    ClusterCapacityProviders,
    #[serde(rename = "aws:cloudwatch/logGroup:LogGroup")]
    LogGroup,
    #[serde(rename = "aws:ecs/taskDefinition:TaskDefinition")]
    TaskDefinition,
    #[serde(rename = "aws:lb/loadBalancer:LoadBalancer")]
    LoadBalancer,
    #[serde(rename = "aws:lb/targetGroup:TargetGroup")]
    TargetGroup,
    #[serde(rename = "aws:lb/listener:Listener")]
    Listener,
    #[serde(rename = "aws:ecs/service:Service")]
    EcsService,
    #[serde(rename = "aws:appautoscaling/target:Target")]
    ScalingTarget,
    #[serde(rename = "aws:appautoscaling/policy:Policy")]
    ScalingPolicy,
    #[serde(rename = "aws:cloudwatch/metricAlarm:MetricAlarm")]
    MetricAlarm,
}

impl ResourceKind {
    /// 是否支援 tags 屬性
    pub fn taggable(&self) -> bool {
        !matches!(
            self,
            ResourceKind::RouteTableAssociation
                | ResourceKind::BucketVersioning
                | ResourceKind::BucketEncryption
                | ResourceKind::BucketPublicAccessBlock
                | ResourceKind::BucketLifecycle
                | ResourceKind::RolePolicyAttachment
                | ResourceKind::ClusterCapacityProviders
                | ResourceKind::ScalingTarget
                | ResourceKind::ScalingPolicy
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub properties: Value,
    #[serde(rename = "dependsOn", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(name: impl Into<String>, kind: ResourceKind, properties: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            properties,
            depends_on: Vec::new(),
        }
    }

    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// Explicit dependencies plus every resource referenced from the properties.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut deps = refs::referenced_resources(&self.properties);
        deps.extend(self.depends_on.iter().cloned());
        deps.remove(&self.name);
        deps
    }

    pub fn tags(&self) -> Option<BTreeMap<String, String>> {
        let tags = self.properties.get("tags")?.as_object()?;
        Some(
            tags.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub project: String,
    pub stack: String,
    pub region: String,
    pub resources: Vec<Resource>,
    pub outputs: Vec<StackOutput>,
}

impl Plan {
    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(move |r| r.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Names are unique and every dependency points at a declared resource.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for resource in &self.resources {
            if !names.insert(resource.name.as_str()) {
                return Err(ApiError::TopologyError {
                    resource: resource.name.clone(),
                    message: "Duplicate resource name".to_string(),
                });
            }
        }

        for resource in &self.resources {
            if let Some(missing) = resource
                .dependencies()
                .into_iter()
                .find(|dep| !names.contains(dep.as_str()))
            {
                return Err(ApiError::TopologyError {
                    resource: resource.name.clone(),
                    message: format!("Depends on undeclared resource '{}'", missing),
                });
            }
        }

        for output in &self.outputs {
            if let Some(missing) = output
                .referenced_resources()
                .into_iter()
                .find(|dep| !names.contains(dep.as_str()))
            {
                return Err(ApiError::TopologyError {
                    resource: format!("output:{}", output.name),
                    message: format!("References undeclared resource '{}'", missing),
                });
            }
        }

        self.creation_order()?;
        Ok(())
    }
}
