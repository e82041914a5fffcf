//! Resource declarations: one desired-state description per cloud resource.
//!
//! A declaration carries typed references to the declarations it depends on.
//! References serialize as `{"Ref": <logical id>}` so rendered properties can
//! be handed to the provisioning engine as-is.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use fargate_stack_common::types::{RemovalPolicy, Tags};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Construct path of a declaration, e.g. `DemoTodo/DatabaseInstance`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    /// Creates an id from a construct path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the construct path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last path component.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(self.0.as_str())
    }

    /// Stable logical id for the provisioning engine.
    ///
    /// The stack component is dropped; the remaining components are stripped
    /// to alphanumerics and suffixed with the first eight upper-case hex
    /// digits of the SHA-256 of their `/`-joined path.
    #[must_use]
    pub fn logical_id(&self) -> String {
        let components: Vec<&str> = self.0.split('/').collect();
        let local = if components.len() > 1 {
            &components[1..]
        } else {
            &components[..]
        };
        let human: String = local
            .iter()
            .flat_map(|c| c.chars())
            .filter(char::is_ascii_alphanumeric)
            .collect();
        let digest = Sha256::digest(local.join("/").as_bytes());
        let hash: String = digest
            .iter()
            .take(4)
            .map(|b| format!("{b:02X}"))
            .collect();
        format!("{human}{hash}")
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = BTreeMap::new();
        let _ = map.insert("Ref", self.logical_id());
        map.serialize(serializer)
    }
}

/// Category of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Virtual network.
    Vpc,
    /// Reference to an existing DNS zone.
    HostedZoneLookup,
    /// Generated administrative database credential.
    DatabaseSecret,
    /// Managed PostgreSQL instance.
    DatabaseInstance,
    /// Credential-management provider bound to a database instance.
    SqlProvider,
    /// Logical database.
    SqlDatabase,
    /// Database role with its own secret.
    SqlRole,
    /// Schema owned by a role.
    SqlSchema,
    /// Generated application secret bundle.
    Secret,
    /// Container image built from a local context.
    ContainerImageAsset,
    /// Load-balanced container service.
    LoadBalancedFargateService,
    /// Ingress rule on a security group.
    SecurityGroupIngress,
    /// Autoscaling target for the service task count.
    ScalableTaskCount,
    /// Target-tracking scaling policy.
    TargetTrackingScalingPolicy,
}

impl ResourceKind {
    /// Type name used in rendered manifests.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Vpc => "Network::Vpc",
            Self::HostedZoneLookup => "Dns::HostedZoneLookup",
            Self::DatabaseSecret => "Database::AdminSecret",
            Self::DatabaseInstance => "Database::Instance",
            Self::SqlProvider => "Sql::Provider",
            Self::SqlDatabase => "Sql::Database",
            Self::SqlRole => "Sql::Role",
            Self::SqlSchema => "Sql::Schema",
            Self::Secret => "Secrets::Secret",
            Self::ContainerImageAsset => "Container::ImageAsset",
            Self::LoadBalancedFargateService => "Container::LoadBalancedFargateService",
            Self::SecurityGroupIngress => "Network::SecurityGroupIngress",
            Self::ScalableTaskCount => "Scaling::ScalableTaskCount",
            Self::TargetTrackingScalingPolicy => "Scaling::TargetTrackingPolicy",
        }
    }

    /// Lookups reference existing resources and carry no tags.
    #[must_use]
    pub const fn is_taggable(self) -> bool {
        !matches!(self, Self::HostedZoneLookup)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Network addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IpProtocol {
    /// IPv4 and IPv6.
    #[serde(rename = "DUAL_STACK")]
    DualStack,
}

/// Subnet tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubnetType {
    /// Private subnets with NAT egress.
    #[serde(rename = "PRIVATE_WITH_EGRESS")]
    PrivateWithEgress,
}

/// Virtual network spanning several availability zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcSpec {
    /// Number of availability zones.
    pub max_azs: u8,
    /// NAT gateway count, or `None` for one per zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_gateways: Option<u8>,
    /// Addressing mode.
    pub ip_protocol: IpProtocol,
}

/// Read-only reference to an existing hosted zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostedZoneLookupSpec {
    /// Zone name.
    pub domain_name: String,
}

/// Generated admin credential for a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseSecretSpec {
    /// Secret storage path.
    pub secret_name: String,
    /// Fixed administrative username.
    pub username: String,
}

/// Managed PostgreSQL instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseInstanceSpec {
    /// Network the instance is placed in.
    pub vpc: ResourceId,
    /// Instance class, e.g. `db.t4g.micro`.
    pub instance_class: String,
    /// Engine name.
    pub engine: String,
    /// Engine major version.
    pub engine_version: String,
    /// Replicate across availability zones.
    pub multi_az: bool,
    /// Admin credential the instance authenticates with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<ResourceId>,
    /// Allocated storage in GB.
    pub allocated_storage: u32,
    /// Storage autoscaling ceiling in GB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_allocated_storage: Option<u32>,
    /// Storage performance tier.
    pub storage_type: String,
    /// Certificate authority for client TLS validation.
    pub ca_certificate: String,
    /// Network stack mode.
    pub network_type: String,
    /// Listening port.
    pub port: u16,
    /// Policy applied when the instance leaves the stack.
    #[serde(skip)]
    pub removal_policy: RemovalPolicy,
}

/// Credential-management provider operating over a live database connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SqlProviderSpec {
    /// Network the provider function runs in.
    pub vpc: ResourceId,
    /// Subnets the provider function is placed in.
    pub subnet_type: SubnetType,
    /// Database instance the provider manages.
    pub database_instance: ResourceId,
    /// Admin secret the provider authenticates with.
    pub secret: ResourceId,
    /// Allow IPv6 traffic on dual-stack subnets.
    pub ipv6_allowed_for_dual_stack: bool,
    /// Allow all outbound IPv6 traffic.
    pub allow_all_ipv6_outbound: bool,
}

/// Logical database created through a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SqlDatabaseSpec {
    /// Provider that creates the database.
    pub provider: ResourceId,
    /// Name of the logical database.
    pub database_name: String,
}

/// Database role with a generated secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SqlRoleSpec {
    /// Provider that creates the role.
    pub provider: ResourceId,
    /// Database the role is scoped to.
    pub database: ResourceId,
    /// Role name.
    pub role_name: String,
    /// Storage path of the role's secret. `None` means no secret is generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
}

/// Schema owned by a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SqlSchemaSpec {
    /// Provider that creates the schema.
    pub provider: ResourceId,
    /// Database holding the schema.
    pub database: ResourceId,
    /// Schema name.
    pub schema_name: String,
    /// Owning role.
    pub role: ResourceId,
}

/// Generated secret holding a single random value under a JSON key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeneratedSecretSpec {
    /// Secret storage path.
    pub secret_name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON key the generated value is stored under.
    pub generate_string_key: String,
    /// Characters never used in the generated value.
    pub exclude_characters: String,
    /// Length of the generated value.
    pub password_length: u32,
}

/// Container image built from a local directory and pushed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerImageSpec {
    /// Build context directory.
    pub directory: PathBuf,
}

/// Value of a non-secret container environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    /// A literal string.
    Literal(String),
    /// An attribute of another declaration, resolved at deploy time.
    Attribute {
        /// Declaration exposing the attribute.
        resource: ResourceId,
        /// Attribute name, e.g. `Endpoint.Address`.
        attribute: String,
    },
}

impl EnvValue {
    /// Returns the referenced declaration, if any.
    #[must_use]
    pub const fn reference(&self) -> Option<&ResourceId> {
        match self {
            Self::Literal(_) => None,
            Self::Attribute { resource, .. } => Some(resource),
        }
    }
}

impl Serialize for EnvValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(value) => serializer.serialize_str(value),
            Self::Attribute {
                resource,
                attribute,
            } => {
                let mut map = BTreeMap::new();
                let _ = map.insert("Fn::GetAtt", [resource.logical_id(), attribute.clone()]);
                map.serialize(serializer)
            }
        }
    }
}

/// A secret-backed container environment variable: one JSON field of a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecretField {
    /// Declaration owning the secret.
    pub secret: ResourceId,
    /// JSON field within the secret.
    pub field: String,
}

/// Listener protocol of the load balancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ListenerProtocol {
    /// TLS-terminating HTTPS.
    #[serde(rename = "HTTPS")]
    Https,
}

/// Rollback-on-failure switch for deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CircuitBreaker {
    /// Stop failing deployments.
    pub enable: bool,
    /// Roll back to the last healthy deployment.
    pub rollback: bool,
}

/// Container service behind an HTTPS load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadBalancedServiceSpec {
    /// Network the service runs in.
    pub vpc: ResourceId,
    /// Hosted zone the DNS record is created in.
    pub domain_zone: ResourceId,
    /// DNS name bound to the load balancer.
    pub domain_name: String,
    /// Image to run.
    pub image: ResourceId,
    /// CPU units for the task.
    pub cpu: u32,
    /// Memory for the task in MiB.
    #[serde(rename = "MemoryLimitMiB")]
    pub memory_limit_mib: u32,
    /// Port the container listens on.
    pub container_port: u16,
    /// Non-secret environment variables.
    pub environment: BTreeMap<String, EnvValue>,
    /// Secret-backed environment variables, referenced by identity.
    pub secrets: BTreeMap<String, SecretField>,
    /// Load balancer addressing.
    pub ip_address_type: IpProtocol,
    /// Listener protocol.
    pub protocol: ListenerProtocol,
    /// Redirect plain HTTP to HTTPS.
    #[serde(rename = "RedirectHTTP")]
    pub redirect_http: bool,
    /// Share of desired capacity kept healthy during deployments.
    pub min_healthy_percent: u32,
    /// Deployment circuit breaker.
    pub circuit_breaker: CircuitBreaker,
    /// Allow remote command execution into running containers.
    pub enable_execute_command: bool,
    /// HTTP path probed by the target group health check.
    pub health_check_path: String,
}

/// Ingress on a resource's default port from another resource's security group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IngressRuleSpec {
    /// Resource whose security group receives the rule.
    pub target: ResourceId,
    /// Resource whose security group is allowed in.
    pub source: ResourceId,
    /// Port opened on the target.
    pub port: u16,
    /// Rule description.
    pub description: String,
}

/// Bounds for the service task count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScalableTargetSpec {
    /// Service whose task count scales.
    pub service: ResourceId,
    /// Task count floor.
    pub min_capacity: u32,
    /// Task count ceiling.
    pub max_capacity: u32,
}

/// Metric tracked by a scaling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalingMetric {
    /// Average CPU utilization.
    #[serde(rename = "ECSServiceAverageCPUUtilization")]
    Cpu,
    /// Average memory utilization.
    #[serde(rename = "ECSServiceAverageMemoryUtilization")]
    Memory,
}

/// Target-tracking policy on a scalable target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScalingPolicySpec {
    /// Scalable target the policy drives.
    pub target: ResourceId,
    /// Tracked metric.
    pub metric: ScalingMetric,
    /// Target average utilization in percent.
    pub target_utilization_percent: u32,
}

/// Desired state of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResourceSpec {
    /// See [`VpcSpec`].
    Vpc(VpcSpec),
    /// See [`HostedZoneLookupSpec`].
    HostedZoneLookup(HostedZoneLookupSpec),
    /// See [`DatabaseSecretSpec`].
    DatabaseSecret(DatabaseSecretSpec),
    /// See [`DatabaseInstanceSpec`].
    DatabaseInstance(DatabaseInstanceSpec),
    /// See [`SqlProviderSpec`].
    SqlProvider(SqlProviderSpec),
    /// See [`SqlDatabaseSpec`].
    SqlDatabase(SqlDatabaseSpec),
    /// See [`SqlRoleSpec`].
    SqlRole(SqlRoleSpec),
    /// See [`SqlSchemaSpec`].
    SqlSchema(SqlSchemaSpec),
    /// See [`GeneratedSecretSpec`].
    Secret(GeneratedSecretSpec),
    /// See [`ContainerImageSpec`].
    ContainerImage(ContainerImageSpec),
    /// See [`LoadBalancedServiceSpec`].
    LoadBalancedService(LoadBalancedServiceSpec),
    /// See [`IngressRuleSpec`].
    IngressRule(IngressRuleSpec),
    /// See [`ScalableTargetSpec`].
    ScalableTarget(ScalableTargetSpec),
    /// See [`ScalingPolicySpec`].
    ScalingPolicy(ScalingPolicySpec),
}

impl ResourceSpec {
    /// Category of this spec.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Vpc(_) => ResourceKind::Vpc,
            Self::HostedZoneLookup(_) => ResourceKind::HostedZoneLookup,
            Self::DatabaseSecret(_) => ResourceKind::DatabaseSecret,
            Self::DatabaseInstance(_) => ResourceKind::DatabaseInstance,
            Self::SqlProvider(_) => ResourceKind::SqlProvider,
            Self::SqlDatabase(_) => ResourceKind::SqlDatabase,
            Self::SqlRole(_) => ResourceKind::SqlRole,
            Self::SqlSchema(_) => ResourceKind::SqlSchema,
            Self::Secret(_) => ResourceKind::Secret,
            Self::ContainerImage(_) => ResourceKind::ContainerImageAsset,
            Self::LoadBalancedService(_) => ResourceKind::LoadBalancedFargateService,
            Self::IngressRule(_) => ResourceKind::SecurityGroupIngress,
            Self::ScalableTarget(_) => ResourceKind::ScalableTaskCount,
            Self::ScalingPolicy(_) => ResourceKind::TargetTrackingScalingPolicy,
        }
    }

    /// Every declaration this spec references, in field order, without duplicates.
    #[must_use]
    pub fn references(&self) -> Vec<&ResourceId> {
        let refs: Vec<&ResourceId> = match self {
            Self::Vpc(_)
            | Self::HostedZoneLookup(_)
            | Self::DatabaseSecret(_)
            | Self::Secret(_)
            | Self::ContainerImage(_) => Vec::new(),
            Self::DatabaseInstance(spec) => {
                std::iter::once(&spec.vpc).chain(spec.credentials.as_ref()).collect()
            }
            Self::SqlProvider(spec) => vec![&spec.vpc, &spec.database_instance, &spec.secret],
            Self::SqlDatabase(spec) => vec![&spec.provider],
            Self::SqlRole(spec) => vec![&spec.provider, &spec.database],
            Self::SqlSchema(spec) => vec![&spec.provider, &spec.database, &spec.role],
            Self::LoadBalancedService(spec) => [&spec.vpc, &spec.domain_zone, &spec.image]
                .into_iter()
                .chain(spec.environment.values().filter_map(EnvValue::reference))
                .chain(spec.secrets.values().map(|s| &s.secret))
                .collect(),
            Self::IngressRule(spec) => vec![&spec.target, &spec.source],
            Self::ScalableTarget(spec) => vec![&spec.service],
            Self::ScalingPolicy(spec) => vec![&spec.target],
        };
        let mut unique: Vec<&ResourceId> = Vec::with_capacity(refs.len());
        for id in refs {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        unique
    }
}

/// One node of the declaration graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Construct path.
    pub id: ResourceId,
    /// Desired state.
    pub spec: ResourceSpec,
    /// Tags applied to the resource.
    pub tags: Tags,
}

impl Declaration {
    /// Category of this declaration.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.spec.kind()
    }

    /// The secret this declaration exposes, if any.
    ///
    /// A database instance exposes the admin credential it authenticates
    /// with; a role exposes its own generated secret.
    #[must_use]
    pub fn secret(&self) -> Option<ResourceId> {
        match &self.spec {
            ResourceSpec::DatabaseSecret(_) | ResourceSpec::Secret(_) => Some(self.id.clone()),
            ResourceSpec::DatabaseInstance(spec) => spec.credentials.clone(),
            ResourceSpec::SqlRole(spec) => spec.secret_name.as_ref().map(|_| self.id.clone()),
            _ => None,
        }
    }

    /// Removal policy for stateful resources.
    #[must_use]
    pub const fn removal_policy(&self) -> Option<RemovalPolicy> {
        match &self.spec {
            ResourceSpec::DatabaseInstance(spec) => Some(spec.removal_policy),
            _ => None,
        }
    }
}
