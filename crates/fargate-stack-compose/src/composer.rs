//! Stack composition for one resolved configuration.
//!
//! Declares, in dependency order: network, DNS zone lookup, admin
//! credential, database instance, application credential chain, application
//! secret bundle, container image, load-balanced service (with health check),
//! database ingress from the service, and task-count autoscaling.
//!
//! Composition either returns a complete stack or an error; a partially
//! declared stack is dropped with the error.

use std::collections::BTreeMap;

use fargate_stack_common::constants::{
    APPLICATION_DATABASE_NAME, APPLICATION_DATABASE_USERNAME, APPLICATION_SCHEMA_NAME,
    DATABASE_ADMIN_USERNAME, DATABASE_CA_CERTIFICATE, DATABASE_STORAGE_TYPE, MAX_TASK_COUNT,
    MIN_HEALTHY_PERCENT, MIN_TASK_COUNT, POSTGRES_ENGINE_VERSION, POSTGRES_PORT,
    SECRET_EXCLUDED_CHARACTERS, SECRET_KEY_BASE, SECRET_KEY_BASE_LENGTH,
    TARGET_UTILIZATION_PERCENT,
};
use fargate_stack_common::error::{Result, StackError};
use fargate_stack_config::{ResolvedConfig, StackConfig, validator};

use crate::credentials::{PostgresCredentialsRequest, provision_postgres_credentials};
use crate::declaration::{
    CircuitBreaker, ContainerImageSpec, DatabaseInstanceSpec, DatabaseSecretSpec, EnvValue,
    GeneratedSecretSpec, HostedZoneLookupSpec, IngressRuleSpec, IpProtocol, ListenerProtocol,
    LoadBalancedServiceSpec, ResourceId, ResourceSpec, ScalableTargetSpec, ScalingMetric,
    ScalingPolicySpec, SecretField, VpcSpec,
};
use crate::stack::{App, Stack, StackEnvironment};

/// Non-secret container environment variables.
pub const PLAIN_ENVIRONMENT_KEYS: [&str; 4] =
    ["PHX_HOST", "PORT", "DATABASE_HOST", "DATABASE_PORT"];

/// Secret-backed container environment variables.
pub const SECRET_ENVIRONMENT_KEYS: [&str; 4] = [
    "DATABASE_USERNAME",
    "DATABASE_PASSWORD",
    "DATABASE_NAME",
    SECRET_KEY_BASE,
];

/// Builds the app for one configuration: composes the stack, then applies
/// the configuration's tags to the whole tree.
///
/// # Errors
///
/// Returns an error if composition fails.
pub fn build_app(stack_id: &str, resolved: &ResolvedConfig) -> Result<App> {
    let stack = compose_stack(stack_id, resolved)?;
    let mut app = App::new();
    app.add_stack(stack);
    app.apply_tags(&resolved.config.tags);
    Ok(app)
}

/// Declares the full resource graph for `resolved` in a stack named
/// `stack_id`.
///
/// The record is validated again before any declaration, since
/// [`ResolvedConfig`] fields are public and may have been edited after
/// resolution.
///
/// # Errors
///
/// Returns [`StackError::Config`] if the stack id or the record is invalid,
/// [`StackError::MissingSecret`] if the admin or application credential is
/// absent after declaration, or a graph error if a declaration is rejected.
pub fn compose_stack(stack_id: &str, resolved: &ResolvedConfig) -> Result<Stack> {
    check_stack_id(stack_id)?;
    validator::validate(resolved.name, &resolved.config)?;
    let config = &resolved.config;
    let stack = Stack::new(
        stack_id,
        StackEnvironment {
            account: config.account_id.clone(),
            region: config.region.clone(),
        },
    );
    let mut composer = Composer { stack, config };
    composer.compose()?;
    tracing::info!(
        stack = %stack_id,
        declarations = composer.stack.graph().len(),
        "composed stack"
    );
    Ok(composer.stack)
}

/// Checks a stack id. Ids become the first component of every construct
/// path and secret name, and the manifest file name.
///
/// # Errors
///
/// Returns [`StackError::Config`] if the id is empty or holds anything other
/// than ASCII letters, digits, and `-`.
pub fn check_stack_id(stack_id: &str) -> Result<()> {
    if stack_id.is_empty() || !stack_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(StackError::Config {
            message: format!(
                "stack id must be non-empty and contain only ASCII letters, digits, and '-', got \"{stack_id}\""
            ),
        });
    }
    Ok(())
}

/// Lower-cased secret path namespaced by the stack id.
fn secret_path(stack_id: &str, suffix: &str) -> String {
    format!("/{stack_id}/{suffix}").to_lowercase()
}

struct Composer<'a> {
    stack: Stack,
    config: &'a StackConfig,
}

impl Composer<'_> {
    fn compose(&mut self) -> Result<()> {
        let vpc = self.declare_network()?;
        let zone = self.stack.declare(
            "ApplicationDomain",
            ResourceSpec::HostedZoneLookup(HostedZoneLookupSpec {
                domain_name: self.config.dns.base_domain.clone(),
            }),
        )?;
        let admin_credentials = self.declare_admin_credentials()?;
        let database = self.declare_database(&vpc, admin_credentials)?;

        let request = PostgresCredentialsRequest {
            database_instance: &database,
            secret_name: secret_path(self.stack.id(), "db/credentials/application"),
            username: APPLICATION_DATABASE_USERNAME.into(),
            database_name: APPLICATION_DATABASE_NAME.into(),
            schema_name: APPLICATION_SCHEMA_NAME.into(),
        };
        let application_credentials = provision_postgres_credentials(&mut self.stack, &request)?;

        let app_secrets = self.declare_application_secrets()?;
        let image = self.stack.declare(
            "ContainerImage",
            ResourceSpec::ContainerImage(ContainerImageSpec {
                directory: self.config.container.dockerfile_directory_path.clone(),
            }),
        )?;

        let service = self.declare_service(ServiceInputs {
            vpc: &vpc,
            zone: &zone,
            image: &image,
            database: &database,
            database_credentials: &application_credentials.secret,
            app_secrets: &app_secrets,
        })?;

        let _ = self.stack.declare(
            "DatabaseIngressFromApp",
            ResourceSpec::IngressRule(IngressRuleSpec {
                target: database,
                source: service.clone(),
                port: POSTGRES_PORT,
                description: "Allow Postgres access from the application".into(),
            }),
        )?;

        self.declare_autoscaling(&service)
    }

    fn declare_network(&mut self) -> Result<ResourceId> {
        let vpc = &self.config.vpc;
        if vpc.use_single_nat_gateway == Some(true) {
            tracing::warn!(
                max_azs = vpc.max_azs,
                "single NAT gateway shared by all zones; a zone outage removes all egress"
            );
        }
        self.stack.declare(
            "Vpc",
            ResourceSpec::Vpc(VpcSpec {
                max_azs: vpc.max_azs,
                nat_gateways: vpc.nat_gateways(),
                ip_protocol: IpProtocol::DualStack,
            }),
        )
    }

    fn declare_admin_credentials(&mut self) -> Result<ResourceId> {
        self.stack.declare(
            "DatabaseAdminCredentials",
            ResourceSpec::DatabaseSecret(DatabaseSecretSpec {
                secret_name: secret_path(self.stack.id(), "db/credentials/admin"),
                username: DATABASE_ADMIN_USERNAME.into(),
            }),
        )
    }

    fn declare_database(&mut self, vpc: &ResourceId, credentials: ResourceId) -> Result<ResourceId> {
        let database = &self.config.database;
        self.stack.declare(
            "DatabaseInstance",
            ResourceSpec::DatabaseInstance(DatabaseInstanceSpec {
                vpc: vpc.clone(),
                instance_class: database.instance_type.database_class(),
                engine: "postgres".into(),
                engine_version: POSTGRES_ENGINE_VERSION.into(),
                multi_az: database.multi_az,
                credentials: Some(credentials),
                allocated_storage: database.storage_size_gb,
                max_allocated_storage: database.max_storage_size_gb,
                storage_type: DATABASE_STORAGE_TYPE.into(),
                ca_certificate: DATABASE_CA_CERTIFICATE.into(),
                network_type: "DUAL".into(),
                port: POSTGRES_PORT,
                removal_policy: self.config.removal_policy,
            }),
        )
    }

    fn declare_application_secrets(&mut self) -> Result<ResourceId> {
        let stack_id = self.stack.id().to_string();
        self.stack.declare(
            "ApplicationSecrets",
            ResourceSpec::Secret(GeneratedSecretSpec {
                secret_name: secret_path(&stack_id, "application/secrets"),
                description: format!("{stack_id} application secrets"),
                generate_string_key: SECRET_KEY_BASE.into(),
                exclude_characters: SECRET_EXCLUDED_CHARACTERS.into(),
                password_length: SECRET_KEY_BASE_LENGTH,
            }),
        )
    }

    fn declare_service(&mut self, inputs: ServiceInputs<'_>) -> Result<ResourceId> {
        let container = &self.config.container;
        let environment = BTreeMap::from([
            (
                "PHX_HOST".to_string(),
                EnvValue::Literal(self.config.dns.app_domain.clone()),
            ),
            ("PORT".to_string(), EnvValue::Literal(container.port.to_string())),
            (
                "DATABASE_HOST".to_string(),
                EnvValue::Attribute {
                    resource: inputs.database.clone(),
                    attribute: "Endpoint.Address".into(),
                },
            ),
            (
                "DATABASE_PORT".to_string(),
                EnvValue::Attribute {
                    resource: inputs.database.clone(),
                    attribute: "Endpoint.Port".into(),
                },
            ),
        ]);
        let field = |secret: &ResourceId, field: &str| SecretField {
            secret: secret.clone(),
            field: field.into(),
        };
        let secrets = BTreeMap::from([
            (
                "DATABASE_USERNAME".to_string(),
                field(inputs.database_credentials, "username"),
            ),
            (
                "DATABASE_PASSWORD".to_string(),
                field(inputs.database_credentials, "password"),
            ),
            (
                "DATABASE_NAME".to_string(),
                field(inputs.database_credentials, "dbname"),
            ),
            (
                SECRET_KEY_BASE.to_string(),
                field(inputs.app_secrets, SECRET_KEY_BASE),
            ),
        ]);

        self.stack.declare(
            "App",
            ResourceSpec::LoadBalancedService(LoadBalancedServiceSpec {
                vpc: inputs.vpc.clone(),
                domain_zone: inputs.zone.clone(),
                domain_name: self.config.dns.app_domain.clone(),
                image: inputs.image.clone(),
                cpu: container.cpu_units,
                memory_limit_mib: container.memory_limit_mib,
                container_port: container.port,
                environment,
                secrets,
                ip_address_type: IpProtocol::DualStack,
                protocol: ListenerProtocol::Https,
                redirect_http: true,
                min_healthy_percent: MIN_HEALTHY_PERCENT,
                circuit_breaker: CircuitBreaker {
                    enable: true,
                    rollback: true,
                },
                enable_execute_command: true,
                health_check_path: container.health_check_path().to_string(),
            }),
        )
    }

    fn declare_autoscaling(&mut self, service: &ResourceId) -> Result<()> {
        let target = self.stack.declare(
            "AppTaskCount",
            ResourceSpec::ScalableTarget(ScalableTargetSpec {
                service: service.clone(),
                min_capacity: MIN_TASK_COUNT,
                max_capacity: MAX_TASK_COUNT,
            }),
        )?;
        for (name, metric) in [
            ("CpuScaling", ScalingMetric::Cpu),
            ("MemoryScaling", ScalingMetric::Memory),
        ] {
            let _ = self.stack.declare(
                name,
                ResourceSpec::ScalingPolicy(ScalingPolicySpec {
                    target: target.clone(),
                    metric,
                    target_utilization_percent: TARGET_UTILIZATION_PERCENT,
                }),
            )?;
        }
        Ok(())
    }
}

struct ServiceInputs<'a> {
    vpc: &'a ResourceId,
    zone: &'a ResourceId,
    image: &'a ResourceId,
    database: &'a ResourceId,
    database_credentials: &'a ResourceId,
    app_secrets: &'a ResourceId,
}
