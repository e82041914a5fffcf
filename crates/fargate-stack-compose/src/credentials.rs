//! Application database credential provisioning.
//!
//! Declares a least-privilege role for the application, the logical database
//! it owns, and a schema owned by that role. The role's secret carries the
//! `username`, `password` and `dbname` fields the application connects with;
//! the admin credential never leaves the provider.

use fargate_stack_common::error::{Result, StackError};

use crate::declaration::{
    ResourceId, ResourceSpec, SqlDatabaseSpec, SqlProviderSpec, SqlRoleSpec, SqlSchemaSpec,
    SubnetType,
};
use crate::stack::Stack;

/// Inputs for [`provision_postgres_credentials`].
#[derive(Debug, Clone)]
pub struct PostgresCredentialsRequest<'a> {
    /// Database instance the role is created on.
    pub database_instance: &'a ResourceId,
    /// Storage path of the application secret. A blank path leaves the role
    /// without a generated secret.
    pub secret_name: String,
    /// Application role name.
    pub username: String,
    /// Logical database name.
    pub database_name: String,
    /// Schema name.
    pub schema_name: String,
}

/// Declarations produced by [`provision_postgres_credentials`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresCredentials {
    /// Credential-management provider.
    pub provider: ResourceId,
    /// Logical database.
    pub database: ResourceId,
    /// Application role.
    pub role: ResourceId,
    /// Schema owned by the role.
    pub schema: ResourceId,
    /// Secret holding the role's connection fields.
    pub secret: ResourceId,
}

/// Declares provider, database, role and schema for the application.
///
/// # Errors
///
/// Returns [`StackError::MissingSecret`] if the database instance exposes no
/// admin secret or the role exposes no secret after declaration, and
/// [`StackError::Config`] if `database_instance` is not a database instance.
pub fn provision_postgres_credentials(
    stack: &mut Stack,
    request: &PostgresCredentialsRequest<'_>,
) -> Result<PostgresCredentials> {
    let instance = stack
        .get(request.database_instance)
        .ok_or_else(|| StackError::DanglingReference {
            from: stack.child("DatabaseProvider").to_string(),
            to: request.database_instance.to_string(),
        })?;
    let ResourceSpec::DatabaseInstance(instance_spec) = &instance.spec else {
        return Err(StackError::Config {
            message: format!("{} is not a database instance", instance.id),
        });
    };
    let vpc = instance_spec.vpc.clone();
    let admin_secret = instance.secret().ok_or(StackError::MissingSecret {
        resource: "database admin",
    })?;

    let provider = stack.declare(
        "DatabaseProvider",
        ResourceSpec::SqlProvider(SqlProviderSpec {
            vpc,
            subnet_type: SubnetType::PrivateWithEgress,
            database_instance: request.database_instance.clone(),
            secret: admin_secret,
            ipv6_allowed_for_dual_stack: true,
            allow_all_ipv6_outbound: true,
        }),
    )?;

    let database = stack.declare(
        "ApplicationDatabase",
        ResourceSpec::SqlDatabase(SqlDatabaseSpec {
            provider: provider.clone(),
            database_name: request.database_name.clone(),
        }),
    )?;

    let role_secret = request.secret_name.trim();
    let role = stack.declare(
        "DatabaseApplicationCredentials",
        ResourceSpec::SqlRole(SqlRoleSpec {
            provider: provider.clone(),
            database: database.clone(),
            role_name: request.username.clone(),
            secret_name: (!role_secret.is_empty()).then(|| role_secret.to_string()),
        }),
    )?;

    let schema = stack.declare(
        "DatabaseSchema",
        ResourceSpec::SqlSchema(SqlSchemaSpec {
            provider: provider.clone(),
            database: database.clone(),
            schema_name: request.schema_name.clone(),
            role: role.clone(),
        }),
    )?;

    let secret = stack
        .get(&role)
        .and_then(crate::declaration::Declaration::secret)
        .ok_or(StackError::MissingSecret {
            resource: "database application",
        })?;

    tracing::info!(
        role = %request.username,
        database = %request.database_name,
        schema = %request.schema_name,
        "declared application database credentials"
    );
    Ok(PostgresCredentials {
        provider,
        database,
        role,
        schema,
        secret,
    })
}

#[cfg(test)]
mod tests {
    use fargate_stack_common::types::RemovalPolicy;

    use super::*;
    use crate::declaration::{DatabaseInstanceSpec, DatabaseSecretSpec, IpProtocol, VpcSpec};
    use crate::graph::DeclarationGraph;
    use crate::stack::StackEnvironment;

    fn stack_with_instance(with_credentials: bool) -> (Stack, ResourceId) {
        let mut stack = Stack::new(
            "Test",
            StackEnvironment {
                account: "000000000000".into(),
                region: "eu-central-1".into(),
            },
        );
        let vpc = stack
            .declare(
                "Vpc",
                ResourceSpec::Vpc(VpcSpec {
                    max_azs: 2,
                    nat_gateways: Some(1),
                    ip_protocol: IpProtocol::DualStack,
                }),
            )
            .expect("vpc");
        let credentials = with_credentials.then(|| {
            stack
                .declare(
                    "DatabaseAdminCredentials",
                    ResourceSpec::DatabaseSecret(DatabaseSecretSpec {
                        secret_name: "/test/db/credentials/admin".into(),
                        username: "postgres".into(),
                    }),
                )
                .expect("admin secret")
        });
        let instance = stack
            .declare(
                "DatabaseInstance",
                ResourceSpec::DatabaseInstance(DatabaseInstanceSpec {
                    vpc,
                    instance_class: "db.t4g.micro".into(),
                    engine: "postgres".into(),
                    engine_version: "17".into(),
                    multi_az: false,
                    credentials,
                    allocated_storage: 20,
                    max_allocated_storage: None,
                    storage_type: "gp3".into(),
                    ca_certificate: "rds-ca-ecc384-g1".into(),
                    network_type: "DUAL".into(),
                    port: 5432,
                    removal_policy: RemovalPolicy::Destroy,
                }),
            )
            .expect("instance");
        (stack, instance)
    }

    fn request(instance: &ResourceId) -> PostgresCredentialsRequest<'_> {
        PostgresCredentialsRequest {
            database_instance: instance,
            secret_name: "/test/db/credentials/application".into(),
            username: "app".into(),
            database_name: "demo_app".into(),
            schema_name: "public".into(),
        }
    }

    fn graph(stack: &Stack) -> &DeclarationGraph {
        stack.graph()
    }

    #[test]
    fn declares_provider_database_role_schema_chain() {
        let (mut stack, instance) = stack_with_instance(true);
        let creds = provision_postgres_credentials(&mut stack, &request(&instance)).expect("ok");

        let g = graph(&stack);
        assert!(g.dependencies(&creds.provider).contains(&&instance));
        assert_eq!(g.dependencies(&creds.database), vec![&creds.provider]);
        assert!(g.dependencies(&creds.role).contains(&&creds.database));
        assert!(g.dependencies(&creds.schema).contains(&&creds.role));
        assert_eq!(creds.secret, creds.role);
    }

    #[test]
    fn provider_uses_admin_secret_in_private_subnets() {
        let (mut stack, instance) = stack_with_instance(true);
        let creds = provision_postgres_credentials(&mut stack, &request(&instance)).expect("ok");
        let provider = stack.get(&creds.provider).expect("provider");
        let ResourceSpec::SqlProvider(spec) = &provider.spec else {
            panic!("expected provider spec");
        };
        assert_eq!(spec.subnet_type, SubnetType::PrivateWithEgress);
        assert_eq!(spec.secret.as_str(), "Test/DatabaseAdminCredentials");
    }

    #[test]
    fn role_secret_lives_at_requested_path() {
        let (mut stack, instance) = stack_with_instance(true);
        let creds = provision_postgres_credentials(&mut stack, &request(&instance)).expect("ok");
        let ResourceSpec::SqlRole(spec) = &stack.get(&creds.role).expect("role").spec else {
            panic!("expected role spec");
        };
        assert_eq!(
            spec.secret_name.as_deref(),
            Some("/test/db/credentials/application")
        );
        assert_eq!(spec.role_name, "app");
    }

    #[test]
    fn missing_admin_secret_fails_before_declaring() {
        let (mut stack, instance) = stack_with_instance(false);
        let before = stack.graph().len();
        let err = provision_postgres_credentials(&mut stack, &request(&instance)).unwrap_err();
        assert!(matches!(err, StackError::MissingSecret { .. }), "got: {err}");
        assert_eq!(stack.graph().len(), before);
    }

    #[test]
    fn non_instance_target_is_rejected() {
        let (mut stack, _) = stack_with_instance(true);
        let vpc = stack.child("Vpc");
        let err = provision_postgres_credentials(&mut stack, &request(&vpc)).unwrap_err();
        assert!(matches!(err, StackError::Config { .. }), "got: {err}");
    }

    #[test]
    fn role_without_secret_path_fails_with_missing_application_secret() {
        let (mut stack, instance) = stack_with_instance(true);
        let mut req = request(&instance);
        req.secret_name = "  ".into();
        let err = provision_postgres_credentials(&mut stack, &req).unwrap_err();
        assert!(
            matches!(
                err,
                StackError::MissingSecret {
                    resource: "database application"
                }
            ),
            "got: {err}"
        );
        assert_eq!(
            err.to_string(),
            "the database application credentials are not defined"
        );
    }
}
