//! Fixed names and values shared by the resolver, the composer and the CLI.

use crate::types::EnvironmentName;

/// Environment variable selecting the active configuration.
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

/// Environment used when the selector is unset.
pub const DEFAULT_ENVIRONMENT: EnvironmentName = EnvironmentName::Dev;

/// Default stack identifier.
pub const DEFAULT_STACK_ID: &str = "DemoTodo";

/// Application name used in CLI output and manifests.
pub const APP_NAME: &str = "fargate-stack";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "fstack";

/// Administrative database username.
pub const DATABASE_ADMIN_USERNAME: &str = "postgres";

/// Major version of the PostgreSQL engine.
pub const POSTGRES_ENGINE_VERSION: &str = "17";

/// Default PostgreSQL port.
pub const POSTGRES_PORT: u16 = 5432;

/// Database storage performance tier.
pub const DATABASE_STORAGE_TYPE: &str = "gp3";

/// Certificate authority used for client TLS validation.
pub const DATABASE_CA_CERTIFICATE: &str = "rds-ca-ecc384-g1";

/// Least-privilege role used by the application.
pub const APPLICATION_DATABASE_USERNAME: &str = "app";

/// Logical database owned by the application.
pub const APPLICATION_DATABASE_NAME: &str = "demo_app";

/// Schema owned by the application role.
pub const APPLICATION_SCHEMA_NAME: &str = "public";

/// JSON key of the generated application secret key.
pub const SECRET_KEY_BASE: &str = "SECRET_KEY_BASE";

/// Length of the generated application secret key.
pub const SECRET_KEY_BASE_LENGTH: u32 = 64;

/// Characters excluded from generated secrets.
pub const SECRET_EXCLUDED_CHARACTERS: &str = " %+~`#$&*()|[]{}:;<>?!'/@\"\\";

/// Health check path used when the configuration leaves it unset.
pub const DEFAULT_HEALTH_CHECK_PATH: &str = "/";

/// Task count floor.
pub const MIN_TASK_COUNT: u32 = 1;

/// Task count ceiling.
pub const MAX_TASK_COUNT: u32 = 5;

/// Target average utilization for both scaling policies, in percent.
pub const TARGET_UTILIZATION_PERCENT: u32 = 50;

/// Minimum healthy share of desired capacity during deployments, in percent.
pub const MIN_HEALTHY_PERCENT: u32 = 100;

/// Tag key identifying the environment a resource belongs to.
pub const ENVIRONMENT_TAG: &str = "Environment";
