//! # fargate-stack-config
//!
//! Selects the parameter set for one named environment.
//!
//! Handles:
//! - **Model**: the `StackConfig` record and its network, DNS, database and
//!   container sub-records.
//! - **Environments**: the data-driven table of named configurations.
//! - **Resolver**: selector-to-configuration lookup with a documented default.
//! - **Validator**: pre-flight checks that run before any declaration work.

pub mod environments;
pub mod model;
pub mod resolver;
pub mod validator;

pub use environments::EnvironmentTable;
pub use model::{ContainerConfig, DatabaseConfig, DnsConfig, StackConfig, VpcConfig};
pub use resolver::{ResolvedConfig, resolve, resolve_in};
