//! Pre-flight validation of a resolved configuration.
//!
//! Runs before any declaration work so composition never starts from a
//! record it would have to reject halfway through.

use fargate_stack_common::constants::ENVIRONMENT_TAG;
use fargate_stack_common::error::{Result, StackError};
use fargate_stack_common::types::EnvironmentName;

use crate::model::{ContainerConfig, DatabaseConfig, StackConfig};

/// Memory sizes (MiB) allowed with the smallest CPU size.
const QUARTER_VCPU_MEMORY: [u32; 3] = [512, 1024, 2048];

/// Valid Fargate memory ranges (MiB) for larger CPU sizes, as `(cpu, min, max, step)`.
const FARGATE_TASK_SIZES: [(u32, u32, u32, u32); 6] = [
    (512, 1024, 4096, 1024),
    (1024, 2048, 8192, 1024),
    (2048, 4096, 16384, 1024),
    (4096, 8192, 30720, 1024),
    (8192, 16384, 61440, 4096),
    (16384, 32768, 122_880, 8192),
];

/// Validates a configuration record for semantic correctness.
///
/// # Checks performed
///
/// 1. The account id is twelve digits and the region is set.
/// 2. The network spans two or three availability zones.
/// 3. A production-tagged environment does not share one NAT gateway.
/// 4. The application domain is the base domain or a subdomain of it.
/// 5. Storage autoscaling, when enabled, has a ceiling above the allocation.
/// 6. The container port is set, the CPU/memory pair is a valid Fargate
///    task size, and the health check path is absolute.
///
/// # Errors
///
/// Returns the first failing check as [`StackError::Config`].
pub fn validate(name: EnvironmentName, config: &StackConfig) -> Result<()> {
    tracing::debug!(environment = %name, "validating configuration");
    check_account(config)?;
    check_network(name, config)?;
    check_dns(config)?;
    check_database(&config.database)?;
    check_container(&config.container)?;
    Ok(())
}

/// Returns `true` if the record belongs to a production environment, either by
/// selector or by its `Environment` tag.
#[must_use]
pub fn is_production(name: EnvironmentName, config: &StackConfig) -> bool {
    name == EnvironmentName::Prod
        || config.tags.get(ENVIRONMENT_TAG).map(String::as_str) == Some(EnvironmentName::Prod.as_str())
}

fn config_error(message: String) -> StackError {
    StackError::Config { message }
}

fn check_account(config: &StackConfig) -> Result<()> {
    if config.account_id.len() != 12 || !config.account_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(config_error(format!(
            "account id must be 12 digits, got \"{}\"",
            config.account_id
        )));
    }
    if config.region.trim().is_empty() {
        return Err(config_error("region must not be empty".into()));
    }
    Ok(())
}

fn check_network(name: EnvironmentName, config: &StackConfig) -> Result<()> {
    if !matches!(config.vpc.max_azs, 2 | 3) {
        return Err(config_error(format!(
            "maxAzs must be 2 or 3, got {}",
            config.vpc.max_azs
        )));
    }
    if config.vpc.use_single_nat_gateway == Some(true) && is_production(name, config) {
        return Err(config_error(format!(
            "environment \"{name}\" is tagged for production and must not use a single NAT gateway"
        )));
    }
    Ok(())
}

fn check_dns(config: &StackConfig) -> Result<()> {
    if !config.dns.app_domain_in_zone() {
        return Err(config_error(format!(
            "appDomain \"{}\" must equal or be a subdomain of baseDomain \"{}\"",
            config.dns.app_domain, config.dns.base_domain
        )));
    }
    Ok(())
}

fn check_database(database: &DatabaseConfig) -> Result<()> {
    if database.storage_size_gb == 0 {
        return Err(config_error("storageSizeInGb must be positive".into()));
    }
    if let Some(max) = database.max_storage_size_gb {
        if max <= database.storage_size_gb {
            return Err(config_error(format!(
                "maxStorageSizeInGb ({max}) must exceed storageSizeInGb ({})",
                database.storage_size_gb
            )));
        }
    }
    Ok(())
}

fn check_container(container: &ContainerConfig) -> Result<()> {
    if container.port == 0 {
        return Err(config_error("container port must be non-zero".into()));
    }
    if !is_valid_task_size(container.cpu_units, container.memory_limit_mib) {
        return Err(config_error(format!(
            "{} CPU units with {} MiB is not a valid Fargate task size",
            container.cpu_units, container.memory_limit_mib
        )));
    }
    if let Some(path) = &container.health_check_path {
        if !path.starts_with('/') {
            return Err(config_error(format!(
                "healthCheckPath must start with '/', got \"{path}\""
            )));
        }
    }
    Ok(())
}

/// Returns `true` if `(cpu, memory_mib)` is a Fargate-supported task size.
#[must_use]
pub fn is_valid_task_size(cpu: u32, memory_mib: u32) -> bool {
    if cpu == 256 {
        return QUARTER_VCPU_MEMORY.contains(&memory_mib);
    }
    FARGATE_TASK_SIZES
        .iter()
        .find(|(size, ..)| *size == cpu)
        .is_some_and(|&(_, min, max, step)| {
            (min..=max).contains(&memory_mib) && (memory_mib - min) % step == 0
        })
}
