//! Configuration model for one deployment environment.

use std::path::PathBuf;

use fargate_stack_common::constants::DEFAULT_HEALTH_CHECK_PATH;
use fargate_stack_common::types::{InstanceType, RemovalPolicy, Tags};
use serde::{Deserialize, Serialize};

/// Full parameter set for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
    /// Account to deploy to (12 digits).
    pub account_id: String,
    /// Region to deploy to.
    pub region: String,
    /// Tags applied to every deployed resource.
    pub tags: Tags,
    /// Network shape.
    pub vpc: VpcConfig,
    /// DNS names.
    pub dns: DnsConfig,
    /// Database sizing.
    pub database: DatabaseConfig,
    /// Container sizing and build context.
    pub container: ContainerConfig,
    /// Removal policy for stateful resources.
    pub removal_policy: RemovalPolicy,
}

/// Network options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcConfig {
    /// Number of availability zones the network spans (2 or 3).
    pub max_azs: u8,
    /// Provision one NAT gateway shared by every zone instead of one per zone.
    ///
    /// Never set this on a production environment: losing the zone that hosts
    /// the gateway removes egress for the whole network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_single_nat_gateway: Option<bool>,
}

impl VpcConfig {
    /// Number of NAT gateways to request, or `None` for one per zone.
    #[must_use]
    pub fn nat_gateways(&self) -> Option<u8> {
        self.use_single_nat_gateway.unwrap_or(false).then_some(1)
    }
}

/// DNS options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsConfig {
    /// Name of the existing hosted zone, e.g. `example.com`.
    pub base_domain: String,
    /// Name attached to the load balancer. Equal to or a subdomain of `base_domain`.
    pub app_domain: String,
}

impl DnsConfig {
    /// Returns `true` if `app_domain` equals `base_domain` or is a subdomain of it.
    #[must_use]
    pub fn app_domain_in_zone(&self) -> bool {
        let base = self.base_domain.trim_end_matches('.').to_ascii_lowercase();
        let app = self.app_domain.trim_end_matches('.').to_ascii_lowercase();
        !base.is_empty()
            && (app == base
                || app
                    .strip_suffix(&base)
                    .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.')))
    }
}

/// Database options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Instance type of the database.
    pub instance_type: InstanceType,
    /// Replicate across availability zones.
    pub multi_az: bool,
    /// Allocated storage in GB.
    #[serde(rename = "storageSizeInGb")]
    pub storage_size_gb: u32,
    /// Ceiling for storage autoscaling in GB. Absent means no autoscaling.
    #[serde(
        rename = "maxStorageSizeInGb",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_storage_size_gb: Option<u32>,
}

/// Container options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerConfig {
    /// Directory holding the Dockerfile used to build the image.
    pub dockerfile_directory_path: PathBuf,
    /// Port exposed through the load balancer.
    pub port: u16,
    /// CPU units for the task (256 = 0.25 vCPU).
    pub cpu_units: u32,
    /// Memory for the task in MiB.
    #[serde(rename = "memoryLimitMiB")]
    pub memory_limit_mib: u32,
    /// HTTP path for health checks. Defaults to `/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_path: Option<String>,
}

impl ContainerConfig {
    /// Health check path with the default applied.
    #[must_use]
    pub fn health_check_path(&self) -> &str {
        self.health_check_path
            .as_deref()
            .unwrap_or(DEFAULT_HEALTH_CHECK_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dns(base: &str, app: &str) -> DnsConfig {
        DnsConfig {
            base_domain: base.into(),
            app_domain: app.into(),
        }
    }

    #[test]
    fn app_domain_equal_to_base_is_in_zone() {
        assert!(dns("example.com", "example.com").app_domain_in_zone());
    }

    #[test]
    fn subdomain_is_in_zone() {
        assert!(dns("example.com", "demo-todo.example.com").app_domain_in_zone());
        assert!(dns("example.com", "a.b.Example.COM.").app_domain_in_zone());
    }

    #[test]
    fn suffix_without_label_boundary_is_not_in_zone() {
        assert!(!dns("example.com", "badexample.com").app_domain_in_zone());
        assert!(!dns("example.com", ".example.com").app_domain_in_zone());
        assert!(!dns("example.com", "example.org").app_domain_in_zone());
    }

    #[test]
    fn single_nat_flag_maps_to_gateway_count() {
        let shared = VpcConfig {
            max_azs: 2,
            use_single_nat_gateway: Some(true),
        };
        let per_zone = VpcConfig {
            max_azs: 3,
            use_single_nat_gateway: None,
        };
        assert_eq!(shared.nat_gateways(), Some(1));
        assert_eq!(per_zone.nat_gateways(), None);
    }

    #[test]
    fn health_check_path_defaults_to_root() {
        let container = ContainerConfig {
            dockerfile_directory_path: PathBuf::from("../"),
            port: 4000,
            cpu_units: 256,
            memory_limit_mib: 512,
            health_check_path: None,
        };
        assert_eq!(container.health_check_path(), "/");
    }
}
