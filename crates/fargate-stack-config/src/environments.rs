//! The table of named environment configurations.
//!
//! New environments are added by inserting a record, never by branching at
//! call sites. Operators can also replace the built-in table with a JSON file
//! keyed by environment name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fargate_stack_common::constants::ENVIRONMENT_TAG;
use fargate_stack_common::error::{Result, StackError};
use fargate_stack_common::types::{
    EnvironmentName, InstanceClass, InstanceSize, InstanceType, RemovalPolicy, Tags,
};

use crate::model::{ContainerConfig, DatabaseConfig, DnsConfig, StackConfig, VpcConfig};

/// Named configurations, keyed by environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentTable {
    entries: BTreeMap<EnvironmentName, StackConfig>,
}

impl EnvironmentTable {
    /// Returns the built-in table with the `dev` and `prod` records.
    #[must_use]
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        let _ = entries.insert(EnvironmentName::Dev, dev());
        let _ = entries.insert(EnvironmentName::Prod, prod());
        Self { entries }
    }

    /// Builds a table from explicit records.
    #[must_use]
    pub const fn from_entries(entries: BTreeMap<EnvironmentName, StackConfig>) -> Self {
        Self { entries }
    }

    /// Loads a table from a JSON object keyed by environment name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not deserialize
    /// into a table.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading environment table");
        let content = std::fs::read_to_string(path).map_err(|e| StackError::Io {
            path: PathBuf::from(path),
            source: e,
        })?;
        let entries: BTreeMap<EnvironmentName, StackConfig> = serde_json::from_str(&content)?;
        Ok(Self { entries })
    }

    /// Returns the record for `name`, if the table holds one.
    #[must_use]
    pub fn get(&self, name: EnvironmentName) -> Option<&StackConfig> {
        self.entries.get(&name)
    }

    /// Iterates the records in environment order.
    pub fn iter(&self) -> impl Iterator<Item = (EnvironmentName, &StackConfig)> {
        self.entries.iter().map(|(name, config)| (*name, config))
    }

    /// Returns the environment names present in the table.
    #[must_use]
    pub fn names(&self) -> Vec<EnvironmentName> {
        self.entries.keys().copied().collect()
    }
}

impl Default for EnvironmentTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn tags(environment: EnvironmentName) -> Tags {
    let mut tags = Tags::new();
    let _ = tags.insert(ENVIRONMENT_TAG.into(), environment.as_str().into());
    let _ = tags.insert("Owner".into(), "product".into());
    tags
}

fn dev() -> StackConfig {
    StackConfig {
        account_id: "000000000000".into(),
        region: "eu-central-1".into(),
        tags: tags(EnvironmentName::Dev),
        vpc: VpcConfig {
            max_azs: 2,
            use_single_nat_gateway: Some(true),
        },
        dns: DnsConfig {
            base_domain: "example.com".into(),
            app_domain: "demo-todo-dev.example.com".into(),
        },
        database: DatabaseConfig {
            instance_type: InstanceType::of(InstanceClass::Burstable4Graviton, InstanceSize::Micro),
            multi_az: false,
            storage_size_gb: 20,
            max_storage_size_gb: Some(50),
        },
        container: ContainerConfig {
            dockerfile_directory_path: PathBuf::from("../"),
            port: 4000,
            cpu_units: 256,
            memory_limit_mib: 512,
            health_check_path: Some("/healthz".into()),
        },
        removal_policy: RemovalPolicy::Destroy,
    }
}

fn prod() -> StackConfig {
    StackConfig {
        account_id: "111111111111".into(),
        region: "eu-central-1".into(),
        tags: tags(EnvironmentName::Prod),
        vpc: VpcConfig {
            max_azs: 3,
            use_single_nat_gateway: None,
        },
        dns: DnsConfig {
            base_domain: "example.com".into(),
            app_domain: "demo-todo.example.com".into(),
        },
        database: DatabaseConfig {
            instance_type: InstanceType::of(InstanceClass::M8g, InstanceSize::Medium),
            multi_az: true,
            storage_size_gb: 50,
            max_storage_size_gb: Some(200),
        },
        container: ContainerConfig {
            dockerfile_directory_path: PathBuf::from("../"),
            port: 4000,
            cpu_units: 512,
            memory_limit_mib: 1024,
            health_check_path: Some("/healthz".into()),
        },
        removal_policy: RemovalPolicy::Retain,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_table_holds_every_environment() {
        let table = EnvironmentTable::builtin();
        assert_eq!(table.names(), EnvironmentName::ALL.to_vec());
    }

    #[test]
    fn dev_and_prod_differ_in_sizing() {
        let table = EnvironmentTable::builtin();
        let dev = table.get(EnvironmentName::Dev).expect("dev");
        let prod = table.get(EnvironmentName::Prod).expect("prod");
        assert_eq!(dev.vpc.max_azs, 2);
        assert_eq!(prod.vpc.max_azs, 3);
        assert!(!dev.database.multi_az);
        assert!(prod.database.multi_az);
        assert_eq!(dev.database.instance_type.to_string(), "t4g.micro");
        assert_eq!(prod.database.instance_type.to_string(), "m8g.medium");
    }

    #[test]
    fn tags_carry_environment_name() {
        let table = EnvironmentTable::builtin();
        for (name, config) in table.iter() {
            assert_eq!(
                config.tags.get("Environment").map(String::as_str),
                Some(name.as_str())
            );
            assert_eq!(config.tags.get("Owner").map(String::as_str), Some("product"));
        }
    }

    #[test]
    fn load_reads_json_table() {
        let builtin = EnvironmentTable::builtin();
        let json = serde_json::to_string(&builtin.entries).expect("serialize");
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(json.as_bytes()).expect("write");

        let loaded = EnvironmentTable::load(file.path()).expect("load");
        assert_eq!(loaded, builtin);
    }

    #[test]
    fn load_rejects_unknown_environment_key() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(br#"{"staging": {}}"#).expect("write");
        assert!(EnvironmentTable::load(file.path()).is_err());
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = EnvironmentTable::load(Path::new("/nonexistent/envs.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/envs.json"));
    }
}
