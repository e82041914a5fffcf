//! Selector-to-configuration lookup.
//!
//! The selector is passed in explicitly; reading it from the process
//! environment is the caller's job. `None` selects the default environment.

use fargate_stack_common::constants::DEFAULT_ENVIRONMENT;
use fargate_stack_common::error::{Result, StackError};
use fargate_stack_common::types::EnvironmentName;

use crate::environments::EnvironmentTable;
use crate::model::StackConfig;
use crate::validator;

/// A configuration record together with the environment it was selected for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// The selected environment.
    pub name: EnvironmentName,
    /// An owned copy of the table record.
    pub config: StackConfig,
}

/// Resolves the active configuration from the built-in table.
///
/// # Errors
///
/// Returns [`StackError::InvalidEnvironment`] if `selector` names an unknown
/// environment, or [`StackError::Config`] if the record fails validation.
pub fn resolve(selector: Option<&str>) -> Result<ResolvedConfig> {
    resolve_in(&EnvironmentTable::builtin(), selector)
}

/// Resolves the active configuration from `table`.
///
/// # Errors
///
/// Returns [`StackError::InvalidEnvironment`] if `selector` names an
/// environment the table does not hold, or [`StackError::Config`] if no
/// selector is given and the table lacks the default environment, or if the
/// record fails validation.
pub fn resolve_in(table: &EnvironmentTable, selector: Option<&str>) -> Result<ResolvedConfig> {
    let name = match selector {
        Some(value) => value.parse::<EnvironmentName>()?,
        None => DEFAULT_ENVIRONMENT,
    };

    let available = || {
        table
            .names()
            .iter()
            .map(|n| n.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let config = match (table.get(name), selector) {
        (Some(config), _) => config.clone(),
        (None, Some(_)) => {
            return Err(StackError::InvalidEnvironment {
                value: name.to_string(),
                available: available(),
            });
        }
        (None, None) => {
            return Err(StackError::Config {
                message: format!(
                    "table has no entry for default environment {name} (available: {})",
                    available()
                ),
            });
        }
    };

    validator::validate(name, &config)?;
    tracing::info!(
        environment = %name,
        account = %config.account_id,
        region = %config.region,
        "resolved stack configuration"
    );
    Ok(ResolvedConfig { name, config })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use fargate_stack_common::types::RemovalPolicy;

    use super::*;

    #[test]
    fn no_selector_resolves_to_dev() {
        let resolved = resolve(None).expect("should resolve");
        assert_eq!(resolved.name, EnvironmentName::Dev);
        let cfg = resolved.config;
        assert_eq!(cfg.vpc.max_azs, 2);
        assert_eq!(cfg.vpc.use_single_nat_gateway, Some(true));
        assert_eq!(cfg.removal_policy, RemovalPolicy::Destroy);
        assert_eq!(cfg.container.cpu_units, 256);
        assert_eq!(cfg.container.memory_limit_mib, 512);
    }

    #[test]
    fn prod_selector_resolves_to_prod() {
        let cfg = resolve(Some("prod")).expect("should resolve").config;
        assert_eq!(cfg.vpc.max_azs, 3);
        assert_eq!(cfg.vpc.use_single_nat_gateway, None);
        assert_eq!(cfg.removal_policy, RemovalPolicy::Retain);
        assert!(cfg.database.multi_az);
        assert_eq!(cfg.container.cpu_units, 512);
        assert_eq!(cfg.container.memory_limit_mib, 1024);
    }

    #[test]
    fn unknown_selector_fails_with_options() {
        for selector in ["staging", "qa", "", "Dev"] {
            let err = resolve(Some(selector)).unwrap_err();
            assert!(
                matches!(err, StackError::InvalidEnvironment { .. }),
                "{selector}: {err}"
            );
            let msg = err.to_string();
            assert!(msg.contains("dev"), "got: {msg}");
            assert!(msg.contains("prod"), "got: {msg}");
        }
    }

    #[test]
    fn removal_policy_destructive_only_for_dev() {
        for name in EnvironmentName::ALL {
            let cfg = resolve(Some(name.as_str())).expect("should resolve").config;
            assert_eq!(
                cfg.removal_policy.is_destructive(),
                name == EnvironmentName::Dev,
                "{name}"
            );
        }
    }

    #[test]
    fn app_domain_within_base_domain_for_every_environment() {
        for name in EnvironmentName::ALL {
            let cfg = resolve(Some(name.as_str())).expect("should resolve").config;
            assert!(cfg.dns.app_domain_in_zone(), "{name}");
        }
    }

    #[test]
    fn resolved_record_is_an_independent_copy() {
        let mut first = resolve(None).expect("should resolve");
        first.config.region = "us-east-1".into();
        let second = resolve(None).expect("should resolve");
        assert_eq!(second.config.region, "eu-central-1");
    }

    #[test]
    fn table_without_entry_reports_its_names() {
        let mut entries = BTreeMap::new();
        let dev = EnvironmentTable::builtin()
            .get(EnvironmentName::Dev)
            .cloned()
            .expect("dev");
        let _ = entries.insert(EnvironmentName::Dev, dev);
        let table = EnvironmentTable::from_entries(entries);

        let err = resolve_in(&table, Some("prod")).unwrap_err();
        assert!(matches!(
            err,
            StackError::InvalidEnvironment { ref available, .. } if available == "dev"
        ));
    }

    #[test]
    fn table_without_default_reports_missing_default() {
        let mut entries = BTreeMap::new();
        let prod = EnvironmentTable::builtin()
            .get(EnvironmentName::Prod)
            .cloned()
            .expect("prod");
        let _ = entries.insert(EnvironmentName::Prod, prod);
        let table = EnvironmentTable::from_entries(entries);

        let err = resolve_in(&table, None).unwrap_err();
        assert!(matches!(err, StackError::Config { .. }), "{err}");
        let msg = err.to_string();
        assert!(msg.contains("default environment dev"), "got: {msg}");
        assert!(!msg.contains("ENVIRONMENT env var"), "got: {msg}");
        assert!(resolve_in(&table, Some("prod")).is_ok());
    }

    #[test]
    fn invalid_record_fails_before_returning() {
        let mut entries = BTreeMap::new();
        let mut prod = EnvironmentTable::builtin()
            .get(EnvironmentName::Prod)
            .cloned()
            .expect("prod");
        prod.vpc.use_single_nat_gateway = Some(true);
        let _ = entries.insert(EnvironmentName::Prod, prod);
        let table = EnvironmentTable::from_entries(entries);

        assert!(matches!(
            resolve_in(&table, Some("prod")),
            Err(StackError::Config { .. })
        ));
    }
}
