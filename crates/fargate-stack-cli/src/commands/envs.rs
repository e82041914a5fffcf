//! `fstack envs` — List the recognized environments.

use clap::Args;
use fargate_stack_common::constants::DEFAULT_ENVIRONMENT;

use super::Globals;
use crate::output::format_mib;

/// Arguments for the `envs` command.
#[derive(Args, Debug)]
pub struct EnvsArgs {}

/// Executes the `envs` command.
///
/// # Errors
///
/// Returns an error if the environment table cannot be loaded.
pub fn execute(globals: &Globals, _args: EnvsArgs) -> anyhow::Result<()> {
    let table = globals.table()?;
    println!(
        "{:<8} {:<14} {:<14} {:<5} {:<10} {:<10}",
        "NAME", "ACCOUNT", "REGION", "AZS", "MEMORY", "REMOVAL"
    );
    for (name, config) in table.iter() {
        let marker = if name == DEFAULT_ENVIRONMENT { "*" } else { "" };
        println!(
            "{:<8} {:<14} {:<14} {:<5} {:<10} {:<10}",
            format!("{name}{marker}"),
            config.account_id,
            config.region,
            config.vpc.max_azs,
            format_mib(config.container.memory_limit_mib),
            config.removal_policy
        );
    }
    Ok(())
}
