//! `fstack plan` — Display declarations in deployment order.

use clap::Args;

use super::Globals;
use crate::output::format_mib;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Also list the dependencies of each declaration.
    #[arg(long)]
    pub dependencies: bool,
}

/// Executes the `plan` command.
///
/// Resolves the configuration, composes the stack, and prints every
/// declaration with dependencies listed before their dependents.
///
/// # Errors
///
/// Returns an error if resolution, composition, or ordering fails.
pub fn execute(globals: &Globals, args: PlanArgs) -> anyhow::Result<()> {
    let resolved = globals.resolve()?;
    let app = fargate_stack_compose::build_app(&globals.stack_id, &resolved)?;
    let container = &resolved.config.container;

    for stack in app.stacks() {
        let graph = stack.graph();
        let order = graph.resolve_order()?;

        println!(
            "Deployment Plan for: {} ({}, {} / {})",
            stack.id(),
            resolved.name,
            stack.environment().account,
            stack.environment().region
        );
        println!("{}", "\u{2550}".repeat(48));
        println!();

        for declaration in &order {
            println!("  + {} ({})", declaration.id.name(), declaration.kind());
            if args.dependencies {
                for dep in graph.dependencies(&declaration.id) {
                    println!("      after: {}", dep.name());
                }
            }
            if let Some(policy) = declaration.removal_policy() {
                println!("      removal: {policy}");
            }
        }

        println!();
        println!("  {} declaration(s).", order.len());
        println!(
            "  Task size: {} CPU units, {}.",
            container.cpu_units,
            format_mib(container.memory_limit_mib)
        );
    }

    Ok(())
}
