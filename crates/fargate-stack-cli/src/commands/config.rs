//! `fstack config` — Print the resolved configuration.

use clap::Args;

use super::Globals;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print compact JSON on one line.
    #[arg(long)]
    pub compact: bool,
}

/// Executes the `config` command.
///
/// # Errors
///
/// Returns an error if resolution or serialization fails.
pub fn execute(globals: &Globals, args: ConfigArgs) -> anyhow::Result<()> {
    let resolved = globals.resolve()?;
    let json = if args.compact {
        serde_json::to_string(&resolved.config)?
    } else {
        serde_json::to_string_pretty(&resolved.config)?
    };
    println!("{json}");
    Ok(())
}
