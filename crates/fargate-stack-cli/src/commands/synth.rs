//! `fstack synth` — Compose the stack and render its manifest.

use std::path::PathBuf;

use clap::Args;
use fargate_stack_compose::synth::{self, OutputFormat};

use super::Globals;

/// Arguments for the `synth` command.
#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Write manifests into this directory instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Manifest format: json or yaml.
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,
}

/// Executes the `synth` command.
///
/// Resolves the configuration, composes the stack, applies global tags, and
/// renders the manifest. Nothing is rendered unless composition succeeds.
///
/// # Errors
///
/// Returns an error if resolution, composition, rendering, or writing fails.
pub fn execute(globals: &Globals, args: SynthArgs) -> anyhow::Result<()> {
    let resolved = globals.resolve()?;
    tracing::info!(
        environment = %resolved.name,
        stack = %globals.stack_id,
        format = %args.format,
        "synthesizing"
    );
    let app = fargate_stack_compose::build_app(&globals.stack_id, &resolved)?;

    if let Some(dir) = args.output {
        let written = synth::write_assembly(&app, &dir, args.format)?;
        for path in &written {
            println!("wrote {}", path.display());
        }
        return Ok(());
    }

    for stack in app.stacks() {
        let template = synth::render_stack(stack)?;
        println!("{}", synth::to_string(&template, args.format)?);
    }
    Ok(())
}
