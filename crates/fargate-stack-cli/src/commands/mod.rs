//! CLI command definitions and dispatch.

pub mod config;
pub mod envs;
pub mod plan;
pub mod synth;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use fargate_stack_common::constants::{BIN_NAME, DEFAULT_STACK_ID, ENVIRONMENT_VAR};
use fargate_stack_config::{EnvironmentTable, ResolvedConfig};

/// fstack — Declare and synthesize the Fargate web application stack.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Environment whose configuration is used. Defaults to `dev`.
    #[arg(long, global = true, env = ENVIRONMENT_VAR)]
    pub environment: Option<String>,

    /// JSON file replacing the built-in environment table.
    #[arg(long, global = true)]
    pub config_file: Option<PathBuf>,

    /// Identifier of the stack (ASCII letters, digits, and `-`).
    #[arg(long, global = true, default_value = DEFAULT_STACK_ID, value_parser = parse_stack_id)]
    pub stack_id: String,

    /// Log output format (logs go to stderr).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compose the stack and render its manifest.
    Synth(synth::SynthArgs),
    /// Display declarations in deployment order.
    Plan(plan::PlanArgs),
    /// Print the resolved configuration.
    Config(config::ConfigArgs),
    /// List the recognized environments.
    Envs(envs::EnvsArgs),
}

fn parse_stack_id(value: &str) -> Result<String, String> {
    fargate_stack_compose::check_stack_id(value)
        .map(|()| value.to_string())
        .map_err(|e| e.to_string())
}

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Globals {
    /// Environment selector, if set.
    pub environment: Option<String>,
    /// Table override file, if set.
    pub config_file: Option<PathBuf>,
    /// Stack identifier.
    pub stack_id: String,
}

impl Globals {
    /// Loads the environment table: the override file if given, else the built-in one.
    ///
    /// # Errors
    ///
    /// Returns an error if the override file cannot be loaded.
    pub fn table(&self) -> anyhow::Result<EnvironmentTable> {
        Ok(match &self.config_file {
            Some(path) => EnvironmentTable::load(path)?,
            None => EnvironmentTable::builtin(),
        })
    }

    /// Resolves the active configuration. This is the pre-flight gate: it
    /// fails before any declaration work starts.
    ///
    /// # Errors
    ///
    /// Returns an error if the selector is unknown or the record is invalid.
    pub fn resolve(&self) -> anyhow::Result<ResolvedConfig> {
        let table = self.table()?;
        Ok(fargate_stack_config::resolve_in(
            &table,
            self.environment.as_deref(),
        )?)
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let globals = Globals {
        environment: cli.environment,
        config_file: cli.config_file,
        stack_id: cli.stack_id,
    };
    match cli.command {
        Command::Synth(args) => synth::execute(&globals, args),
        Command::Plan(args) => plan::execute(&globals, args),
        Command::Config(args) => config::execute(&globals, args),
        Command::Envs(args) => envs::execute(&globals, args),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn environment_flag_is_parsed() {
        let cli = Cli::try_parse_from(["fstack", "--environment", "prod", "plan"]).expect("parse");
        assert_eq!(cli.environment.as_deref(), Some("prod"));
        assert_eq!(cli.stack_id, "DemoTodo");
        assert!(matches!(cli.command, Command::Plan(_)));
    }

    #[test]
    fn stack_id_must_be_a_single_path_component() {
        for stack_id in ["", "a/b", "../x"] {
            assert!(
                Cli::try_parse_from([BIN_NAME, "--stack-id", stack_id, "plan"]).is_err(),
                "{stack_id:?}"
            );
        }
        let cli = Cli::try_parse_from([BIN_NAME, "--stack-id", "Demo-2", "synth"]).expect("parse");
        assert_eq!(cli.stack_id, "Demo-2");
    }

    #[test]
    fn unknown_environment_fails_resolution() {
        let globals = Globals {
            environment: Some("qa".into()),
            config_file: None,
            stack_id: "DemoTodo".into(),
        };
        let msg = globals.resolve().unwrap_err().to_string();
        assert!(msg.contains("qa"), "got: {msg}");
    }
}
