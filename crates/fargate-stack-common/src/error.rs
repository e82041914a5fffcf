//! Unified error type for the fargate-stack workspace.
//!
//! Every failure is fatal at this layer: resolution and composition either
//! produce a complete result or one of these values, never a partial tree.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StackError {
    /// The environment selector named an unknown environment.
    #[error("invalid value for the ENVIRONMENT env var: \"{value}\". Available options: {available}")]
    InvalidEnvironment {
        /// The rejected selector value.
        value: String,
        /// Comma-separated list of recognized environment names.
        available: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A declaration that must expose a secret did not.
    #[error("the {resource} credentials are not defined")]
    MissingSecret {
        /// Human-readable name of the credential that is missing.
        resource: &'static str,
    },

    /// A declaration id was registered twice.
    #[error("duplicate declaration: {id}")]
    DuplicateDeclaration {
        /// Construct path of the duplicated declaration.
        id: String,
    },

    /// A declaration references a sibling that has not been declared.
    #[error("declaration {from} references undeclared {to}")]
    DanglingReference {
        /// Construct path of the referencing declaration.
        from: String,
        /// Construct path of the missing target.
        to: String,
    },

    /// The declaration graph contains a cycle.
    #[error("cyclic dependency detected in declaration graph")]
    CyclicDependency,

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML rendering failed.
    #[error("yaml error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StackError>;
