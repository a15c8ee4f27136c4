//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use enver_core::CoreError;
use enver_kube::KubeError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Configuration is missing, malformed or inconsistent
    #[error("Configuration error: {message}")]
    #[diagnostic(code(enver::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Cluster access failed
    #[error("{message}")]
    #[diagnostic(code(enver::cli::cluster))]
    Cluster { message: String },

    /// Invalid command-line usage
    #[error("{message}")]
    #[diagnostic(code(enver::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// One or more executions failed; each entry is `name: error`
    #[error("execution errors:\n  {}", .failures.join("\n  "))]
    #[diagnostic(code(enver::cli::execution))]
    Execution { failures: Vec<String> },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(enver::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Cluster { .. } => exit_codes::CLUSTER_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Execution { .. } => exit_codes::ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a usage error with help text
    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err)
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => Self::io(e),
            CoreError::FileWrite { .. } | CoreError::EnvFile { .. } => Self::Io {
                message: err.to_string(),
            },
            _ => Self::config(err.to_string()),
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        match err {
            KubeError::Core(e) => e.into(),
            e if e.is_configuration() => Self::config(e.to_string()),
            e => Self::Cluster {
                message: e.to_string(),
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
