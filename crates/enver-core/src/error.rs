//! Core error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("type is required for source {name:?}")]
    MissingSourceType { name: String },

    #[error("unknown source type {kind:?} for source {name:?}")]
    UnknownSourceType { kind: String, name: String },

    #[error("{field} is required for {kind} source {name:?}")]
    MissingField {
        kind: String,
        name: String,
        field: String,
    },

    #[error("unknown transformation type: {0}")]
    UnknownTransformation(String),

    #[error("{field} is required for {transformation} transformation")]
    MissingParameter {
        transformation: String,
        field: String,
    },

    #[error("failed to write file {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Configuration errors abort a run before anything is fetched
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CoreError::MissingSourceType { .. }
                | CoreError::UnknownSourceType { .. }
                | CoreError::MissingField { .. }
                | CoreError::UnknownTransformation(_)
                | CoreError::MissingParameter { .. }
                | CoreError::YamlParse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
