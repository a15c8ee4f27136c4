//! CLI commands

pub mod execute;
pub mod generate;
pub mod validate;

use enver_core::EnverConfig;
use std::path::Path;

use crate::error::{CliError, Result};

/// Load `.enver.yaml`, naming the file in every error
pub(crate) fn load_config(path: &Path) -> Result<EnverConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::config_with_help(
            format!("failed to read {}: {e}", path.display()),
            "run enver from the directory holding .enver.yaml, or pass --config",
        )
    })?;

    EnverConfig::from_yaml(&content)
        .map_err(|e| CliError::config(format!("failed to parse {}: {e}", path.display())))
}
