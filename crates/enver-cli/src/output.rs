//! Env file writing

use enver_core::{EnvEntry, render_env};
use std::path::Path;

use crate::error::{CliError, Result};

/// Render `entries` to `path`, creating its directory first
pub fn write_env_file(path: &Path, entries: &[EnvEntry]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| CliError::Io {
            message: format!("failed to create output directory {}: {e}", dir.display()),
        })?;
    }

    std::fs::write(path, render_env(entries)).map_err(|e| CliError::Io {
        message: format!("failed to write output file {}: {e}", path.display()),
    })
}
