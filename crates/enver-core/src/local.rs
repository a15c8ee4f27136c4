//! Fetchers for sources that never touch the cluster

use std::path::Path;

use crate::entry::{EntryCollector, Provenance};
use crate::error::{CoreError, Result};
use crate::source::{SourceType, VarEntry};

/// Split `KEY=VALUE` lines on the first `=`
///
/// Blank lines, `#` comments and lines without `=` are skipped. Keys and
/// values are trimmed; pairs with an empty key are dropped.
pub fn parse_env_lines(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Read a local `.env` style file
pub fn fetch_env_file(path: &Path, collector: &mut EntryCollector<'_>) -> Result<()> {
    let content = std::fs::read_to_string(path).map_err(|source| CoreError::EnvFile {
        path: path.to_path_buf(),
        source,
    })?;

    let provenance = Provenance::local(SourceType::EnvFile, path.to_string_lossy());
    for (key, value) in parse_env_lines(&content) {
        collector.push(&key, &value, &provenance)?;
    }

    Ok(())
}

/// Echo inline literals, skipping unnamed entries
pub fn fetch_vars(name: &str, vars: &[VarEntry], collector: &mut EntryCollector<'_>) -> Result<()> {
    let provenance = Provenance::local(SourceType::Vars, name);
    for var in vars.iter().filter(|v| !v.name.is_empty()) {
        collector.push(&var.name, &var.value, &provenance)?;
    }

    Ok(())
}
