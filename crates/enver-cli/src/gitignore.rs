//! `.gitignore` bookkeeping for generated files
//!
//! Generated env files and the files written beside them usually carry
//! secrets. After an execution writes its output, every written path is
//! checked with `git check-ignore`; an unignored path produces a warning,
//! or with `--gitignore` its directory is appended to the repository's
//! root `.gitignore`.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::display::Console;
use crate::error::{CliError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitignorePolicy {
    Warn,
    Append,
}

impl GitignorePolicy {
    pub fn from_flag(append: bool) -> Self {
        if append { Self::Append } else { Self::Warn }
    }
}

/// Run git quietly; `None` when git itself is unavailable
async fn git(args: &[&str]) -> Option<std::process::Output> {
    Command::new("git")
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()
}

async fn git_stdout(args: &[&str]) -> Option<String> {
    git(args)
        .await
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim_end().to_string())
}

/// Whether the working directory is inside a git repository
async fn is_git_repo() -> bool {
    git(&["rev-parse", "--git-dir"])
        .await
        .is_some_and(|out| out.status.success())
}

/// `Some(false)` only when git reports the path as not ignored
///
/// Paths outside the repository make `check-ignore` fail and yield `None`.
async fn ignore_status(path: &Path) -> Option<bool> {
    let path = path.to_string_lossy();
    let out = git(&["check-ignore", "-q", &path]).await?;
    match out.status.code() {
        Some(0) => Some(true),
        Some(1) => Some(false),
        _ => None,
    }
}

async fn git_root() -> Result<PathBuf> {
    git_stdout(&["rev-parse", "--show-toplevel"])
        .await
        .filter(|root| !root.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| CliError::Io {
            message: "failed to find git root".to_string(),
        })
}

/// Root-relative `.gitignore` entry for the directory holding `path`
///
/// `cwd_prefix` is the working directory relative to the repository root,
/// as printed by `git rev-parse --show-prefix`. Absolute paths are made
/// relative to `root`; `None` when they lie outside it.
pub fn directory_entry(path: &Path, cwd_prefix: &str, root: &Path) -> Option<String> {
    let (relative, prefix) = if path.is_absolute() {
        (path.strip_prefix(root).ok()?, "")
    } else {
        (path, cwd_prefix)
    };

    let entry = match relative.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => format!("{prefix}{}/", dir.to_string_lossy().trim_end_matches('/')),
        None => format!("{prefix}{}", relative.to_string_lossy()),
    };
    Some(entry)
}

/// Whether an already handled entry covers `entry`
fn covers(done: &str, entry: &str) -> bool {
    done == entry || (done.ends_with('/') && entry.starts_with(done))
}

/// Append `entry` on its own line unless an identical line exists
///
/// Returns whether the file changed.
pub fn append_entry(gitignore: &Path, entry: &str) -> std::io::Result<bool> {
    let existing = match std::fs::read_to_string(gitignore) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    if existing.lines().any(|line| line.trim() == entry) {
        return Ok(false);
    }

    let prefix = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        "\n"
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(gitignore)?;
    writeln!(file, "{prefix}{entry}")?;
    Ok(true)
}

/// Check that every written path is ignored by git
///
/// Paths are checked in order, so an entry appended for the env file
/// already covers files written below it. Appends hold the console lock so
/// concurrent executions never race on the same `.gitignore`.
pub async fn ensure_ignored(
    paths: &[PathBuf],
    policy: GitignorePolicy,
    console: &Console,
) -> Result<()> {
    if !is_git_repo().await {
        return Ok(());
    }

    let root = git_root().await?;
    let prefix = git_stdout(&["rev-parse", "--show-prefix"])
        .await
        .unwrap_or_default();
    let mut reported: BTreeSet<String> = BTreeSet::new();

    for path in paths {
        if ignore_status(path).await != Some(false) {
            continue;
        }

        let resolved = if path.is_absolute() {
            path.canonicalize().unwrap_or_else(|_| path.clone())
        } else {
            path.clone()
        };
        let Some(entry) = directory_entry(&resolved, &prefix, &root) else {
            continue;
        };
        if reported.iter().any(|done| covers(done, &entry)) {
            continue;
        }

        console.exclusive(|| match policy {
            GitignorePolicy::Warn => {
                console.warn_locked(&format!(
                    "{} is not covered by .gitignore (rerun with --gitignore to add \"{}\")",
                    path.display(),
                    entry
                ));
                Ok::<_, CliError>(())
            }
            GitignorePolicy::Append => {
                let gitignore = root.join(".gitignore");
                if append_entry(&gitignore, &entry)? {
                    tracing::debug!(
                        entry = %entry,
                        path = %gitignore.display(),
                        "appended gitignore entry"
                    );
                    console.success_locked(&format!("Added \"{entry}\" to .gitignore"));
                }
                Ok(())
            }
        })?;
        reported.insert(entry);
    }

    Ok(())
}
