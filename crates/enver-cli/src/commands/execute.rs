//! Execute command - run named executions from `.enver.yaml` concurrently

use enver_core::{EnverConfig, Execution};
use enver_kube::ClientCache;
use futures::future::join_all;
use std::path::Path;

use crate::commands::load_config;
use crate::display::Console;
use crate::error::{CliError, Result};
use crate::gitignore::{GitignorePolicy, ensure_ignored};
use crate::runner::Runner;

/// Pick the executions to run, in request order
fn select<'a>(config: &'a EnverConfig, names: &[String], all: bool) -> Result<Vec<&'a Execution>> {
    if all {
        return Ok(config.executions.iter().collect());
    }

    if names.is_empty() {
        let available: Vec<&str> = config.executions.iter().map(|e| e.name.as_str()).collect();
        return Err(CliError::usage_with_help(
            "no executions selected",
            format!(
                "pass --name <NAME> (repeatable) or --all; available: {}",
                available.join(", ")
            ),
        ));
    }

    names
        .iter()
        .map(|name| {
            config.execution(name).ok_or_else(|| {
                CliError::config(format!("execution {name:?} not found in .enver.yaml"))
            })
        })
        .collect()
}

/// Run the execute command
pub async fn run(config_path: &Path, names: &[String], all: bool, gitignore: bool) -> Result<()> {
    let config = load_config(config_path)?;

    if config.executions.is_empty() {
        return Err(CliError::config("no executions found in .enver.yaml"));
    }
    if config.sources.is_empty() {
        return Err(CliError::config("no sources found in .enver.yaml"));
    }

    let selected = select(&config, names, all)?;
    let sources = config.sources()?;
    let policy = GitignorePolicy::from_flag(gitignore);

    let clients = ClientCache::new();
    let console = Console::new();
    let runner = Runner::new(&sources, &clients, &console);

    let results = join_all(selected.iter().map(|execution| {
        let runner = &runner;
        async move {
            runner.console().executing(&execution.name);
            let result = match runner.run(execution).await {
                Ok(written) => {
                    runner
                        .console()
                        .wrote(Some(&execution.name), written.count, &written.path);
                    ensure_ignored(&written.paths(), policy, runner.console()).await
                }
                Err(e) => Err(e),
            };
            (execution.name.as_str(), result)
        }
    }))
    .await;

    let failures: Vec<String> = results
        .into_iter()
        .filter_map(|(name, result)| result.err().map(|e| format!("{name}: {e}")))
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(CliError::Execution { failures })
    }
}
