//! Generate command - one ad-hoc run driven by command-line flags

use enver_core::{Execution, ExecutionOutput};
use enver_kube::{ClientCache, KubeProvider};
use std::path::Path;

use crate::commands::load_config;
use crate::display::Console;
use crate::error::{CliError, Result};
use crate::gitignore::{GitignorePolicy, ensure_ignored};
use crate::runner::Runner;

pub struct GenerateOptions<'a> {
    pub config: &'a Path,
    pub contexts: &'a [String],
    pub kube_context: Option<&'a str>,
    pub output_name: &'a str,
    pub output_directory: &'a str,
    pub gitignore: bool,
}

/// Run the generate command
pub async fn run(options: GenerateOptions<'_>) -> Result<()> {
    let config = load_config(options.config)?;
    if config.sources.is_empty() {
        return Err(CliError::config("no sources found in .enver.yaml"));
    }

    for context in options.contexts {
        if !config.contexts.is_empty() && !config.contexts.contains(context) {
            tracing::warn!(context = %context, "context is not declared in .enver.yaml");
        }
    }

    let sources = config.sources()?;
    let clients = ClientCache::new();
    let console = Console::new();
    let runner = Runner::new(&sources, &clients, &console);

    let mut execution = Execution {
        name: "generate".to_string(),
        output: ExecutionOutput {
            name: options.output_name.to_string(),
            directory: options.output_directory.to_string(),
        },
        contexts: options.contexts.to_vec(),
        kube_context: options.kube_context.map(str::to_string),
    };

    if execution.kube_context.is_none() && runner.needs_cluster(&execution) {
        let current = KubeProvider::current_context()?;
        tracing::debug!(context = %current, "using current kube-context");
        execution.kube_context = Some(current);
    }

    let written = runner.run(&execution).await?;
    console.wrote(None, written.count, &written.path);

    ensure_ignored(
        &written.paths(),
        GitignorePolicy::from_flag(options.gitignore),
        &console,
    )
    .await
}
