//! Execution runner
//!
//! One [`Runner`] is shared by every execution of a command invocation. It
//! owns nothing mutable except the client cache, so executions run
//! concurrently: the only shared state is the per-context client map and
//! the console lock.

use enver_core::{Execution, Source};
use enver_kube::{ClientCache, ClusterProvider, KubeProvider, requires_cluster, resolve_sources};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::display::Console;
use crate::error::{CliError, Result};
use crate::output::write_env_file;

/// Result of one successful execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub path: PathBuf,
    pub count: usize,
    /// Files written by `file` transformations and volume projections
    pub files: Vec<PathBuf>,
}

impl Written {
    /// The env file followed by every other written file
    pub fn paths(&self) -> Vec<PathBuf> {
        std::iter::once(self.path.clone())
            .chain(self.files.iter().cloned())
            .collect()
    }
}

pub struct Runner<'a> {
    sources: &'a [Source],
    clients: &'a ClientCache<KubeProvider>,
    console: &'a Console,
}

impl<'a> Runner<'a> {
    pub fn new(
        sources: &'a [Source],
        clients: &'a ClientCache<KubeProvider>,
        console: &'a Console,
    ) -> Self {
        Self {
            sources,
            clients,
            console,
        }
    }

    pub fn console(&self) -> &Console {
        self.console
    }

    /// Whether `execution` needs a cluster client
    pub fn needs_cluster(&self, execution: &Execution) -> bool {
        requires_cluster(self.sources, &execution.contexts)
    }

    /// Shared client for `context`, built on first use
    async fn provider(&self, context: &str) -> Result<Arc<KubeProvider>> {
        Ok(self
            .clients
            .get_or_try_init(context, || KubeProvider::for_context(Some(context)))
            .await?)
    }

    /// Resolve every eligible source and write the execution's env file
    ///
    /// A cluster client is only built when an eligible source needs one;
    /// the execution must then name its kube-context.
    pub async fn run(&self, execution: &Execution) -> Result<Written> {
        let provider = if self.needs_cluster(execution) {
            let context = execution
                .kube_context
                .as_deref()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| {
                    CliError::config_with_help(
                        format!(
                            "execution {:?} requires Kubernetes sources but no kube-context is specified",
                            execution.name
                        ),
                        "set `kube-context` on the execution in .enver.yaml",
                    )
                })?;
            Some(self.provider(context).await?)
        } else {
            None
        };

        let output_dir = Path::new(&execution.output.directory);
        let entries = resolve_sources(
            provider.as_deref().map(|p| p as &dyn ClusterProvider),
            self.sources,
            &execution.contexts,
            output_dir,
        )
        .await?;

        let path = execution.output.path();
        write_env_file(&path, &entries)?;

        tracing::debug!(
            execution = %execution.name,
            entries = entries.len(),
            path = %path.display(),
            "wrote env file"
        );

        let mut seen = BTreeSet::new();
        let files = entries
            .iter()
            .flat_map(|entry| entry.files.iter())
            .filter(|file| seen.insert(*file))
            .cloned()
            .collect();

        Ok(Written {
            path,
            count: entries.len(),
            files,
        })
    }
}
