//! Source resolution
//!
//! [`resolve_source`] is the single entry point: it checks context
//! eligibility, builds the source's transformation chain and dispatches on
//! the source variant. Cluster calls made for one source are awaited one
//! after another, so entries come out in a deterministic step order.

mod configmap;
mod container;
mod workload;

pub use workload::{Workload, resolve_pod_spec};

use workload::WorkloadKind;

use enver_core::local::{fetch_env_file, fetch_vars};
use enver_core::{EntryCollector, EnvEntry, Source, SourceKind, TransformChain};
use std::path::Path;

use crate::error::{KubeError, Result};
use crate::provider::ClusterProvider;

fn cluster<'a>(
    provider: Option<&'a dyn ClusterProvider>,
    source: &Source,
) -> Result<&'a dyn ClusterProvider> {
    provider.ok_or_else(|| KubeError::ClientRequired {
        kind: source.source_type().to_string(),
        name: source.name.clone(),
    })
}

/// Resolve one source into its ordered entries
///
/// Sources excluded by `selected_contexts` yield nothing and make no
/// external calls. Local sources never touch `provider`, which may be
/// `None` when no cluster source is eligible.
pub async fn resolve_source(
    provider: Option<&dyn ClusterProvider>,
    source: &Source,
    selected_contexts: &[String],
    output_dir: &Path,
) -> Result<Vec<EnvEntry>> {
    if !source.should_include(selected_contexts) {
        tracing::debug!(
            source = %source.name,
            r#type = %source.source_type(),
            "skipped by context"
        );
        return Ok(Vec::new());
    }

    let chain = TransformChain::build(&source.transformations, output_dir)?;
    let mut collector = EntryCollector::new(&source.variables, &chain);

    match &source.kind {
        SourceKind::EnvFile { path } => fetch_env_file(path, &mut collector)?,
        SourceKind::Vars { vars } => fetch_vars(&source.name, vars, &mut collector)?,
        SourceKind::ConfigMap => {
            configmap::fetch_config_map(cluster(provider, source)?, source, &mut collector).await?
        }
        SourceKind::Secret => {
            configmap::fetch_secret(cluster(provider, source)?, source, &mut collector).await?
        }
        SourceKind::Deployment(options) => {
            let provider = cluster(provider, source)?;
            let kind = WorkloadKind::Deployment;
            workload::fetch_workload(provider, kind, source, options, output_dir, &mut collector)
                .await?
        }
        SourceKind::StatefulSet(options) => {
            let provider = cluster(provider, source)?;
            let kind = WorkloadKind::StatefulSet;
            workload::fetch_workload(provider, kind, source, options, output_dir, &mut collector)
                .await?
        }
        SourceKind::DaemonSet(options) => {
            let provider = cluster(provider, source)?;
            let kind = WorkloadKind::DaemonSet;
            workload::fetch_workload(provider, kind, source, options, output_dir, &mut collector)
                .await?
        }
        SourceKind::Container(options) => {
            container::fetch_container(
                cluster(provider, source)?,
                source,
                options,
                output_dir,
                &mut collector,
            )
            .await?
        }
    }

    tracing::debug!(
        source = %source.name,
        r#type = %source.source_type(),
        entries = collector.len(),
        "resolved source"
    );
    Ok(collector.into_entries())
}

/// Resolve sources in declaration order and concatenate their entries
pub async fn resolve_sources(
    provider: Option<&dyn ClusterProvider>,
    sources: &[Source],
    selected_contexts: &[String],
    output_dir: &Path,
) -> Result<Vec<EnvEntry>> {
    let mut entries = Vec::new();
    for source in sources {
        entries.extend(resolve_source(provider, source, selected_contexts, output_dir).await?);
    }
    Ok(entries)
}

/// Whether any source eligible under `selected_contexts` needs a cluster
pub fn requires_cluster(sources: &[Source], selected_contexts: &[String]) -> bool {
    sources
        .iter()
        .any(|s| s.should_include(selected_contexts) && s.kind.requires_cluster())
}

#[cfg(test)]
mod tests {
    use super::*;
    use enver_core::{ContextFilter, SourceType, VarEntry};
    use tempfile::TempDir;

    fn vars(name: &str, pairs: &[(&str, &str)]) -> Source {
        Source::new(
            name,
            SourceKind::Vars {
                vars: pairs
                    .iter()
                    .map(|(n, v)| VarEntry {
                        name: n.to_string(),
                        value: v.to_string(),
                    })
                    .collect(),
            },
        )
    }

    fn only(include: &[&str]) -> ContextFilter {
        ContextFilter {
            include: include.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_local_sources_need_no_provider() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local.env");
        std::fs::write(&path, "DEBUG=true\n").unwrap();

        let sources = vec![
            vars("inline", &[("A", "1")]),
            Source::new("", SourceKind::EnvFile { path }),
        ];

        let entries = resolve_sources(None, &sources, &[], dir.path()).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source_type(), SourceType::Vars);
        assert_eq!(entries[1].source_type(), SourceType::EnvFile);
    }

    #[tokio::test]
    async fn test_context_excluded_source_makes_no_calls() {
        let provider = crate::MockClusterProvider::new();
        let source = Source::new("app", SourceKind::ConfigMap).with_contexts(only(&["prod"]));

        let entries = resolve_source(
            Some(&provider),
            &source,
            &["local".to_string()],
            Path::new("generated"),
        )
        .await
        .unwrap();

        assert!(entries.is_empty());
        assert_eq!(provider.operation_counts().gets, 0);
    }

    #[tokio::test]
    async fn test_cluster_source_without_provider() {
        let source = Source::new("app", SourceKind::ConfigMap);

        let err = resolve_source(None, &source, &[], Path::new("generated"))
            .await
            .unwrap_err();
        assert!(matches!(err, KubeError::ClientRequired { .. }));
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_invalid_chain_fails_before_fetching() {
        let provider = crate::MockClusterProvider::new();
        let source = Source::new("app", SourceKind::ConfigMap)
            .with_transformations(vec![enver_core::TransformationSpec::new("rot13")]);

        let err = resolve_source(Some(&provider), &source, &[], Path::new("generated"))
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(provider.operation_counts().gets, 0);
    }

    #[test]
    fn test_requires_cluster_honors_contexts() {
        let sources = vec![
            vars("inline", &[("A", "1")]),
            Source::new("app", SourceKind::ConfigMap).with_contexts(only(&["prod"])),
        ];

        assert!(!requires_cluster(&sources, &["local".to_string()]));
        assert!(requires_cluster(&sources, &["prod".to_string()]));
        assert!(requires_cluster(&sources, &[]));
    }
}
