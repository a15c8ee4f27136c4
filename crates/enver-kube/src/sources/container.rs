//! Container sources: environment and files read from a running pod

use enver_core::local::parse_env_lines;
use enver_core::{
    ContainerOptions, CoreError, EntryCollector, EnvEntry, FileOutput, Provenance, Source,
    SourceType,
};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use std::path::Path;

use crate::error::{KubeError, Result};
use crate::provider::ClusterProvider;
use crate::selector::format_label_selector;

const RUNNING: &str = "Running";

fn phase(pod: &Pod) -> &str {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .unwrap_or("Unknown")
}

pub(crate) async fn fetch_container(
    provider: &dyn ClusterProvider,
    source: &Source,
    options: &ContainerOptions,
    output_dir: &Path,
    collector: &mut EntryCollector<'_>,
) -> Result<()> {
    let pod = find_running_pod(provider, source, options).await?;
    let pod_name = pod.metadata.name.clone().unwrap_or_default();
    let namespace = source.namespace.as_str();

    let containers: Vec<&str> = pod
        .spec
        .iter()
        .flat_map(|spec| spec.containers.iter())
        .map(|c| c.name.as_str())
        .filter(|name| options.selects_container(name))
        .collect();

    let env_command = vec!["env".to_string()];
    for container in &containers {
        let stdout = provider
            .exec_in_container(namespace, &pod_name, container, &env_command)
            .await?;
        let provenance = Provenance::new(
            SourceType::Container,
            format!("{pod_name}/{container}"),
            namespace,
        );

        for (key, value) in parse_env_lines(&stdout) {
            collector.push(&key, &value, &provenance)?;
        }
    }

    for file in &options.files {
        let Some(container) = file.container.as_deref().or(containers.first().copied()) else {
            tracing::warn!(
                pod = %pod_name,
                path = %file.path,
                "no eligible container to read file from"
            );
            continue;
        };

        let command = vec!["cat".to_string(), file.path.clone()];
        let content = provider
            .exec_in_container(namespace, &pod_name, container, &command)
            .await?;
        let output = FileOutput::new(&file.output, &file.key, output_dir)?;
        let (key, path) = output.write(content.as_bytes())?;

        let provenance = Provenance::new(
            SourceType::Container,
            format!("{pod_name}/{container}"),
            namespace,
        );
        let entry = EnvEntry::new(key, path, provenance).with_files([output.path().to_path_buf()]);
        collector.push_raw(entry);
    }

    Ok(())
}

/// Locate the pod a Container source reads from
///
/// `Pod` names the pod directly. Workload kinds list pods through the
/// workload's selector and pick the first one in the Running phase.
async fn find_running_pod(
    provider: &dyn ClusterProvider,
    source: &Source,
    options: &ContainerOptions,
) -> Result<Pod> {
    let namespace = source.namespace.as_str();
    let name = source.name.as_str();

    let selector = match options.kind.as_str() {
        "" => {
            return Err(CoreError::MissingField {
                kind: "Container".to_string(),
                name: name.to_string(),
                field: "kind".to_string(),
            }
            .into());
        }
        "Pod" => {
            let pod = provider.get_pod(namespace, name).await?;
            let phase = phase(&pod);
            if phase != RUNNING {
                return Err(KubeError::PodNotRunning {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    phase: phase.to_string(),
                });
            }
            return Ok(pod);
        }
        "Deployment" => {
            let deployment = provider.get_deployment(namespace, name).await?;
            deployment.spec.map(|s| s.selector)
        }
        "StatefulSet" => {
            let stateful_set = provider.get_stateful_set(namespace, name).await?;
            stateful_set.spec.map(|s| s.selector)
        }
        "DaemonSet" => {
            let daemon_set = provider.get_daemon_set(namespace, name).await?;
            daemon_set.spec.map(|s| s.selector)
        }
        other => {
            return Err(KubeError::InvalidContainerKind {
                kind: other.to_string(),
                name: name.to_string(),
            });
        }
    };

    let selector: LabelSelector = selector.ok_or_else(|| KubeError::MissingSelector {
        kind: options.kind.clone(),
        namespace: namespace.to_string(),
        name: name.to_string(),
    })?;

    let pods = provider
        .list_pods(namespace, &format_label_selector(&selector))
        .await?;
    let found = pods.len();

    tracing::debug!(kind = %options.kind, name, found, "listed pods for container source");

    pods.into_iter()
        .find(|pod| phase(pod) == RUNNING)
        .ok_or_else(|| {
            if found == 0 {
                KubeError::NoPodsFound {
                    kind: options.kind.clone(),
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                }
            } else {
                KubeError::NoRunningPods {
                    kind: options.kind.clone(),
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    found,
                }
            }
        })
}
