//! Deployment, StatefulSet and DaemonSet sources
//!
//! The three workload variants differ only in how their pod template is
//! fetched. Everything else lives in [`resolve_pod_spec`], which walks the
//! template's containers and resolves, per container and in this order:
//!
//! 1. `envFrom` references (whole ConfigMaps / Secrets, with prefix)
//! 2. `env` variables (literals and `valueFrom` references)
//! 3. volume mounts backed by ConfigMaps / Secrets, written out as files
//!
//! `env` entries follow `envFrom` entries so that flattening the output
//! gives `env` priority, as the kubelet does.

use enver_core::{
    EntryCollector, EnvEntry, FileOutput, Provenance, Source, SourceType, VolumePaths,
    WorkloadOptions,
};
use k8s_openapi::api::core::v1::{
    Container, EnvFromSource, EnvVarSource, KeyToPath, PodSpec, Volume, VolumeMount,
};
use std::collections::BTreeMap;
use std::path::Path;

use super::configmap::collect_data;
use crate::error::{KubeError, Result};
use crate::provider::{
    ClusterProvider, config_map_bytes, config_map_data, secret_bytes, secret_data, trim_secret,
};

/// The workload a pod spec belongs to
#[derive(Debug, Clone, Copy)]
pub struct Workload<'a> {
    pub name: &'a str,
    pub source_type: SourceType,
    pub namespace: &'a str,
    pub options: &'a WorkloadOptions,
    /// Base directory for files projected from volumes
    pub output_dir: &'a Path,
}

impl Workload<'_> {
    fn provenance(&self, name: String) -> Provenance {
        Provenance::new(self.source_type, name, self.namespace)
    }
}

/// Workload kinds that carry a pod template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkloadKind {
    Deployment,
    StatefulSet,
    DaemonSet,
}

/// Fetch the workload named by `source` and resolve its pod template
pub(crate) async fn fetch_workload(
    provider: &dyn ClusterProvider,
    kind: WorkloadKind,
    source: &Source,
    options: &WorkloadOptions,
    output_dir: &Path,
    collector: &mut EntryCollector<'_>,
) -> Result<()> {
    let namespace = source.namespace.as_str();
    let name = source.name.as_str();

    let pod_spec = match kind {
        WorkloadKind::Deployment => deployment_pod_spec(provider, namespace, name).await?,
        WorkloadKind::StatefulSet => stateful_set_pod_spec(provider, namespace, name).await?,
        WorkloadKind::DaemonSet => daemon_set_pod_spec(provider, namespace, name).await?,
    };

    let workload = Workload {
        name,
        source_type: source.source_type(),
        namespace,
        options,
        output_dir,
    };
    resolve_pod_spec(provider, &pod_spec, &workload, collector).await
}

async fn deployment_pod_spec(
    provider: &dyn ClusterProvider,
    namespace: &str,
    name: &str,
) -> Result<PodSpec> {
    let deployment = provider.get_deployment(namespace, name).await?;
    Ok(deployment
        .spec
        .and_then(|spec| spec.template.spec)
        .unwrap_or_default())
}

async fn stateful_set_pod_spec(
    provider: &dyn ClusterProvider,
    namespace: &str,
    name: &str,
) -> Result<PodSpec> {
    let stateful_set = provider.get_stateful_set(namespace, name).await?;
    Ok(stateful_set
        .spec
        .and_then(|spec| spec.template.spec)
        .unwrap_or_default())
}

async fn daemon_set_pod_spec(
    provider: &dyn ClusterProvider,
    namespace: &str,
    name: &str,
) -> Result<PodSpec> {
    let daemon_set = provider.get_daemon_set(namespace, name).await?;
    Ok(daemon_set
        .spec
        .and_then(|spec| spec.template.spec)
        .unwrap_or_default())
}

/// Resolve every selected container of `pod_spec` into `collector`
pub async fn resolve_pod_spec(
    provider: &dyn ClusterProvider,
    pod_spec: &PodSpec,
    workload: &Workload<'_>,
    collector: &mut EntryCollector<'_>,
) -> Result<()> {
    let volumes = pod_spec.volumes.as_deref().unwrap_or_default();

    for container in pod_spec
        .containers
        .iter()
        .filter(|c| workload.options.selects_container(&c.name))
    {
        for env_from in container.env_from.iter().flatten() {
            resolve_env_from(provider, env_from, container, workload, collector).await?;
        }

        resolve_env(provider, container, workload, collector).await?;

        for mount in container.volume_mounts.iter().flatten() {
            let Some(volume) = volumes.iter().find(|v| v.name == mount.name) else {
                continue;
            };
            resolve_volume(provider, volume, mount, workload, collector).await?;
        }
    }

    Ok(())
}

async fn resolve_env_from(
    provider: &dyn ClusterProvider,
    env_from: &EnvFromSource,
    container: &Container,
    workload: &Workload<'_>,
    collector: &mut EntryCollector<'_>,
) -> Result<()> {
    let prefix = env_from.prefix.as_deref().unwrap_or_default();
    let namespace = workload.namespace;

    let (kind, name, optional, data) = if let Some(cm_ref) = &env_from.config_map_ref {
        let data = provider
            .get_config_map(namespace, &cm_ref.name)
            .await
            .map(config_map_data);
        ("ConfigMap", &cm_ref.name, cm_ref.optional, data)
    } else if let Some(secret_ref) = &env_from.secret_ref {
        let data = provider
            .get_secret(namespace, &secret_ref.name)
            .await
            .map(secret_data);
        ("Secret", &secret_ref.name, secret_ref.optional, data)
    } else {
        return Ok(());
    };

    let data = match data {
        Ok(data) => data,
        Err(e) if optional.unwrap_or(false) => {
            tracing::debug!(kind, name = %name, error = %e, "skipping optional envFrom reference");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let provenance = workload.provenance(format!(
        "{}/{} ({kind}: {name})",
        workload.name, container.name
    ));
    collect_data(collector, data, prefix, &provenance)
}

async fn resolve_env(
    provider: &dyn ClusterProvider,
    container: &Container,
    workload: &Workload<'_>,
    collector: &mut EntryCollector<'_>,
) -> Result<()> {
    let provenance = workload.provenance(format!("{}/{}", workload.name, container.name));

    for var in container.env.iter().flatten() {
        let value = match (&var.value, &var.value_from) {
            (Some(value), _) if !value.is_empty() => value.clone(),
            (_, Some(value_from)) => resolve_value_from(provider, workload.namespace, value_from)
                .await
                .map_err(|e| KubeError::variable(&var.name, e))?,
            _ => String::new(),
        };

        // Unresolvable or optional-missing references are dropped here
        if value.is_empty() {
            continue;
        }
        collector.push(&var.name, &value, &provenance)?;
    }

    Ok(())
}

/// Resolve a `valueFrom` reference to its value
///
/// Field and resource-field references need a live pod and resolve to "".
async fn resolve_value_from(
    provider: &dyn ClusterProvider,
    namespace: &str,
    value_from: &EnvVarSource,
) -> Result<String> {
    if let Some(selector) = &value_from.config_map_key_ref {
        return match provider.get_config_map(namespace, &selector.name).await {
            Ok(config_map) => Ok(config_map_data(config_map)
                .remove(&selector.key)
                .unwrap_or_default()),
            Err(_) if selector.optional.unwrap_or(false) => Ok(String::new()),
            Err(e) => Err(e),
        };
    }

    if let Some(selector) = &value_from.secret_key_ref {
        return match provider.get_secret(namespace, &selector.name).await {
            Ok(secret) => Ok(secret
                .data
                .unwrap_or_default()
                .get(&selector.key)
                .map(|bytes| trim_secret(&bytes.0))
                .unwrap_or_default()),
            Err(_) if selector.optional.unwrap_or(false) => Ok(String::new()),
            Err(e) => Err(e),
        };
    }

    Ok(String::new())
}

/// One ConfigMap or Secret projected into a volume
struct Projection<'a> {
    kind: &'static str,
    name: &'a str,
    items: &'a [KeyToPath],
    optional: bool,
    projected: bool,
}

fn projections(volume: &Volume) -> Vec<Projection<'_>> {
    let mut out = Vec::new();

    if let Some(cm) = &volume.config_map {
        out.push(Projection {
            kind: "ConfigMap",
            name: &cm.name,
            items: cm.items.as_deref().unwrap_or_default(),
            optional: cm.optional.unwrap_or(false),
            projected: false,
        });
    }

    if let Some(secret) = &volume.secret {
        out.push(Projection {
            kind: "Secret",
            name: secret.secret_name.as_deref().unwrap_or_default(),
            items: secret.items.as_deref().unwrap_or_default(),
            optional: secret.optional.unwrap_or(false),
            projected: false,
        });
    }

    if let Some(projected) = &volume.projected {
        for source in projected.sources.iter().flatten() {
            if let Some(cm) = &source.config_map {
                out.push(Projection {
                    kind: "ConfigMap",
                    name: &cm.name,
                    items: cm.items.as_deref().unwrap_or_default(),
                    optional: cm.optional.unwrap_or(false),
                    projected: true,
                });
            }
            if let Some(secret) = &source.secret {
                out.push(Projection {
                    kind: "Secret",
                    name: &secret.name,
                    items: secret.items.as_deref().unwrap_or_default(),
                    optional: secret.optional.unwrap_or(false),
                    projected: true,
                });
            }
        }
    }

    out
}

async fn resolve_volume(
    provider: &dyn ClusterProvider,
    volume: &Volume,
    mount: &VolumeMount,
    workload: &Workload<'_>,
    collector: &mut EntryCollector<'_>,
) -> Result<()> {
    for projection in projections(volume) {
        let data = if projection.kind == "Secret" {
            provider
                .get_secret(workload.namespace, projection.name)
                .await
                .map(secret_bytes)
        } else {
            provider
                .get_config_map(workload.namespace, projection.name)
                .await
                .map(config_map_bytes)
        };

        let data = match data {
            Ok(data) => data,
            Err(e) if projection.optional => {
                tracing::debug!(
                    volume = %volume.name,
                    kind = projection.kind,
                    name = projection.name,
                    error = %e,
                    "skipping optional volume source"
                );
                continue;
            }
            Err(e) => return Err(e),
        };

        write_projection(&projection, data, mount, workload, collector)?;
    }

    Ok(())
}

/// Write each projected key as a file and emit `<key>=<file path>`
///
/// The source's own chain runs first on text values; values that are not
/// valid UTF-8 are written byte for byte. A key listed under several items
/// is written to every item path.
fn write_projection(
    projection: &Projection<'_>,
    data: BTreeMap<String, Vec<u8>>,
    mount: &VolumeMount,
    workload: &Workload<'_>,
    collector: &mut EntryCollector<'_>,
) -> Result<()> {
    let label = if projection.projected {
        "Projected Volume"
    } else {
        "Volume"
    };
    let provenance = workload.provenance(format!(
        "{} ({label}: {}, {}: {})",
        workload.name, mount.name, projection.kind, projection.name
    ));
    let root = match workload.options.volume_paths {
        VolumePaths::MountPath => Path::new(&mount.mount_path),
        VolumePaths::MountName => Path::new(&mount.name),
    };

    for (key, bytes) in data {
        let file_paths: Vec<&str> = if projection.items.is_empty() {
            vec![key.as_str()]
        } else {
            projection
                .items
                .iter()
                .filter(|item| item.key == key)
                .map(|item| item.path.as_str())
                .collect()
        };

        if file_paths.is_empty() || !collector.filter().keeps(&key) {
            continue;
        }

        let mut written = Vec::new();
        let bytes = match String::from_utf8(bytes) {
            Ok(text) => collector.chain().apply(&key, &text, &mut written)?.1.into_bytes(),
            Err(raw) => {
                tracing::debug!(
                    key = %key,
                    volume = %mount.name,
                    "binary value written unchanged"
                );
                raw.into_bytes()
            }
        };
        let env_key = workload
            .options
            .mapped_key(projection.kind, projection.name, &key);

        for file_path in file_paths {
            let output = FileOutput::new(
                &root.join(file_path).to_string_lossy(),
                &env_key,
                workload.output_dir,
            )?;
            let (env_key, path) = output.write(&bytes)?;
            let files = written.iter().cloned().chain([output.path().to_path_buf()]);

            collector.push_raw(EnvEntry::new(env_key, path, provenance.clone()).with_files(files));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClusterProvider;
    use crate::sources::resolve_source;
    use enver_core::{
        SourceKind, Target, TransformationSpec, VariableFilter, VolumeMountKeyMapping,
    };
    use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
    use serde_json::json;
    use tempfile::TempDir;

    fn deployment(name: &str, pod_spec: serde_json::Value) -> Deployment {
        serde_json::from_value(json!({
            "metadata": { "name": name, "namespace": "default" },
            "spec": {
                "selector": { "matchLabels": { "app": name } },
                "template": { "spec": pod_spec }
            }
        }))
        .unwrap()
    }

    fn workload_source(name: &str, options: WorkloadOptions) -> Source {
        Source::new(name, SourceKind::Deployment(options))
    }

    async fn resolve(provider: &MockClusterProvider, source: &Source, dir: &Path) -> Vec<EnvEntry> {
        resolve_source(Some(provider), source, &[], dir).await.unwrap()
    }

    fn pairs(entries: &[EnvEntry]) -> Vec<(&str, &str)> {
        entries
            .iter()
            .map(|e| (e.key.as_str(), e.value.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn test_env_from_then_env_order() {
        let provider = MockClusterProvider::new()
            .with_config_map("default", "shared", [("A", "1")])
            .with_deployment(deployment(
                "api",
                json!({
                    "containers": [{
                        "name": "app",
                        "envFrom": [{ "configMapRef": { "name": "shared" } }],
                        "env": [{ "name": "A", "value": "2" }]
                    }]
                }),
            ));
        let dir = TempDir::new().unwrap();

        let entries = resolve(
            &provider,
            &workload_source("api", WorkloadOptions::default()),
            dir.path(),
        )
        .await;

        assert_eq!(pairs(&entries), vec![("A", "1"), ("A", "2")]);
        assert_eq!(entries[0].provenance.name, "api/app (ConfigMap: shared)");
        assert_eq!(entries[1].provenance.name, "api/app");
        assert_eq!(entries[1].source_type(), SourceType::Deployment);
    }

    #[tokio::test]
    async fn test_env_from_prefix_and_optional_secret() {
        let provider = MockClusterProvider::new()
            .with_config_map("default", "db", [("HOST", "pg"), ("PORT", "")])
            .with_deployment(deployment(
                "api",
                json!({
                    "containers": [{
                        "name": "app",
                        "envFrom": [
                            { "prefix": "DB_", "configMapRef": { "name": "db" } },
                            { "secretRef": { "name": "absent", "optional": true } }
                        ]
                    }]
                }),
            ));
        let dir = TempDir::new().unwrap();

        let entries = resolve(
            &provider,
            &workload_source("api", WorkloadOptions::default()),
            dir.path(),
        )
        .await;

        assert_eq!(pairs(&entries), vec![("DB_HOST", "pg")]);
    }

    #[tokio::test]
    async fn test_env_from_required_missing_is_fatal() {
        let provider = MockClusterProvider::new().with_deployment(deployment(
            "api",
            json!({
                "containers": [{
                    "name": "app",
                    "envFrom": [{ "configMapRef": { "name": "absent" } }]
                }]
            }),
        ));
        let dir = TempDir::new().unwrap();

        let err = resolve_source(
            Some(&provider),
            &workload_source("api", WorkloadOptions::default()),
            &[],
            dir.path(),
        )
        .await
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_optional_missing_key_ref_is_dropped() {
        let provider = MockClusterProvider::new()
            .with_secret("default", "creds", [("password", "s3cret\n")])
            .with_deployment(deployment(
                "api",
                json!({
                    "containers": [{
                        "name": "app",
                        "env": [
                            { "name": "OPTIONAL", "valueFrom": {
                                "configMapKeyRef": { "name": "absent", "key": "k", "optional": true } } },
                            { "name": "PASSWORD", "valueFrom": {
                                "secretKeyRef": { "name": "creds", "key": "password" } } },
                            { "name": "MISSING_KEY", "valueFrom": {
                                "secretKeyRef": { "name": "creds", "key": "nope" } } },
                            { "name": "POD_NAME", "valueFrom": {
                                "fieldRef": { "fieldPath": "metadata.name" } } },
                            { "name": "CPU", "valueFrom": {
                                "resourceFieldRef": { "resource": "limits.cpu" } } },
                            { "name": "EMPTY", "value": "" }
                        ]
                    }]
                }),
            ));
        let dir = TempDir::new().unwrap();

        let entries = resolve(
            &provider,
            &workload_source("api", WorkloadOptions::default()),
            dir.path(),
        )
        .await;

        assert_eq!(pairs(&entries), vec![("PASSWORD", "s3cret")]);
    }

    #[tokio::test]
    async fn test_required_missing_key_ref_is_fatal() {
        let provider = MockClusterProvider::new().with_deployment(deployment(
            "api",
            json!({
                "containers": [{
                    "name": "app",
                    "env": [{ "name": "DB_HOST", "valueFrom": {
                        "configMapKeyRef": { "name": "absent", "key": "host" } } }]
                }]
            }),
        ));
        let dir = TempDir::new().unwrap();

        let err = resolve_source(
            Some(&provider),
            &workload_source("api", WorkloadOptions::default()),
            &[],
            dir.path(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, KubeError::Variable { ref variable, .. } if variable == "DB_HOST"));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_container_allow_list() {
        let provider = MockClusterProvider::new().with_deployment(deployment(
            "api",
            json!({
                "containers": [
                    { "name": "app", "env": [{ "name": "APP", "value": "1" }] },
                    { "name": "sidecar", "env": [{ "name": "SIDECAR", "value": "1" }] }
                ]
            }),
        ));
        let dir = TempDir::new().unwrap();
        let options = WorkloadOptions {
            containers: vec!["app".to_string()],
            ..Default::default()
        };

        let entries = resolve(&provider, &workload_source("api", options), dir.path()).await;
        assert_eq!(pairs(&entries), vec![("APP", "1")]);
    }

    #[tokio::test]
    async fn test_config_map_volume_written_under_mount_path() {
        let dir = TempDir::new().unwrap();
        let mount_path = dir.path().join("etc/app");
        let provider = MockClusterProvider::new()
            .with_config_map(
                "default",
                "files",
                [("a.json", "{\"a\":1}\n"), ("b.yaml", "b: 2\n")],
            )
            .with_deployment(deployment(
                "api",
                json!({
                    "containers": [{
                        "name": "app",
                        "volumeMounts": [{ "name": "config", "mountPath": mount_path }]
                    }],
                    "volumes": [{ "name": "config", "configMap": { "name": "files" } }]
                }),
            ));

        let entries = resolve(
            &provider,
            &workload_source("api", WorkloadOptions::default()),
            dir.path(),
        )
        .await;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "a.json");
        assert_eq!(entries[1].key, "b.yaml");
        assert_eq!(
            entries[0].provenance.name,
            "api (Volume: config, ConfigMap: files)"
        );
        for (entry, expected) in entries.iter().zip(["{\"a\":1}\n", "b: 2\n"]) {
            assert!(Path::new(&entry.value).starts_with(&mount_path));
            assert_eq!(std::fs::read_to_string(&entry.value).unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_secret_volume_items_and_key_mapping() {
        let dir = TempDir::new().unwrap();
        let provider = MockClusterProvider::new()
            .with_secret(
                "default",
                "tls",
                [("tls.crt", "CERT\n"), ("tls.key", "KEY\n"), ("ca.crt", "CA\n")],
            )
            .with_deployment(deployment(
                "api",
                json!({
                    "containers": [{
                        "name": "app",
                        "volumeMounts": [{ "name": "certs", "mountPath": "/etc/tls" }]
                    }],
                    "volumes": [{
                        "name": "certs",
                        "secret": {
                            "secretName": "tls",
                            "items": [{ "key": "tls.crt", "path": "server/cert.pem" }]
                        }
                    }]
                }),
            ));
        let options = WorkloadOptions {
            volume_mount_key_mappings: vec![VolumeMountKeyMapping {
                kind: "Secret".to_string(),
                name: "tls".to_string(),
                mappings: [("tls.crt".to_string(), "TLS_CERT_PATH".to_string())].into(),
            }],
            volume_paths: VolumePaths::MountName,
            ..Default::default()
        };

        let entries = resolve(&provider, &workload_source("api", options), dir.path()).await;

        let expected = dir.path().join("certs/server/cert.pem");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "TLS_CERT_PATH");
        assert_eq!(entries[0].value, expected.to_string_lossy());
        assert_eq!(std::fs::read_to_string(&expected).unwrap(), "CERT");
    }

    #[tokio::test]
    async fn test_projected_volume_skips_optional_and_filters() {
        let dir = TempDir::new().unwrap();
        let provider = MockClusterProvider::new()
            .with_config_map("default", "settings", [("app.ini", "x=1"), ("debug.ini", "y")])
            .with_deployment(deployment(
                "api",
                json!({
                    "containers": [{
                        "name": "app",
                        "volumeMounts": [{ "name": "bundle", "mountPath": "/etc/bundle" }]
                    }],
                    "volumes": [{
                        "name": "bundle",
                        "projected": { "sources": [
                            { "secret": { "name": "absent", "optional": true } },
                            { "configMap": { "name": "settings" } }
                        ] }
                    }]
                }),
            ));
        let source = workload_source(
            "api",
            WorkloadOptions {
                volume_paths: VolumePaths::MountName,
                ..Default::default()
            },
        )
        .with_variables(VariableFilter::new(Vec::<String>::new(), ["debug.ini"]));

        let entries = resolve(&provider, &source, dir.path()).await;

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "app.ini");
        assert_eq!(
            entries[0].provenance.name,
            "api (Projected Volume: bundle, ConfigMap: settings)"
        );
    }

    #[tokio::test]
    async fn test_volume_file_receives_transformed_value() {
        let dir = TempDir::new().unwrap();
        let provider = MockClusterProvider::new()
            .with_config_map("default", "encoded", [("blob", "aGVsbG8=")])
            .with_deployment(deployment(
                "api",
                json!({
                    "containers": [{
                        "name": "app",
                        "volumeMounts": [{ "name": "data", "mountPath": "/data" }]
                    }],
                    "volumes": [{ "name": "data", "configMap": { "name": "encoded" } }]
                }),
            ));
        let source = workload_source(
            "api",
            WorkloadOptions {
                volume_paths: VolumePaths::MountName,
                ..Default::default()
            },
        )
        .with_transformations(vec![
            TransformationSpec::new("base64_decode").target(Target::Value),
        ]);

        let entries = resolve(&provider, &source, dir.path()).await;

        assert_eq!(std::fs::read_to_string(&entries[0].value).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_binary_secret_volume_written_verbatim() {
        let dir = TempDir::new().unwrap();
        let keystore: &[u8] = &[0x30, 0x82, 0xff, 0xfe, 0x00, 0x01, 0x80];
        let provider = MockClusterProvider::new()
            .with_secret("default", "ks", [("keystore.p12", keystore)])
            .with_deployment(deployment(
                "api",
                json!({
                    "containers": [{
                        "name": "app",
                        "volumeMounts": [{ "name": "keystore", "mountPath": "/etc/ks" }]
                    }],
                    "volumes": [{ "name": "keystore", "secret": { "secretName": "ks" } }]
                }),
            ));
        let source = workload_source(
            "api",
            WorkloadOptions {
                volume_paths: VolumePaths::MountName,
                ..Default::default()
            },
        )
        .with_transformations(vec![TransformationSpec::new("suffix").value("-x")]);

        let entries = resolve(&provider, &source, dir.path()).await;

        let expected = dir.path().join("keystore/keystore.p12");
        assert_eq!(entries[0].value, expected.to_string_lossy());
        assert_eq!(std::fs::read(&expected).unwrap(), keystore);
        assert_eq!(entries[0].files, vec![expected]);
    }

    #[tokio::test]
    async fn test_key_projected_to_every_item_path() {
        let dir = TempDir::new().unwrap();
        let provider = MockClusterProvider::new()
            .with_config_map("default", "app", [("config.yaml", "a: 1")])
            .with_deployment(deployment(
                "api",
                json!({
                    "containers": [{
                        "name": "app",
                        "volumeMounts": [{ "name": "conf", "mountPath": "/etc/app" }]
                    }],
                    "volumes": [{
                        "name": "conf",
                        "configMap": {
                            "name": "app",
                            "items": [
                                { "key": "config.yaml", "path": "current.yaml" },
                                { "key": "config.yaml", "path": "backup/previous.yaml" }
                            ]
                        }
                    }]
                }),
            ));
        let source = workload_source(
            "api",
            WorkloadOptions {
                volume_paths: VolumePaths::MountName,
                ..Default::default()
            },
        );

        let entries = resolve(&provider, &source, dir.path()).await;

        assert_eq!(entries.len(), 2);
        let paths = ["conf/current.yaml", "conf/backup/previous.yaml"];
        for (entry, path) in entries.iter().zip(paths) {
            let expected = dir.path().join(path);
            assert_eq!(entry.key, "config.yaml");
            assert_eq!(entry.value, expected.to_string_lossy());
            assert_eq!(std::fs::read_to_string(&expected).unwrap(), "a: 1");
        }
    }

    #[tokio::test]
    async fn test_mount_without_matching_volume_is_ignored() {
        let provider = MockClusterProvider::new().with_deployment(deployment(
            "api",
            json!({
                "containers": [{
                    "name": "app",
                    "volumeMounts": [{ "name": "scratch", "mountPath": "/tmp/scratch" }]
                }],
                "volumes": [{ "name": "scratch", "emptyDir": {} }]
            }),
        ));
        let dir = TempDir::new().unwrap();

        let entries = resolve(
            &provider,
            &workload_source("api", WorkloadOptions::default()),
            dir.path(),
        )
        .await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_stateful_set_and_daemon_set_adapters() {
        let pod_spec = json!({
            "containers": [{ "name": "main", "env": [{ "name": "ROLE", "value": "db" }] }]
        });
        let stateful_set: StatefulSet = serde_json::from_value(json!({
            "metadata": { "name": "pg", "namespace": "data" },
            "spec": {
                "serviceName": "pg",
                "selector": { "matchLabels": { "app": "pg" } },
                "template": { "spec": pod_spec.clone() }
            }
        }))
        .unwrap();
        let daemon_set: DaemonSet = serde_json::from_value(json!({
            "metadata": { "name": "agent", "namespace": "data" },
            "spec": {
                "selector": { "matchLabels": { "app": "agent" } },
                "template": { "spec": pod_spec }
            }
        }))
        .unwrap();
        let provider = MockClusterProvider::new()
            .with_stateful_set(stateful_set)
            .with_daemon_set(daemon_set);
        let dir = TempDir::new().unwrap();

        let sts = Source::new("pg", SourceKind::StatefulSet(WorkloadOptions::default()))
            .in_namespace("data");
        let ds = Source::new("agent", SourceKind::DaemonSet(WorkloadOptions::default()))
            .in_namespace("data");

        let sts_entries = resolve(&provider, &sts, dir.path()).await;
        let ds_entries = resolve(&provider, &ds, dir.path()).await;

        assert_eq!(sts_entries[0].provenance.to_string(), "StatefulSet data/pg/main");
        assert_eq!(ds_entries[0].provenance.to_string(), "DaemonSet data/agent/main");
    }
}
