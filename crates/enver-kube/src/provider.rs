//! Read-only cluster data provider
//!
//! Every cluster access made while resolving sources goes through
//! [`ClusterProvider`]. [`crate::KubeProvider`] talks to a real API server;
//! [`crate::MockClusterProvider`] serves objects from memory for tests.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret};
use std::collections::BTreeMap;

use crate::error::Result;

/// Cluster capability consumed by the resolvers
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait ClusterProvider: Send + Sync {
    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap>;

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret>;

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment>;

    async fn get_stateful_set(&self, namespace: &str, name: &str) -> Result<StatefulSet>;

    async fn get_daemon_set(&self, namespace: &str, name: &str) -> Result<DaemonSet>;

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod>;

    /// List pods matching a textual label selector (empty = all pods)
    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>>;

    /// Run `command` in a container and return its stdout
    async fn exec_in_container(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<String>;
}

/// String data of a ConfigMap
pub fn config_map_data(config_map: ConfigMap) -> BTreeMap<String, String> {
    config_map.data.unwrap_or_default()
}

/// ConfigMap data as bytes, for writing into files
pub fn config_map_bytes(config_map: ConfigMap) -> BTreeMap<String, Vec<u8>> {
    config_map_data(config_map)
        .into_iter()
        .map(|(key, value)| (key, value.into_bytes()))
        .collect()
}

/// Decoded data of a Secret, trailing CR/LF trimmed
pub fn secret_data(secret: Secret) -> BTreeMap<String, String> {
    secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(key, bytes)| (key, trim_secret(&bytes.0)))
        .collect()
}

/// Raw Secret bytes, trailing CR/LF trimmed
pub fn secret_bytes(secret: Secret) -> BTreeMap<String, Vec<u8>> {
    secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(key, bytes)| (key, trim_line_endings(&bytes.0).to_vec()))
        .collect()
}

/// Strip trailing `\n` / `\r` bytes
pub fn trim_line_endings(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !matches!(b, b'\n' | b'\r'))
        .map_or(0, |last| last + 1);
    &bytes[..end]
}

/// Secret bytes as text without trailing `\n` / `\r`
pub fn trim_secret(bytes: &[u8]) -> String {
    String::from_utf8_lossy(trim_line_endings(bytes)).into_owned()
}
