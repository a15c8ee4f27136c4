//! Mock cluster provider for testing
//!
//! This provider serves objects from memory, useful for unit tests
//! without requiring a Kubernetes cluster.

use async_trait::async_trait;
use k8s_openapi::ByteString;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{KubeError, Result};
use crate::provider::ClusterProvider;

type ObjectKey = (String, String);

#[derive(Default)]
struct MockState {
    config_maps: HashMap<ObjectKey, ConfigMap>,
    secrets: HashMap<ObjectKey, Secret>,
    deployments: HashMap<ObjectKey, Deployment>,
    stateful_sets: HashMap<ObjectKey, StatefulSet>,
    daemon_sets: HashMap<ObjectKey, DaemonSet>,
    /// Ordered so that `list_pods` is deterministic
    pods: BTreeMap<ObjectKey, Pod>,
    /// (namespace, pod, container, command) -> stdout
    exec_outputs: HashMap<(String, String, String, Vec<String>), String>,
}

/// In-memory cluster provider for testing
#[derive(Clone, Default)]
pub struct MockClusterProvider {
    state: Arc<RwLock<MockState>>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub lists: usize,
    pub execs: usize,
}

fn key_of(meta: &ObjectMeta) -> ObjectKey {
    (
        meta.namespace.clone().unwrap_or_else(|| "default".to_string()),
        meta.name.clone().unwrap_or_default(),
    )
}

fn meta(namespace: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

/// Equality, existence and negated-existence terms; set terms always match
fn selector_matches(selector: &str, labels: &BTreeMap<String, String>) -> bool {
    let label = |key: &str| labels.get(key).map(String::as_str);

    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| {
            if term.contains(' ') {
                true
            } else if let Some((key, value)) = term.split_once("!=") {
                label(key) != Some(value)
            } else if let Some((key, value)) =
                term.split_once("==").or_else(|| term.split_once('='))
            {
                label(key) == Some(value)
            } else if let Some(key) = term.strip_prefix('!') {
                label(key).is_none()
            } else {
                label(term).is_some()
            }
        })
}

impl MockClusterProvider {
    /// Create a new empty mock provider
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&self) -> std::sync::RwLockWriteGuard<'_, MockState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> std::sync::RwLockReadGuard<'_, MockState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn count(&self, update: impl FnOnce(&mut OperationCounts)) {
        let mut ops = self.operations.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut *ops);
    }

    /// Add a ConfigMap with string data
    pub fn with_config_map<I, K, V>(self, namespace: &str, name: &str, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let config_map = ConfigMap {
            metadata: meta(namespace, name),
            data: Some(data.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
            ..Default::default()
        };
        self.state_mut()
            .config_maps
            .insert((namespace.to_string(), name.to_string()), config_map);
        self
    }

    /// Add a Secret; values are stored as raw bytes
    pub fn with_secret<I, K, V>(self, namespace: &str, name: &str, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<[u8]>,
    {
        let secret = Secret {
            metadata: meta(namespace, name),
            data: Some(
                data.into_iter()
                    .map(|(k, v)| (k.into(), ByteString(v.as_ref().to_vec())))
                    .collect(),
            ),
            ..Default::default()
        };
        self.state_mut()
            .secrets
            .insert((namespace.to_string(), name.to_string()), secret);
        self
    }

    pub fn with_deployment(self, deployment: Deployment) -> Self {
        let key = key_of(&deployment.metadata);
        self.state_mut().deployments.insert(key, deployment);
        self
    }

    pub fn with_stateful_set(self, stateful_set: StatefulSet) -> Self {
        let key = key_of(&stateful_set.metadata);
        self.state_mut().stateful_sets.insert(key, stateful_set);
        self
    }

    pub fn with_daemon_set(self, daemon_set: DaemonSet) -> Self {
        let key = key_of(&daemon_set.metadata);
        self.state_mut().daemon_sets.insert(key, daemon_set);
        self
    }

    pub fn with_pod(self, pod: Pod) -> Self {
        let key = key_of(&pod.metadata);
        self.state_mut().pods.insert(key, pod);
        self
    }

    /// Register the stdout of `command` in a container
    pub fn with_exec_output(
        self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[&str],
        stdout: impl Into<String>,
    ) -> Self {
        self.state_mut().exec_outputs.insert(
            (
                namespace.to_string(),
                pod.to_string(),
                container.to_string(),
                command.iter().map(|c| c.to_string()).collect(),
            ),
            stdout.into(),
        );
        self
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lookup<T: Clone>(
        &self,
        select: impl FnOnce(&MockState) -> &HashMap<ObjectKey, T>,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<T> {
        self.count(|ops| ops.gets += 1);

        let state = self.state();
        select(&*state)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| KubeError::NotFound {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}

#[async_trait]
impl ClusterProvider for MockClusterProvider {
    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap> {
        self.lookup(|s| &s.config_maps, "ConfigMap", namespace, name)
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret> {
        self.lookup(|s| &s.secrets, "Secret", namespace, name)
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        self.lookup(|s| &s.deployments, "Deployment", namespace, name)
    }

    async fn get_stateful_set(&self, namespace: &str, name: &str) -> Result<StatefulSet> {
        self.lookup(|s| &s.stateful_sets, "StatefulSet", namespace, name)
    }

    async fn get_daemon_set(&self, namespace: &str, name: &str) -> Result<DaemonSet> {
        self.lookup(|s| &s.daemon_sets, "DaemonSet", namespace, name)
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod> {
        self.count(|ops| ops.gets += 1);

        self.state()
            .pods
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| KubeError::NotFound {
                kind: "Pod".to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>> {
        self.count(|ops| ops.lists += 1);

        let empty = BTreeMap::new();
        Ok(self
            .state()
            .pods
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .filter(|(_, pod)| {
                selector_matches(label_selector, pod.metadata.labels.as_ref().unwrap_or(&empty))
            })
            .map(|(_, pod)| pod.clone())
            .collect())
    }

    async fn exec_in_container(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<String> {
        self.count(|ops| ops.execs += 1);

        let key = (
            namespace.to_string(),
            pod.to_string(),
            container.to_string(),
            command.to_vec(),
        );
        self.state()
            .exec_outputs
            .get(&key)
            .cloned()
            .ok_or_else(|| KubeError::ExecFailed {
                namespace: namespace.to_string(),
                pod: pod.to_string(),
                container: container.to_string(),
                message: format!("command {command:?} terminated with exit code 1"),
            })
    }
}
