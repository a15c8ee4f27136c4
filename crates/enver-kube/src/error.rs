//! Error types for enver-kube

use enver_core::CoreError;
use thiserror::Error;

/// Result type for enver-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while resolving cluster-backed sources
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Referenced object does not exist
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    /// Kubeconfig could not be loaded for the requested context
    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(String),

    /// Command execution inside a container failed
    #[error("failed to exec into container {container} in pod {namespace}/{pod}: {message}")]
    ExecFailed {
        namespace: String,
        pod: String,
        container: String,
        message: String,
    },

    /// Workload selector matched nothing
    #[error("no pods found for {kind} {namespace}/{name}")]
    NoPodsFound {
        kind: String,
        namespace: String,
        name: String,
    },

    /// Workload selector matched pods, none of them running
    #[error(
        "no running pods found for {kind} {namespace}/{name} (found {found} pods, none running)"
    )]
    NoRunningPods {
        kind: String,
        namespace: String,
        name: String,
        found: usize,
    },

    /// Target pod is not in the Running phase
    #[error("pod {namespace}/{name} is not running (phase: {phase})")]
    PodNotRunning {
        namespace: String,
        name: String,
        phase: String,
    },

    /// Container source declares an unsupported workload kind
    #[error(
        "invalid kind {kind:?} for Container source {name:?} (must be Pod, Deployment, StatefulSet, or DaemonSet)"
    )]
    InvalidContainerKind { kind: String, name: String },

    /// A workload carries no label selector to find its pods with
    #[error("{kind} {namespace}/{name} has no selector")]
    MissingSelector {
        kind: String,
        namespace: String,
        name: String,
    },

    /// A cluster source was resolved without a cluster client
    #[error("{kind} source {name:?} requires a Kubernetes client")]
    ClientRequired { kind: String, name: String },

    /// Resolution of one `env` variable failed
    #[error("failed to resolve env var {variable}: {source}")]
    Variable {
        variable: String,
        #[source]
        source: Box<KubeError>,
    },

    /// Configuration, transformation or local IO error
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        match self {
            KubeError::NotFound { .. } => true,
            KubeError::Api(kube::Error::Api(resp)) => resp.code == 404,
            KubeError::Variable { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error stems from invalid configuration
    pub fn is_configuration(&self) -> bool {
        match self {
            KubeError::InvalidContainerKind { .. } | KubeError::ClientRequired { .. } => true,
            KubeError::Core(e) => e.is_configuration(),
            _ => false,
        }
    }

    pub(crate) fn variable(variable: &str, source: KubeError) -> Self {
        KubeError::Variable {
            variable: variable.to_string(),
            source: Box::new(source),
        }
    }
}
