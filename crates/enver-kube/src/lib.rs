//! Enver Kube - Kubernetes integration for enver
//!
//! This crate provides:
//! - **Cluster Provider**: Read-only access to ConfigMaps, Secrets, workloads and pods
//! - **Client Cache**: One client per kube-context, shared across concurrent executions
//! - **Source Resolution**: ConfigMap, Secret, workload and container sources to entries
//! - **Mock Provider**: In-memory cluster for tests

pub mod cache;
pub mod client;
pub mod error;
pub mod mock;
pub mod provider;
pub mod selector;
pub mod sources;

pub use cache::ClientCache;
pub use client::KubeProvider;
pub use error::{KubeError, Result};
pub use mock::{MockClusterProvider, OperationCounts};
pub use provider::ClusterProvider;
pub use selector::format_label_selector;
pub use sources::{Workload, requires_cluster, resolve_pod_spec, resolve_source, resolve_sources};
