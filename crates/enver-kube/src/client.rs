//! `kube`-backed cluster provider

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret};
use kube::api::{Api, AttachParams, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{KubeError, Result};
use crate::provider::ClusterProvider;

/// Cluster provider talking to a real API server
#[derive(Clone)]
pub struct KubeProvider {
    client: Client,
}

impl KubeProvider {
    /// Create with an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the local kubeconfig
    ///
    /// `None` selects the kubeconfig's current context.
    pub async fn for_context(context: Option<&str>) -> Result<Self> {
        let options = KubeConfigOptions {
            context: context.map(str::to_string),
            ..Default::default()
        };
        let config = Config::from_kubeconfig(&options)
            .await
            .map_err(|e| KubeError::Kubeconfig(e.to_string()))?;

        Ok(Self::new(Client::try_from(config)?))
    }

    /// Name of the kubeconfig's current context
    pub fn current_context() -> Result<String> {
        Kubeconfig::read()
            .map_err(|e| KubeError::Kubeconfig(e.to_string()))?
            .current_context
            .filter(|c| !c.is_empty())
            .ok_or_else(|| KubeError::Kubeconfig("no current context set".to_string()))
    }

    /// Get the underlying Kubernetes client
    pub fn kube_client(&self) -> &Client {
        &self.client
    }

    async fn get<K>(&self, namespace: &str, name: &str) -> Result<K>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get(name).await.map_err(|e| match e {
            kube::Error::Api(resp) if resp.code == 404 => KubeError::NotFound {
                kind: K::kind(&K::DynamicType::default()).into_owned(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            other => KubeError::Api(other),
        })
    }
}

async fn read_stream(stream: Option<impl AsyncRead + Unpin>) -> std::io::Result<String> {
    let mut buf = String::new();
    if let Some(mut stream) = stream {
        stream.read_to_string(&mut buf).await?;
    }
    Ok(buf)
}

#[async_trait]
impl ClusterProvider for KubeProvider {
    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap> {
        self.get(namespace, name).await
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret> {
        self.get(namespace, name).await
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        self.get(namespace, name).await
    }

    async fn get_stateful_set(&self, namespace: &str, name: &str) -> Result<StatefulSet> {
        self.get(namespace, name).await
    }

    async fn get_daemon_set(&self, namespace: &str, name: &str) -> Result<DaemonSet> {
        self.get(namespace, name).await
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod> {
        self.get(namespace, name).await
    }

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let mut params = ListParams::default();
        if !label_selector.is_empty() {
            params = params.labels(label_selector);
        }

        Ok(api.list(&params).await?.items)
    }

    async fn exec_in_container(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<String> {
        let failed = |message: String| KubeError::ExecFailed {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            container: container.to_string(),
            message,
        };

        tracing::debug!(namespace, pod, container, ?command, "exec");

        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = AttachParams::default()
            .container(container)
            .stdin(false)
            .stdout(true)
            .stderr(true);

        let mut process = api
            .exec(pod, command.to_vec(), &params)
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = process.take_status();
        let (stdout, stderr) = (process.stdout(), process.stderr());
        let (stdout, stderr) = tokio::join!(read_stream(stdout), read_stream(stderr));
        let stdout = stdout.map_err(|e| failed(e.to_string()))?;
        let stderr = stderr.map_err(|e| failed(e.to_string()))?;

        if let Some(status) = status
            && let Some(status) = status.await
            && status.status.as_deref() == Some("Failure")
        {
            let message = status.message.unwrap_or_default();
            return Err(failed(format!("{message} (stderr: {})", stderr.trim())));
        }

        process.join().await.map_err(|e| failed(e.to_string()))?;
        Ok(stdout)
    }
}
