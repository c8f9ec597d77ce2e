use async_trait::async_trait;
use kube::{
    api::PostParams,
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client, Config,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::provisioner::crd::{ClusterDeployment, ClusterVersion};

/// Errors returned by the Cluster-Operator API.
#[derive(Debug, Error)]
pub enum K8sError {
    /// The object already exists (HTTP 409).
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

/// Typed access to the Cluster-Operator resources the provisioner writes.
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait ClusterOperatorClient: Send + Sync {
    /// Returns `None` when no ClusterVersion with that name exists.
    async fn get_cluster_version(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ClusterVersion>, K8sError>;

    async fn create_cluster_version(
        &self,
        namespace: &str,
        cluster_version: &ClusterVersion,
    ) -> Result<ClusterVersion, K8sError>;

    async fn create_cluster_deployment(
        &self,
        namespace: &str,
        cluster_deployment: &ClusterDeployment,
    ) -> Result<ClusterDeployment, K8sError>;
}

/// [`ClusterOperatorClient`] backed by the [`kube`] client.
#[derive(Clone)]
pub struct KubeClusterOperatorClient {
    client: Client,
}

impl KubeClusterOperatorClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn conflict_as_already_exists(err: kube::Error, kind: &'static str, name: &str) -> K8sError {
    match err {
        kube::Error::Api(ae) if ae.code == 409 => K8sError::AlreadyExists {
            kind,
            name: name.to_string(),
        },
        e => K8sError::Kube(e),
    }
}

#[async_trait]
impl ClusterOperatorClient for KubeClusterOperatorClient {
    async fn get_cluster_version(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ClusterVersion>, K8sError> {
        let api: Api<ClusterVersion> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn create_cluster_version(
        &self,
        namespace: &str,
        cluster_version: &ClusterVersion,
    ) -> Result<ClusterVersion, K8sError> {
        let api: Api<ClusterVersion> = Api::namespaced(self.client.clone(), namespace);
        let name = cluster_version.metadata.name.clone().unwrap_or_default();
        api.create(&PostParams::default(), cluster_version)
            .await
            .map_err(|e| conflict_as_already_exists(e, "ClusterVersion", &name))
    }

    async fn create_cluster_deployment(
        &self,
        namespace: &str,
        cluster_deployment: &ClusterDeployment,
    ) -> Result<ClusterDeployment, K8sError> {
        let api: Api<ClusterDeployment> = Api::namespaced(self.client.clone(), namespace);
        let name = cluster_deployment.metadata.name.clone().unwrap_or_default();
        api.create(&PostParams::default(), cluster_deployment)
            .await
            .map_err(|e| conflict_as_already_exists(e, "ClusterDeployment", &name))
    }
}

/// Where the Kubernetes client configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KubeConfigSource {
    File(PathBuf),
    InCluster,
}

#[derive(Debug, Error)]
pub enum KubeConfigError {
    #[error("the Kubernetes configuration path '{0}' is a directory")]
    IsDirectory(PathBuf),

    #[error("can't open Kubernetes configuration file '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Resolves the kubeconfig file: the flag wins, then `$KUBECONFIG`, then
/// `$HOME/.kube/config`. A file that does not exist selects the in-cluster
/// configuration.
pub fn resolve_kubeconfig(
    flag: Option<&Path>,
    env_kubeconfig: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<KubeConfigSource, KubeConfigError> {
    let path = match (flag, env_kubeconfig) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(env)) if !env.is_empty() => PathBuf::from(env),
        _ => match home {
            Some(home) => home.join(".kube").join("config"),
            None => return Ok(KubeConfigSource::InCluster),
        },
    };

    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => Err(KubeConfigError::IsDirectory(path)),
        Ok(_) => Ok(KubeConfigSource::File(path)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(KubeConfigSource::InCluster),
        Err(source) => Err(KubeConfigError::Unreadable { path, source }),
    }
}

/// Builds a [`Client`] from the resolved configuration source, applying the
/// `--master` override when given.
pub async fn kube_client(
    kubeconfig: Option<&Path>,
    master: Option<&str>,
) -> anyhow::Result<Client> {
    let source = resolve_kubeconfig(
        kubeconfig,
        std::env::var_os("KUBECONFIG"),
        std::env::var_os("HOME").map(PathBuf::from),
    )?;

    let mut config = match source {
        KubeConfigSource::File(path) => {
            info!("Loading Kubernetes configuration from '{}'", path.display());
            let kubeconfig = Kubeconfig::read_from(&path)?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
        }
        KubeConfigSource::InCluster => {
            info!("Kubernetes configuration file not found, using in-cluster configuration");
            Config::incluster()?
        }
    };

    if let Some(master) = master {
        config.cluster_url = master.parse()?;
    }

    Ok(Client::try_from(config)?)
}
