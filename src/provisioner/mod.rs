//! Cluster provisioning through the OpenShift Cluster-Operator.
//!
//! A cluster is provisioned by creating two custom resources: the shared
//! [`ClusterVersion`] (created once per namespace) and one
//! [`ClusterDeployment`] per cluster. The Cluster-Operator controller does
//! the actual work asynchronously; nothing here waits for it.

pub mod config;
pub mod crd;
pub mod k8s;

use async_trait::async_trait;
use kube::api::ObjectMeta;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub use config::ProvisionerConfig;
use crd::{
    AwsClusterSpec, AwsRegionAmi, AwsVmImages, ClusterDeployment, ClusterDeploymentSpec,
    ClusterHardwareSpec, ClusterMachineSet, ClusterNetworkingConfig, ClusterVersion,
    ClusterVersionImages, ClusterVersionReference, ClusterVersionSpec, MachineSetAwsHardwareSpec,
    MachineSetConfig, MachineSetHardwareSpec, NetworkRanges, NodeType, SecretReference, VmImages,
};
pub use k8s::{ClusterOperatorClient, K8sError, KubeClusterOperatorClient};

use crate::models::{Cluster, ClusterNodes};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to create ClusterVersion object: {0}")]
    ClusterVersion(#[source] K8sError),

    #[error("failed to create ClusterDeployment object: {0}")]
    ClusterDeployment(#[source] K8sError),
}

/// Provisions clusters.
///
/// `Ok(())` means the request was accepted by the Kubernetes API, not that
/// the cluster is running.
#[async_trait]
pub trait ClusterProvisioner: Send + Sync {
    async fn provision(&self, cluster: &Cluster) -> Result<(), ProvisionError>;
}

pub struct ClusterOperatorProvisioner {
    client: Arc<dyn ClusterOperatorClient>,
    config: ProvisionerConfig,
}

impl ClusterOperatorProvisioner {
    pub fn new(client: Arc<dyn ClusterOperatorClient>, config: ProvisionerConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Creates the shared ClusterVersion unless it is already there.
    ///
    /// Two concurrent callers may both miss it on lookup; the loser's create
    /// fails with a conflict, which counts as success.
    pub async fn ensure_cluster_version(&self) -> Result<(), K8sError> {
        let namespace = &self.config.namespace;
        let name = &self.config.cluster_version.name;

        if self.client.get_cluster_version(namespace, name).await?.is_some() {
            debug!("ClusterVersion {}/{} already exists", namespace, name);
            return Ok(());
        }

        info!("Creating ClusterVersion {}/{}", namespace, name);
        match self
            .client
            .create_cluster_version(namespace, &self.cluster_version())
            .await
        {
            Ok(_) => Ok(()),
            Err(K8sError::AlreadyExists { .. }) => {
                info!("ClusterVersion {}/{} was created concurrently", namespace, name);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn cluster_version(&self) -> ClusterVersion {
        let version = &self.config.cluster_version;
        let pull_policy = Some(version.image_pull_policy.clone());

        let spec = ClusterVersionSpec {
            deployment_type: version.deployment_type,
            version: version.version.clone(),
            vm_images: VmImages {
                aws_images: Some(AwsVmImages {
                    region_amis: version
                        .region_amis
                        .iter()
                        .map(|r| AwsRegionAmi {
                            region: r.region.clone(),
                            ami: r.ami.clone(),
                        })
                        .collect(),
                }),
            },
            images: ClusterVersionImages {
                image_format: version.image_format.clone(),
                openshift_ansible_image: Some(version.openshift_ansible_image.clone()),
                openshift_ansible_image_pull_policy: pull_policy.clone(),
                cluster_api_image: Some(version.cluster_api_image.clone()),
                cluster_api_image_pull_policy: pull_policy.clone(),
                machine_controller_image: Some(version.machine_controller_image.clone()),
                machine_controller_image_pull_policy: pull_policy,
            },
        };

        ClusterVersion {
            metadata: self.object_meta(&version.name),
            spec,
        }
    }

    pub fn cluster_deployment(&self, cluster: &Cluster) -> ClusterDeployment {
        let name = cluster.resource_name();
        let aws = &self.config.aws;
        let network = &self.config.network;

        let spec = ClusterDeploymentSpec {
            cluster_name: name.clone(),
            cluster_version_ref: ClusterVersionReference {
                namespace: self.config.namespace.clone(),
                name: self.config.cluster_version.name.clone(),
            },
            network_config: ClusterNetworkingConfig {
                services: NetworkRanges {
                    cidr_blocks: network.service_cidr_blocks.clone(),
                },
                pods: NetworkRanges {
                    cidr_blocks: network.pod_cidr_blocks.clone(),
                },
            },
            hardware: ClusterHardwareSpec {
                aws: Some(AwsClusterSpec {
                    account_secret: SecretReference::new(&aws.account_secret),
                    ssh_secret: SecretReference::new(&aws.ssh_secret),
                    ssh_user: aws.ssh_user.clone(),
                    ssl_secret: SecretReference::new(&aws.ssl_secret),
                    region: aws.region.clone(),
                    key_pair_name: aws.key_pair_name.clone(),
                }),
            },
            default_hardware_spec: Some(MachineSetHardwareSpec {
                aws: Some(MachineSetAwsHardwareSpec {
                    instance_type: aws.instance_type.clone(),
                }),
            }),
            machine_sets: machine_sets(&cluster.nodes),
        };

        ClusterDeployment {
            metadata: self.object_meta(&name),
            spec,
        }
    }

    fn object_meta(&self, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(self.config.namespace.clone()),
            ..ObjectMeta::default()
        }
    }
}

/// Master, compute and infra machine sets, in that order.
pub fn machine_sets(nodes: &ClusterNodes) -> Vec<ClusterMachineSet> {
    vec![
        ClusterMachineSet {
            short_name: String::new(),
            config: MachineSetConfig {
                node_type: NodeType::Master,
                infra: false,
                size: nodes.master,
            },
        },
        ClusterMachineSet {
            short_name: "compute".to_string(),
            config: MachineSetConfig {
                node_type: NodeType::Compute,
                infra: false,
                size: nodes.compute,
            },
        },
        ClusterMachineSet {
            short_name: "infra".to_string(),
            config: MachineSetConfig {
                node_type: NodeType::Compute,
                infra: true,
                size: nodes.infra,
            },
        },
    ]
}

#[async_trait]
impl ClusterProvisioner for ClusterOperatorProvisioner {
    async fn provision(&self, cluster: &Cluster) -> Result<(), ProvisionError> {
        self.ensure_cluster_version()
            .await
            .map_err(ProvisionError::ClusterVersion)?;

        let deployment = self.cluster_deployment(cluster);
        info!(
            "Creating ClusterDeployment {}/{} (master={}, compute={}, infra={})",
            self.config.namespace,
            cluster.resource_name(),
            cluster.nodes.master,
            cluster.nodes.compute,
            cluster.nodes.infra
        );
        self.client
            .create_cluster_deployment(&self.config.namespace, &deployment)
            .await
            .map_err(ProvisionError::ClusterDeployment)?;

        Ok(())
    }
}
