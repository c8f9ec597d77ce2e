//! Cluster-Operator custom resources.
//!
//! Only the fields written by the provisioner are modelled. The controller
//! that consumes these objects owns every other field.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const API_GROUP: &str = "clusteroperator.openshift.io";
pub const API_VERSION: &str = "v1alpha1";

/// ClusterVersion describes the OpenShift release and images a cluster is
/// installed from. A single object is shared by every cluster.
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "clusteroperator.openshift.io",
    version = "v1alpha1",
    kind = "ClusterVersion",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterVersionSpec {
    pub deployment_type: ClusterDeploymentType,
    pub version: String,
    pub vm_images: VmImages,
    pub images: ClusterVersionImages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClusterDeploymentType {
    Origin,
    OpenShift,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VmImages {
    #[serde(rename = "awsVMImages", default, skip_serializing_if = "Option::is_none")]
    pub aws_images: Option<AwsVmImages>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AwsVmImages {
    #[serde(rename = "regionAMIs")]
    pub region_amis: Vec<AwsRegionAmi>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AwsRegionAmi {
    pub region: String,
    pub ami: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PullPolicy {
    Always,
    IfNotPresent,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterVersionImages {
    pub image_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_ansible_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_ansible_image_pull_policy: Option<PullPolicy>,
    #[serde(rename = "clusterAPIImage", default, skip_serializing_if = "Option::is_none")]
    pub cluster_api_image: Option<String>,
    #[serde(
        rename = "clusterAPIImagePullPolicy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cluster_api_image_pull_policy: Option<PullPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_controller_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_controller_image_pull_policy: Option<PullPolicy>,
}

/// ClusterDeployment requests one cluster from the Cluster-Operator.
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "clusteroperator.openshift.io",
    version = "v1alpha1",
    kind = "ClusterDeployment",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentSpec {
    pub cluster_name: String,
    pub cluster_version_ref: ClusterVersionReference,
    pub network_config: ClusterNetworkingConfig,
    pub hardware: ClusterHardwareSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_hardware_spec: Option<MachineSetHardwareSpec>,
    pub machine_sets: Vec<ClusterMachineSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterVersionReference {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterNetworkingConfig {
    pub services: NetworkRanges,
    pub pods: NetworkRanges,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRanges {
    pub cidr_blocks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterHardwareSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsClusterSpec>,
}

/// Reference to a secret in the cluster namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SecretReference {
    pub name: String,
}

impl SecretReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwsClusterSpec {
    pub account_secret: SecretReference,
    pub ssh_secret: SecretReference,
    pub ssh_user: String,
    pub ssl_secret: SecretReference,
    pub region: String,
    pub key_pair_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MachineSetHardwareSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<MachineSetAwsHardwareSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineSetAwsHardwareSpec {
    pub instance_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum NodeType {
    Master,
    Compute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMachineSet {
    #[serde(default)]
    pub short_name: String,
    #[serde(flatten)]
    pub config: MachineSetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineSetConfig {
    pub node_type: NodeType,
    pub infra: bool,
    pub size: u32,
}
