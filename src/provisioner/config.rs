//! Infrastructure settings used to build Cluster-Operator resources.
//!
//! [`ProvisionerConfig::default`] carries the values the portal has always
//! provisioned with; a JSON file passed with `--provisioner-config` can
//! override any subset of them.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ConfigError;
use crate::provisioner::crd::{ClusterDeploymentType, PullPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionerConfig {
    /// Namespace holding every Cluster-Operator object.
    pub namespace: String,
    pub cluster_version: ClusterVersionConfig,
    pub network: NetworkConfig,
    pub aws: AwsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterVersionConfig {
    pub name: String,
    pub deployment_type: ClusterDeploymentType,
    pub version: String,
    pub region_amis: Vec<RegionAmi>,
    pub image_format: String,
    pub openshift_ansible_image: String,
    pub cluster_api_image: String,
    pub machine_controller_image: String,
    pub image_pull_policy: PullPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAmi {
    pub region: String,
    pub ami: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub service_cidr_blocks: Vec<String>,
    pub pod_cidr_blocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub account_secret: String,
    pub ssh_secret: String,
    pub ssh_user: String,
    pub ssl_secret: String,
    pub region: String,
    pub key_pair_name: String,
    pub instance_type: String,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            namespace: "dedicated-portal".to_string(),
            cluster_version: ClusterVersionConfig::default(),
            network: NetworkConfig::default(),
            aws: AwsConfig::default(),
        }
    }
}

impl Default for ClusterVersionConfig {
    fn default() -> Self {
        Self {
            name: "origin-v3-10".to_string(),
            deployment_type: ClusterDeploymentType::Origin,
            version: "v3.10.0".to_string(),
            region_amis: vec![RegionAmi {
                region: "us-east-1".to_string(),
                ami: "ami-0dd8ad483cef75c18".to_string(),
            }],
            image_format: "openshift/origin-${component}:v3.10.0".to_string(),
            openshift_ansible_image: "cluster-operator-ansible:canary".to_string(),
            cluster_api_image: "default('registry.svc.ci.openshift.org/openshift-cluster-operator/kubernetes-cluster-api:latest')".to_string(),
            machine_controller_image: "default('registry.svc.ci.openshift.org/openshift-cluster-operator/cluster-operator:latest')".to_string(),
            image_pull_policy: PullPolicy::Never,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            service_cidr_blocks: vec!["172.30.0.0/16".to_string()],
            pod_cidr_blocks: vec!["172.30.0.0/14".to_string()],
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            account_secret: "nshneor-aws-creds".to_string(),
            ssh_secret: "ssh-secret".to_string(),
            ssh_user: "centos".to_string(),
            ssl_secret: "nshneor-certs".to_string(),
            region: "us-east-1".to_string(),
            key_pair_name: "libra".to_string(),
            instance_type: "t2.xlarge".to_string(),
        }
    }
}

impl ProvisionerConfig {
    /// Reads a JSON override file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::ParseProvisionerConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the file when given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
