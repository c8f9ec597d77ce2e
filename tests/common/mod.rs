// Shared helpers for the integration tests
#![allow(dead_code)]

pub mod database;

use async_trait::async_trait;
use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use dedicated_portal::{
    error::ApiError,
    models::{Cluster, CreateClusterRequest},
    provisioner::{
        crd::{ClusterDeployment, ClusterVersion},
        ClusterOperatorClient, ClusterProvisioner, K8sError,
    },
    services::ClustersService,
};

pub const TEST_KID: &str = "portal-test-key";
pub const TEST_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/jwt_rsa_private.pem");
pub const OTHER_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/other_rsa_private.pem");
pub const TEST_JWKS: &str = include_str!("../fixtures/jwks.json");

pub fn api_error(code: u16, reason: &str) -> K8sError {
    K8sError::Kube(kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{} from test API server", reason),
        reason: reason.to_string(),
        code,
    }))
}

/// In-memory stand-in for the Cluster-Operator API that records every call.
#[derive(Default)]
pub struct FakeClusterOperator {
    pub cluster_versions: Mutex<Vec<ClusterVersion>>,
    pub cluster_deployments: Mutex<Vec<ClusterDeployment>>,
    pub version_gets: AtomicUsize,
    pub version_creates: AtomicUsize,
    /// Status code returned by `get_cluster_version` instead of a result.
    pub fail_version_get: Option<u16>,
    /// Answer version creates with 409 as if another request won the race.
    pub conflict_on_version_create: bool,
    /// Status code returned by `create_cluster_deployment`.
    pub fail_deployment_create: Option<u16>,
}

impl FakeClusterOperator {
    pub fn version_creates(&self) -> usize {
        self.version_creates.load(Ordering::SeqCst)
    }

    pub fn deployments(&self) -> Vec<ClusterDeployment> {
        self.cluster_deployments.lock().unwrap().clone()
    }

    pub fn versions(&self) -> Vec<ClusterVersion> {
        self.cluster_versions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterOperatorClient for FakeClusterOperator {
    async fn get_cluster_version(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ClusterVersion>, K8sError> {
        self.version_gets.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = self.fail_version_get {
            return Err(api_error(code, "InternalError"));
        }

        Ok(self
            .cluster_versions
            .lock()
            .unwrap()
            .iter()
            .find(|v| {
                v.metadata.namespace.as_deref() == Some(namespace)
                    && v.metadata.name.as_deref() == Some(name)
            })
            .cloned())
    }

    async fn create_cluster_version(
        &self,
        _namespace: &str,
        cluster_version: &ClusterVersion,
    ) -> Result<ClusterVersion, K8sError> {
        self.version_creates.fetch_add(1, Ordering::SeqCst);
        if self.conflict_on_version_create {
            return Err(K8sError::AlreadyExists {
                kind: "ClusterVersion",
                name: cluster_version.metadata.name.clone().unwrap_or_default(),
            });
        }

        self.cluster_versions
            .lock()
            .unwrap()
            .push(cluster_version.clone());
        Ok(cluster_version.clone())
    }

    async fn create_cluster_deployment(
        &self,
        _namespace: &str,
        cluster_deployment: &ClusterDeployment,
    ) -> Result<ClusterDeployment, K8sError> {
        if let Some(code) = self.fail_deployment_create {
            return Err(api_error(code, "Forbidden"));
        }

        self.cluster_deployments
            .lock()
            .unwrap()
            .push(cluster_deployment.clone());
        Ok(cluster_deployment.clone())
    }
}

/// Clusters service keeping its records in memory.
pub struct InMemoryClustersService {
    clusters: Mutex<Vec<Cluster>>,
    provisioner: Arc<dyn ClusterProvisioner>,
}

impl InMemoryClustersService {
    pub fn new(provisioner: Arc<dyn ClusterProvisioner>) -> Self {
        Self {
            clusters: Mutex::new(Vec::new()),
            provisioner,
        }
    }

    pub fn len(&self) -> usize {
        self.clusters.lock().unwrap().len()
    }
}

#[async_trait]
impl ClustersService for InMemoryClustersService {
    async fn list(&self) -> Result<Vec<Cluster>, ApiError> {
        Ok(self.clusters.lock().unwrap().clone())
    }

    async fn create(&self, request: CreateClusterRequest) -> Result<Cluster, ApiError> {
        let cluster = Cluster {
            id: Uuid::new_v4(),
            name: request.name,
            nodes: request.nodes,
            created_at: Utc::now(),
        };
        self.provisioner.provision(&cluster).await?;
        self.clusters.lock().unwrap().push(cluster.clone());
        Ok(cluster)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Cluster>, ApiError> {
        Ok(self
            .clusters
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }
}

/// Signs an RS256 token expiring `expires_in` seconds from now (negative for
/// an already expired token).
pub fn sign_token(kid: Option<&str>, private_key: &[u8], expires_in: i64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);

    let claims = json!({
        "sub": "portal-user",
        "iat": now,
        "exp": now + expires_in,
        "aud": "account",
    });

    encode(
        &header,
        &claims,
        &EncodingKey::from_rsa_pem(private_key).unwrap(),
    )
    .unwrap()
}

pub fn valid_token() -> String {
    sign_token(Some(TEST_KID), TEST_PRIVATE_KEY, 3600)
}

/// Serves the fixture JWK set on a local port and returns its URL.
pub async fn spawn_jwks_server() -> String {
    spawn_counting_jwks_server().await.0
}

/// Like [`spawn_jwks_server`], also returning the number of key set requests
/// served so far.
pub async fn spawn_counting_jwks_server() -> (String, Arc<AtomicUsize>) {
    let jwks: Value = serde_json::from_str(TEST_JWKS).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/certs",
        get({
            let hits = hits.clone();
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
                let jwks = jwks.clone();
                async move { Json(jwks) }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/certs", addr), hits)
}
