use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{Cluster, CreateClusterRequest},
    ClustersState,
};

pub async fn list_clusters(
    State(state): State<ClustersState>,
) -> Result<Json<Vec<Cluster>>, ApiError> {
    let clusters = state.clusters.list().await?;
    Ok(Json(clusters))
}

/// Creates a cluster.
///
/// `201 Created` means the cluster was recorded and its custom resources were
/// accepted by the Kubernetes API. Provisioning itself continues
/// asynchronously in the Cluster-Operator.
pub async fn create_cluster(
    State(state): State<ClustersState>,
    Json(request): Json<CreateClusterRequest>,
) -> Result<(StatusCode, Json<Cluster>), ApiError> {
    info!(
        "Create cluster '{}': master={}, infra={}, compute={}",
        request.name, request.nodes.master, request.nodes.infra, request.nodes.compute
    );
    let cluster = state.clusters.create(request).await?;
    Ok((StatusCode::CREATED, Json(cluster)))
}

pub async fn get_cluster(
    State(state): State<ClustersState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Cluster>, ApiError> {
    state
        .clusters
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("cluster '{}'", id)))
}
