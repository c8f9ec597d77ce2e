use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, StoreError};
use crate::models::{Cluster, ClusterRow, CreateClusterRequest};
use crate::provisioner::ClusterProvisioner;

/// Stores clusters and hands new ones to the provisioner.
#[async_trait]
pub trait ClustersService: Send + Sync {
    async fn list(&self) -> Result<Vec<Cluster>, ApiError>;

    /// Records the cluster and provisions it. Returns once the provisioner
    /// accepted the request.
    async fn create(&self, request: CreateClusterRequest) -> Result<Cluster, ApiError>;

    async fn get(&self, id: Uuid) -> Result<Option<Cluster>, ApiError>;
}

pub struct SqlClustersService {
    pool: PgPool,
    provisioner: Arc<dyn ClusterProvisioner>,
}

impl SqlClustersService {
    pub fn new(pool: PgPool, provisioner: Arc<dyn ClusterProvisioner>) -> Self {
        Self { pool, provisioner }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn into_cluster(row: ClusterRow) -> Result<Cluster, ApiError> {
    let id = row.id;
    Cluster::try_from(row).map_err(|e| {
        StoreError::InvalidRecord(format!("cluster '{}' has an invalid node count: {}", id, e))
            .into()
    })
}

#[async_trait]
impl ClustersService for SqlClustersService {
    async fn list(&self) -> Result<Vec<Cluster>, ApiError> {
        let rows: Vec<ClusterRow> = sqlx::query_as(
            r#"
            select id, name, master_nodes, infra_nodes, compute_nodes, created_at
            from clusters
            order by created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(into_cluster).collect()
    }

    async fn create(&self, request: CreateClusterRequest) -> Result<Cluster, ApiError> {
        let mut tx = self.pool.begin().await?;

        let row: ClusterRow = sqlx::query_as(
            r#"
            insert into clusters (id, name, master_nodes, infra_nodes, compute_nodes)
            values ($1, $2, $3, $4, $5)
            returning id, name, master_nodes, infra_nodes, compute_nodes, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(i64::from(request.nodes.master))
        .bind(i64::from(request.nodes.infra))
        .bind(i64::from(request.nodes.compute))
        .fetch_one(&mut *tx)
        .await?;
        let cluster = into_cluster(row)?;

        // The row is only committed once the Kubernetes API accepted the
        // resources; dropping the transaction rolls it back. The pooled
        // connection stays checked out until then, so a stalled API server
        // ties up one connection per in-flight create.
        self.provisioner.provision(&cluster).await?;
        tx.commit().await?;

        info!("Cluster '{}' created with id {}", cluster.name, cluster.id);
        Ok(cluster)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Cluster>, ApiError> {
        let row: Option<ClusterRow> = sqlx::query_as(
            r#"
            select id, name, master_nodes, infra_nodes, compute_nodes, created_at
            from clusters
            where id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_cluster).transpose()
    }
}
