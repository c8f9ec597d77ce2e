use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Node counts requested for each machine set of a cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNodes {
    pub master: u32,
    pub infra: u32,
    pub compute: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: Uuid,
    pub name: String,
    pub nodes: ClusterNodes,
    pub created_at: DateTime<Utc>,
}

impl Cluster {
    /// Name used for the Kubernetes objects backing this cluster.
    pub fn resource_name(&self) -> String {
        self.name.to_lowercase()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClusterRequest {
    pub name: String,
    pub nodes: ClusterNodes,
}

/// Row shape of the `clusters` table.
#[derive(Debug, FromRow)]
pub struct ClusterRow {
    pub id: Uuid,
    pub name: String,
    pub master_nodes: i64,
    pub infra_nodes: i64,
    pub compute_nodes: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ClusterRow> for Cluster {
    type Error = std::num::TryFromIntError;

    fn try_from(row: ClusterRow) -> Result<Self, Self::Error> {
        Ok(Cluster {
            id: row.id,
            name: row.name,
            nodes: ClusterNodes {
                master: u32::try_from(row.master_nodes)?,
                infra: u32::try_from(row.infra_nodes)?,
                compute: u32::try_from(row.compute_nodes)?,
            },
            created_at: row.created_at,
        })
    }
}
