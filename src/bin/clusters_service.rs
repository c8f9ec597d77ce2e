use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use dedicated_portal::{
    config::{ClustersCli, ClustersCommand, ClustersConfig, PostgresEnv},
    db,
    provisioner::{k8s::kube_client, ClusterOperatorProvisioner, KubeClusterOperatorClient},
    server::{clusters_router, serve},
    services::SqlClustersService,
    telemetry::init_tracing,
    ClustersState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = ClustersCli::parse();
    let ClustersCommand::Serve(args) = cli.command;

    let config = ClustersConfig::load(args, &PostgresEnv::load())?;

    let client = kube_client(config.kubeconfig.as_deref(), config.master.as_deref())
        .await
        .context("Error loading Kubernetes client configuration")?;
    info!("Connected to Kubernetes API server");

    let pool = db::connect(&config.database_url)
        .await
        .context("Can't connect to the clusters database")?;
    db::ensure_schema(&pool, &db::clusters_migrator())
        .await
        .context("Can't migrate sql schema")?;

    let provisioner = ClusterOperatorProvisioner::new(
        Arc::new(KubeClusterOperatorClient::new(client)),
        config.provisioner.clone(),
    );
    let service = Arc::new(SqlClustersService::new(pool, Arc::new(provisioner)));
    info!("Created cluster service");

    let app = clusters_router(ClustersState {
        clusters: service.clone(),
    });

    let result = serve(app, &config.server_address, None).await;

    service.close().await;
    result
}
