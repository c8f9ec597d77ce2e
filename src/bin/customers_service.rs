use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use dedicated_portal::{
    config::{CustomersBackend, CustomersCli, CustomersCommand, CustomersConfig},
    db,
    server::{customers_router, serve},
    services::{CustomersService, DemoCustomersService, SqlCustomersService},
    telemetry::init_tracing,
    AuthService, CustomersState, CUSTOMERS_OPENAPI,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = CustomersCli::parse();
    let CustomersCommand::Serve(args) = cli.command;

    // Every flag is checked before anything is started
    let config = CustomersConfig::try_from(args)?;

    let customers: Arc<dyn CustomersService> = match &config.backend {
        CustomersBackend::Sql { db_url } => {
            let pool = db::connect(db_url)
                .await
                .context("Can't connect to sql service")?;
            db::ensure_schema(&pool, &db::customers_migrator())
                .await
                .context("Can't migrate sql schema")?;
            info!("Connected to the customers database");
            Arc::new(SqlCustomersService::new(pool))
        }
        CustomersBackend::Demo => {
            info!("Running in demo mode: no token needed, serving demo data");
            Arc::new(DemoCustomersService::new())
        }
    };

    let auth = match &config.jwk_certs_url {
        Some(url) => Some(AuthService::new(url).with_context(|| {
            format!("Can't create authentication route using URL '{}'", url)
        })?),
        None => None,
    };

    let state = CustomersState::new(customers.clone(), CUSTOMERS_OPENAPI);
    let app = customers_router(state, auth);

    info!("Starting customers-service server at {}", config.server_address);
    let result = serve(app, &config.server_address, config.tls.as_ref()).await;

    customers.close().await;
    result
}
