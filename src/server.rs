//! Router construction and the HTTP(S) listener shared by both services.

use anyhow::{anyhow, Context, Result};
use axum::{middleware::from_fn_with_state, routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    auth::AuthService,
    config::TlsConfig,
    handlers::{cluster_handler, customer_handler, health_handler, openapi_handler},
    middleware::auth_middleware,
    ClustersState, CustomersState,
};

pub const CLUSTERS_API_PREFIX: &str = "/api/clusters_mgmt/v1";
pub const CUSTOMERS_API_PREFIX: &str = "/api/customers_mgmt/v1";

pub fn clusters_router(state: ClustersState) -> Router {
    let api = Router::new()
        .route(
            "/clusters",
            get(cluster_handler::list_clusters).post(cluster_handler::create_cluster),
        )
        .route("/clusters/:uuid", get(cluster_handler::get_cluster));

    Router::new()
        .route("/health", get(|| health_handler::health_check("clusters-service")))
        .nest(CLUSTERS_API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Builds the customers router. With `auth` set, every customer route
/// requires a valid bearer token; `/openapi` and `/health` stay public.
pub fn customers_router(state: CustomersState, auth: Option<AuthService>) -> Router {
    let mut customers = Router::new()
        .route(
            "/customers",
            get(customer_handler::get_customers_list).post(customer_handler::add_customer),
        )
        .route("/customers/:id", get(customer_handler::get_customer_by_id));

    if let Some(auth) = auth {
        customers = customers.route_layer(from_fn_with_state(auth, auth_middleware));
    }

    let api = customers.route("/openapi", get(openapi_handler::get_openapi));

    Router::new()
        .route("/health", get(|| health_handler::health_check("customers-service")))
        .nest(CUSTOMERS_API_PREFIX, api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

/// Serves `app` until SIGINT or SIGTERM, over TLS when `tls` is set.
pub async fn serve(app: Router, address: &str, tls: Option<&TlsConfig>) -> Result<()> {
    match tls {
        None => {
            let listener = tokio::net::TcpListener::bind(address)
                .await
                .with_context(|| format!("failed to bind to {}", address))?;
            info!("Server listening on http://{}", listener.local_addr()?);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Some(tls) => {
            // reqwest and kube also link rustls; pick the provider explicitly
            let _ = rustls::crypto::ring::default_provider().install_default();

            let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .with_context(|| {
                    format!(
                        "can't load TLS certificate '{}' and key '{}'",
                        tls.cert_path.display(),
                        tls.key_path.display()
                    )
                })?;
            let addr = resolve_address(address).await?;

            let handle = axum_server::Handle::new();
            tokio::spawn({
                let handle = handle.clone();
                async move {
                    shutdown_signal().await;
                    handle.graceful_shutdown(None);
                }
            });

            info!("Server listening on https://{}", addr);
            axum_server::bind_rustls(addr, rustls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn resolve_address(address: &str) -> Result<SocketAddr> {
    tokio::net::lookup_host(address)
        .await
        .with_context(|| format!("can't resolve {}", address))?
        .next()
        .ok_or_else(|| anyhow!("no address found for {}", address))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
