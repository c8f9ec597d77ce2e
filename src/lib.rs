// Dedicated portal backends: the clusters service and the customers service

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod provisioner;
pub mod server;
pub mod services;
pub mod telemetry;

use axum::body::Bytes;
use std::sync::Arc;

pub use auth::AuthService;
pub use config::{ClustersConfig, CustomersConfig};
use services::{ClustersService, CustomersService};

/// OpenAPI description of the customers service, embedded at build time.
pub const CUSTOMERS_OPENAPI: &[u8] = include_bytes!("../assets/customers-service.json");

/// Router state of the clusters service.
#[derive(Clone)]
pub struct ClustersState {
    pub clusters: Arc<dyn ClustersService>,
}

/// Router state of the customers service.
#[derive(Clone)]
pub struct CustomersState {
    pub customers: Arc<dyn CustomersService>,
    pub openapi: Bytes,
}

impl CustomersState {
    pub fn new(customers: Arc<dyn CustomersService>, openapi: impl Into<Bytes>) -> Self {
        Self {
            customers,
            openapi: openapi.into(),
        }
    }
}
