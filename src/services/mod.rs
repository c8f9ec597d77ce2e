pub mod clusters_service;
pub mod customers_service;
pub mod demo_customers_service;

pub use clusters_service::{ClustersService, SqlClustersService};
pub use customers_service::{CustomersService, SqlCustomersService};
pub use demo_customers_service::DemoCustomersService;
