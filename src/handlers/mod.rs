pub mod cluster_handler;
pub mod customer_handler;
pub mod health_handler;
pub mod openapi_handler;
