// Data structures shared by the clusters and customers services

pub mod cluster;
pub mod customer;
pub mod response;

pub use cluster::*;
pub use customer::*;
pub use response::*;
