use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{CreateCustomerRequest, Customer, CustomerList, Pagination};
use crate::services::CustomersService;

/// Serves a fixed set of customers. Nothing is ever written.
pub struct DemoCustomersService {
    customers: Vec<Customer>,
}

impl DemoCustomersService {
    pub fn new() -> Self {
        Self::with_customers(demo_customers())
    }

    /// Demo service over the given records, kept sorted by id.
    pub fn with_customers(mut customers: Vec<Customer>) -> Self {
        customers.sort_by(|a, b| a.id.cmp(&b.id));
        Self { customers }
    }
}

impl Default for DemoCustomersService {
    fn default() -> Self {
        Self::new()
    }
}

fn customer(id: &str, name: &str, owned_clusters: &[&str]) -> Customer {
    Customer {
        id: id.to_string(),
        name: name.to_string(),
        owned_clusters: owned_clusters.iter().map(|c| c.to_string()).collect(),
    }
}

fn demo_customers() -> Vec<Customer> {
    vec![
        customer(
            "1a0f5f3e-6f7b-4c55-9a0e-3c1d2b7e8f01",
            "Acme Corporation",
            &["acme-prod", "acme-staging"],
        ),
        customer(
            "2b7c9d41-0e2a-4f86-8b53-5d6e7f809a12",
            "Globex",
            &["globex-east"],
        ),
        customer("3c8daf52-1f3b-4a97-9c64-6e7f80912b23", "Initech", &[]),
        customer(
            "4d9eb063-204c-4ba8-ad75-7f8091a23c34",
            "Umbrella",
            &["umbrella-lab", "umbrella-dr", "umbrella-edge"],
        ),
        customer(
            "5eafc174-315d-4cb9-be86-8091a2b34d45",
            "Stark Industries",
            &["stark-rnd"],
        ),
    ]
}

#[async_trait]
impl CustomersService for DemoCustomersService {
    async fn list(&self, pagination: Pagination) -> Result<CustomerList, ApiError> {
        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let items = self
            .customers
            .iter()
            .skip(offset)
            .take(pagination.size as usize)
            .cloned()
            .collect();

        Ok(CustomerList {
            page: pagination.page(),
            size: pagination.size,
            total: self.customers.len() as u64,
            items,
        })
    }

    async fn create(&self, request: CreateCustomerRequest) -> Result<Customer, ApiError> {
        Ok(Customer {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            owned_clusters: request.owned_clusters,
        })
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Customer>, ApiError> {
        Ok(self.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn close(&self) {}
}
