use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{CreateCustomerRequest, Customer, CustomerList, Pagination};

/// Access to customer records.
///
/// The SQL and demo implementations are interchangeable; one is chosen at
/// startup.
#[async_trait]
pub trait CustomersService: Send + Sync {
    async fn list(&self, pagination: Pagination) -> Result<CustomerList, ApiError>;

    async fn create(&self, request: CreateCustomerRequest) -> Result<Customer, ApiError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Customer>, ApiError>;

    /// Releases the backing resources.
    async fn close(&self);
}

pub struct SqlCustomersService {
    pool: PgPool,
}

impl SqlCustomersService {
    /// Expects the customers schema to be migrated already.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomersService for SqlCustomersService {
    async fn list(&self, pagination: Pagination) -> Result<CustomerList, ApiError> {
        let total: i64 = sqlx::query_scalar("select count(*) from customers")
            .fetch_one(&self.pool)
            .await?;

        let items: Vec<Customer> = sqlx::query_as(
            r#"
            select id, name, owned_clusters
            from customers
            order by id
            limit $1 offset $2
            "#,
        )
        .bind(i64::from(pagination.size))
        .bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(CustomerList {
            page: pagination.page(),
            size: pagination.size,
            total: u64::try_from(total).unwrap_or_default(),
            items,
        })
    }

    async fn create(&self, request: CreateCustomerRequest) -> Result<Customer, ApiError> {
        let customer: Customer = sqlx::query_as(
            r#"
            insert into customers (id, name, owned_clusters)
            values ($1, $2, $3)
            returning id, name, owned_clusters
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&request.name)
        .bind(&request.owned_clusters)
        .fetch_one(&self.pool)
        .await?;

        info!("Customer '{}' created with id {}", customer.name, customer.id);
        Ok(customer)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Customer>, ApiError> {
        let customer: Option<Customer> = sqlx::query_as(
            r#"
            select id, name, owned_clusters
            from customers
            where id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
