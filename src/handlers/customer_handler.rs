use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;

use crate::{
    error::ApiError,
    models::{CreateCustomerRequest, Customer, CustomerList, Pagination},
    CustomersState,
};

/// Lists customers. `page` and `size` must be non-negative integers; any
/// other value is rejected by the query extractor before this runs.
pub async fn get_customers_list(
    State(state): State<CustomersState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<CustomerList>, ApiError> {
    let list = state.customers.list(pagination).await?;
    Ok(Json(list))
}

pub async fn add_customer(
    State(state): State<CustomersState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    info!("Add customer '{}'", request.name);
    let customer = state.customers.create(request).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer_by_id(
    State(state): State<CustomersState>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    state
        .customers
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("customer '{}'", id)))
}
