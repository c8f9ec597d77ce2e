use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::CustomersState;

/// Serves the OpenAPI document exactly as it was loaded.
pub async fn get_openapi(State(state): State<CustomersState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.openapi.clone(),
    )
}
