use axum::response::Json;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::HealthResponse;

pub async fn health_check(service: &'static str) -> Json<HealthResponse> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: service.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp,
    })
}
