//! Error types surfaced by the HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;
use crate::provisioner::ProvisionError;

/// Errors raised while loading or reading from the services' stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored record is invalid: {0}")]
    InvalidRecord(String),
}

/// Per-request error, rendered as a JSON error body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provisioning(#[from] ProvisionError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Provisioning(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Store(StoreError::Database(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::NotFound(_) => ErrorResponse::new("Not Found", Some(self.to_string())),
            ApiError::Store(e) => {
                error!("Store error: {}", e);
                ErrorResponse::new("Internal Server Error", None)
            }
            ApiError::Provisioning(e) => {
                error!("Provisioning error: {}", e);
                ErrorResponse::new("Provisioning Failed", Some(e.to_string()))
            }
        };

        (status, Json(body)).into_response()
    }
}
