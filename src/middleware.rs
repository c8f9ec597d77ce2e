use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
};
use tracing::{debug, error, warn};

use crate::auth::AuthService;
use crate::models::ErrorResponse;

/// Rejects requests without a valid bearer token.
///
/// On success the token's [`Claims`](crate::auth::Claims) are added to the
/// request extensions.
pub async fn auth_middleware(
    State(auth_service): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let token = match auth_service.extract_token_from_headers(request.headers()) {
        Ok(token) => token,
        Err(e) => {
            warn!("Failed to extract token: {}", e);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "Unauthorized",
                    Some("Missing or invalid authorization header".to_string()),
                )),
            ));
        }
    };

    match auth_service.validate_token(&token).await {
        Ok(claims) => {
            debug!("Request authenticated (sub: {:?})", claims.sub);
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(e) if e.is_client_error() => {
            warn!("Token validation failed: {}", e);
            Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Unauthorized", Some("Invalid token".to_string()))),
            ))
        }
        Err(e) => {
            error!("Token validation error: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Internal Server Error",
                    Some("Token validation failed".to_string()),
                )),
            ))
        }
    }
}
