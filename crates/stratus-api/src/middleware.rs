use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{DecodingKey, Validation, decode};

use stratus_core::CoreError;
use stratus_types::api::Claims;

use crate::AppState;
use crate::error::ApiError;

/// Validates the bearer session token and stashes its claims in the request
/// extensions for the handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(ApiError::Core(CoreError::Unauthorized))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Core(CoreError::Unauthorized))?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}
