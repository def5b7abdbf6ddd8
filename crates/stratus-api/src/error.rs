use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use stratus_core::CoreError;
use stratus_types::api::MessageResponse;

/// Error envelope for every handler: a status code plus `{ "message": ... }`.
///
/// Dependency failures are logged with their full chain and leave the
/// process as a bare 500; clients never see backend details.
#[derive(Debug)]
pub enum ApiError {
    Core(CoreError),
    BadRequest(String),
    PayloadTooLarge,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Core(CoreError::Dependency(inner)) => {
                error!("dependency failure: {inner:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            ApiError::Core(err) => {
                let status = match &err {
                    CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    CoreError::Forbidden => StatusCode::FORBIDDEN,
                    CoreError::Conflict(_) => StatusCode::CONFLICT,
                    CoreError::InvalidToken => StatusCode::BAD_REQUEST,
                    CoreError::Unauthorized => StatusCode::UNAUTHORIZED,
                    CoreError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "file exceeds the upload size limit".to_string(),
            ),
        };

        (status, Json(MessageResponse { message })).into_response()
    }
}
