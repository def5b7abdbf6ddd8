use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use jsonwebtoken::{EncodingKey, Header, encode};

use stratus_core::CoreError;
use stratus_core::account::NewAccount;
use stratus_types::api::{
    Claims, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    ResetPasswordRequest, SessionResponse, UserProfile,
};
use stratus_types::models::User;

use crate::AppState;
use crate::error::ApiError;

/// Sessions run long; the single-use activation and reset secrets are the
/// short-lived credentials, not the login.
const SESSION_DAYS: i64 = 30;

const MIN_PASSWORD_LEN: usize = 8;

/// POST /auth/register — creates an inactive account and queues the
/// activation mail. Responds as soon as the account exists; delivery is not
/// awaited.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(ApiError::bad_request("first and last name are required"));
    }
    if !req.email.contains('@') {
        return Err(ApiError::bad_request("a valid email is required"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(
            "password must be at least 8 characters",
        ));
    }

    state.accounts.register(NewAccount {
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        password: req.password,
    })?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "account created; check your inbox for the activation link".to_string(),
        }),
    ))
}

/// POST /auth/login — checks credentials and mints a session token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let user = state
        .accounts
        .authenticate(&req.email.trim().to_lowercase(), &req.password)?;

    let token = create_token(&state.jwt_secret, &user)?;
    Ok(Json(SessionResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

/// GET /auth/activate/{secret} — redeems the activation token and signs the
/// fresh account in: the response carries a session token just like login.
/// The second attempt with the same secret sees an already-spent token.
pub async fn activate(
    State(state): State<AppState>,
    Path(secret): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let user = state.accounts.activate(&secret)?;
    let token = create_token(&state.jwt_secret, &user)?;
    Ok(Json(SessionResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

/// GET /auth/profile — the authenticated account.
pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state.accounts.profile(claims.sub)?;
    Ok(Json(UserProfile::from(&user)))
}

/// POST /auth/forgot-password — queues the reset mail. Unknown addresses
/// get a 404: this endpoint does confirm which emails are registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .accounts
        .request_password_reset(&req.email.trim().to_lowercase())?;
    Ok(Json(MessageResponse {
        message: "password reset mail is on its way".to_string(),
    }))
}

/// POST /auth/reset-password — redeems a reset secret and stores the new
/// password.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(
            "password must be at least 8 characters",
        ));
    }

    state.accounts.reset_password(&req.token, &req.password)?;
    Ok(Json(MessageResponse {
        message: "password updated".to_string(),
    }))
}

fn create_token(secret: &str, user: &User) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Core(CoreError::Dependency(e.into())))
}
