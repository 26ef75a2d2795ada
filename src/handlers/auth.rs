use axum::{
    extract::{Extension, Json, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use validator::Validate;

use crate::{
    auth::AuthUser,
    entities::user::UserRole,
    errors::ApiError,
    handlers::common::{created_response, success_response, validate_input},
    AppState,
};

/// Routes open without a token.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/login", post(login))
}

/// Routes requiring an authenticated caller.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
struct LoginRequest {
    #[validate(email(message = "Email must be a valid address"))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Debug, Deserialize, Validate)]
struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    name: String,
    #[validate(email(message = "Email must be a valid address"))]
    email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
    /// Defaults to the ordinary user role
    role: Option<String>,
}

/// Exchange credentials for a bearer token
async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let token = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| match e {
            // Unknown email and wrong password answer identically
            crate::auth::AuthError::InvalidCredentials | crate::auth::AuthError::UserNotFound => {
                ApiError::Unauthorized
            }
            other => ApiError::ServiceError(crate::errors::ServiceError::InternalError(
                other.to_string(),
            )),
        })?;

    Ok(success_response(token))
}

/// Create an account; restricted to managers
async fn register(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    if !auth_user.is_manager() {
        return Err(ApiError::ServiceError(crate::errors::ServiceError::Forbidden(
            "Only managers may register accounts".to_string(),
        )));
    }
    validate_input(&payload)?;

    let role = match payload.role.as_deref() {
        Some(raw) => UserRole::from_str(raw)
            .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))?,
        None => UserRole::User,
    };

    let user = state
        .auth_service
        .register(payload.name, payload.email, &payload.password, role)
        .await
        .map_err(|e| match e {
            crate::auth::AuthError::EmailTaken => {
                ApiError::ServiceError(crate::errors::ServiceError::Conflict(e.to_string()))
            }
            other => ApiError::ServiceError(crate::errors::ServiceError::InternalError(
                other.to_string(),
            )),
        })?;

    Ok(created_response(user))
}

/// The identity resolved from the presented token
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let user = state
        .auth_service
        .get_user(auth_user.user_id)
        .await
        .map_err(|e| ApiError::NotFound(e.to_string()))?;
    Ok(success_response(user))
}
