/*!
 * Authentication and authorization.
 *
 * JWT bearer tokens carry the user's id, email and role. Handlers read
 * the [`AuthUser`] extension inserted by [`auth_middleware`]; board
 * permissions go through the single [`authorize`] capability check.
 */

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::board;
use crate::entities::user::{self, UserRole};

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated user extracted from a validated token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_manager(&self) -> bool {
        self.role.is_manager()
    }

    pub fn from_user(user: &user::Model) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

/// Board-scoped actions gated by [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardAction {
    View,
    Edit,
    ManageColumns,
    ManageCards,
    MoveCards,
    ManageRules,
    Delete,
}

/// Single capability check for every board-scoped operation.
///
/// Admins and staff may do anything; the board creator may do anything
/// on their own board; everyone else is limited to viewing and moving
/// cards on boards they can see.
pub fn authorize(actor: &AuthUser, action: BoardAction, board: &board::Model) -> bool {
    if actor.is_manager() || board.created_by == actor.user_id {
        return true;
    }
    matches!(action, BoardAction::View | BoardAction::MoveCards)
}

/// Authentication service handling password hashing and token issuance.
#[derive(Clone)]
pub struct AuthService {
    db: Arc<DatabaseConnection>,
    jwt_secret: String,
    /// Token lifetime in seconds.
    jwt_expiration: i64,
}

impl AuthService {
    pub fn new(db: Arc<DatabaseConnection>, jwt_secret: String, jwt_expiration: i64) -> Self {
        Self {
            db,
            jwt_secret,
            jwt_expiration,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Generate a JWT for a user.
    pub fn generate_token(&self, user: &user::Model) -> Result<TokenResponse, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.to_string(),
            iat: now,
            exp: now + self.jwt_expiration,
        };
        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_expiration,
        })
    }

    /// Validate a JWT and extract the claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Verify credentials and issue a token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, AuthError> {
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let account = match found {
            Some(u) if u.is_active => u,
            // Same error either way so login probing cannot enumerate accounts
            _ => return Err(AuthError::InvalidCredentials),
        };

        if !self.verify_password(password, &account.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.generate_token(&account)
    }

    /// Creates an account with a hashed password. Email must be unused.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: String,
        email: String,
        password: &str,
        role: UserRole,
    ) -> Result<user::Model, AuthError> {
        let taken = user::Entity::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        if taken.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            email: Set(email),
            password_hash: Set(self.hash_password(password)?),
            role: Set(role),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        model
            .insert(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))
    }

    /// Loads the full account behind an authenticated identity.
    pub async fn get_user(&self, id: Uuid) -> Result<user::Model, AuthError> {
        user::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::UserNotFound)
    }

    /// Turn a set of validated claims into an [`AuthUser`].
    pub fn auth_user_from_claims(&self, claims: &Claims) -> Result<AuthUser, AuthError> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let role = UserRole::from_str(&claims.role).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            user_id,
            email: claims.email.clone(),
            role,
        })
    }
}

/// Token response returned by login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Email is already registered")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message): (StatusCode, &str, String) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required".to_string(),
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired".to_string(),
            ),
            Self::EmailTaken => (
                StatusCode::CONFLICT,
                "AUTH_EMAIL_TAKEN",
                "Email is already registered".to_string(),
            ),
            Self::UserNotFound => (
                StatusCode::NOT_FOUND,
                "AUTH_USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Middleware that validates the bearer token and inserts [`AuthUser`]
/// into the request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    match extract_auth_from_headers(request.headers(), &auth_service) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let auth_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingAuth)?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingAuth)?
        .trim();

    let claims = auth_service.validate_token(token)?;
    auth_service.auth_user_from_claims(&claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user(role: UserRole) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: String::new(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn test_board(created_by: Uuid) -> board::Model {
        board::Model {
            id: Uuid::new_v4(),
            name: "Pipeline".to_string(),
            description: None,
            customer_id: None,
            created_by,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(DatabaseConnection::Disconnected),
            "a-test-secret-that-is-long-enough-0123".to_string(),
            3600,
        )
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        let svc = service();
        let u = test_user(UserRole::Staff);
        let token = svc.generate_token(&u).unwrap();
        let claims = svc.validate_token(&token.access_token).unwrap();
        let auth = svc.auth_user_from_claims(&claims).unwrap();
        assert_eq!(auth.user_id, u.id);
        assert_eq!(auth.role, UserRole::Staff);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let svc = service();
        let u = test_user(UserRole::User);
        let mut token = svc.generate_token(&u).unwrap().access_token;
        token.push('x');
        assert!(svc.validate_token(&token).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let svc = service();
        let hash = svc.hash_password("hunter22").unwrap();
        assert!(svc.verify_password("hunter22", &hash).unwrap());
        assert!(!svc.verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn creator_may_manage_own_board() {
        let u = test_user(UserRole::User);
        let auth = AuthUser::from_user(&u);
        let b = test_board(u.id);
        assert!(authorize(&auth, BoardAction::ManageColumns, &b));
        assert!(authorize(&auth, BoardAction::Delete, &b));
    }

    #[test]
    fn plain_user_limited_on_foreign_board() {
        let u = test_user(UserRole::User);
        let auth = AuthUser::from_user(&u);
        let b = test_board(Uuid::new_v4());
        assert!(authorize(&auth, BoardAction::View, &b));
        assert!(authorize(&auth, BoardAction::MoveCards, &b));
        assert!(!authorize(&auth, BoardAction::ManageColumns, &b));
        assert!(!authorize(&auth, BoardAction::ManageRules, &b));
        assert!(!authorize(&auth, BoardAction::Delete, &b));
    }

    #[test]
    fn staff_may_manage_any_board() {
        let u = test_user(UserRole::Staff);
        let auth = AuthUser::from_user(&u);
        let b = test_board(Uuid::new_v4());
        assert!(authorize(&auth, BoardAction::ManageRules, &b));
    }
}
