//! Authentication API Endpoints
//! Mission: Register, login, profile and admin user deletion over the auth core

use crate::auth::{
    jwt::{JwtHandler, TokenError},
    models::{
        AuthContext, CredentialsRequest, Identity, LoginResponse, MessageResponse, NewUser,
        ProfileResponse, RegisterResponse, Role, UserResponse,
    },
    password::{HashingError, PasswordHasher},
    user_store::{StoreError, UserStore},
    validation::{is_valid_email, is_valid_password},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

const MSG_MISSING_FIELDS: &str = "Email and password are required";
const MSG_INVALID_BODY: &str = "Invalid request body";
const MSG_INVALID_EMAIL: &str = "Invalid email format";
const MSG_WEAK_PASSWORD: &str = "Password must be at least 8 characters long and contain at least one uppercase letter, one lowercase letter, and one number";

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<dyn UserStore>,
    pub jwt_handler: Arc<JwtHandler>,
    pub hasher: PasswordHasher,
}

impl AuthState {
    pub fn new(user_store: Arc<dyn UserStore>, jwt_handler: Arc<JwtHandler>) -> Self {
        Self {
            user_store,
            jwt_handler,
            hasher: PasswordHasher::new(),
        }
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }
}

/// Auth API errors
#[derive(Debug, Error)]
pub enum AuthApiError {
    /// Missing or malformed input, reported before any hashing or store call
    #[error("{0}")]
    Validation(&'static str),
    #[error("Email already exists")]
    DuplicateEmail,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("store failure: {0}")]
    Store(StoreError),
    #[error("hashing failure: {0}")]
    Hashing(#[from] HashingError),
    #[error("token failure: {0}")]
    Token(#[from] TokenError),
}

impl From<StoreError> for AuthApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthApiError::DuplicateEmail,
            other => AuthApiError::Store(other),
        }
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthApiError::Validation(msg) => (StatusCode::BAD_REQUEST, *msg),
            AuthApiError::DuplicateEmail => (StatusCode::BAD_REQUEST, "Email already exists"),
            AuthApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AuthApiError::Store(_) | AuthApiError::Hashing(_) | AuthApiError::Token(_) => {
                error!("Request failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Pull non-empty email and password out of the body.
///
/// A body sent without a JSON content type counts as empty.
fn read_credentials(
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(String, String), AuthApiError> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => CredentialsRequest::default(),
        Err(rejection) => {
            debug!("Unreadable credentials body: {}", rejection);
            return Err(AuthApiError::Validation(MSG_INVALID_BODY));
        }
    };

    match (req.email, req.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            Ok((email, password))
        }
        _ => Err(AuthApiError::Validation(MSG_MISSING_FIELDS)),
    }
}

/// Register endpoint - POST /register
pub async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthApiError> {
    let (email, password) = read_credentials(payload)?;

    if !is_valid_email(&email) {
        return Err(AuthApiError::Validation(MSG_INVALID_EMAIL));
    }
    if !is_valid_password(&password) {
        return Err(AuthApiError::Validation(MSG_WEAK_PASSWORD));
    }

    let password_hash = state.hasher.hash(&password).await?;

    let user = state
        .user_store
        .insert_user(NewUser {
            email,
            password_hash,
            role: Role::User,
        })
        .await
        .map_err(|e| {
            if matches!(e, StoreError::DuplicateEmail) {
                info!("Registration refused, email already taken");
            }
            AuthApiError::from(e)
        })?;

    info!("✅ Registered user: {} ({})", user.email, user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: UserResponse::from_user(&user),
        }),
    ))
}

/// Login endpoint - POST /login
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let (email, password) = read_credentials(payload)?;

    if !is_valid_email(&email) {
        return Err(AuthApiError::Validation(MSG_INVALID_EMAIL));
    }

    info!("🔐 Login attempt: {}", email);

    let Some(user) = state.user_store.find_user_by_email(&email).await? else {
        warn!("❌ Failed login attempt (unknown email): {}", email);
        return Err(AuthApiError::InvalidCredentials);
    };

    if !state.hasher.verify(&password, &user.password_hash).await? {
        warn!("❌ Failed login attempt (bad password): {}", email);
        return Err(AuthApiError::InvalidCredentials);
    }

    let (token, _claims) = state.jwt_handler.issue(&Identity::from(&user))?;

    info!(
        "✅ Login successful: {} ({})",
        user.email,
        user.role.as_str()
    );

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: UserResponse::from_user(&user),
    }))
}

/// Current user profile - GET /profile (authenticated)
pub async fn get_profile(
    State(state): State<AuthState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<ProfileResponse>, AuthApiError> {
    let user = state
        .user_store
        .find_user_by_id(&ctx.user_id)
        .await?
        .ok_or_else(|| {
            warn!("Token for user {} outlived the account", ctx.user_id);
            AuthApiError::UserNotFound
        })?;

    Ok(Json(ProfileResponse {
        message: "Profile retrieved successfully".to_string(),
        user: UserResponse::from_user(&user),
    }))
}

/// Delete user - DELETE /admin/users/:id (admin only)
pub async fn delete_user(
    State(state): State<AuthState>,
    Extension(ctx): Extension<AuthContext>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, AuthApiError> {
    let removed = state.user_store.delete_user(&user_id).await?;

    if removed == 0 {
        info!(
            "Admin {} deleted user {}, which did not exist",
            ctx.user_id, user_id
        );
    } else {
        info!("🗑️  User {} deleted by admin {}", user_id, ctx.user_id);
    }

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
