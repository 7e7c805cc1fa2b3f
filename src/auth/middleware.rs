//! Authentication Middleware
//! Mission: Gate protected endpoints behind a valid token, and admin endpoints behind the admin role
//!
//! A request moves through at most three steps, each of which can end it:
//!
//! 1. no usable `Authorization` header  -> 401 `Access token required`
//! 2. token fails verification          -> 403 `Invalid or expired token`
//! 3. (admin routes) role is not admin  -> 403 `Admin access required`
//!
//! On success the verified [`AuthContext`] rides along in the request extensions.

use crate::auth::{
    jwt::{JwtHandler, TokenError},
    models::AuthContext,
};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Auth error types
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Access token required")]
    MissingToken,
    /// Expired and forged tokens look the same to the client
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Admin access required")]
    AdminRequired,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken | AuthError::AdminRequired => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The header is split on whitespace and the second piece taken; the scheme
/// word itself is not inspected.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .split_whitespace()
        .nth(1)
}

/// Steps 1 and 2: find the token and verify it
pub fn authenticate(jwt: &JwtHandler, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
    let token = extract_bearer_token(headers).ok_or(AuthError::MissingToken)?;

    match jwt.verify(token) {
        Ok(claims) => Ok(AuthContext::from(claims)),
        Err(TokenError::Expired) => {
            debug!("Rejected expired token");
            Err(AuthError::InvalidToken)
        }
        Err(e) => {
            debug!("Rejected token: {}", e);
            Err(AuthError::InvalidToken)
        }
    }
}

/// Step 3: role gate
pub fn authorize_admin(ctx: &AuthContext) -> Result<(), AuthError> {
    if ctx.is_admin() {
        Ok(())
    } else {
        warn!("Non-admin user {} denied admin route", ctx.user_id);
        Err(AuthError::AdminRequired)
    }
}

/// Auth middleware that validates JWT tokens
pub async fn require_auth(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let ctx = authenticate(&jwt_handler, req.headers())?;

    // Add the context to request extensions so handlers can access it
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// Admin gate. Must sit inside [`require_auth`]; without a context it answers 401.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AuthError> {
    let ctx = extract_context(&req).ok_or(AuthError::MissingToken)?;
    authorize_admin(ctx)?;

    Ok(next.run(req).await)
}

/// Read the context set by [`require_auth`]
pub fn extract_context(req: &Request) -> Option<&AuthContext> {
    req.extensions().get::<AuthContext>()
}
