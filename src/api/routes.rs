use axum::{
    middleware,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::auth::{api as auth_api, require_admin, require_auth, AuthState};
use crate::middleware::request_logging;

/// Create the API router
pub fn create_router(state: AuthState) -> Router {
    let jwt_handler = state.jwt_handler.clone();

    // Public routes
    let public_routes = Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/register", post(auth_api::register))
        .route("/login", post(auth_api::login));

    let protected_routes = Router::new()
        .route("/profile", get(auth_api::get_profile))
        .route_layer(middleware::from_fn_with_state(
            jwt_handler.clone(),
            require_auth,
        ));

    // Last route_layer runs first: authenticate, then check the role
    let admin_routes = Router::new()
        .route("/admin/users/:id", delete(auth_api::delete_user))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(jwt_handler, require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

// ===== Route Handlers =====

/// Public landing route listing the endpoints
async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the API! Public route accessible to everyone.",
        "endpoints": {
            "register": "POST /register",
            "login": "POST /login",
            "profile": "GET /profile (requires authentication)",
            "deleteUser": "DELETE /admin/users/:id (requires admin role)"
        }
    }))
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}
