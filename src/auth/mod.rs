//! Authentication Module
//! Mission: Register users, hash their passwords, issue JWTs and gate routes by role

pub mod api;
pub mod bootstrap;
pub mod clock;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod user_store;
pub mod validation;

pub use api::AuthState;
pub use jwt::JwtHandler;
pub use middleware::{require_admin, require_auth};
pub use password::PasswordHasher;
pub use user_store::UserStore;
