//! CredGate Backend Library
//!
//! Exposes the auth core, router and configuration for the binary and tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;

pub use api::create_router;
pub use config::{Config, StoreBackend};
