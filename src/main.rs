//! CredGate - Credential Service
//! Mission: Register users, verify passwords, hand out JWTs and guard routes by role

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use credgate_backend::{
    auth::{
        bootstrap::ensure_admin,
        user_store::{SqliteUserStore, SupabaseUserStore},
        AuthState, JwtHandler, PasswordHasher, UserStore,
    },
    create_router, Config, StoreBackend,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let config = Config::parse();

    info!("🚀 CredGate starting");

    // Fail fast before anything binds
    let jwt_handler = Arc::new(JwtHandler::new(config.jwt_secret()?).context("Invalid JWT secret")?);
    let user_store = build_user_store(&config)?;
    let hasher = PasswordHasher::new();

    if let Some((email, password)) = config.admin_credentials() {
        ensure_admin(user_store.as_ref(), &hasher, email, password)
            .await
            .context("Admin bootstrap failed")?;
    } else if config.admin_email.is_some() || config.admin_password.is_some() {
        warn!("⚠️  ADMIN_EMAIL and ADMIN_PASSWORD must both be set; skipping admin bootstrap");
    }

    let state = AuthState::new(user_store, jwt_handler).with_hasher(hasher);
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn build_user_store(config: &Config) -> Result<Arc<dyn UserStore>> {
    match config.store_backend {
        StoreBackend::Supabase => {
            let settings = config.supabase_settings()?;
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .context("Failed to build HTTP client")?;
            info!("🗄️  Using Supabase user store at {}", settings.url);
            Ok(Arc::new(SupabaseUserStore::new(
                http,
                &settings.url,
                &settings.anon_key,
            )))
        }
        StoreBackend::Sqlite => {
            let store = SqliteUserStore::open(&config.sqlite_path)
                .with_context(|| format!("Failed to open {}", config.sqlite_path))?;
            Ok(Arc::new(store))
        }
    }
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "credgate_backend=debug,credgate=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate directory (when run with --manifest-path from elsewhere)
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
