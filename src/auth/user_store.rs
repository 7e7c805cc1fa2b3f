//! User Storage
//! Mission: The only door to persistence. Insert, look up and delete user rows.

use crate::auth::models::{NewUser, User};
use async_trait::async_trait;
use thiserror::Error;

pub mod sqlite;
pub mod supabase;

pub use sqlite::SqliteUserStore;
pub use supabase::SupabaseUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's unique constraint on `email` fired
    #[error("email already exists")]
    DuplicateEmail,
    #[error("store responded {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected store response: {0}")]
    Decode(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Persistence contract for user rows. Email uniqueness is the store's job.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a row; the store assigns `id` and `created_at`
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Exact, case-sensitive email match
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Returns how many rows were removed (0 when the id is unknown)
    async fn delete_user(&self, id: &str) -> Result<u64, StoreError>;
}
