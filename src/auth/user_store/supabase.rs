//! Supabase user store
//!
//! Talks to the project's PostgREST endpoint (`/rest/v1/users`) with the
//! project key. The table is `users(id, email UNIQUE, password_hash, role, created_at)`;
//! the database fills `id`, `created_at` and the `role` default.

use crate::auth::models::{NewUser, User};
use crate::auth::user_store::{StoreError, UserStore};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

const USER_COLUMNS: &str = "id,email,password_hash,role,created_at";

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Error body PostgREST returns on non-2xx responses
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

pub struct SupabaseUserStore {
    http: reqwest::Client,
    users_url: String,
    api_key: String,
}

impl SupabaseUserStore {
    pub fn new(http: reqwest::Client, project_url: &str, api_key: &str) -> Self {
        Self {
            http,
            users_url: format!("{}/rest/v1/users", project_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.http
            .request(method, &self.users_url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch_one(&self, column: &str, value: &str) -> Result<Option<User>, StoreError> {
        let filter = format!("eq.{value}");
        let resp = self
            .request(Method::GET)
            .query(&[("select", USER_COLUMNS), (column, filter.as_str())])
            .send()
            .await?;

        let rows: Vec<User> = check(resp).await?.json().await?;
        Ok(rows.into_iter().next())
    }
}

/// Pass 2xx responses through; turn everything else into a `StoreError`
async fn check(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let err: PostgrestError = serde_json::from_str(&body).unwrap_or_default();
    debug!("Supabase responded {}: {}", status, body);

    if err.code.as_deref() == Some(UNIQUE_VIOLATION) {
        return Err(StoreError::DuplicateEmail);
    }

    Err(StoreError::Backend {
        status: status.as_u16(),
        message: err.message.unwrap_or(body),
    })
}

#[async_trait]
impl UserStore for SupabaseUserStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let resp = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .query(&[("select", USER_COLUMNS)])
            .json(&[&user])
            .send()
            .await?;

        let rows: Vec<User> = check(resp).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one("email", email).await
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one("id", id).await
    }

    async fn delete_user(&self, id: &str) -> Result<u64, StoreError> {
        let filter = format!("eq.{id}");
        let resp = self
            .request(Method::DELETE)
            .header("Prefer", "return=representation")
            .query(&[("id", filter.as_str()), ("select", "id")])
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = check(resp).await?.json().await?;
        Ok(rows.len() as u64)
    }
}
