//! Admin bootstrap
//!
//! Registration only ever creates `user` rows, so the first admin comes from
//! startup configuration.

use crate::auth::{
    models::{NewUser, Role, User},
    password::PasswordHasher,
    user_store::{StoreError, UserStore},
    validation::{is_valid_email, is_valid_password},
};
use anyhow::{bail, Context, Result};
use tracing::{info, warn};

/// Make sure an admin account with `email` exists.
///
/// Returns the new row when one was created, `None` when the email was
/// already taken. An existing row is never modified, whatever its role.
pub async fn ensure_admin(
    store: &dyn UserStore,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> Result<Option<User>> {
    if !is_valid_email(email) {
        bail!("ADMIN_EMAIL is not a valid email address");
    }
    if !is_valid_password(password) {
        bail!("ADMIN_PASSWORD does not meet the password policy");
    }

    if let Some(existing) = store
        .find_user_by_email(email)
        .await
        .context("Failed to check for admin user")?
    {
        if existing.role != Role::Admin {
            warn!(
                "⚠️  Bootstrap admin {} exists with role '{}', leaving it unchanged",
                email,
                existing.role.as_str()
            );
        }
        return Ok(None);
    }

    let password_hash = hasher
        .hash(password)
        .await
        .context("Failed to hash admin password")?;

    let new_admin = NewUser {
        email: email.to_string(),
        password_hash,
        role: Role::Admin,
    };

    match store.insert_user(new_admin).await {
        Ok(admin) => {
            info!("🔐 Admin user created: {} ({})", admin.email, admin.id);
            Ok(Some(admin))
        }
        // Another instance got there between the lookup and the insert
        Err(StoreError::DuplicateEmail) => Ok(None),
        Err(e) => Err(e).context("Failed to insert admin user"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::user_store::SqliteUserStore;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_cost(4)
    }

    #[tokio::test]
    async fn test_creates_admin_once() {
        let store = SqliteUserStore::open_in_memory().unwrap();

        let created = ensure_admin(&store, &hasher(), "root@corp.io", "Sup3rSecret")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.role, Role::Admin);
        assert!(hasher()
            .verify("Sup3rSecret", &created.password_hash)
            .await
            .unwrap());

        let again = ensure_admin(&store, &hasher(), "root@corp.io", "Different1")
            .await
            .unwrap();
        assert!(again.is_none());

        // Second call did not touch the stored hash
        let stored = store.find_user_by_email("root@corp.io").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, created.password_hash);
    }

    #[tokio::test]
    async fn test_existing_user_keeps_role() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        store
            .insert_user(NewUser {
                email: "me@corp.io".to_string(),
                password_hash: "h".to_string(),
                role: Role::User,
            })
            .await
            .unwrap();

        let outcome = ensure_admin(&store, &hasher(), "me@corp.io", "Sup3rSecret")
            .await
            .unwrap();
        assert!(outcome.is_none());

        let stored = store.find_user_by_email("me@corp.io").await.unwrap().unwrap();
        assert_eq!(stored.role, Role::User);
    }

    #[tokio::test]
    async fn test_invalid_credentials_are_fatal() {
        let store = SqliteUserStore::open_in_memory().unwrap();

        assert!(ensure_admin(&store, &hasher(), "not-an-email", "Sup3rSecret")
            .await
            .is_err());
        assert!(ensure_admin(&store, &hasher(), "root@corp.io", "short")
            .await
            .is_err());
        assert!(store
            .find_user_by_email("root@corp.io")
            .await
            .unwrap()
            .is_none());
    }
}
