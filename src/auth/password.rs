//! Password Hashing
//! Mission: Salted bcrypt digests, computed off the async executor

use thiserror::Error;
use tracing::debug;

/// Work factor for new digests
pub const BCRYPT_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum HashingError {
    #[error("bcrypt failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("hashing task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// bcrypt hasher. Each digest carries its own random salt and cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self { cost: BCRYPT_COST }
    }

    /// Hasher with a custom work factor (tests use the bcrypt minimum)
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password. Two calls never return the same digest.
    pub async fn hash(&self, plaintext: &str) -> Result<String, HashingError> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;

        let digest = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost)).await??;
        Ok(digest)
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// A malformed digest is a mismatch, not an error. The only error is the
    /// blocking task itself failing.
    pub async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, HashingError> {
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();

        let matched = tokio::task::spawn_blocking(move || {
            match bcrypt::verify(plaintext, &digest) {
                Ok(matched) => matched,
                Err(e) => {
                    debug!("Stored digest could not be checked: {}", e);
                    false
                }
            }
        })
        .await?;

        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        // bcrypt's minimum cost
        PasswordHasher::with_cost(4)
    }

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hasher = fast_hasher();
        let digest = hasher.hash("Abcdef12").await.unwrap();

        assert!(hasher.verify("Abcdef12", &digest).await.unwrap());
        assert!(!hasher.verify("Abcdef13", &digest).await.unwrap());
        assert!(!hasher.verify("", &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_password_gets_fresh_salt() {
        let hasher = fast_hasher();
        let first = hasher.hash("Abcdef12").await.unwrap();
        let second = hasher.hash("Abcdef12").await.unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("Abcdef12", &first).await.unwrap());
        assert!(hasher.verify("Abcdef12", &second).await.unwrap());
    }

    #[tokio::test]
    async fn test_digest_never_contains_plaintext() {
        let hasher = fast_hasher();
        let digest = hasher.hash("Abcdef12").await.unwrap();
        assert!(!digest.contains("Abcdef12"));
    }

    #[tokio::test]
    async fn test_malformed_digest_is_mismatch() {
        let hasher = fast_hasher();

        assert!(!hasher.verify("Abcdef12", "").await.unwrap());
        assert!(!hasher.verify("Abcdef12", "not-a-bcrypt-digest").await.unwrap());
        assert!(!hasher.verify("Abcdef12", "$2b$10$short").await.unwrap());
    }

    #[tokio::test]
    async fn test_default_cost_is_encoded_in_digest() {
        let hasher = PasswordHasher::new();
        assert_eq!(hasher.cost(), BCRYPT_COST);

        let digest = hasher.hash("Abcdef12").await.unwrap();
        assert!(digest.starts_with("$2b$10$"));
    }
}
