//! JWT Token Handler
//! Mission: Issue and verify stateless, expiring bearer tokens

use crate::auth::clock::{Clock, SystemClock};
use crate::auth::models::{Identity, TokenClaims};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Lifetime of every issued token
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is empty")]
    MissingSecret,
    #[error("token expired")]
    Expired,
    #[error("invalid token signature or payload")]
    InvalidSignature,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// JWT Handler for token operations
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtHandler {
    /// Create a handler for the process-wide secret. An empty secret is refused.
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock, with no leeway
        validation.validate_exp = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(TOKEN_TTL_HOURS),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `identity`, valid from now until now + ttl
    pub fn issue(&self, identity: &Identity) -> Result<(String, TokenClaims), TokenError> {
        let iat = self.clock.now().timestamp();
        let claims = TokenClaims {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            iat,
            exp: iat + self.ttl.num_seconds(),
        };

        debug!(
            "Issuing JWT for user {} ({}), expires in {}h",
            claims.email,
            claims.user_id,
            self.ttl.num_hours()
        );

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )
        .map_err(TokenError::Signing)?;

        Ok((token, claims))
    }

    /// Check signature, then expiry. Only `Expired` and `InvalidSignature` come back.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let decoded = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("JWT rejected: {:?}", e.kind());
                TokenError::InvalidSignature
            })?;
        let claims = decoded.claims;

        if self.clock.now().timestamp() >= claims.exp {
            debug!("JWT for user {} expired at {}", claims.user_id, claims.exp);
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
