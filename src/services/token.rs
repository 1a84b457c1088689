//! Signed session tokens.
//!
//! Tokens are HS256 JWTs carrying the subject user id and email. They are not
//! persisted; every request re-verifies the signature and expiry.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::SecurityConfig;
use crate::domain::UserId;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Malformed, tampered or expired token. Maps to 401.
    #[error("Invalid token")]
    Invalid,

    /// Key or encoding failure on our side. Maps to 500.
    #[error("Token signing error: {0}")]
    Signing(String),
}

/// JWT session claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i32,      // Subject (user ID)
    pub email: String, // User email
    pub iat: i64,      // Issued at
    pub exp: i64,      // Expiration time
}

impl SessionClaims {
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }
}

pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl TokenAuthority {
    #[must_use]
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        let ttl = i64::try_from(ttl_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Build from config, generating an ephemeral secret when none is set.
    #[must_use]
    pub fn from_config(config: &SecurityConfig) -> Self {
        if config.jwt_secret.is_empty() {
            warn!(
                "No JWT secret configured; generated an ephemeral one. Sessions will not survive a restart"
            );
            return Self::new(&generate_secret(), config.token_ttl_seconds);
        }
        Self::new(&config.jwt_secret, config.token_ttl_seconds)
    }

    pub fn issue(&self, user_id: UserId, email: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry overflows".to_string()))?;
        let claims = SessionClaims {
            sub: user_id.value(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(format!("create JWT: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        use jsonwebtoken::errors::ErrorKind;

        let validation = Validation::default();
        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidEcdsaKey
                | ErrorKind::InvalidRsaKey(_)
                | ErrorKind::RsaFailedSigning
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::InvalidKeyFormat
                | ErrorKind::MissingAlgorithm
                | ErrorKind::Crypto(_) => TokenError::Signing(format!("JWT verification: {e}")),
                _ => TokenError::Invalid,
            })
    }
}

/// Random 64 character hex secret
#[must_use]
pub fn generate_secret() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
