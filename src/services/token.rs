//! Session token codec
//!
//! Signs and verifies the compact, stateless session token that binds a
//! user identity to an expiration. The token is two base64url segments,
//! `payload.tag`, where the payload is a small JSON claims object and
//! the tag is an HMAC-SHA256 over the encoded payload.
//!
//! Nothing is stored server-side: the only way to end a session before
//! expiry is for the client to discard the token. Revocation is out of
//! scope by design.

use anyhow::Result;
use chrono::{Duration, Utc};
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Claims carried inside a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: i64,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expires-at, unix seconds
    pub exp: i64,
}

/// Errors produced when a token fails verification.
///
/// Callers map every variant to the same unauthenticated response so
/// that the failure mode is not observable from outside.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Token is structurally invalid (wrong segment count, bad base64,
    /// bad JSON)
    #[error("Malformed token")]
    Malformed,

    /// Signature does not match the payload
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token is past its expiry
    #[error("Token expired")]
    Expired,
}

/// Signs and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    key: Vec<u8>,
    ttl: Duration,
}

impl TokenCodec {
    /// Create a codec with the given signing secret and token lifetime
    /// in days.
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Issue a token for the given user, expiring after the configured
    /// lifetime.
    pub fn issue(&self, user_id: i64) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let payload = BASE64URL_NOPAD.encode(&serde_json::to_vec(&claims)?);
        let tag = BASE64URL_NOPAD.encode(&self.sign(payload.as_bytes())?);

        Ok(format!("{}.{}", payload, tag))
    }

    /// Verify a token and return its claims.
    ///
    /// The signature is checked before anything in the payload is
    /// trusted; expiry is checked last.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let (payload, tag) = token.split_once('.').ok_or(TokenError::Malformed)?;

        let tag_bytes = BASE64URL_NOPAD
            .decode(tag.as_bytes())
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|_| TokenError::InvalidSignature)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&tag_bytes)
            .map_err(|_| TokenError::InvalidSignature)?;

        let payload_bytes = BASE64URL_NOPAD
            .decode(payload.as_bytes())
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Malformed)?;

        if Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| anyhow::anyhow!("Invalid HMAC key: {}", e))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
