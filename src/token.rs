//! Signed, expiring capability tokens.
//!
//! A token is `<payload>.<signature>`, both base64url without padding. The
//! payload is a small JSON document carrying the upstream URL and its
//! issue/expiry instants; the signature is HMAC-SHA256 over the encoded
//! payload, so the URL and the expiry are covered together.
//!
//! Tokens are self-contained: nothing is stored server-side and a token simply
//! stops verifying once its expiry has passed.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::{sync::Arc, time::Duration};

type HmacSha256 = Hmac<Sha256>;

/// Separator between the encoded payload and the encoded signature.
const SEPARATOR: char = '.';

/// Reasons a token cannot be issued or verified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature mismatch")]
    InvalidSignature,

    #[error("Token expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("Invalid URL for token: {0}")]
    InvalidUrl(String),
}

/// Claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoToken {
    /// Upstream URL, exactly as issued.
    #[serde(rename = "u")]
    pub url: String,

    /// Issue instant, milliseconds since the Unix epoch.
    #[serde(rename = "iat")]
    pub issued_at: i64,

    /// Expiry instant, milliseconds since the Unix epoch.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl VideoToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.expires_at
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.expires_at).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Issues and verifies tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    key: Arc<[u8]>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec from secret bytes.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into().into(),
        }
    }

    /// Create a test codec (for testing only).
    #[cfg(test)]
    pub fn test_codec() -> Self {
        Self::new(b"test-signing-key-for-tests".to_vec())
    }

    /// Issue a token for `url`, valid for `ttl` from now.
    pub fn issue(&self, url: &str, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(url, ttl, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        url: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        validate_url(url)?;

        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let issued_at = now.timestamp_millis();
        let claims = VideoToken {
            url: url.to_string(),
            issued_at,
            expires_at: issued_at.saturating_add(ttl_ms),
        };

        let json = serde_json::to_vec(&claims).map_err(|e| TokenError::Malformed(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes()));

        Ok(format!("{payload}{SEPARATOR}{signature}"))
    }

    /// Verify a token and return the URL it grants access to.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = self.decode(token)?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired(claims.expiry()));
        }

        Ok(claims.url)
    }

    /// Check the signature and decode the claims, ignoring expiry.
    pub fn decode(&self, token: &str) -> Result<VideoToken, TokenError> {
        let (payload, signature) = token
            .split_once(SEPARATOR)
            .ok_or_else(|| TokenError::Malformed("missing separator".to_string()))?;

        let sig_bytes = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig_bytes)
            .map_err(|_| TokenError::InvalidSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        serde_json::from_slice(&json).map_err(|e| TokenError::Malformed(e.to_string()))
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size")
    }
}

/// Only absolute URLs with a host may be granted.
fn validate_url(url: &str) -> Result<(), TokenError> {
    let parsed = url::Url::parse(url).map_err(|e| TokenError::InvalidUrl(format!("{url}: {e}")))?;
    if !parsed.has_host() {
        return Err(TokenError::InvalidUrl(format!("{url}: missing host")));
    }
    Ok(())
}
