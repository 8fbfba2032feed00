//! Local inspection of bearer tokens.
//!
//! Tokens are JWTs issued by the inventory API. The payload is decoded for
//! display only: the signature is never checked and expiry is never enforced
//! here, the API does both.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::TokenError;

/// Subject claim. Some issuers use numeric user ids, others strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Id(i64),
    Name(String),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Id(id) => write!(f, "{}", id),
            Subject::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Claims read from a token payload. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecodedIdentity {
    #[serde(default)]
    pub sub: Option<Subject>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, rename = "iat", with = "chrono::serde::ts_seconds_option")]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "exp", with = "chrono::serde::ts_seconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl DecodedIdentity {
    /// Name to greet the user with.
    pub fn display_name(&self) -> &str {
        match self.username.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "Guest",
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Checks the `header.payload.signature` shape without decoding anything.
pub fn check_format(token: &str) -> Result<(), TokenError> {
    let parts = token.split('.').count();
    if parts != 3 {
        return Err(TokenError::WrongPartCount(parts));
    }
    Ok(())
}

/// Decodes the payload of a JWT.
pub fn decode_identity(token: &str) -> Result<DecodedIdentity, TokenError> {
    check_format(token)?;

    let payload = token.split('.').nth(1).unwrap_or_default();
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| TokenError::Encoding(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| TokenError::Payload(e.to_string()))
}
