//! Bearer token issuing and validation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::db::Role;

/// Token kind for distinguishing access vs refresh tokens.
///
/// One validation pipeline serves both kinds; the caller picks which kind a
/// route accepts and the guard rejects the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived token presented on every API call
    Access,
    /// Long-lived token exchanged only for a new access token
    Refresh,
}

impl TokenKind {
    pub fn is_refresh(&self) -> bool {
        matches!(self, TokenKind::Refresh)
    }
}

/// Identity carried inside every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub email: String,
    pub user_uid: String,
    pub role: Role,
}

/// JWT claims shared by access and refresh tokens.
///
/// Every issuance gets a fresh `jti` so individual tokens can be revoked
/// before their natural expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identity
    pub user: Subject,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Unique per-issuance identifier for revocation tracking
    pub jti: String,
    /// True for refresh tokens, false for access tokens
    pub refresh: bool,
}

/// Access token lifetime: 1 hour
pub const ACCESS_TOKEN_TTL_SECS: u64 = 60 * 60;

/// Refresh token lifetime: 2 days
pub const REFRESH_TOKEN_TTL_SECS: u64 = 2 * 24 * 60 * 60;

/// Issues and decodes signed bearer tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    /// Create a codec signing with the given process-wide secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token of the given kind for a subject.
    ///
    /// Stamps `iat = now`, `exp = now + lifetime` and a fresh `jti`.
    pub fn issue(
        &self,
        subject: Subject,
        kind: TokenKind,
        lifetime: Duration,
    ) -> Result<String, TokenError> {
        let now = unix_now()?;

        let claims = Claims {
            user: subject,
            iat: now,
            exp: now + lifetime.as_secs(),
            jti: uuid::Uuid::new_v4().to_string(),
            refresh: kind.is_refresh(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// Pure computation; revocation and kind checks belong to the guard.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(TokenError::Decoding)?;

        Ok(token_data.claims)
    }
}

/// Current Unix timestamp in seconds.
pub fn unix_now() -> Result<u64, TokenError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TokenError::Clock)?
        .as_secs())
}

/// Errors from token issuing and decoding.
#[derive(Debug)]
pub enum TokenError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Signature, structure, or expiry check failed
    Decoding(jsonwebtoken::errors::Error),
    /// System clock is before the Unix epoch
    Clock,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            TokenError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            TokenError::Clock => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for TokenError {}
