//! Short-lived signed tokens for email links.
//!
//! Email verification and password reset both hand the user a URL-safe
//! signed payload instead of a session. Links share the signing primitive
//! with bearer tokens but carry a different claim shape and an explicit
//! purpose tag, so neither family is accepted in place of the other.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::jwt::{TokenError, unix_now};

/// Default link lifetime: 1 hour
pub const LINK_TOKEN_TTL_SECS: u64 = 60 * 60;

/// What a signed link is allowed to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPurpose {
    Verify,
    PasswordReset,
}

/// Claims carried by a signed link. No `jti`, no revocation tracking.
#[derive(Debug, Serialize, Deserialize)]
struct LinkClaims {
    email: String,
    purpose: LinkPurpose,
    iat: u64,
    exp: u64,
}

/// Outcome of decoding a signed link.
///
/// Expired links are reported separately from malformed or wrong-purpose
/// ones so endpoints can tell the user which happened.
#[derive(Debug, PartialEq, Eq)]
pub enum LinkDecodeResult {
    Valid { email: String },
    Expired,
    Invalid,
}

/// Issues and decodes signed email-link tokens.
#[derive(Clone)]
pub struct LinkCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl LinkCodec {
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime,
        }
    }

    /// Sign an email address into a URL-safe link token.
    pub fn issue(&self, email: &str, purpose: LinkPurpose) -> Result<String, TokenError> {
        let now = unix_now()?;

        let claims = LinkClaims {
            email: email.to_string(),
            purpose,
            iat: now,
            exp: now + self.lifetime.as_secs(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// Decode a link token, enforcing signature, expiry, and purpose.
    pub fn decode(&self, token: &str, purpose: LinkPurpose) -> LinkDecodeResult {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        match jsonwebtoken::decode::<LinkClaims>(token, &self.decoding_key, &validation) {
            Ok(data) if data.claims.purpose == purpose => LinkDecodeResult::Valid {
                email: data.claims.email,
            },
            Ok(_) => LinkDecodeResult::Invalid,
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => LinkDecodeResult::Expired,
            Err(_) => LinkDecodeResult::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Role;
    use crate::jwt::{Subject, TokenCodec, TokenKind};

    fn codec() -> LinkCodec {
        LinkCodec::new(
            b"test-secret-key-for-testing",
            Duration::from_secs(LINK_TOKEN_TTL_SECS),
        )
    }

    #[test]
    fn test_round_trip() {
        let token = codec().issue("a@b.com", LinkPurpose::Verify).unwrap();

        assert_eq!(
            codec().decode(&token, LinkPurpose::Verify),
            LinkDecodeResult::Valid {
                email: "a@b.com".to_string()
            }
        );
    }

    #[test]
    fn test_expired_link() {
        let now = unix_now().unwrap();
        let claims = LinkClaims {
            email: "a@b.com".to_string(),
            purpose: LinkPurpose::Verify,
            iat: now - 100,
            exp: now - 50,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key-for-testing"),
        )
        .unwrap();

        assert_eq!(
            codec().decode(&token, LinkPurpose::Verify),
            LinkDecodeResult::Expired
        );
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert_eq!(
            codec().decode("garbage", LinkPurpose::Verify),
            LinkDecodeResult::Invalid
        );
    }

    #[test]
    fn test_wrong_purpose_is_invalid() {
        let token = codec().issue("a@b.com", LinkPurpose::PasswordReset).unwrap();

        assert_eq!(
            codec().decode(&token, LinkPurpose::Verify),
            LinkDecodeResult::Invalid
        );
    }

    #[test]
    fn test_bearer_token_is_not_a_link() {
        let bearer = TokenCodec::new(b"test-secret-key-for-testing");
        let token = bearer
            .issue(
                Subject {
                    email: "a@b.com".to_string(),
                    user_uid: "uuid-1".to_string(),
                    role: Role::User,
                },
                TokenKind::Access,
                Duration::from_secs(60),
            )
            .unwrap();

        assert_eq!(
            codec().decode(&token, LinkPurpose::Verify),
            LinkDecodeResult::Invalid
        );
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let other = LinkCodec::new(b"another-secret-entirely-here", Duration::from_secs(60));
        let token = other.issue("a@b.com", LinkPurpose::Verify).unwrap();

        assert_eq!(
            codec().decode(&token, LinkPurpose::Verify),
            LinkDecodeResult::Invalid
        );
    }
}
