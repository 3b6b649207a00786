//! Bearer credential extraction and validation.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};

use super::errors::AuthError;
use crate::db::Database;
use crate::jwt::{Claims, TokenCodec, TokenKind};

/// State types that expose the handles the auth pipeline needs.
///
/// The codec and database are process-wide resources created at startup and
/// injected into each router state, so tests can substitute their own.
pub trait AuthBackend {
    fn codec(&self) -> &TokenCodec;
    fn db(&self) -> &Database;
}

/// Implement [`AuthBackend`] for a state struct with the standard fields
/// `codec: Arc<TokenCodec>` and `db: Database`.
#[macro_export]
macro_rules! impl_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::AuthBackend for $state_type {
            fn codec(&self) -> &$crate::jwt::TokenCodec {
                &self.codec
            }
            fn db(&self) -> &$crate::db::Database {
                &self.db
            }
        }
    };
}

/// Pull the token out of the `Authorization: Bearer` header.
fn bearer_credential(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// One validation pipeline for both token kinds.
///
/// The revocation check runs before the kind check: a revoked token is
/// reported as revoked even when it is also the wrong kind, and even when
/// its own expiry has not yet passed.
async fn validate<S>(parts: &Parts, state: &S, kind: TokenKind) -> Result<Claims, AuthError>
where
    S: AuthBackend,
{
    let token = bearer_credential(&parts.headers).ok_or(AuthError::MissingCredential)?;

    let claims = state
        .codec()
        .decode(token)
        .map_err(|_| AuthError::InvalidOrExpiredToken)?;

    let revoked = state
        .db()
        .revocations()
        .contains(&claims.jti)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to check revocation marker");
            AuthError::StoreError
        })?;
    if revoked {
        return Err(AuthError::RevokedToken);
    }

    if claims.refresh != kind.is_refresh() {
        return Err(AuthError::WrongTokenType { expected: kind });
    }

    Ok(claims)
}

/// Extractor for routes that require a valid access token.
pub struct AccessToken(pub Claims);

impl<S> FromRequestParts<S> for AccessToken
where
    S: AuthBackend + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        validate(parts, state, TokenKind::Access)
            .await
            .map(AccessToken)
    }
}

/// Extractor for the refresh endpoint; rejects access tokens.
pub struct RefreshToken(pub Claims);

impl<S> FromRequestParts<S> for RefreshToken
where
    S: AuthBackend + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        validate(parts, state, TokenKind::Refresh)
            .await
            .map(RefreshToken)
    }
}
