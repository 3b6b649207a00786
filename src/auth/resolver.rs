//! Mapping validated access-token claims to a user account.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::errors::AuthError;
use super::guard::{AccessToken, AuthBackend};
use crate::db::User;

/// Extractor resolving the access token's subject to the stored account.
///
/// Tokens can outlive the account they describe; a missing account is a
/// hard auth failure, never a silent pass-through.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: AuthBackend + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AccessToken(claims) = AccessToken::from_request_parts(parts, state).await?;

        let user = state
            .db()
            .users()
            .get_by_email(&claims.user.email)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to look up user");
                AuthError::StoreError
            })?
            .ok_or(AuthError::UserNotFound)?;

        Ok(CurrentUser(user))
    }
}
