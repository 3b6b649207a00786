//! Authentication and authorization error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::jwt::TokenKind;

/// Everything that can abort the guard/resolver/gate pipeline.
#[derive(Debug)]
pub enum AuthError {
    /// No `Authorization: Bearer` credential on the request
    MissingCredential,
    /// Signature, structure, or expiry check failed
    InvalidOrExpiredToken,
    /// The token's jti has a live revocation marker
    RevokedToken,
    /// Access token on a refresh route or vice versa
    WrongTokenType { expected: TokenKind },
    /// Valid token, but the account no longer exists
    UserNotFound,
    /// Account has not completed email verification
    AccountNotVerified,
    /// Account role is not allowed on this route
    InsufficientPermission,
    /// Revocation or user store unavailable
    StoreError,
}

/// Token-class failures carry a machine-parsable body so clients can
/// decide between re-authenticating and re-requesting.
#[derive(Serialize)]
struct TokenErrorBody {
    error: &'static str,
    resolution: &'static str,
}

/// Credential-class failures carry a plain human-readable detail.
#[derive(Serialize)]
struct DetailBody {
    detail: &'static str,
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthError::InvalidOrExpiredToken
            | AuthError::RevokedToken
            | AuthError::WrongTokenType { .. }
            | AuthError::AccountNotVerified
            | AuthError::InsufficientPermission => StatusCode::FORBIDDEN,
            AuthError::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        use axum::Json;

        let status = self.status_code();
        match self {
            AuthError::MissingCredential => (
                status,
                Json(DetailBody {
                    detail: "Not authenticated",
                }),
            )
                .into_response(),
            AuthError::UserNotFound => (
                status,
                Json(DetailBody {
                    detail: "User not found",
                }),
            )
                .into_response(),
            AuthError::StoreError => (
                status,
                Json(DetailBody {
                    detail: "Internal server error",
                }),
            )
                .into_response(),
            AuthError::InvalidOrExpiredToken => (
                status,
                Json(TokenErrorBody {
                    error: "This token is invalid or expired",
                    resolution: "Please get a new token",
                }),
            )
                .into_response(),
            AuthError::RevokedToken => (
                status,
                Json(TokenErrorBody {
                    error: "This token has been revoked",
                    resolution: "Please get a new token",
                }),
            )
                .into_response(),
            AuthError::WrongTokenType { expected } => {
                let resolution = match expected {
                    TokenKind::Access => "Please provide an access token",
                    TokenKind::Refresh => "Please provide a refresh token",
                };
                (
                    status,
                    Json(TokenErrorBody {
                        error: "Wrong token type",
                        resolution,
                    }),
                )
                    .into_response()
            }
            AuthError::AccountNotVerified => (
                status,
                Json(TokenErrorBody {
                    error: "Account not verified",
                    resolution: "Please check your email for verification details",
                }),
            )
                .into_response(),
            AuthError::InsufficientPermission => (
                status,
                Json(TokenErrorBody {
                    error: "Insufficient permissions",
                    resolution: "You are not allowed to perform this action",
                }),
            )
                .into_response(),
        }
    }
}
