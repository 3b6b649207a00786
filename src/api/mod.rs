mod auth;
mod books;
mod error;
mod reviews;

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::auth::RoleGate;
use crate::db::{Database, Role};
use crate::jwt::TokenCodec;
use crate::links::LinkCodec;
use crate::mail::Mailer;
use crate::password::PasswordHasher;
use crate::rate_limit::RateLimitConfig;

pub use auth::AuthState;

/// Roles allowed on the regular catalogue routes.
const MEMBER_ROLES: &[Role] = &[Role::User, Role::Admin];

/// Create the API router.
#[allow(clippy::too_many_arguments)]
pub fn create_api_router(
    db: Database,
    codec: Arc<TokenCodec>,
    links: Arc<LinkCodec>,
    hasher: Arc<PasswordHasher>,
    mailer: Arc<dyn Mailer>,
    public_url: Url,
    access_ttl: Duration,
    refresh_ttl: Duration,
    revocation_ttl: Duration,
    rate_limits: Arc<RateLimitConfig>,
) -> Router {
    let auth_state = auth::AuthState {
        db: db.clone(),
        codec: codec.clone(),
        links,
        hasher,
        mailer,
        public_url,
        access_ttl,
        refresh_ttl,
        revocation_ttl,
        gate: RoleGate::new(MEMBER_ROLES),
    };

    let books_state = books::BooksState {
        db: db.clone(),
        codec: codec.clone(),
        gate: RoleGate::new(MEMBER_ROLES),
    };

    let reviews_state = reviews::ReviewsState {
        db,
        codec,
        gate: RoleGate::new(MEMBER_ROLES),
    };

    Router::new()
        .nest("/auth", auth::router(auth_state, rate_limits))
        .nest("/books", books::router(books_state))
        .nest("/reviews", reviews::router(reviews_state))
}
