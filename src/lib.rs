pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod links;
pub mod mail;
pub mod password;
pub mod rate_limit;

use api::create_api_router;
use axum::Router;
use db::Database;
use jwt::TokenCodec;
use links::LinkCodec;
use mail::Mailer;
use password::PasswordHasher;
use rate_limit::RateLimitConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing bearer tokens and email links
    pub jwt_secret: Vec<u8>,
    /// Public base URL used when building email links
    pub public_url: Url,
    /// Access token lifetime in seconds
    pub access_token_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_token_secs: u64,
    /// Revocation marker lifetime in seconds
    pub revocation_ttl_secs: u64,
    /// Email link lifetime in seconds
    pub link_token_secs: u64,
    /// Outbound email collaborator
    pub mailer: Arc<dyn Mailer>,
    /// Per-IP limits on login and signup
    pub rate_limits: Arc<RateLimitConfig>,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let codec = Arc::new(TokenCodec::new(&config.jwt_secret));
    let links = Arc::new(LinkCodec::new(
        &config.jwt_secret,
        Duration::from_secs(config.link_token_secs),
    ));
    let hasher = Arc::new(PasswordHasher::new());

    let api_router = create_api_router(
        config.db.clone(),
        codec,
        links,
        hasher,
        config.mailer.clone(),
        config.public_url.clone(),
        Duration::from_secs(config.access_token_secs),
        Duration::from_secs(config.refresh_token_secs),
        Duration::from_secs(config.revocation_ttl_secs),
        config.rate_limits.clone(),
    );

    Router::new().nest("/api/v1", api_router)
}

/// Run cleanup tasks and spawn the background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(db: &Database) {
    cleanup::run_cleanup(db).await;
    cleanup::spawn_cleanup_scheduler(db.clone());
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to sweep lapsed revocation markers on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<std::net::SocketAddr>();
    axum::serve(listener, make_service).await
}
