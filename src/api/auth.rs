//! Account and session API endpoints.
//!
//! - POST `/signup` - Create an unverified account and send a verification link
//! - GET  `/verify/{token}` - Confirm an email address
//! - POST `/login` - Exchange credentials for access + refresh tokens
//! - GET  `/refresh` - Exchange a refresh token for a new access token
//! - GET  `/me` - Profile of the authenticated user
//! - GET  `/logout` - Revoke the presented access token
//! - POST `/password-reset-request` - Send a reset link
//! - POST `/password-reset-confirm/{token}` - Set a new password
//! - POST `/send-mail` - Fire a plain mail to a list of addresses

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::error;
use url::Url;

use super::error::{ApiError, ResultExt};
use crate::auth::{AccessToken, CurrentUser, RefreshToken, RoleGate};
use crate::db::{Book, Database, NewUser, Review, Role, User};
use crate::impl_auth_backend;
use crate::jwt::{TokenCodec, TokenKind, unix_now};
use crate::links::{LinkCodec, LinkDecodeResult, LinkPurpose};
use crate::mail::{Mailer, OutgoingMail};
use crate::password::PasswordHasher;
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_signup};

#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub codec: Arc<TokenCodec>,
    pub links: Arc<LinkCodec>,
    pub hasher: Arc<PasswordHasher>,
    pub mailer: Arc<dyn Mailer>,
    pub public_url: Url,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub revocation_ttl: Duration,
    pub gate: RoleGate,
}

impl_auth_backend!(AuthState);

pub fn router(state: AuthState, rate_limits: Arc<RateLimitConfig>) -> Router {
    let login_routes = Router::new()
        .route("/login", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            rate_limits.clone(),
            rate_limit_login,
        ));

    let signup_routes = Router::new()
        .route("/signup", post(signup))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(rate_limits, rate_limit_signup));

    let routes = Router::new()
        .route("/verify/{token}", get(verify_account))
        .route("/refresh", get(refresh_token))
        .route("/me", get(me))
        .route("/logout", get(logout))
        .route("/password-reset-request", post(password_reset_request))
        .route("/password-reset-confirm/{token}", post(password_reset_confirm))
        .route("/send-mail", post(send_mail))
        .with_state(state);

    Router::new()
        .merge(login_routes)
        .merge(signup_routes)
        .merge(routes)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct SignupRequest {
    first_name: String,
    last_name: String,
    username: String,
    email: String,
    password: String,
}

#[derive(Serialize)]
struct UserResponse {
    uid: String,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    is_verified: bool,
    role: Role,
    created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            uid: user.uid,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_verified: user.is_verified,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
struct SignupResponse {
    message: &'static str,
    user: UserResponse,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginUser {
    email: String,
    username: String,
    first_name: String,
    last_name: String,
}

#[derive(Serialize)]
struct LoginResponse {
    message: &'static str,
    access_token: String,
    refresh_token: String,
    user: LoginUser,
}

#[derive(Serialize)]
struct ProfileResponse {
    #[serde(flatten)]
    user: UserResponse,
    books: Vec<Book>,
    reviews: Vec<Review>,
}

#[derive(Deserialize)]
struct PasswordResetRequest {
    email: String,
}

#[derive(Deserialize)]
struct PasswordResetConfirmRequest {
    new_password: String,
    confirm_new_password: String,
}

#[derive(Deserialize)]
struct SendMailRequest {
    addresses: Vec<String>,
}

// --- Helpers ---

fn validate_signup(payload: &SignupRequest) -> Result<(), ApiError> {
    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email address is required"));
    }
    if payload.username.trim().is_empty() {
        return Err(ApiError::bad_request("Username cannot be empty"));
    }
    if payload.username.len() > 32 {
        return Err(ApiError::bad_request(
            "Username cannot be longer than 32 characters",
        ));
    }
    if payload.password.len() < 6 || payload.password.len() > 128 {
        return Err(ApiError::bad_request(
            "Password must be between 6 and 128 characters",
        ));
    }
    Ok(())
}

fn link_url(public_url: &Url, route: &str, token: &str) -> String {
    format!(
        "{}/api/v1/auth/{}/{}",
        public_url.as_str().trim_end_matches('/'),
        route,
        token
    )
}

fn token_issue_err(e: crate::jwt::TokenError) -> ApiError {
    error!("Failed to generate token: {}", e);
    ApiError::internal("Failed to generate token")
}

// --- Handlers ---

async fn signup(
    State(state): State<AuthState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_signup(&payload)?;
    let email = payload.email.trim().to_string();

    let exists = state
        .db
        .users()
        .email_exists(&email)
        .await
        .db_err("Failed to check email availability")?;
    if exists {
        return Err(ApiError::conflict(
            "An account with this email already exists",
        ));
    }

    let password_hash = state.hasher.hash(&payload.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to create account")
    })?;

    let new_user = NewUser {
        uid: uuid::Uuid::new_v4().to_string(),
        username: payload.username.trim().to_string(),
        email: email.clone(),
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        password_hash,
    };
    state
        .db
        .users()
        .create(&new_user)
        .await
        .db_err("Failed to create user")?;

    let token = state
        .links
        .issue(&email, LinkPurpose::Verify)
        .map_err(token_issue_err)?;
    let link = link_url(&state.public_url, "verify", &token);

    state.mailer.deliver(OutgoingMail {
        recipients: vec![email.clone()],
        subject: "Verify your email".to_string(),
        html_body: format!(
            "<h1>Verify your Email</h1>\n\
             <p>Please click this <a href=\"{}\">link</a> to verify your email</p>",
            link
        ),
    });

    let user = state
        .db
        .users()
        .get_by_email(&email)
        .await
        .db_err("Failed to load user")?
        .ok_or_else(|| ApiError::internal("Failed to load user"))?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Account created! Check your email to verify your account",
            user: user.into(),
        }),
    ))
}

async fn verify_account(
    State(state): State<AuthState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let email = match state.links.decode(&token, LinkPurpose::Verify) {
        LinkDecodeResult::Valid { email } => email,
        LinkDecodeResult::Expired => {
            return Err(ApiError::bad_request("Verification link has expired"));
        }
        LinkDecodeResult::Invalid => {
            return Err(ApiError::bad_request("Verification link is invalid"));
        }
    };

    let verified = state
        .db
        .users()
        .mark_verified(&email)
        .await
        .db_err("Failed to verify account")?;
    if !verified {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(Json(serde_json::json!({
        "message": "Account verified successfully"
    })))
}

async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .users()
        .get_by_email(payload.email.trim())
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(|| {
            ApiError::not_found("User not found. Please verify the email address and try again.")
        })?;

    if !state.hasher.verify(&payload.password, &user.password_hash) {
        return Err(ApiError::unauthorized(
            "Invalid credentials. Please check your password and try again.",
        ));
    }

    let subject = crate::jwt::Subject {
        email: user.email.clone(),
        user_uid: user.uid.clone(),
        role: user.role,
    };

    let access_token = state
        .codec
        .issue(subject.clone(), TokenKind::Access, state.access_ttl)
        .map_err(token_issue_err)?;
    let refresh_token = state
        .codec
        .issue(subject, TokenKind::Refresh, state.refresh_ttl)
        .map_err(token_issue_err)?;

    Ok(Json(LoginResponse {
        message: "User login successful",
        access_token,
        refresh_token,
        user: LoginUser {
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        },
    }))
}

/// Issue a new access token from a valid refresh token.
///
/// Re-checks the claims' expiry against the clock even though decode
/// already enforced it; the two checks are kept as separate layers.
async fn refresh_token(
    State(state): State<AuthState>,
    RefreshToken(claims): RefreshToken,
) -> Result<impl IntoResponse, ApiError> {
    let now = unix_now().map_err(|e| {
        error!("Failed to read clock: {}", e);
        ApiError::internal("Failed to generate token")
    })?;
    if claims.exp <= now {
        return Err(ApiError::bad_request("Invalid or expired token"));
    }

    let access_token = state
        .codec
        .issue(claims.user, TokenKind::Access, state.access_ttl)
        .map_err(token_issue_err)?;

    Ok(Json(serde_json::json!({ "access_token": access_token })))
}

async fn me(
    State(state): State<AuthState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize(&user)?;

    let books = state
        .db
        .books()
        .list_by_user(&user.uid)
        .await
        .db_err("Failed to list books")?;
    let reviews = state
        .db
        .reviews()
        .list_by_user(&user.uid)
        .await
        .db_err("Failed to list reviews")?;

    Ok(Json(ProfileResponse {
        user: user.into(),
        books,
        reviews,
    }))
}

/// Revoke the presented access token.
///
/// Writes a revocation marker for the token's jti; the marker outlives the
/// token's own expiry window.
async fn logout(
    State(state): State<AuthState>,
    AccessToken(claims): AccessToken,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .revocations()
        .add(&claims.jti, state.revocation_ttl)
        .await
        .db_err("Failed to revoke token")?;

    Ok(Json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}

async fn password_reset_request(
    State(state): State<AuthState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim().to_string();

    let token = state
        .links
        .issue(&email, LinkPurpose::PasswordReset)
        .map_err(token_issue_err)?;
    let link = link_url(&state.public_url, "password-reset-confirm", &token);

    state.mailer.deliver(OutgoingMail {
        recipients: vec![email],
        subject: "Reset your password".to_string(),
        html_body: format!(
            "<h1>Reset Your Password</h1>\n\
             <p>Please click this <a href=\"{}\">link</a> to reset your password</p>",
            link
        ),
    });

    Ok(Json(serde_json::json!({
        "message": "Please check your email for instructions to reset your password"
    })))
}

async fn password_reset_confirm(
    State(state): State<AuthState>,
    Path(token): Path<String>,
    Json(payload): Json<PasswordResetConfirmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.new_password != payload.confirm_new_password {
        return Err(ApiError::bad_request("Passwords do not match"));
    }
    if payload.new_password.len() < 6 || payload.new_password.len() > 128 {
        return Err(ApiError::bad_request(
            "Password must be between 6 and 128 characters",
        ));
    }

    let email = match state.links.decode(&token, LinkPurpose::PasswordReset) {
        LinkDecodeResult::Valid { email } => email,
        LinkDecodeResult::Expired => {
            return Err(ApiError::bad_request("Password reset link has expired"));
        }
        LinkDecodeResult::Invalid => {
            return Err(ApiError::bad_request("Password reset link is invalid"));
        }
    };

    let password_hash = state.hasher.hash(&payload.new_password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to reset password")
    })?;

    let updated = state
        .db
        .users()
        .update_password_hash(&email, &password_hash)
        .await
        .db_err("Failed to reset password")?;
    if !updated {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(Json(serde_json::json!({
        "message": "Password reset successfully"
    })))
}

async fn send_mail(
    State(state): State<AuthState>,
    Json(payload): Json<SendMailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.addresses.is_empty() {
        return Err(ApiError::bad_request("At least one address is required"));
    }

    state.mailer.deliver(OutgoingMail {
        recipients: payload.addresses,
        subject: "Welcome to the app".to_string(),
        html_body: "<h1>Welcome to the app</h1>".to_string(),
    });

    Ok(Json(serde_json::json!({
        "message": "Email sent successfully"
    })))
}
