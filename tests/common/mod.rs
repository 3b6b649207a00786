#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use libris::db::{Database, NewUser, Role};
use libris::mail::RecordingMailer;
use libris::password::PasswordHasher;
use libris::rate_limit::RateLimitConfig;
use libris::{ServerConfig, create_app};
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;

pub const TEST_SECRET: &[u8] = b"test-jwt-secret-long-enough-for-hs256";

pub struct TestApp {
    pub app: axum::Router,
    pub db: Database,
    pub mailer: Arc<RecordingMailer>,
}

/// Start an app over an in-memory database with relaxed rate limits and a
/// recording mailer.
pub async fn setup() -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let mailer = RecordingMailer::new();

    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: TEST_SECRET.to_vec(),
        public_url: Url::parse("http://localhost:8000").expect("Invalid URL"),
        access_token_secs: 3600,
        refresh_token_secs: 172800,
        revocation_ttl_secs: 3600,
        link_token_secs: 3600,
        mailer: mailer.clone(),
        rate_limits: Arc::new(RateLimitConfig::unlimited()),
    };

    TestApp {
        app: create_app(&config),
        db,
        mailer,
    }
}

/// Insert a user directly, bypassing the signup endpoint.
/// Returns the user's uid.
pub async fn create_user(
    db: &Database,
    email: &str,
    password: &str,
    verified: bool,
) -> String {
    let uid = uuid::Uuid::new_v4().to_string();
    let hash = PasswordHasher::new()
        .hash(password)
        .expect("Failed to hash password");

    db.users()
        .create(&NewUser {
            uid: uid.clone(),
            username: email.split('@').next().unwrap_or("user").to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash: hash,
        })
        .await
        .expect("Failed to create user");

    if verified {
        db.users()
            .mark_verified(email)
            .await
            .expect("Failed to verify user");
    }

    uid
}

/// Promote a user to admin.
pub async fn make_admin(db: &Database, email: &str) {
    db.users()
        .set_role(email, Role::Admin)
        .await
        .expect("Failed to set role");
}

impl TestApp {
    /// Send a request and return the response.
    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed")
    }

    /// GET with an optional bearer token.
    pub async fn get(&self, path: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// POST a JSON body with an optional bearer token.
    pub async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Response<Body> {
        self.send_json("POST", path, body, token).await
    }

    /// PATCH a JSON body with an optional bearer token.
    pub async fn patch_json(
        &self,
        path: &str,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Response<Body> {
        self.send_json("PATCH", path, body, token).await
    }

    /// DELETE with an optional bearer token.
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("DELETE").uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    async fn send_json(
        &self,
        method: &str,
        path: &str,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Log in and return `(access_token, refresh_token)`.
    pub async fn login(&self, email: &str, password: &str) -> (String, String) {
        let response = self
            .post_json(
                "/api/v1/auth/login",
                serde_json::json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login failed");

        let json = json_body(response).await;
        (
            json["access_token"].as_str().unwrap().to_string(),
            json["refresh_token"].as_str().unwrap().to_string(),
        )
    }
}

/// Read a response body as JSON.
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
