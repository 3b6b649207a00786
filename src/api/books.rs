//! Book catalogue API.
//!
//! Every endpoint runs the full pipeline: access-token guard, user
//! resolution, then the role gate.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::{CurrentUser, RoleGate};
use crate::db::{Book, Database, NewBook, Review};
use crate::impl_auth_backend;
use crate::jwt::TokenCodec;

/// State for book endpoints.
#[derive(Clone)]
pub struct BooksState {
    pub db: Database,
    pub codec: Arc<TokenCodec>,
    pub gate: RoleGate,
}

impl_auth_backend!(BooksState);

pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/", get(list_books))
        .route("/", post(create_book))
        .route("/me", get(my_books))
        .route("/{uid}", get(get_book))
        .route("/{uid}", patch(update_book))
        .route("/{uid}", delete(delete_book))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct CreateBookRequest {
    title: String,
    author: String,
    publisher: String,
    published_date: String,
    page_count: i64,
    language: String,
}

#[derive(Deserialize)]
struct UpdateBookRequest {
    title: Option<String>,
    author: Option<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    page_count: Option<i64>,
    language: Option<String>,
}

#[derive(Serialize)]
struct BookDetailsResponse {
    #[serde(flatten)]
    book: Book,
    reviews: Vec<Review>,
}

// --- Helpers ---

fn validate_book(payload: &CreateBookRequest) -> Result<(), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title cannot be empty"));
    }
    if payload.author.trim().is_empty() {
        return Err(ApiError::bad_request("Author cannot be empty"));
    }
    if payload.page_count <= 0 {
        return Err(ApiError::bad_request("Page count must be positive"));
    }
    Ok(())
}

// --- Handlers ---

async fn list_books(
    State(state): State<BooksState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize(&user)?;

    let books = state.db.books().list_all().await.db_err("Failed to list books")?;
    Ok(Json(books))
}

async fn create_book(
    State(state): State<BooksState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize(&user)?;
    validate_book(&payload)?;

    let book = state
        .db
        .books()
        .create(
            &NewBook {
                title: payload.title.trim().to_string(),
                author: payload.author.trim().to_string(),
                publisher: payload.publisher.trim().to_string(),
                published_date: payload.published_date.trim().to_string(),
                page_count: payload.page_count,
                language: payload.language.trim().to_string(),
            },
            &user.uid,
        )
        .await
        .db_err("Failed to create book")?;

    Ok((StatusCode::CREATED, Json(book)))
}

async fn my_books(
    State(state): State<BooksState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize(&user)?;

    let books = state
        .db
        .books()
        .list_by_user(&user.uid)
        .await
        .db_err("Failed to list books")?;
    Ok(Json(books))
}

async fn get_book(
    State(state): State<BooksState>,
    CurrentUser(user): CurrentUser,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize(&user)?;
    validate_uuid(&uid)?;

    let book = state
        .db
        .books()
        .get_by_uid(&uid)
        .await
        .db_err("Failed to get book")?
        .ok_or_else(|| ApiError::not_found("Book not found"))?;

    let reviews = state
        .db
        .reviews()
        .list_by_book(&uid)
        .await
        .db_err("Failed to list reviews")?;

    Ok(Json(BookDetailsResponse { book, reviews }))
}

async fn update_book(
    State(state): State<BooksState>,
    CurrentUser(user): CurrentUser,
    Path(uid): Path<String>,
    Json(payload): Json<UpdateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize(&user)?;
    validate_uuid(&uid)?;

    let existing = state
        .db
        .books()
        .get_by_uid(&uid)
        .await
        .db_err("Failed to get book")?
        .ok_or_else(|| ApiError::not_found("Book not found"))?;

    let merged = NewBook {
        title: payload.title.unwrap_or(existing.title),
        author: payload.author.unwrap_or(existing.author),
        publisher: payload.publisher.unwrap_or(existing.publisher),
        published_date: payload.published_date.unwrap_or(existing.published_date),
        page_count: payload.page_count.unwrap_or(existing.page_count),
        language: payload.language.unwrap_or(existing.language),
    };
    if merged.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title cannot be empty"));
    }
    if merged.page_count <= 0 {
        return Err(ApiError::bad_request("Page count must be positive"));
    }

    state
        .db
        .books()
        .update(&uid, &merged)
        .await
        .db_err("Failed to update book")?;

    let book = state
        .db
        .books()
        .get_by_uid(&uid)
        .await
        .db_err("Failed to get book")?
        .ok_or_else(|| ApiError::not_found("Book not found"))?;

    Ok(Json(book))
}

async fn delete_book(
    State(state): State<BooksState>,
    CurrentUser(user): CurrentUser,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize(&user)?;
    validate_uuid(&uid)?;

    let deleted = state
        .db
        .books()
        .delete(&uid)
        .await
        .db_err("Failed to delete book")?;
    if !deleted {
        return Err(ApiError::not_found("Book not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
