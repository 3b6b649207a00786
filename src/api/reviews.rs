//! Review API.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::{CurrentUser, RoleGate};
use crate::db::Database;
use crate::impl_auth_backend;
use crate::jwt::TokenCodec;

/// State for review endpoints.
#[derive(Clone)]
pub struct ReviewsState {
    pub db: Database,
    pub codec: Arc<TokenCodec>,
    pub gate: RoleGate,
}

impl_auth_backend!(ReviewsState);

pub fn router(state: ReviewsState) -> Router {
    Router::new()
        .route("/", get(list_reviews))
        .route("/book/{book_uid}", post(add_review))
        .route("/{uid}", delete(delete_review))
        .with_state(state)
}

#[derive(Deserialize)]
struct CreateReviewRequest {
    rating: f64,
    review_text: String,
}

async fn list_reviews(
    State(state): State<ReviewsState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize(&user)?;

    let reviews = state
        .db
        .reviews()
        .list_all()
        .await
        .db_err("Failed to list reviews")?;
    Ok(Json(reviews))
}

async fn add_review(
    State(state): State<ReviewsState>,
    CurrentUser(user): CurrentUser,
    Path(book_uid): Path<String>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize(&user)?;
    validate_uuid(&book_uid)?;

    if !(payload.rating > 0.0 && payload.rating <= 5.0) {
        return Err(ApiError::bad_request("Rating must be in (0, 5]"));
    }

    let book = state
        .db
        .books()
        .get_by_uid(&book_uid)
        .await
        .db_err("Failed to get book")?;
    if book.is_none() {
        return Err(ApiError::not_found("Book not found"));
    }

    let review = state
        .db
        .reviews()
        .create(&book_uid, &user.uid, payload.rating, &payload.review_text)
        .await
        .db_err("Failed to create review")?;

    Ok((StatusCode::CREATED, Json(review)))
}

async fn delete_review(
    State(state): State<ReviewsState>,
    CurrentUser(user): CurrentUser,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize(&user)?;
    validate_uuid(&uid)?;

    let review = state
        .db
        .reviews()
        .get_by_uid(&uid)
        .await
        .db_err("Failed to get review")?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;

    // Owner-only: reviews are deleted by the user who wrote them.
    if review.user_uid.as_deref() != Some(user.uid.as_str()) {
        return Err(ApiError::forbidden("Cannot delete another user's review"));
    }

    state
        .db
        .reviews()
        .delete(&uid)
        .await
        .db_err("Failed to delete review")?;

    Ok(StatusCode::NO_CONTENT)
}
