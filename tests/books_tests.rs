mod common;

use axum::http::StatusCode;
use common::{create_user, json_body, setup};

async fn logged_in(ctx: &common::TestApp, email: &str) -> String {
    create_user(&ctx.db, email, "hunter22", true).await;
    let (access, _) = ctx.login(email, "hunter22").await;
    access
}

fn sample_book() -> serde_json::Value {
    serde_json::json!({
        "title": "The Dispossessed",
        "author": "Ursula K. Le Guin",
        "publisher": "Harper & Row",
        "published_date": "1974-05-01",
        "page_count": 341,
        "language": "en"
    })
}

#[tokio::test]
async fn test_books_require_authentication() {
    let ctx = setup().await;

    let response = ctx.get("/api/v1/books/", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx.post_json("/api/v1/books/", sample_book(), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_list_books() {
    let ctx = setup().await;
    let access = logged_in(&ctx, "alice@example.com").await;

    let response = ctx
        .post_json("/api/v1/books/", sample_book(), Some(&access))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = json_body(response).await;
    assert_eq!(created["title"], "The Dispossessed");
    assert!(created["uid"].as_str().is_some());

    let response = ctx.get("/api/v1/books/", Some(&access)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let books = json_body(response).await;
    assert_eq!(books.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_book_stamps_submitting_user() {
    let ctx = setup().await;
    let access = logged_in(&ctx, "alice@example.com").await;

    let response = ctx
        .post_json("/api/v1/books/", sample_book(), Some(&access))
        .await;
    let created = json_body(response).await;

    let user = ctx
        .db
        .users()
        .get_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created["user_uid"], serde_json::json!(user.uid));

    // And it shows up under /books/me.
    let response = ctx.get("/api/v1/books/me", Some(&access)).await;
    let mine = json_body(response).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_book_includes_reviews() {
    let ctx = setup().await;
    let access = logged_in(&ctx, "alice@example.com").await;

    let response = ctx
        .post_json("/api/v1/books/", sample_book(), Some(&access))
        .await;
    let uid = json_body(response).await["uid"].as_str().unwrap().to_string();

    ctx.post_json(
        &format!("/api/v1/reviews/book/{}", uid),
        serde_json::json!({ "rating": 4.5, "review_text": "Read it twice." }),
        Some(&access),
    )
    .await;

    let response = ctx.get(&format!("/api/v1/books/{}", uid), Some(&access)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let details = json_body(response).await;
    assert_eq!(details["title"], "The Dispossessed");
    assert_eq!(details["reviews"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_missing_book_is_not_found() {
    let ctx = setup().await;
    let access = logged_in(&ctx, "alice@example.com").await;

    let uid = uuid::Uuid::new_v4();
    let response = ctx.get(&format!("/api/v1/books/{}", uid), Some(&access)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_book_merges_fields() {
    let ctx = setup().await;
    let access = logged_in(&ctx, "alice@example.com").await;

    let response = ctx
        .post_json("/api/v1/books/", sample_book(), Some(&access))
        .await;
    let uid = json_body(response).await["uid"].as_str().unwrap().to_string();

    let response = ctx
        .patch_json(
            &format!("/api/v1/books/{}", uid),
            serde_json::json!({ "page_count": 400 }),
            Some(&access),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = json_body(response).await;
    assert_eq!(updated["page_count"], 400);
    // Untouched fields survive the patch.
    assert_eq!(updated["title"], "The Dispossessed");
}

#[tokio::test]
async fn test_update_rejects_invalid_page_count() {
    let ctx = setup().await;
    let access = logged_in(&ctx, "alice@example.com").await;

    let response = ctx
        .post_json("/api/v1/books/", sample_book(), Some(&access))
        .await;
    let uid = json_body(response).await["uid"].as_str().unwrap().to_string();

    let response = ctx
        .patch_json(
            &format!("/api/v1/books/{}", uid),
            serde_json::json!({ "page_count": 0 }),
            Some(&access),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_book() {
    let ctx = setup().await;
    let access = logged_in(&ctx, "alice@example.com").await;

    let response = ctx
        .post_json("/api/v1/books/", sample_book(), Some(&access))
        .await;
    let uid = json_body(response).await["uid"].as_str().unwrap().to_string();

    let response = ctx.delete(&format!("/api/v1/books/{}", uid), Some(&access)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx.delete(&format!("/api/v1/books/{}", uid), Some(&access)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_book_rejects_empty_title() {
    let ctx = setup().await;
    let access = logged_in(&ctx, "alice@example.com").await;

    let mut book = sample_book();
    book["title"] = serde_json::json!("   ");

    let response = ctx.post_json("/api/v1/books/", book, Some(&access)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unverified_user_cannot_list_books() {
    let ctx = setup().await;
    create_user(&ctx.db, "bob@example.com", "hunter22", false).await;
    let (access, _) = ctx.login("bob@example.com", "hunter22").await;

    let response = ctx.get("/api/v1/books/", Some(&access)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = json_body(response).await;
    assert_eq!(json["error"], "Account not verified");
}
