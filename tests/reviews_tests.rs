mod common;

use axum::http::StatusCode;
use common::{create_user, json_body, setup};

async fn logged_in(ctx: &common::TestApp, email: &str) -> String {
    create_user(&ctx.db, email, "hunter22", true).await;
    let (access, _) = ctx.login(email, "hunter22").await;
    access
}

async fn create_book(ctx: &common::TestApp, access: &str) -> String {
    let response = ctx
        .post_json(
            "/api/v1/books/",
            serde_json::json!({
                "title": "Solaris",
                "author": "Stanisław Lem",
                "publisher": "MON",
                "published_date": "1961-06-01",
                "page_count": 204,
                "language": "pl"
            }),
            Some(access),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["uid"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_add_and_list_reviews() {
    let ctx = setup().await;
    let access = logged_in(&ctx, "alice@example.com").await;
    let book_uid = create_book(&ctx, &access).await;

    let response = ctx
        .post_json(
            &format!("/api/v1/reviews/book/{}", book_uid),
            serde_json::json!({ "rating": 4.0, "review_text": "Unsettling and great." }),
            Some(&access),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let review = json_body(response).await;
    assert_eq!(review["book_uid"], serde_json::json!(book_uid));
    assert_eq!(review["rating"], 4.0);

    let response = ctx.get("/api/v1/reviews/", Some(&access)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_review_requires_existing_book() {
    let ctx = setup().await;
    let access = logged_in(&ctx, "alice@example.com").await;

    let missing = uuid::Uuid::new_v4();
    let response = ctx
        .post_json(
            &format!("/api/v1/reviews/book/{}", missing),
            serde_json::json!({ "rating": 4.0, "review_text": "?" }),
            Some(&access),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_rating_bounds() {
    let ctx = setup().await;
    let access = logged_in(&ctx, "alice@example.com").await;
    let book_uid = create_book(&ctx, &access).await;

    for bad_rating in [0.0, -1.0, 5.5] {
        let response = ctx
            .post_json(
                &format!("/api/v1/reviews/book/{}", book_uid),
                serde_json::json!({ "rating": bad_rating, "review_text": "x" }),
                Some(&access),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // The upper bound itself is allowed.
    let response = ctx
        .post_json(
            &format!("/api/v1/reviews/book/{}", book_uid),
            serde_json::json!({ "rating": 5.0, "review_text": "x" }),
            Some(&access),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_owner_can_delete_own_review() {
    let ctx = setup().await;
    let access = logged_in(&ctx, "alice@example.com").await;
    let book_uid = create_book(&ctx, &access).await;

    let response = ctx
        .post_json(
            &format!("/api/v1/reviews/book/{}", book_uid),
            serde_json::json!({ "rating": 3.0, "review_text": "Fine." }),
            Some(&access),
        )
        .await;
    let review_uid = json_body(response).await["uid"].as_str().unwrap().to_string();

    let response = ctx
        .delete(&format!("/api/v1/reviews/{}", review_uid), Some(&access))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx.get("/api/v1/reviews/", Some(&access)).await;
    assert!(json_body(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cannot_delete_another_users_review() {
    let ctx = setup().await;
    let alice = logged_in(&ctx, "alice@example.com").await;
    let bob = logged_in(&ctx, "bob@example.com").await;
    let book_uid = create_book(&ctx, &alice).await;

    let response = ctx
        .post_json(
            &format!("/api/v1/reviews/book/{}", book_uid),
            serde_json::json!({ "rating": 2.0, "review_text": "Not for me." }),
            Some(&alice),
        )
        .await;
    let review_uid = json_body(response).await["uid"].as_str().unwrap().to_string();

    let response = ctx
        .delete(&format!("/api/v1/reviews/{}", review_uid), Some(&bob))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The review is still there.
    let response = ctx.get("/api/v1/reviews/", Some(&alice)).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reviews_require_authentication() {
    let ctx = setup().await;

    let response = ctx.get("/api/v1/reviews/", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
