//! HTTP-level tests for the notification endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get_auth, post_auth, seed, token_for};
use equiplog_db::repositories::NotificationRepo;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn list_count_and_mark_read(pool: PgPool) {
    let seeded = seed(&pool).await;
    let token = token_for(seeded.responsible_id, "responsible");
    let ids = NotificationRepo::create_many(&pool, &[seeded.responsible_id], "first")
        .await
        .unwrap();
    NotificationRepo::create_many(&pool, &[seeded.responsible_id], "second")
        .await
        .unwrap();

    let response = get_auth(build_test_app(pool.clone()), "/api/v1/notifications", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

    let uri = format!("/api/v1/notifications/{}/read", ids[0]);
    let response = post_auth(build_test_app(pool.clone()), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(build_test_app(pool.clone()), "/api/v1/notifications/unread-count", &token).await;
    assert_eq!(body_json(response).await["data"]["count"], 1);

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/v1/notifications?unread_only=true",
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["description"], "second");

    let response = post_auth(build_test_app(pool), "/api/v1/notifications/read-all", &token).await;
    assert_eq!(body_json(response).await["data"]["marked_read"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cannot_mark_another_users_notification(pool: PgPool) {
    let seeded = seed(&pool).await;
    let ids = NotificationRepo::create_many(&pool, &[seeded.responsible_id], "private")
        .await
        .unwrap();

    let uri = format!("/api/v1/notifications/{}/read", ids[0]);
    let response = post_auth(build_test_app(pool), &uri, &token_for(seeded.outsider_id, "user")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
