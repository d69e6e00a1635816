//! HTTP-level tests for registration, sign-in, refresh and sign-out.
//!
//! Run with `DATABASE_URL` set and `cargo test -- --ignored`.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_auth, post_json};
use serde_json::json;
use sqlx::PgPool;

async fn register(app: &common::TestApp, email: &str, password: &str) -> serde_json::Value {
    let response = post_json(
        &app.router,
        "/api/v1/auth/register",
        json!({ "email": email, "password": password, "confirm_password": password }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn register_signs_the_user_in(pool: PgPool) {
    let app = common::build_test_app(pool);
    let json = register(&app, "Ana@Example.com ", "secret1").await;

    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["expires_in"], 15 * 60);
    assert_eq!(json["user"]["email"], "ana@example.com");

    let token = json["access_token"].as_str().unwrap();
    let me = body_json(get_auth(&app.router, "/api/v1/auth/me", token).await).await;
    assert_eq!(me["email"], "ana@example.com");
    assert_eq!(me["uid"], json["user"]["uid"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_email_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, "dup@example.com", "secret1").await;

    let response = post_json(
        &app.router,
        "/api/v1/auth/register",
        json!({ "email": "DUP@example.com", "password": "secret2", "confirm_password": "secret2" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "auth/email-already-in-use");
    assert_eq!(json["error"], "Email already registered");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn registration_form_errors_are_coded(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        &app.router,
        "/api/v1/auth/register",
        json!({ "email": "a@b.io", "password": "secret1", "confirm_password": "secret2" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "auth/password-mismatch");

    let response = post_json(
        &app.router,
        "/api/v1/auth/register",
        json!({ "email": "a@b.io", "password": "12345", "confirm_password": "12345" }),
    )
    .await;
    assert_eq!(body_json(response).await["code"], "auth/weak-password");

    let response = post_json(
        &app.router,
        "/api/v1/auth/register",
        json!({ "email": "not-an-email", "password": "secret1", "confirm_password": "secret1" }),
    )
    .await;
    assert_eq!(body_json(response).await["code"], "auth/invalid-email");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn wrong_password_and_unknown_email_look_the_same(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, "bo@example.com", "secret1").await;

    let wrong = post_json(
        &app.router,
        "/api/v1/auth/login",
        json!({ "email": "bo@example.com", "password": "nope123" }),
    )
    .await;
    let unknown = post_json(
        &app.router,
        "/api/v1/auth/login",
        json!({ "email": "nobody@example.com", "password": "secret1" }),
    )
    .await;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong).await, body_json(unknown).await);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn refresh_rotates_and_logout_revokes(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, "cy@example.com", "secret1").await;

    let login = post_json(
        &app.router,
        "/api/v1/auth/login",
        json!({ "email": "cy@example.com", "password": "secret1" }),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);
    let login = body_json(login).await;
    let refresh_token = login["refresh_token"].as_str().unwrap().to_string();

    let refreshed = post_json(
        &app.router,
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(refreshed.status(), StatusCode::OK);
    let refreshed = body_json(refreshed).await;

    // The old token was single-use.
    let replay = post_json(
        &app.router,
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let access = refreshed["access_token"].as_str().unwrap();
    let response = post_auth(&app.router, "/api/v1/auth/logout", access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let after_logout = post_json(
        &app.router,
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refreshed["refresh_token"] }),
    )
    .await;
    assert_eq!(after_logout.status(), StatusCode::UNAUTHORIZED);
}
