//! HTTP-level integration tests for login, registration, `/auth/me` and
//! role enforcement.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_user, get, get_auth, post_json, TEST_PASSWORD};
use falgate_db::repositories::UserRepo;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn login_returns_token_and_profile(pool: PgPool) {
    let user = create_user(&pool, "alice", false).await;
    let t = common::build_test_app(pool);

    let response = post_json(
        t.app(),
        "/api/v1/auth/login",
        json!({ "username": "alice", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert!(data["access_token"].is_string());
    assert_eq!(data["expires_in"], 3600);
    assert_eq!(data["user"]["id"], user.id);
    assert_eq!(data["user"]["username"], "alice");
    assert_eq!(data["user"]["role"], "user");
    assert_eq!(data["user"]["first_name"], "");
    assert!(data["user"].get("password_hash").is_none());

    // The issued token is accepted.
    let token = data["access_token"].as_str().unwrap();
    let me = get_auth(t.app(), "/api/v1/auth/me", token).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(body_json(me).await["data"]["username"], "alice");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn wrong_password_and_unknown_user_are_both_401(pool: PgPool) {
    create_user(&pool, "bob", false).await;
    let t = common::build_test_app(pool);

    let wrong = post_json(
        t.app(),
        "/api/v1/auth/login",
        json!({ "username": "bob", "password": "not-the-password" }),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let wrong_json = body_json(wrong).await;
    assert_eq!(wrong_json["code"], "UNAUTHORIZED");

    let unknown = post_json(
        t.app(),
        "/api/v1/auth/login",
        json!({ "username": "nobody", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(unknown).await["error"], wrong_json["error"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_without_credentials_is_400(pool: PgPool) {
    let t = common::build_test_app(pool);

    let response = post_json(t.app(), "/api/v1/auth/login", json!({ "username": "x" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn registration_is_disabled(pool: PgPool) {
    let t = common::build_test_app(pool.clone());

    let response = post_json(
        t.app(),
        "/api/v1/auth/register",
        json!({ "username": "mallory", "password": "whatever-long" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(UserRepo::find_by_username(&pool, "mallory")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn me_requires_a_valid_bearer_token(pool: PgPool) {
    let t = common::build_test_app(pool);

    let missing = get(t.app(), "/api/v1/auth/me").await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = get_auth(t.app(), "/api/v1/auth/me", "not.a.jwt").await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn user_token_cannot_reach_admin_routes(pool: PgPool) {
    let user = create_user(&pool, "carol", false).await;
    let t = common::build_test_app(pool);
    let token = t.token_for(&user);

    let response = get_auth(t.app(), "/api/v1/admin/users", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn revoked_admin_loses_access_before_token_expiry(pool: PgPool) {
    let admin = create_user(&pool, "dave", true).await;
    let t = common::build_test_app(pool.clone());
    let token = t.token_for(&admin);

    let before = get_auth(t.app(), "/api/v1/admin/users", &token).await;
    assert_eq!(before.status(), StatusCode::OK);

    UserRepo::set_admin(&pool, admin.id, false).await.unwrap();

    let after = get_auth(t.app(), "/api/v1/admin/users", &token).await;
    assert_eq!(after.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deleted_account_token_is_rejected(pool: PgPool) {
    let admin = create_user(&pool, "erin", true).await;
    let t = common::build_test_app(pool.clone());
    let token = t.token_for(&admin);

    UserRepo::delete(&pool, admin.id).await.unwrap();

    let admin_route = get_auth(t.app(), "/api/v1/admin/users", &token).await;
    assert_eq!(admin_route.status(), StatusCode::UNAUTHORIZED);

    let me = get_auth(t.app(), "/api/v1/auth/me", &token).await;
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
}
