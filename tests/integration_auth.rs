mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::*;

#[sqlx::test(migrations = "./migrations")]
async fn test_send_code_stores_hashed_code(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/send-code",
            None,
            json!({ "email": "  New.User@ClassHero.test " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let (hash, attempts): (String, i32) =
        sqlx::query_as("SELECT otp_hash, attempts FROM otps WHERE email = $1")
            .bind("new.user@classhero.test")
            .fetch_one(&pool)
            .await
            .unwrap();

    assert!(hash.starts_with("$2"));
    assert_eq!(attempts, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_code_creates_account_on_first_login(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    store_code(&pool, "first@classhero.test", "123456").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/verify-code",
            None,
            json!({ "email": "first@classhero.test", "code": "123456" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["user"]["email"], "first@classhero.test");
    assert_eq!(body["user"]["is_validated"], false);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM otps WHERE email = $1")
        .bind("first@classhero.test")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_existing_user_keeps_roles_on_login(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    create_user(&pool, "teacher@classhero.test", teacher()).await;
    store_code(&pool, "teacher@classhero.test", "654321").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/verify-code",
            None,
            json!({ "email": "teacher@classhero.test", "code": "654321" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["is_a_teacher"], true);
    assert_eq!(body["user"]["is_a_admin"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_wrong_code_counts_attempts(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    store_code(&pool, "guess@classhero.test", "111111").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/verify-code",
            None,
            json!({ "email": "guess@classhero.test", "code": "222222" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid or expired code");

    let attempts: i32 = sqlx::query_scalar("SELECT attempts FROM otps WHERE email = $1")
        .bind("guess@classhero.test")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(attempts, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_code_is_discarded_after_max_attempts(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    store_code(&pool, "locked@classhero.test", "111111").await;

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/verify-code",
                None,
                json!({ "email": "locked@classhero.test", "code": "999999" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // The right code no longer works once the record is gone.
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/verify-code",
            None,
            json!({ "email": "locked@classhero.test", "code": "111111" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_expired_code_is_rejected(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    store_code(&pool, "late@classhero.test", "123456").await;
    sqlx::query("UPDATE otps SET expires_at = NOW() - INTERVAL '1 minute' WHERE email = $1")
        .bind("late@classhero.test")
        .execute(&pool)
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/verify-code",
            None,
            json!({ "email": "late@classhero.test", "code": "123456" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_issues_new_pair(pool: sqlx::PgPool) {
    let app = setup_app(pool.clone());
    store_code(&pool, "refresh@classhero.test", "123456").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify-code",
            None,
            json!({ "email": "refresh@classhero.test", "code": "123456" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/refresh",
            None,
            json!({ "refresh_token": refresh_token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "refresh@classhero.test");

    let access_token = body["access_token"].as_str().unwrap().to_string();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/refresh",
            None,
            json!({ "refresh_token": access_token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
