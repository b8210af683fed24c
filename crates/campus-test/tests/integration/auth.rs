#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Login, logout, activation and password change through the API.

use salvo::http::StatusCode;
use serde_json::json;

use campus_db::db::enums::Role;
use campus_test::TEST_PASSWORD;

use super::helpers::{TestDb, TestRequest, login, require_db};

#[test_log::test(tokio::test)]
async fn test_login_returns_token_and_user() {
    let db = require_db!();
    let admin = db.seed_user(Role::Admin, "admin@campus.test").await;
    let service = db.service().await;

    let res = TestRequest::post("/api/auth/login")
        .json(&json!({ "email": "  Admin@Campus.TEST ", "password": TEST_PASSWORD }))
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    let body = res.json();
    assert!(!body["token"].as_str().unwrap_or_default().is_empty());
    assert_eq!(body["user"]["id"], json!(admin.id));
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().expect("token");
    let me = TestRequest::get("/api/auth/me")
        .bearer(token)
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(me.json()["email"], "admin@campus.test");
}

#[test_log::test(tokio::test)]
async fn test_bad_credentials_are_indistinguishable() {
    let db = require_db!();
    db.seed_user(Role::Teacher, "teacher@campus.test").await;
    let service = db.service().await;

    let wrong_password = TestRequest::post("/api/auth/login")
        .json(&json!({ "email": "teacher@campus.test", "password": "not the password" }))
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    let unknown_email = TestRequest::post("/api/auth/login")
        .json(&json!({ "email": "nobody@campus.test", "password": TEST_PASSWORD }))
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    assert_eq!(wrong_password.json(), unknown_email.json());
}

#[test_log::test(tokio::test)]
async fn test_activation_flow() {
    let db = require_db!();
    db.seed_user(Role::Admin, "admin@campus.test").await;
    let service = db.service().await;
    let admin_token = login(&service, "admin@campus.test").await;

    let created = TestRequest::post("/api/users")
        .bearer(&admin_token)
        .json(&json!({
            "email": "new.teacher@campus.test",
            "first_name": "Grace",
            "last_name": "Hopper",
            "role": "teacher"
        }))
        .send(&service)
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(created["user"]["is_active"], false);
    let activation_token = created["activation_token"]
        .as_str()
        .expect("activation token")
        .to_string();
    assert!(
        created["activation_url"]
            .as_str()
            .unwrap_or_default()
            .starts_with("https://campus.test/")
    );

    // Inactive accounts cannot log in yet.
    TestRequest::post("/api/auth/login")
        .json(&json!({ "email": "new.teacher@campus.test", "password": TEST_PASSWORD }))
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let activated = TestRequest::post("/api/auth/activate")
        .json(&json!({ "token": activation_token, "password": TEST_PASSWORD }))
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(activated.json()["is_active"], true);

    login(&service, "new.teacher@campus.test").await;

    // The token is single use.
    TestRequest::post("/api/auth/activate")
        .json(&json!({ "token": activation_token, "password": TEST_PASSWORD }))
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn test_logout_invalidates_token() {
    let db = require_db!();
    db.seed_user(Role::Student, "student@campus.test").await;
    let service = db.service().await;
    let token = login(&service, "student@campus.test").await;

    TestRequest::post("/api/auth/logout")
        .bearer(&token)
        .send(&service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    TestRequest::get("/api/auth/me")
        .bearer(&token)
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn test_password_change_revokes_other_sessions() {
    let db = require_db!();
    db.seed_user(Role::Teacher, "teacher@campus.test").await;
    let service = db.service().await;
    let current = login(&service, "teacher@campus.test").await;
    let other = login(&service, "teacher@campus.test").await;

    TestRequest::post("/api/auth/password")
        .bearer(&current)
        .json(&json!({
            "current_password": TEST_PASSWORD,
            "new_password": "an even longer passphrase"
        }))
        .send(&service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    TestRequest::get("/api/auth/me")
        .bearer(&current)
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    TestRequest::get("/api/auth/me")
        .bearer(&other)
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    TestRequest::post("/api/auth/login")
        .json(&json!({ "email": "teacher@campus.test", "password": "an even longer passphrase" }))
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
}
