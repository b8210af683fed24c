#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Inbox listing, read flags and administrator messages.

use salvo::http::StatusCode;
use serde_json::json;

use campus_db::db::enums::Role;

use super::helpers::{TestDb, TestRequest, login, require_db};

#[test_log::test(tokio::test)]
async fn test_send_to_role_and_read_flags() {
    let db = require_db!();
    db.seed_user(Role::Admin, "admin@campus.test").await;
    db.seed_user(Role::Teacher, "t1@campus.test").await;
    db.seed_user(Role::Teacher, "t2@campus.test").await;
    db.seed_user(Role::Student, "s1@campus.test").await;
    let service = db.service().await;
    let admin = login(&service, "admin@campus.test").await;

    for title in ["Réunion pédagogique", "Conseil de classe"] {
        let delivered = TestRequest::post("/api/notifications")
            .bearer(&admin)
            .json(&json!({ "role": "teacher", "title": title, "message": "Salle des profs, 17h" }))
            .send(&service)
            .await
            .assert_status(StatusCode::CREATED)
            .json();
        assert_eq!(delivered["delivered"], 2);
    }

    let teacher = login(&service, "t1@campus.test").await;
    let inbox = TestRequest::get("/api/notifications")
        .bearer(&teacher)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let inbox = inbox.as_array().expect("notification list").clone();
    assert_eq!(inbox.len(), 2);
    assert!(inbox.iter().all(|n| n["is_read"] == false));

    let first_id = inbox[0]["id"].as_str().expect("notification id");
    let read = TestRequest::post(&format!("/api/notifications/{first_id}/read"))
        .bearer(&teacher)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(read["is_read"], true);
    assert!(!read["read_at"].is_null());

    let unread = TestRequest::get("/api/notifications?unread=true")
        .bearer(&teacher)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(unread.as_array().map(Vec::len), Some(1));

    let updated = TestRequest::post("/api/notifications/read-all")
        .bearer(&teacher)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(updated["updated"], 1);

    let count = TestRequest::get("/api/notifications/unread-count")
        .bearer(&teacher)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(count["unread"], 0);

    let student = login(&service, "s1@campus.test").await;
    let student_count = TestRequest::get("/api/notifications/unread-count")
        .bearer(&student)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(student_count["unread"], 0);
}

#[test_log::test(tokio::test)]
async fn test_cannot_mark_someone_elses_notification() {
    let db = require_db!();
    db.seed_user(Role::Admin, "admin@campus.test").await;
    let target = db.seed_user(Role::Teacher, "t1@campus.test").await;
    db.seed_user(Role::Teacher, "t2@campus.test").await;
    let service = db.service().await;
    let admin = login(&service, "admin@campus.test").await;

    TestRequest::post("/api/notifications")
        .bearer(&admin)
        .json(&json!({ "user_id": target.id, "title": "Bonjour", "message": "Bienvenue" }))
        .send(&service)
        .await
        .assert_status(StatusCode::CREATED);

    let target_token = login(&service, "t1@campus.test").await;
    let inbox = TestRequest::get("/api/notifications")
        .bearer(&target_token)
        .send(&service)
        .await
        .json();
    let id = inbox[0]["id"].as_str().expect("notification id").to_string();

    let intruder = login(&service, "t2@campus.test").await;
    TestRequest::post(&format!("/api/notifications/{id}/read"))
        .bearer(&intruder)
        .send(&service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn test_send_requires_single_target_and_admin() {
    let db = require_db!();
    let admin_user = db.seed_user(Role::Admin, "admin@campus.test").await;
    db.seed_user(Role::Teacher, "teacher@campus.test").await;
    let service = db.service().await;
    let admin = login(&service, "admin@campus.test").await;
    let teacher = login(&service, "teacher@campus.test").await;

    TestRequest::post("/api/notifications")
        .bearer(&admin)
        .json(&json!({
            "user_id": admin_user.id,
            "role": "teacher",
            "title": "Ambigu",
            "message": "Deux cibles"
        }))
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    TestRequest::post("/api/notifications")
        .bearer(&teacher)
        .json(&json!({ "role": "student", "title": "Hello", "message": "World" }))
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
