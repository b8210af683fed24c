#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Role and ownership checks across resources.

use salvo::http::StatusCode;
use serde_json::json;

use campus_db::db::enums::Role;

use super::helpers::{TestDb, TestRequest, login, require_db};

#[test_log::test(tokio::test)]
async fn test_teacher_cannot_create_slots() {
    let db = require_db!();
    let teacher = db.seed_user(Role::Teacher, "teacher@campus.test").await;
    let formation = db.seed_formation("BTS SIO").await;
    let course = db.seed_course(formation.id, Some(teacher.id), "Réseaux").await;
    let service = db.service().await;
    let token = login(&service, "teacher@campus.test").await;

    TestRequest::post("/api/schedule")
        .bearer(&token)
        .json(&json!({
            "course_id": course.id,
            "room": "B12",
            "start_time": "2025-09-02T09:00:00",
            "end_time": "2025-09-02T11:00:00"
        }))
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    TestRequest::get("/api/schedule")
        .bearer(&token)
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
}

#[test_log::test(tokio::test)]
async fn test_student_cannot_list_students_or_users() {
    let db = require_db!();
    let formation = db.seed_formation("BTS SIO").await;
    let student = db.seed_student("student@campus.test", formation.id).await;
    let service = db.service().await;
    let token = login(&service, "student@campus.test").await;

    TestRequest::get("/api/students")
        .bearer(&token)
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    TestRequest::get("/api/users")
        .bearer(&token)
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let me = TestRequest::get("/api/students/me")
        .bearer(&token)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(me["id"], json!(student.id));
    assert_eq!(me["profile"]["formation_id"], json!(formation.id));
}

#[test_log::test(tokio::test)]
async fn test_student_cannot_read_another_profile() {
    let db = require_db!();
    let formation = db.seed_formation("BTS SIO").await;
    db.seed_student("alice@campus.test", formation.id).await;
    let bob = db.seed_student("bob@campus.test", formation.id).await;
    let service = db.service().await;
    let token = login(&service, "alice@campus.test").await;

    TestRequest::get(&format!("/api/students/{}", bob.id))
        .bearer(&token)
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn test_teacher_edits_only_modules_of_own_courses() {
    let db = require_db!();
    let owner = db.seed_user(Role::Teacher, "owner@campus.test").await;
    db.seed_user(Role::Teacher, "other@campus.test").await;
    let formation = db.seed_formation("BTS SIO").await;
    let course = db.seed_course(formation.id, Some(owner.id), "Réseaux").await;
    let service = db.service().await;
    let owner_token = login(&service, "owner@campus.test").await;
    let other_token = login(&service, "other@campus.test").await;

    let first = TestRequest::post(&format!("/api/courses/{}/modules", course.id))
        .bearer(&owner_token)
        .json(&json!({ "title": "Modèle OSI", "duration_hours": 6 }))
        .send(&service)
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(first["position"], 1);
    let second = TestRequest::post(&format!("/api/courses/{}/modules", course.id))
        .bearer(&owner_token)
        .json(&json!({ "title": "Routage" }))
        .send(&service)
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(second["position"], 2);

    TestRequest::post(&format!("/api/courses/{}/modules", course.id))
        .bearer(&other_token)
        .json(&json!({ "title": "Intrus" }))
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let module_id = first["id"].as_str().expect("module id");
    TestRequest::put(&format!("/api/modules/{module_id}"))
        .bearer(&other_token)
        .json(&json!({ "title": "Renommé" }))
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    TestRequest::delete(&format!("/api/modules/{module_id}"))
        .bearer(&other_token)
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    TestRequest::delete(&format!("/api/modules/{module_id}"))
        .bearer(&owner_token)
        .send(&service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let remaining = TestRequest::get(&format!("/api/courses/{}/modules", course.id))
        .bearer(&other_token)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(remaining.as_array().map(Vec::len), Some(1));
}

#[test_log::test(tokio::test)]
async fn test_duplicate_email_conflicts() {
    let db = require_db!();
    db.seed_user(Role::Admin, "admin@campus.test").await;
    db.seed_user(Role::Teacher, "teacher@campus.test").await;
    let service = db.service().await;
    let token = login(&service, "admin@campus.test").await;

    TestRequest::post("/api/users")
        .bearer(&token)
        .json(&json!({
            "email": "Teacher@Campus.test",
            "first_name": "Dup",
            "last_name": "Licate",
            "role": "teacher"
        }))
        .send(&service)
        .await
        .assert_status(StatusCode::CONFLICT);
}
