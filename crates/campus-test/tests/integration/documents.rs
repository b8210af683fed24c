#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Document upload, visibility and download.

use salvo::http::StatusCode;

use campus_db::db::enums::Role;

use super::helpers::{TEST_MAX_UPLOAD_BYTES, TestDb, TestRequest, login, require_db};

#[test_log::test(tokio::test)]
async fn test_course_document_reaches_formation_students() {
    let db = require_db!();
    let teacher = db.seed_user(Role::Teacher, "teacher@campus.test").await;
    let formation = db.seed_formation("BTS SIO").await;
    let other_formation = db.seed_formation("Licence Pro").await;
    let course = db.seed_course(formation.id, Some(teacher.id), "Réseaux").await;
    db.seed_student("enrolled@campus.test", formation.id).await;
    db.seed_student("outsider@campus.test", other_formation.id).await;
    let service = db.service().await;
    let teacher_token = login(&service, "teacher@campus.test").await;

    let course_id = course.id.to_string();
    let stored = TestRequest::post("/api/documents")
        .bearer(&teacher_token)
        .multipart(
            "../../notes de cours é.pdf",
            "application/pdf",
            b"%PDF-1.7 fake",
            &[("course_id", &course_id)],
        )
        .send(&service)
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(stored["file_name"], "notes de cours é.pdf");
    assert_eq!(stored["size_bytes"], 13);
    let id = stored["id"].as_str().expect("document id").to_string();

    let enrolled = login(&service, "enrolled@campus.test").await;
    let listed = TestRequest::get("/api/documents")
        .bearer(&enrolled)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let unread = TestRequest::get("/api/notifications/unread-count")
        .bearer(&enrolled)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(unread["unread"], 1);

    let download = TestRequest::get(&format!("/api/documents/{id}/download"))
        .bearer(&enrolled)
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(download.body, b"%PDF-1.7 fake");
    assert_eq!(download.get_header("content-type"), Some("application/pdf"));
    assert_eq!(
        download.get_header("content-disposition"),
        Some("attachment; filename=\"notes de cours _.pdf\"; filename*=UTF-8''notes%20de%20cours%20%C3%A9.pdf")
    );

    let outsider = login(&service, "outsider@campus.test").await;
    TestRequest::get(&format!("/api/documents/{id}"))
        .bearer(&outsider)
        .send(&service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    TestRequest::get(&format!("/api/documents/{id}/download"))
        .bearer(&outsider)
        .send(&service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    TestRequest::delete(&format!("/api/documents/{id}"))
        .bearer(&enrolled)
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    TestRequest::delete(&format!("/api/documents/{id}"))
        .bearer(&teacher_token)
        .send(&service)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert_eq!(db.count("document").await, 0);
}

#[test_log::test(tokio::test)]
async fn test_oversized_upload_is_rejected() {
    let db = require_db!();
    db.seed_user(Role::Teacher, "teacher@campus.test").await;
    let service = db.service().await;
    let token = login(&service, "teacher@campus.test").await;

    let content = vec![b'x'; usize::try_from(TEST_MAX_UPLOAD_BYTES).expect("small limit") + 1];
    TestRequest::post("/api/documents")
        .bearer(&token)
        .multipart("big.bin", "application/octet-stream", &content, &[])
        .send(&service)
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(db.count("document").await, 0);
}

#[test_log::test(tokio::test)]
async fn test_empty_upload_is_rejected() {
    let db = require_db!();
    db.seed_user(Role::Teacher, "teacher@campus.test").await;
    let service = db.service().await;
    let token = login(&service, "teacher@campus.test").await;

    TestRequest::post("/api/documents")
        .bearer(&token)
        .multipart("empty.txt", "text/plain", b"", &[])
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn test_student_cannot_upload_to_foreign_course() {
    let db = require_db!();
    let formation = db.seed_formation("BTS SIO").await;
    let other_formation = db.seed_formation("Licence Pro").await;
    let foreign = db.seed_course(other_formation.id, None, "Droit").await;
    db.seed_student("student@campus.test", formation.id).await;
    let service = db.service().await;
    let token = login(&service, "student@campus.test").await;

    let course_id = foreign.id.to_string();
    TestRequest::post("/api/documents")
        .bearer(&token)
        .multipart("devoir.txt", "text/plain", b"hello", &[("course_id", &course_id)])
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let personal = TestRequest::post("/api/documents")
        .bearer(&token)
        .multipart("perso.txt", "text/plain", b"hello", &[])
        .send(&service)
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert!(personal["course_id"].is_null());
}
