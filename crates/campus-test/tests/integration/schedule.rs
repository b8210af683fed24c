#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Recurring slot creation, previews and schedule visibility.

use salvo::http::StatusCode;
use serde_json::{Value, json};

use campus_db::db::enums::Role;

use super::helpers::{TestDb, TestRequest, login, require_db};

struct Fixture {
    service: salvo::Service,
    admin_token: String,
    course_id: uuid::Uuid,
    formation_id: uuid::Uuid,
    teacher_id: uuid::Uuid,
}

async fn fixture(db: &TestDb) -> Fixture {
    db.seed_user(Role::Admin, "admin@campus.test").await;
    let teacher = db.seed_user(Role::Teacher, "teacher@campus.test").await;
    let formation = db.seed_formation("BTS SIO").await;
    let course = db
        .seed_course(formation.id, Some(teacher.id), "Réseaux")
        .await;
    let service = db.service().await;
    let admin_token = login(&service, "admin@campus.test").await;
    Fixture {
        service,
        admin_token,
        course_id: course.id,
        formation_id: formation.id,
        teacher_id: teacher.id,
    }
}

fn starts(body: &Value) -> Vec<String> {
    body["created"]
        .as_array()
        .expect("created array")
        .iter()
        .map(|slot| {
            slot["start_time"]
                .as_str()
                .expect("start time")
                .to_string()
        })
        .collect()
}

#[test_log::test(tokio::test)]
async fn test_weekly_series_is_created_and_teacher_notified() {
    let db = require_db!();
    let fx = fixture(&db).await;

    let res = TestRequest::post("/api/schedule")
        .bearer(&fx.admin_token)
        .json(&json!({
            "course_id": fx.course_id,
            "room": "B12",
            "start_time": "2025-09-02T09:00:00",
            "end_time": "2025-09-02T11:00:00",
            "is_recurring": true,
            "recurrence_type": "weekly",
            "recurrence_count": 4
        }))
        .send(&fx.service)
        .await
        .assert_status(StatusCode::CREATED);
    let body = res.json();

    assert_eq!(body["requested"], 4);
    assert_eq!(body["skipped"], 0);
    assert_eq!(body["failed"], 0);
    assert_eq!(
        starts(&body),
        [
            "2025-09-02T09:00:00+02:00",
            "2025-09-09T09:00:00+02:00",
            "2025-09-16T09:00:00+02:00",
            "2025-09-23T09:00:00+02:00",
        ]
    );
    for slot in body["created"].as_array().expect("created array") {
        assert_eq!(slot["formation_id"], json!(fx.formation_id));
        assert_eq!(slot["teacher_id"], json!(fx.teacher_id));
    }
    assert_eq!(db.count("schedule_slot").await, 4);

    let teacher_token = login(&fx.service, "teacher@campus.test").await;
    let unread = TestRequest::get("/api/notifications/unread-count")
        .bearer(&teacher_token)
        .send(&fx.service)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(unread.json()["unread"], 1);
}

#[test_log::test(tokio::test)]
async fn test_monthly_series_skips_missing_days() {
    let db = require_db!();
    let fx = fixture(&db).await;

    let res = TestRequest::post("/api/schedule")
        .bearer(&fx.admin_token)
        .json(&json!({
            "course_id": fx.course_id,
            "room": "Amphi A",
            "start_time": "2025-01-31T14:00:00",
            "end_time": "2025-01-31T16:00:00",
            "is_recurring": true,
            "recurrence_type": "monthly",
            "recurrence_mode": "date",
            "recurrence_count": 4
        }))
        .send(&fx.service)
        .await
        .assert_status(StatusCode::CREATED);
    let body = res.json();

    assert_eq!(body["requested"], 4);
    assert_eq!(body["skipped"], 2);
    assert_eq!(
        starts(&body),
        ["2025-01-31T14:00:00+01:00", "2025-03-31T14:00:00+02:00"]
    );
}

#[test_log::test(tokio::test)]
async fn test_occurrence_in_dst_gap_is_skipped() {
    let db = require_db!();
    let fx = fixture(&db).await;

    let res = TestRequest::post("/api/schedule")
        .bearer(&fx.admin_token)
        .json(&json!({
            "course_id": fx.course_id,
            "room": "B12",
            "start_time": "2025-03-23T02:30:00",
            "end_time": "2025-03-23T03:30:00",
            "is_recurring": true,
            "recurrence_type": "weekly",
            "recurrence_count": 3
        }))
        .send(&fx.service)
        .await
        .assert_status(StatusCode::CREATED);
    let body = res.json();

    assert_eq!(body["requested"], 3);
    assert_eq!(body["skipped"], 1);
    assert_eq!(
        starts(&body),
        ["2025-03-23T02:30:00+01:00", "2025-04-06T02:30:00+02:00"]
    );
}

#[test_log::test(tokio::test)]
async fn test_single_slot_in_dst_gap_is_rejected() {
    let db = require_db!();
    let fx = fixture(&db).await;

    TestRequest::post("/api/schedule")
        .bearer(&fx.admin_token)
        .json(&json!({
            "course_id": fx.course_id,
            "room": "B12",
            "start_time": "2025-03-30T02:30:00",
            "end_time": "2025-03-30T03:30:00"
        }))
        .send(&fx.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(db.count("schedule_slot").await, 0);
}

#[test_log::test(tokio::test)]
async fn test_validation_errors() {
    let db = require_db!();
    let fx = fixture(&db).await;

    for body in [
        json!({
            "room": "B12",
            "start_time": "2025-09-02T09:00:00",
            "end_time": "2025-09-02T11:00:00"
        }),
        json!({
            "course_id": fx.course_id,
            "room": "   ",
            "start_time": "2025-09-02T09:00:00",
            "end_time": "2025-09-02T11:00:00"
        }),
        json!({
            "course_id": fx.course_id,
            "room": "B12",
            "start_time": "2025-09-02T11:00:00",
            "end_time": "2025-09-02T11:00:00"
        }),
        json!({
            "course_id": uuid::Uuid::now_v7(),
            "room": "B12",
            "start_time": "2025-09-02T09:00:00",
            "end_time": "2025-09-02T11:00:00"
        }),
    ] {
        TestRequest::post("/api/schedule")
            .bearer(&fx.admin_token)
            .json(&body)
            .send(&fx.service)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
    assert_eq!(db.count("schedule_slot").await, 0);
}

#[test_log::test(tokio::test)]
async fn test_preview_does_not_persist() {
    let db = require_db!();
    let fx = fixture(&db).await;

    let res = TestRequest::post("/api/schedule/preview")
        .bearer(&fx.admin_token)
        .json(&json!({
            "course_id": fx.course_id,
            "room": "B12",
            "start_time": "2025-09-02T09:00:00",
            "end_time": "2025-09-02T11:00:00",
            "is_recurring": true,
            "recurrence_type": "biweekly",
            "recurrence_count": 3
        }))
        .send(&fx.service)
        .await
        .assert_status(StatusCode::OK);
    let body = res.json();

    assert_eq!(body["requested"], 3);
    assert_eq!(
        body["instances"][2]["start_time"],
        "2025-09-30T09:00:00"
    );
    assert_eq!(db.count("schedule_slot").await, 0);
}

#[test_log::test(tokio::test)]
async fn test_count_is_clamped_to_configured_cap() {
    let db = require_db!();
    let fx = fixture(&db).await;

    let res = TestRequest::post("/api/schedule/preview")
        .bearer(&fx.admin_token)
        .json(&json!({
            "start_time": "2025-09-02T09:00:00",
            "end_time": "2025-09-02T11:00:00",
            "is_recurring": true,
            "recurrence_count": 1000
        }))
        .send(&fx.service)
        .await
        .assert_status(StatusCode::OK);
    let body = res.json();

    assert_eq!(body["requested"], 52);
    assert_eq!(body["instances"].as_array().map(Vec::len), Some(52));
}

#[test_log::test(tokio::test)]
async fn test_student_sees_only_own_formation() {
    let db = require_db!();
    let fx = fixture(&db).await;
    let other_formation = db.seed_formation("Licence Pro").await;
    let other_course = db.seed_course(other_formation.id, None, "Droit").await;
    db.seed_student("student@campus.test", fx.formation_id).await;

    for course_id in [fx.course_id, other_course.id] {
        TestRequest::post("/api/schedule")
            .bearer(&fx.admin_token)
            .json(&json!({
                "course_id": course_id,
                "room": "C3",
                "start_time": "2025-10-06T08:00:00",
                "end_time": "2025-10-06T10:00:00"
            }))
            .send(&fx.service)
            .await
            .assert_status(StatusCode::CREATED);
    }

    let student_token = login(&fx.service, "student@campus.test").await;
    let slots = TestRequest::get("/api/schedule")
        .bearer(&student_token)
        .send(&fx.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let slots = slots.as_array().expect("slot list");
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["course_id"], json!(fx.course_id));

    let all = TestRequest::get("/api/schedule")
        .bearer(&fx.admin_token)
        .send(&fx.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(all.as_array().map(Vec::len), Some(2));
}

#[test_log::test(tokio::test)]
async fn test_update_and_delete_slot() {
    let db = require_db!();
    let fx = fixture(&db).await;

    let created = TestRequest::post("/api/schedule")
        .bearer(&fx.admin_token)
        .json(&json!({
            "course_id": fx.course_id,
            "room": "B12",
            "start_time": "2025-09-02T09:00:00",
            "end_time": "2025-09-02T11:00:00"
        }))
        .send(&fx.service)
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    let id = created["created"][0]["id"].as_str().expect("slot id").to_string();

    let updated = TestRequest::put(&format!("/api/schedule/{id}"))
        .bearer(&fx.admin_token)
        .json(&json!({ "room": "D4", "end_time": "2025-09-02T12:00:00" }))
        .send(&fx.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(updated["room"], "D4");
    assert_eq!(updated["end_time"], "2025-09-02T12:00:00+02:00");

    TestRequest::put(&format!("/api/schedule/{id}"))
        .bearer(&fx.admin_token)
        .json(&json!({ "end_time": "2025-09-02T08:00:00" }))
        .send(&fx.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    TestRequest::delete(&format!("/api/schedule/{id}"))
        .bearer(&fx.admin_token)
        .send(&fx.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    TestRequest::get(&format!("/api/schedule/{id}"))
        .bearer(&fx.admin_token)
        .send(&fx.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
