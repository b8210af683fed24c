//! Student profiles.

use chrono::NaiveDate;
use diesel_async::AsyncPgConnection;
use serde::Deserialize;

use campus_db::db::enums::Role;
use campus_db::db::query::{formation as formation_query, student as student_query};
use campus_db::model::student::{Student, StudentProfileChangeset};
use campus_db::model::user::User;

use crate::error::{ServiceError, ServiceResult};
use crate::patch::{double_option, optional_text};

/// Profile edit. Students may change their contact fields; only an
/// administrator may change the enrolment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStudent {
    #[serde(default, deserialize_with = "double_option")]
    pub formation_id: Option<Option<uuid::Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub emergency_contact: Option<Option<String>>,
}

/// ## Summary
/// Whether `actor` may see the profile of student `student_id`.
#[must_use]
pub fn can_view(actor: &User, student_id: uuid::Uuid) -> bool {
    match actor.role {
        Role::Admin | Role::Teacher => true,
        Role::Student => actor.id == student_id,
    }
}

/// ## Summary
/// Whether `actor` may apply `update` to student `student_id`.
#[must_use]
pub fn can_update(actor: &User, student_id: uuid::Uuid, update: &UpdateStudent) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Student => actor.id == student_id && update.formation_id.is_none(),
        Role::Teacher => false,
    }
}

/// ## Errors
/// Returns `AuthorizationError` for student callers.
pub async fn list(
    conn: &mut AsyncPgConnection,
    actor: &User,
    formation_id: Option<uuid::Uuid>,
) -> ServiceResult<Vec<Student>> {
    if actor.role == Role::Student {
        return Err(ServiceError::AuthorizationError(
            "Access denied: read on the student directory".to_string(),
        ));
    }
    Ok(student_query::list_students(conn, formation_id).await?)
}

/// ## Errors
/// - `AuthorizationError` if a student asks for someone else's profile.
/// - `NotFound` if no student has this ID.
pub async fn get(
    conn: &mut AsyncPgConnection,
    actor: &User,
    id: uuid::Uuid,
) -> ServiceResult<Student> {
    if !can_view(actor, id) {
        return Err(ServiceError::AuthorizationError(
            "Access denied: read on another student's profile".to_string(),
        ));
    }
    student_query::get_student(conn, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("student {id}")))
}

/// ## Errors
/// Returns `NotFound` if the caller has no student profile.
pub async fn me(conn: &mut AsyncPgConnection, actor: &User) -> ServiceResult<Student> {
    student_query::get_student(conn, actor.id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("student profile".to_string()))
}

/// ## Errors
/// - `AuthorizationError` if the caller may not make this change.
/// - `ValidationError` for an unknown formation.
/// - `NotFound` if no student has this ID.
#[tracing::instrument(skip(conn, actor, update), fields(actor_id = %actor.id))]
pub async fn update(
    conn: &mut AsyncPgConnection,
    actor: &User,
    id: uuid::Uuid,
    update: &UpdateStudent,
) -> ServiceResult<Student> {
    if !can_update(actor, id, update) {
        return Err(ServiceError::AuthorizationError(
            "Access denied: write on student profile".to_string(),
        ));
    }

    if let Some(Some(formation_id)) = update.formation_id {
        formation_query::get_formation(conn, formation_id)
            .await?
            .ok_or_else(|| ServiceError::ValidationError("Formation introuvable".to_string()))?;
    }

    let text = |field: &Option<Option<String>>| field.as_ref().map(|v| optional_text(v.as_deref()));
    let changes = StudentProfileChangeset {
        formation_id: update.formation_id,
        phone: text(&update.phone),
        address: text(&update.address),
        birth_date: update.birth_date,
        emergency_contact: text(&update.emergency_contact),
        updated_at: Some(chrono::Utc::now()),
    };

    student_query::update_profile(conn, id, &changes)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("student {id}")))?;

    tracing::info!(student_id = %id, "Student profile updated");
    student_query::get_student(conn, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("student {id}")))
}
