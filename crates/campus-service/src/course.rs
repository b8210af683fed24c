//! Courses and their modules.

use diesel_async::AsyncPgConnection;
use serde::Deserialize;

use campus_db::db::enums::Role;
use campus_db::db::query::course::{self as course_query, CourseFilter};
use campus_db::db::query::formation as formation_query;
use campus_db::model::course::{
    Course, CourseChangeset, CourseModule, CourseModuleChangeset, NewCourse, NewCourseModule,
};
use campus_db::model::user::User;

use crate::error::{ServiceError, ServiceResult};
use crate::patch::{double_option, optional_text, required_text};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CourseQuery {
    pub formation_id: Option<uuid::Uuid>,
    pub teacher_id: Option<uuid::Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourse {
    pub formation_id: uuid::Uuid,
    #[serde(default)]
    pub teacher_id: Option<uuid::Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourse {
    pub formation_id: Option<uuid::Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    pub teacher_id: Option<Option<uuid::Uuid>>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateModule {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub duration_hours: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateModule {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub position: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub duration_hours: Option<Option<i32>>,
}

/// ## Summary
/// Whether `actor` may edit the modules of `course`: administrators always,
/// teachers only for the courses they teach.
#[must_use]
pub fn can_edit_modules(actor: &User, course: &Course) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Teacher => course.teacher_id == Some(actor.id),
        Role::Student => false,
    }
}

fn validate_duration(duration_hours: Option<i32>) -> ServiceResult<()> {
    if duration_hours.is_some_and(|h| h < 0) {
        return Err(ServiceError::ValidationError(
            "La durée ne peut pas être négative".to_string(),
        ));
    }
    Ok(())
}

async fn require_formation(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> ServiceResult<()> {
    formation_query::get_formation(conn, id)
        .await?
        .map(|_formation| ())
        .ok_or_else(|| ServiceError::ValidationError("Formation introuvable".to_string()))
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list(conn: &mut AsyncPgConnection, query: CourseQuery) -> ServiceResult<Vec<Course>> {
    let filter = CourseFilter {
        formation_id: query.formation_id,
        teacher_id: query.teacher_id,
    };
    Ok(course_query::list_courses(conn, filter).await?)
}

/// ## Errors
/// Returns `NotFound` if the course does not exist.
pub async fn get(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> ServiceResult<Course> {
    course_query::get_course(conn, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("course {id}")))
}

/// ## Errors
/// `ValidationError` for a blank title, an unknown formation, or a
/// `teacher_id` that is not a teacher.
#[tracing::instrument(skip(conn, request), fields(formation_id = %request.formation_id))]
pub async fn create(conn: &mut AsyncPgConnection, request: &CreateCourse) -> ServiceResult<Course> {
    let title = required_text(&request.title, "titre")?;
    let description = optional_text(request.description.as_deref());
    require_formation(conn, request.formation_id).await?;
    if let Some(teacher_id) = request.teacher_id {
        crate::user::require_role(conn, teacher_id, Role::Teacher).await?;
    }

    let course = course_query::create_course(
        conn,
        &NewCourse {
            id: uuid::Uuid::now_v7(),
            formation_id: request.formation_id,
            teacher_id: request.teacher_id,
            title: &title,
            description: description.as_deref(),
        },
    )
    .await?;

    tracing::info!(course_id = %course.id, "Course created");
    Ok(course)
}

/// ## Errors
/// - `NotFound` if the course does not exist.
/// - `ValidationError` as for [`create`].
#[tracing::instrument(skip(conn, request))]
pub async fn update(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    request: &UpdateCourse,
) -> ServiceResult<Course> {
    if let Some(formation_id) = request.formation_id {
        require_formation(conn, formation_id).await?;
    }
    if let Some(Some(teacher_id)) = request.teacher_id {
        crate::user::require_role(conn, teacher_id, Role::Teacher).await?;
    }

    let changes = CourseChangeset {
        formation_id: request.formation_id,
        teacher_id: request.teacher_id,
        title: request
            .title
            .as_deref()
            .map(|v| required_text(v, "titre"))
            .transpose()?,
        description: request
            .description
            .as_ref()
            .map(|d| optional_text(d.as_deref())),
        updated_at: Some(chrono::Utc::now()),
    };

    course_query::update_course(conn, id, &changes)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("course {id}")))
}

/// ## Errors
/// Returns `NotFound` if the course does not exist.
#[tracing::instrument(skip(conn))]
pub async fn delete(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> ServiceResult<()> {
    if course_query::delete_course(conn, id).await? == 0 {
        return Err(ServiceError::NotFound(format!("course {id}")));
    }
    tracing::info!(course_id = %id, "Course deleted");
    Ok(())
}

/// ## Errors
/// Returns `NotFound` if the course does not exist.
pub async fn list_modules(
    conn: &mut AsyncPgConnection,
    course_id: uuid::Uuid,
) -> ServiceResult<Vec<CourseModule>> {
    get(conn, course_id).await?;
    Ok(course_query::list_modules(conn, course_id).await?)
}

/// ## Summary
/// Adds a module to a course; without a position it goes last.
///
/// ## Errors
/// - `NotFound` if the course does not exist.
/// - `AuthorizationError` if a teacher does not teach the course.
/// - `ValidationError` for a blank title or negative duration.
#[tracing::instrument(skip(conn, actor, request), fields(actor_id = %actor.id))]
pub async fn create_module(
    conn: &mut AsyncPgConnection,
    actor: &User,
    course_id: uuid::Uuid,
    request: &CreateModule,
) -> ServiceResult<CourseModule> {
    let course = get(conn, course_id).await?;
    if !can_edit_modules(actor, &course) {
        return Err(ServiceError::AuthorizationError(
            "Access denied: write on modules of a course taught by someone else".to_string(),
        ));
    }
    let title = required_text(&request.title, "titre")?;
    let description = optional_text(request.description.as_deref());
    validate_duration(request.duration_hours)?;

    let position = match request.position {
        Some(position) => position,
        None => course_query::max_module_position(conn, course_id)
            .await?
            .map_or(1, |last| last.saturating_add(1)),
    };

    let module = course_query::create_module(
        conn,
        &NewCourseModule {
            id: uuid::Uuid::now_v7(),
            course_id,
            title: &title,
            description: description.as_deref(),
            position,
            duration_hours: request.duration_hours,
        },
    )
    .await?;

    tracing::info!(module_id = %module.id, position, "Module created");
    Ok(module)
}

async fn editable_module(
    conn: &mut AsyncPgConnection,
    actor: &User,
    id: uuid::Uuid,
) -> ServiceResult<CourseModule> {
    let module = course_query::get_module(conn, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("module {id}")))?;
    let course = get(conn, module.course_id).await?;
    if !can_edit_modules(actor, &course) {
        return Err(ServiceError::AuthorizationError(
            "Access denied: write on modules of a course taught by someone else".to_string(),
        ));
    }
    Ok(module)
}

/// ## Errors
/// - `NotFound` if the module does not exist.
/// - `AuthorizationError` if a teacher does not teach the course.
/// - `ValidationError` for a blank title or negative duration.
#[tracing::instrument(skip(conn, actor, request), fields(actor_id = %actor.id))]
pub async fn update_module(
    conn: &mut AsyncPgConnection,
    actor: &User,
    id: uuid::Uuid,
    request: &UpdateModule,
) -> ServiceResult<CourseModule> {
    editable_module(conn, actor, id).await?;
    validate_duration(request.duration_hours.flatten())?;

    let changes = CourseModuleChangeset {
        title: request
            .title
            .as_deref()
            .map(|v| required_text(v, "titre"))
            .transpose()?,
        description: request
            .description
            .as_ref()
            .map(|d| optional_text(d.as_deref())),
        position: request.position,
        duration_hours: request.duration_hours,
        updated_at: Some(chrono::Utc::now()),
    };

    course_query::update_module(conn, id, &changes)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("module {id}")))
}

/// ## Errors
/// - `NotFound` if the module does not exist.
/// - `AuthorizationError` if a teacher does not teach the course.
#[tracing::instrument(skip(conn, actor), fields(actor_id = %actor.id))]
pub async fn delete_module(
    conn: &mut AsyncPgConnection,
    actor: &User,
    id: uuid::Uuid,
) -> ServiceResult<()> {
    editable_module(conn, actor, id).await?;
    course_query::delete_module(conn, id).await?;
    tracing::info!(module_id = %id, "Module deleted");
    Ok(())
}
