use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::schema;

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Serialize)]
#[diesel(table_name = schema::course)]
#[diesel(check_for_backend(Pg))]
pub struct Course {
    pub id: uuid::Uuid,
    pub formation_id: uuid::Uuid,
    pub teacher_id: Option<uuid::Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::course)]
pub struct NewCourse<'a> {
    pub id: uuid::Uuid,
    pub formation_id: uuid::Uuid,
    pub teacher_id: Option<uuid::Uuid>,
    pub title: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::course)]
pub struct CourseChangeset {
    pub formation_id: Option<uuid::Uuid>,
    pub teacher_id: Option<Option<uuid::Uuid>>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Teaching unit within a course, ordered by `position`.
#[derive(
    Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations, Serialize,
)]
#[diesel(table_name = schema::course_module)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(Course, foreign_key = course_id))]
pub struct CourseModule {
    pub id: uuid::Uuid,
    pub course_id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub duration_hours: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::course_module)]
pub struct NewCourseModule<'a> {
    pub id: uuid::Uuid,
    pub course_id: uuid::Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub position: i32,
    pub duration_hours: Option<i32>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::course_module)]
pub struct CourseModuleChangeset {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub position: Option<i32>,
    pub duration_hours: Option<Option<i32>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
