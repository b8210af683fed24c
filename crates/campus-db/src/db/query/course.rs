//! Query functions for courses and their modules.

use diesel::dsl::{AsSelect, SqlTypeOf, max};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::{course, course_module};
use crate::model::course::{
    Course, CourseChangeset, CourseModule, CourseModuleChangeset, NewCourse, NewCourseModule,
};

type BoxedQuery<'a> = course::BoxedQuery<'a, Pg, SqlTypeOf<AsSelect<Course, Pg>>>;

/// Optional filters for [`list_courses`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CourseFilter {
    pub formation_id: Option<uuid::Uuid>,
    pub teacher_id: Option<uuid::Uuid>,
}

/// ## Summary
/// Returns a query to select all courses, ordered by title.
#[must_use]
pub fn all() -> BoxedQuery<'static> {
    course::table
        .select(Course::as_select())
        .order(course::title.asc())
        .into_boxed()
}

/// ## Summary
/// Returns a query to find a course by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> BoxedQuery<'static> {
    all().filter(course::id.eq(id))
}

/// ## Summary
/// Returns a query to select courses matching a filter.
#[must_use]
pub fn filtered(filter: CourseFilter) -> BoxedQuery<'static> {
    let mut query = all();
    if let Some(formation_id) = filter.formation_id {
        query = query.filter(course::formation_id.eq(formation_id));
    }
    if let Some(teacher_id) = filter.teacher_id {
        query = query.filter(course::teacher_id.eq(teacher_id));
    }
    query
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_courses(
    conn: &mut AsyncPgConnection,
    filter: CourseFilter,
) -> QueryResult<Vec<Course>> {
    filtered(filter).load(conn).await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_course(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<Option<Course>> {
    by_id(id).first(conn).await.optional()
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_course(
    conn: &mut AsyncPgConnection,
    new_course: &NewCourse<'_>,
) -> QueryResult<Course> {
    diesel::insert_into(course::table)
        .values(new_course)
        .returning(Course::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_course(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    changes: &CourseChangeset,
) -> QueryResult<Option<Course>> {
    diesel::update(course::table.filter(course::id.eq(id)))
        .set(changes)
        .returning(Course::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Deletes a course together with its modules, slots and documents.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_course(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<usize> {
    diesel::delete(course::table.filter(course::id.eq(id)))
        .execute(conn)
        .await
}

/// ## Summary
/// Lists the modules of a course in display order.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_modules(
    conn: &mut AsyncPgConnection,
    course_id: uuid::Uuid,
) -> QueryResult<Vec<CourseModule>> {
    course_module::table
        .filter(course_module::course_id.eq(course_id))
        .select(CourseModule::as_select())
        .order((course_module::position.asc(), course_module::created_at.asc()))
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_module(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> QueryResult<Option<CourseModule>> {
    course_module::table
        .filter(course_module::id.eq(id))
        .select(CourseModule::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Returns the highest module position used in a course.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn max_module_position(
    conn: &mut AsyncPgConnection,
    course_id: uuid::Uuid,
) -> QueryResult<Option<i32>> {
    course_module::table
        .filter(course_module::course_id.eq(course_id))
        .select(max(course_module::position))
        .first(conn)
        .await
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_module(
    conn: &mut AsyncPgConnection,
    new_module: &NewCourseModule<'_>,
) -> QueryResult<CourseModule> {
    diesel::insert_into(course_module::table)
        .values(new_module)
        .returning(CourseModule::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_module(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    changes: &CourseModuleChangeset,
) -> QueryResult<Option<CourseModule>> {
    diesel::update(course_module::table.filter(course_module::id.eq(id)))
        .set(changes)
        .returning(CourseModule::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_module(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<usize> {
    diesel::delete(course_module::table.filter(course_module::id.eq(id)))
        .execute(conn)
        .await
}
