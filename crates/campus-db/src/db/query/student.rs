//! Query functions for student profiles.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::enums::Role;
use crate::db::schema::{student_profile, user_account};
use crate::model::student::{NewStudentProfile, Student, StudentProfile, StudentProfileChangeset};
use crate::model::user::User;

fn into_student((user, profile): (User, StudentProfile)) -> Student {
    Student { user, profile }
}

/// ## Summary
/// Lists students with their profile, optionally restricted to a formation.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_students(
    conn: &mut AsyncPgConnection,
    formation_id: Option<uuid::Uuid>,
) -> QueryResult<Vec<Student>> {
    let mut query = user_account::table
        .inner_join(student_profile::table)
        .filter(user_account::role.eq(Role::Student))
        .select((User::as_select(), StudentProfile::as_select()))
        .order((user_account::last_name.asc(), user_account::first_name.asc()))
        .into_boxed();

    if let Some(formation_id) = formation_id {
        query = query.filter(student_profile::formation_id.eq(formation_id));
    }

    let rows: Vec<(User, StudentProfile)> = query.load(conn).await?;
    Ok(rows.into_iter().map(into_student).collect())
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_student(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
) -> QueryResult<Option<Student>> {
    let row: Option<(User, StudentProfile)> = user_account::table
        .inner_join(student_profile::table)
        .filter(user_account::id.eq(user_id))
        .select((User::as_select(), StudentProfile::as_select()))
        .first(conn)
        .await
        .optional()?;
    Ok(row.map(into_student))
}

/// ## Summary
/// Creates the (empty) profile of a student account.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_profile(
    conn: &mut AsyncPgConnection,
    new_profile: &NewStudentProfile,
) -> QueryResult<StudentProfile> {
    diesel::insert_into(student_profile::table)
        .values(new_profile)
        .returning(StudentProfile::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_profile(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    changes: &StudentProfileChangeset,
) -> QueryResult<Option<StudentProfile>> {
    diesel::update(student_profile::table.filter(student_profile::user_id.eq(user_id)))
        .set(changes)
        .returning(StudentProfile::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Returns the formation a student is enrolled in, if any.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn formation_of(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
) -> QueryResult<Option<uuid::Uuid>> {
    let formation: Option<Option<uuid::Uuid>> = student_profile::table
        .filter(student_profile::user_id.eq(user_id))
        .select(student_profile::formation_id)
        .first(conn)
        .await
        .optional()?;
    Ok(formation.flatten())
}

/// ## Summary
/// Returns the account IDs of every student enrolled in a formation.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn ids_in_formation(
    conn: &mut AsyncPgConnection,
    formation_id: uuid::Uuid,
) -> QueryResult<Vec<uuid::Uuid>> {
    student_profile::table
        .filter(student_profile::formation_id.eq(formation_id))
        .select(student_profile::user_id)
        .load(conn)
        .await
}
