//! Student directory and profiles.

use salvo::writing::Json;
use salvo::{Depot, Request, Router, handler};
use serde::Deserialize;

use super::extract::{authorize, path_id};
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use campus_db::model::student::Student;
use campus_service::auth::{Action, Resource};
use campus_service::student::{self, UpdateStudent};

#[derive(Debug, Default, Deserialize)]
struct StudentQuery {
    formation_id: Option<uuid::Uuid>,
}

/// GET /api/students, for teachers and administrators.
#[handler]
async fn list_students(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<Student>>> {
    let actor = authorize(depot, Resource::Students, Action::Read)?;
    let query: StudentQuery = req.parse_queries()?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        student::list(&mut conn, &actor.user, query.formation_id).await?,
    ))
}

#[handler]
async fn my_profile(depot: &mut Depot) -> AppResult<Json<Student>> {
    let actor = authorize(depot, Resource::Students, Action::Read)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(student::me(&mut conn, &actor.user).await?))
}

#[handler]
async fn get_student(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Student>> {
    let actor = authorize(depot, Resource::Students, Action::Read)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(student::get(&mut conn, &actor.user, id).await?))
}

/// ## Summary
/// PUT /api/students/{id}. Students edit their contact fields; only
/// administrators move a student to another formation.
#[handler]
async fn update_student(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Student>> {
    let actor = authorize(depot, Resource::Students, Action::Write)?;
    let id = path_id(req, "id")?;
    let body: UpdateStudent = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(student::update(&mut conn, &actor.user, id, &body).await?))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("students")
        .get(list_students)
        .push(Router::with_path("me").get(my_profile))
        .push(
            Router::with_path("{id}")
                .get(get_student)
                .put(update_student),
        )
}
