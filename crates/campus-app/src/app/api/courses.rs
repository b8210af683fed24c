//! Courses and their ordered modules.

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};

use super::extract::{authorize, path_id};
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use campus_db::model::course::{Course, CourseModule};
use campus_service::auth::{Action, Resource};
use campus_service::course::{
    self, CourseQuery, CreateCourse, CreateModule, UpdateCourse, UpdateModule,
};

#[handler]
async fn list_courses(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<Course>>> {
    authorize(depot, Resource::Courses, Action::Read)?;
    let query: CourseQuery = req.parse_queries()?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(course::list(&mut conn, query).await?))
}

#[handler]
async fn create_course(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<Course>> {
    authorize(depot, Resource::Courses, Action::Write)?;
    let body: CreateCourse = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let created = course::create(&mut conn, &body).await?;
    res.status_code(StatusCode::CREATED);
    Ok(Json(created))
}

#[handler]
async fn get_course(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Course>> {
    authorize(depot, Resource::Courses, Action::Read)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(course::get(&mut conn, id).await?))
}

#[handler]
async fn update_course(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Course>> {
    authorize(depot, Resource::Courses, Action::Write)?;
    let id = path_id(req, "id")?;
    let body: UpdateCourse = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(course::update(&mut conn, id, &body).await?))
}

#[handler]
async fn delete_course(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    authorize(depot, Resource::Courses, Action::Delete)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    course::delete(&mut conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[handler]
async fn list_modules(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<CourseModule>>> {
    authorize(depot, Resource::Modules, Action::Read)?;
    let course_id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(course::list_modules(&mut conn, course_id).await?))
}

/// POST /api/courses/{id}/modules
#[handler]
async fn create_module(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<CourseModule>> {
    let actor = authorize(depot, Resource::Modules, Action::Write)?;
    let course_id = path_id(req, "id")?;
    let body: CreateModule = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let created = course::create_module(&mut conn, &actor.user, course_id, &body).await?;
    res.status_code(StatusCode::CREATED);
    Ok(Json(created))
}

#[handler]
async fn update_module(req: &mut Request, depot: &mut Depot) -> AppResult<Json<CourseModule>> {
    let actor = authorize(depot, Resource::Modules, Action::Write)?;
    let id = path_id(req, "id")?;
    let body: UpdateModule = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        course::update_module(&mut conn, &actor.user, id, &body).await?,
    ))
}

#[handler]
async fn delete_module(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    let actor = authorize(depot, Resource::Modules, Action::Delete)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    course::delete_module(&mut conn, &actor.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[must_use]
pub fn routes() -> Router {
    Router::new()
        .push(
            Router::with_path("courses")
                .get(list_courses)
                .post(create_course)
                .push(
                    Router::with_path("{id}")
                        .get(get_course)
                        .put(update_course)
                        .delete(delete_course)
                        .push(
                            Router::with_path("modules")
                                .get(list_modules)
                                .post(create_module),
                        ),
                ),
        )
        .push(
            Router::with_path("modules/{id}")
                .put(update_module)
                .delete(delete_module),
        )
}
