use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};

use super::extract::{authorize, path_id};
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use campus_db::model::formation::Formation;
use campus_service::auth::{Action, Resource};
use campus_service::formation::{self, CreateFormation, UpdateFormation};

#[handler]
async fn list_formations(depot: &mut Depot) -> AppResult<Json<Vec<Formation>>> {
    authorize(depot, Resource::Formations, Action::Read)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(formation::list(&mut conn).await?))
}

#[handler]
async fn create_formation(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<Formation>> {
    authorize(depot, Resource::Formations, Action::Write)?;
    let body: CreateFormation = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let created = formation::create(&mut conn, &body).await?;
    res.status_code(StatusCode::CREATED);
    Ok(Json(created))
}

#[handler]
async fn get_formation(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Formation>> {
    authorize(depot, Resource::Formations, Action::Read)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(formation::get(&mut conn, id).await?))
}

#[handler]
async fn update_formation(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Formation>> {
    authorize(depot, Resource::Formations, Action::Write)?;
    let id = path_id(req, "id")?;
    let body: UpdateFormation = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(formation::update(&mut conn, id, &body).await?))
}

#[handler]
async fn delete_formation(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    authorize(depot, Resource::Formations, Action::Delete)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    formation::delete(&mut conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("formations")
        .get(list_formations)
        .post(create_formation)
        .push(
            Router::with_path("{id}")
                .get(get_formation)
                .put(update_formation)
                .delete(delete_formation),
        )
}
