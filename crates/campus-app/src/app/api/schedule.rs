//! Schedule slots, including recurring creation.

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};

use super::extract::{authorize, path_id};
use crate::config::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use campus_service::auth::{Action, Resource};
use campus_service::schedule::batch::BatchOutcome;
use campus_service::schedule::service::{
    self as schedule, Preview, ScheduleRequest, SlotQuery, SlotUpdate, SlotView,
};

/// Status of a batch creation: created when anything was stored.
#[must_use]
pub fn batch_status<T>(outcome: &BatchOutcome<T>) -> StatusCode {
    if outcome.any_created() {
        StatusCode::CREATED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

#[handler]
async fn list_slots(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<SlotView>>> {
    let actor = authorize(depot, Resource::Schedule, Action::Read)?;
    let query: SlotQuery = req.parse_queries()?;
    let settings = get_config_from_depot(depot)?;
    let tz = settings.schedule.tz()?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        schedule::list(&mut conn, tz, &actor.user, &query).await?,
    ))
}

/// POST /api/schedule/preview. Runs the generator without storing anything.
#[handler]
async fn preview_slots(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Preview>> {
    authorize(depot, Resource::Schedule, Action::Write)?;
    let body: ScheduleRequest = req.parse_json().await?;
    let settings = get_config_from_depot(depot)?;

    Ok(Json(schedule::preview(&settings, &body)?))
}

/// ## Summary
/// POST /api/schedule. Creates a slot or a recurring series.
///
/// Answers 201 when at least one slot was stored and 422 when none were;
/// the body always carries the created slots and the counters.
#[handler]
async fn create_slots(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<BatchOutcome<SlotView>>> {
    authorize(depot, Resource::Schedule, Action::Write)?;
    let body: ScheduleRequest = req.parse_json().await?;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;

    let outcome = schedule::create(&*provider, &settings, &body).await?;
    res.status_code(batch_status(&outcome));
    Ok(Json(outcome))
}

#[handler]
async fn get_slot(req: &mut Request, depot: &mut Depot) -> AppResult<Json<SlotView>> {
    authorize(depot, Resource::Schedule, Action::Read)?;
    let id = path_id(req, "id")?;
    let settings = get_config_from_depot(depot)?;
    let tz = settings.schedule.tz()?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(schedule::get(&mut conn, tz, id).await?))
}

#[handler]
async fn update_slot(req: &mut Request, depot: &mut Depot) -> AppResult<Json<SlotView>> {
    authorize(depot, Resource::Schedule, Action::Write)?;
    let id = path_id(req, "id")?;
    let body: SlotUpdate = req.parse_json().await?;
    let settings = get_config_from_depot(depot)?;
    let tz = settings.schedule.tz()?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(schedule::update(&mut conn, tz, id, &body).await?))
}

#[handler]
async fn delete_slot(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    authorize(depot, Resource::Schedule, Action::Delete)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    schedule::delete(&mut conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("schedule")
        .get(list_slots)
        .post(create_slots)
        .push(Router::with_path("preview").post(preview_slots))
        .push(
            Router::with_path("{id}")
                .get(get_slot)
                .put(update_slot)
                .delete(delete_slot),
        )
}
