//! Notification inbox of the caller, and administrator broadcasts.

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::{Deserialize, Serialize};

use super::extract::{authorize, path_id};
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use campus_db::model::notification::Notification;
use campus_service::auth::{Action, Resource};
use campus_service::notification::{self, Delivered, SendNotification, UnreadCount};

#[derive(Debug, Default, Deserialize)]
struct InboxQuery {
    #[serde(default)]
    unread: bool,
}

#[derive(Debug, Serialize)]
struct Updated {
    updated: usize,
}

#[handler]
async fn list_notifications(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Json<Vec<Notification>>> {
    let actor = authorize(depot, Resource::Notifications, Action::Read)?;
    let query: InboxQuery = req.parse_queries()?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(
        notification::list(&mut conn, actor.user.id, query.unread).await?,
    ))
}

#[handler]
async fn unread_count(depot: &mut Depot) -> AppResult<Json<UnreadCount>> {
    let actor = authorize(depot, Resource::Notifications, Action::Read)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(notification::unread_count(&mut conn, actor.user.id).await?))
}

#[handler]
async fn mark_read(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Notification>> {
    let actor = authorize(depot, Resource::Notifications, Action::Read)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(notification::mark_read(&mut conn, actor.user.id, id).await?))
}

#[handler]
async fn mark_all_read(depot: &mut Depot) -> AppResult<Json<Updated>> {
    let actor = authorize(depot, Resource::Notifications, Action::Read)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let updated = notification::mark_all_read(&mut conn, actor.user.id).await?;
    Ok(Json(Updated { updated }))
}

/// POST /api/notifications, administrators only.
#[handler]
async fn send_notification(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<Delivered>> {
    authorize(depot, Resource::Notifications, Action::Write)?;
    let body: SendNotification = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let delivered = notification::send(&mut conn, body).await?;
    res.status_code(StatusCode::CREATED);
    Ok(Json(delivered))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("notifications")
        .get(list_notifications)
        .post(send_notification)
        .push(Router::with_path("unread-count").get(unread_count))
        .push(Router::with_path("read-all").post(mark_all_read))
        .push(Router::with_path("{id}/read").post(mark_read))
}
