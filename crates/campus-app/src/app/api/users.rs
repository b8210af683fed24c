//! Account administration, reserved to administrators by the role policy.

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::Deserialize;

use super::extract::{authorize, path_id};
use crate::config::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use campus_db::db::enums::Role;
use campus_db::model::user::User;
use campus_service::auth::activation::{self, ActivationTicket};
use campus_service::auth::{Action, Resource};
use campus_service::user::{self, CreateUser, CreatedUser, UpdateUser};

#[derive(Debug, Default, Deserialize)]
struct UserQuery {
    role: Option<Role>,
}

#[handler]
async fn list_users(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<User>>> {
    authorize(depot, Resource::Users, Action::Read)?;
    let query: UserQuery = req.parse_queries()?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(user::list(&mut conn, query.role).await?))
}

/// ## Summary
/// POST /api/users. Returns the account with its one-time activation link.
#[handler]
async fn create_user(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<CreatedUser>> {
    authorize(depot, Resource::Users, Action::Write)?;
    let body: CreateUser = req.parse_json().await?;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let created = user::create(&mut conn, &settings, &body).await?;
    res.status_code(StatusCode::CREATED);
    Ok(Json(created))
}

#[handler]
async fn get_user(req: &mut Request, depot: &mut Depot) -> AppResult<Json<User>> {
    authorize(depot, Resource::Users, Action::Read)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(user::get(&mut conn, id).await?))
}

#[handler]
async fn update_user(req: &mut Request, depot: &mut Depot) -> AppResult<Json<User>> {
    let actor = authorize(depot, Resource::Users, Action::Write)?;
    let id = path_id(req, "id")?;
    let body: UpdateUser = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(user::update(&mut conn, &actor.user, id, &body).await?))
}

#[handler]
async fn delete_user(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    let actor = authorize(depot, Resource::Users, Action::Delete)?;
    let id = path_id(req, "id")?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    user::delete(&mut conn, &actor.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/users/{id}/activation
#[handler]
async fn reissue_activation(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Json<ActivationTicket>> {
    authorize(depot, Resource::Users, Action::Write)?;
    let id = path_id(req, "id")?;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    Ok(Json(activation::reissue(&mut conn, &settings, id).await?))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("users")
        .get(list_users)
        .post(create_user)
        .push(
            Router::with_path("{id}")
                .get(get_user)
                .put(update_user)
                .delete(delete_user)
                .push(Router::with_path("activation").post(reissue_activation)),
        )
}
