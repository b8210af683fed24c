//! Login, logout, activation and password changes.

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Router, handler};
use serde::Deserialize;

use super::extract::current_user;
use crate::config::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;
use campus_db::model::user::User;
use campus_service::auth::{activation, authenticate};
use campus_service::auth::authenticate::LoginOutcome;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// ## Summary
/// POST /api/auth/login. Opens a session for valid credentials.
///
/// ## Errors
/// 401 for an unknown email, a wrong password or an inactive account alike.
#[handler]
async fn login(req: &mut Request, depot: &mut Depot) -> AppResult<Json<LoginOutcome>> {
    let body: LoginRequest = req.parse_json().await?;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let email = body.email.trim().to_lowercase();
    let outcome = authenticate::login(&mut conn, &settings, &email, &body.password).await?;
    Ok(Json(outcome))
}

/// POST /api/auth/logout
#[handler]
async fn logout(depot: &mut Depot) -> AppResult<StatusCode> {
    let actor = current_user(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    authenticate::logout(&mut conn, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
#[handler]
async fn me(depot: &mut Depot) -> AppResult<Json<User>> {
    Ok(Json(current_user(depot)?.user))
}

/// ## Summary
/// POST /api/auth/activate. Sets the first password of an account.
///
/// ## Errors
/// 400 for an unknown or expired token, or a password that is too short.
#[handler]
async fn activate(req: &mut Request, depot: &mut Depot) -> AppResult<Json<User>> {
    let body: ActivateRequest = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    let user = activation::activate(&mut conn, body.token.trim(), &body.password).await?;
    Ok(Json(user))
}

/// POST /api/auth/password
#[handler]
async fn change_password(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    let actor = current_user(depot)?;
    let body: ChangePasswordRequest = req.parse_json().await?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = provider.get_connection().await?;

    authenticate::change_password(&mut conn, &actor, &body.current_password, &body.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("auth")
        .push(Router::with_path("login").post(login))
        .push(Router::with_path("logout").post(logout))
        .push(Router::with_path("me").get(me))
        .push(Router::with_path("activate").post(activate))
        .push(Router::with_path("password").post(change_password))
}
