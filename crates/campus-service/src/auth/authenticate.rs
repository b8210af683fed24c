//! Session-based authentication: login, bearer resolution, logout and
//! password changes.

use diesel_async::AsyncPgConnection;
use serde::Serialize;

use campus_core::config::Settings;
use campus_db::db::query::{session as session_query, user as user_query};
use campus_db::model::session::NewSession;
use campus_db::model::user::User;

use super::depot::AuthenticatedUser;
use super::password::{hash_password, validate_new_password, verify_password};
use super::token::{hash_token, issue_token, parse_bearer};
use crate::error::{ServiceError, ServiceResult};

/// Returned once to a client that logged in.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub user: User,
}

/// ## Summary
/// Resolves the bearer token of a request to its user and session.
///
/// ## Errors
/// Returns `NotAuthenticated` if the header is missing or malformed, or the
/// token matches no unexpired session of an active user.
#[tracing::instrument(skip(req, conn))]
pub async fn authenticate(
    req: &salvo::Request,
    conn: &mut AsyncPgConnection,
) -> ServiceResult<AuthenticatedUser> {
    let token = req
        .headers()
        .get(salvo::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
        .ok_or(ServiceError::NotAuthenticated)?;

    authenticate_token(conn, token).await
}

/// ## Summary
/// Resolves a raw session token to its user and session.
///
/// ## Errors
/// Returns `NotAuthenticated` if no valid session matches.
pub async fn authenticate_token(
    conn: &mut AsyncPgConnection,
    token: &str,
) -> ServiceResult<AuthenticatedUser> {
    let found =
        session_query::find_active_session(conn, &hash_token(token), chrono::Utc::now()).await?;

    match found {
        Some((session, user)) => {
            tracing::trace!(user_id = %user.id, session_id = %session.id, "Session resolved");
            Ok(AuthenticatedUser {
                user,
                session_id: session.id,
            })
        }
        None => Err(ServiceError::NotAuthenticated),
    }
}

/// ## Summary
/// Checks credentials and opens a new session.
///
/// Unknown email, wrong password and inactive account all fail the same way.
///
/// ## Side Effects
/// Inserts a session row.
///
/// ## Errors
/// Returns `NotAuthenticated` on bad credentials, or a database error.
#[tracing::instrument(skip(conn, settings, password))]
pub async fn login(
    conn: &mut AsyncPgConnection,
    settings: &Settings,
    email: &str,
    password: &str,
) -> ServiceResult<LoginOutcome> {
    let user = user_query::get_user_by_email(conn, email)
        .await?
        .filter(|user| user.is_active)
        .ok_or(ServiceError::NotAuthenticated)?;

    let stored_hash = user
        .password_hash
        .as_deref()
        .ok_or(ServiceError::NotAuthenticated)?;
    verify_password(password, stored_hash)?;

    let issued = issue_token();
    let expires_at =
        chrono::Utc::now() + chrono::TimeDelta::hours(i64::from(settings.auth.session_ttl_hours));

    let session = session_query::create_session(
        conn,
        &NewSession {
            id: uuid::Uuid::now_v7(),
            user_id: user.id,
            token_hash: &issued.hash,
            expires_at,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, session_id = %session.id, "User logged in");

    Ok(LoginOutcome {
        token: issued.token,
        expires_at,
        user,
    })
}

/// ## Summary
/// Ends the caller's current session.
///
/// ## Errors
/// Returns a database error if the delete fails.
#[tracing::instrument(skip(conn, actor), fields(user_id = %actor.user.id))]
pub async fn logout(conn: &mut AsyncPgConnection, actor: &AuthenticatedUser) -> ServiceResult<()> {
    session_query::delete_session(conn, actor.session_id).await?;
    tracing::debug!("Session closed");
    Ok(())
}

/// ## Summary
/// Changes the caller's password after checking the current one.
///
/// ## Side Effects
/// Revokes every other session of the caller.
///
/// ## Errors
/// - `NotAuthenticated` if the current password is wrong.
/// - `ValidationError` if the new password is too short.
#[tracing::instrument(
    skip(conn, actor, current_password, new_password),
    fields(user_id = %actor.user.id)
)]
pub async fn change_password(
    conn: &mut AsyncPgConnection,
    actor: &AuthenticatedUser,
    current_password: &str,
    new_password: &str,
) -> ServiceResult<()> {
    let stored_hash = actor
        .user
        .password_hash
        .as_deref()
        .ok_or(ServiceError::NotAuthenticated)?;
    verify_password(current_password, stored_hash)?;
    validate_new_password(new_password)?;

    let new_hash = hash_password(new_password)?;
    user_query::set_password_and_activate(conn, actor.user.id, &new_hash).await?;

    let revoked =
        session_query::delete_user_sessions(conn, actor.user.id, Some(actor.session_id)).await?;
    tracing::info!(revoked_sessions = revoked, "Password changed");
    Ok(())
}
