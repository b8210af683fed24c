//! Account activation: new accounts start inactive with a one-time token the
//! user exchanges for a password.

use diesel_async::AsyncPgConnection;
use serde::Serialize;

use campus_core::config::Settings;
use campus_core::constants::ACTIVATION_UI_PATH;
use campus_db::db::query::user as user_query;
use campus_db::model::user::User;

use super::password::{hash_password, validate_new_password};
use super::token::{IssuedToken, hash_token, issue_token};
use crate::error::{ServiceError, ServiceResult};

/// Activation credentials handed to an administrator to pass on.
#[derive(Debug, Clone, Serialize)]
pub struct ActivationTicket {
    pub activation_token: String,
    pub activation_url: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// ## Summary
/// Generates an activation token and its expiry without storing it.
#[must_use]
pub fn new_ticket(settings: &Settings) -> (IssuedToken, ActivationTicket) {
    let issued = issue_token();
    let expires_at = chrono::Utc::now()
        + chrono::TimeDelta::hours(i64::from(settings.auth.activation_ttl_hours));
    let ticket = ActivationTicket {
        activation_url: activation_url(&settings.server.origin(), &issued.token),
        activation_token: issued.token.clone(),
        expires_at,
    };
    (issued, ticket)
}

/// ## Summary
/// Builds the link a user follows to activate their account.
#[must_use]
pub fn activation_url(origin: &str, token: &str) -> String {
    format!(
        "{}{ACTIVATION_UI_PATH}?token={token}",
        origin.trim_end_matches('/')
    )
}

/// ## Summary
/// Replaces the activation token of an inactive account.
///
/// ## Errors
/// - `NotFound` if the user does not exist.
/// - `Conflict` if the account is already active.
#[tracing::instrument(skip(conn, settings))]
pub async fn reissue(
    conn: &mut AsyncPgConnection,
    settings: &Settings,
    user_id: uuid::Uuid,
) -> ServiceResult<ActivationTicket> {
    let user = user_query::get_user(conn, user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user {user_id}")))?;
    if user.is_active {
        return Err(ServiceError::Conflict("Ce compte est déjà activé".to_string()));
    }

    let (issued, ticket) = new_ticket(settings);
    user_query::set_activation_token(conn, user.id, &issued.hash, ticket.expires_at).await?;
    tracing::info!(user_id = %user.id, "Activation token reissued");
    Ok(ticket)
}

/// ## Summary
/// Exchanges an activation token for a password and activates the account.
///
/// ## Errors
/// - `ValidationError` if the token is unknown or expired, or the password is too short.
#[tracing::instrument(skip(conn, token, password))]
pub async fn activate(
    conn: &mut AsyncPgConnection,
    token: &str,
    password: &str,
) -> ServiceResult<User> {
    let invalid =
        || ServiceError::ValidationError("Lien d'activation invalide ou expiré".to_string());

    let user = user_query::get_user_by_activation_token_hash(conn, &hash_token(token))
        .await?
        .ok_or_else(invalid)?;

    let now = chrono::Utc::now();
    if user.activation_expires_at.is_none_or(|expires| expires <= now) {
        return Err(invalid());
    }

    validate_new_password(password)?;
    let hash = hash_password(password)?;
    let user = user_query::set_password_and_activate(conn, user.id, &hash).await?;

    tracing::info!(user_id = %user.id, "Account activated");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_url() {
        assert_eq!(
            activation_url("https://campus.example.org/", "abc"),
            "https://campus.example.org/activate?token=abc"
        );
        assert_eq!(
            activation_url("http://127.0.0.1:8698", "xyz"),
            "http://127.0.0.1:8698/activate?token=xyz"
        );
    }
}
