//! Account administration.

use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection};
use serde::{Deserialize, Serialize};

use campus_core::config::Settings;
use campus_db::db::enums::Role;
use campus_db::db::query::{
    formation as formation_query, session as session_query, student as student_query,
    user as user_query,
};
use campus_db::model::student::NewStudentProfile;
use campus_db::model::user::{NewUser, User, UserChangeset};

use crate::auth::activation::{ActivationTicket, new_ticket};
use crate::error::{ServiceError, ServiceResult};
use crate::patch::required_text;

const EMAIL_TAKEN: &str = "Cette adresse e-mail est déjà utilisée";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(default)]
    pub formation_id: Option<uuid::Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// A new account with the activation credentials to pass on.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedUser {
    pub user: User,
    #[serde(flatten)]
    pub activation: ActivationTicket,
}

/// ## Summary
/// Normalizes and sanity-checks an email address.
///
/// ## Errors
/// Returns `ValidationError` if the value cannot be an address.
pub fn normalize_email(email: &str) -> ServiceResult<String> {
    let email = email.trim().to_lowercase();
    let valid = !email.contains(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        });
    if !valid {
        return Err(ServiceError::ValidationError(format!(
            "Adresse e-mail invalide : {email}"
        )));
    }
    Ok(email)
}

/// ## Summary
/// Loads a user and checks their role.
///
/// ## Errors
/// Returns `ValidationError` if the user does not exist or has another role.
pub async fn require_role(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    role: Role,
) -> ServiceResult<User> {
    match user_query::get_user(conn, user_id).await? {
        Some(user) if user.role == role => Ok(user),
        Some(_) | None => Err(ServiceError::ValidationError(format!(
            "L'utilisateur {user_id} n'a pas le rôle {role}"
        ))),
    }
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list(conn: &mut AsyncPgConnection, role: Option<Role>) -> ServiceResult<Vec<User>> {
    Ok(user_query::list_users(conn, role).await?)
}

/// ## Errors
/// Returns `NotFound` if the user does not exist.
pub async fn get(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> ServiceResult<User> {
    user_query::get_user(conn, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user {id}")))
}

/// ## Summary
/// Creates an inactive account with a fresh activation token. Students also
/// get an empty profile, enrolled in `formation_id` when given.
///
/// ## Side Effects
/// Inserts the account (and profile) in one transaction.
///
/// ## Errors
/// - `ValidationError` for a malformed email, blank names or an unknown formation.
/// - `Conflict` if the email is already used.
#[tracing::instrument(skip(conn, settings, request), fields(role = %request.role))]
pub async fn create(
    conn: &mut AsyncPgConnection,
    settings: &Settings,
    request: &CreateUser,
) -> ServiceResult<CreatedUser> {
    let email = normalize_email(&request.email)?;
    let first_name = required_text(&request.first_name, "prénom")?;
    let last_name = required_text(&request.last_name, "nom")?;
    let role = request.role;
    let formation_id = match role {
        Role::Student => request.formation_id,
        Role::Teacher | Role::Admin => None,
    };

    let (issued, activation) = new_ticket(settings);
    let token_hash = issued.hash;
    let expires_at = activation.expires_at;

    let user = conn
        .transaction::<_, ServiceError, _>(|tx| {
            async move {
                if let Some(formation_id) = formation_id {
                    formation_query::get_formation(tx, formation_id)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::ValidationError("Formation introuvable".to_string())
                        })?;
                }

                let user = user_query::create_user(
                    tx,
                    &NewUser {
                        id: uuid::Uuid::now_v7(),
                        email: &email,
                        first_name: &first_name,
                        last_name: &last_name,
                        role,
                        password_hash: None,
                        is_active: false,
                        activation_token_hash: Some(&token_hash),
                        activation_expires_at: Some(expires_at),
                    },
                )
                .await
                .map_err(|e| ServiceError::from(e).conflict_on_unique(EMAIL_TAKEN))?;

                if role == Role::Student {
                    student_query::create_profile(
                        tx,
                        &NewStudentProfile {
                            user_id: user.id,
                            formation_id,
                        },
                    )
                    .await?;
                }

                Ok(user)
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(user_id = %user.id, "User created");
    Ok(CreatedUser { user, activation })
}

/// ## Summary
/// Updates account fields.
///
/// ## Side Effects
/// Deactivating an account revokes all its sessions. Turning an account into
/// a student creates its profile if missing.
///
/// ## Errors
/// - `NotFound` if the user does not exist.
/// - `ValidationError` for malformed values, or an admin deactivating or
///   demoting themself.
/// - `Conflict` if the new email is already used.
#[tracing::instrument(skip(conn, actor, request), fields(actor_id = %actor.id))]
pub async fn update(
    conn: &mut AsyncPgConnection,
    actor: &User,
    id: uuid::Uuid,
    request: &UpdateUser,
) -> ServiceResult<User> {
    if actor.id == id
        && (request.is_active == Some(false) || request.role.is_some_and(|r| r != Role::Admin))
    {
        return Err(ServiceError::ValidationError(
            "Un administrateur ne peut pas se désactiver ni changer son propre rôle".to_string(),
        ));
    }

    let changes = UserChangeset {
        email: request.email.as_deref().map(normalize_email).transpose()?,
        first_name: request
            .first_name
            .as_deref()
            .map(|v| required_text(v, "prénom"))
            .transpose()?,
        last_name: request
            .last_name
            .as_deref()
            .map(|v| required_text(v, "nom"))
            .transpose()?,
        role: request.role,
        is_active: request.is_active,
        updated_at: Some(chrono::Utc::now()),
    };

    let user = conn
        .transaction::<_, ServiceError, _>(|tx| {
            async move {
                let user = user_query::update_user(tx, id, &changes)
                    .await
                    .map_err(|e| ServiceError::from(e).conflict_on_unique(EMAIL_TAKEN))?
                    .ok_or_else(|| ServiceError::NotFound(format!("user {id}")))?;

                if user.role == Role::Student
                    && student_query::get_student(tx, user.id).await?.is_none()
                {
                    student_query::create_profile(
                        tx,
                        &NewStudentProfile {
                            user_id: user.id,
                            formation_id: None,
                        },
                    )
                    .await?;
                }

                if !user.is_active {
                    let revoked = session_query::delete_user_sessions(tx, user.id, None).await?;
                    tracing::debug!(revoked, "Sessions revoked for inactive account");
                }
                Ok(user)
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(user_id = %user.id, "User updated");
    Ok(user)
}

/// ## Summary
/// Deletes an account and everything it owns.
///
/// ## Errors
/// - `ValidationError` if an admin tries to delete themself.
/// - `NotFound` if the user does not exist.
#[tracing::instrument(skip(conn, actor), fields(actor_id = %actor.id))]
pub async fn delete(
    conn: &mut AsyncPgConnection,
    actor: &User,
    id: uuid::Uuid,
) -> ServiceResult<()> {
    if actor.id == id {
        return Err(ServiceError::ValidationError(
            "Un administrateur ne peut pas supprimer son propre compte".to_string(),
        ));
    }
    if user_query::delete_user(conn, id).await? == 0 {
        return Err(ServiceError::NotFound(format!("user {id}")));
    }
    tracing::info!(user_id = %id, "User deleted");
    Ok(())
}
