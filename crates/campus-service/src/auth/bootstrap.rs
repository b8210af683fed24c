use diesel_async::AsyncPgConnection;

use campus_core::config::Settings;
use campus_db::db::enums::Role;
use campus_db::db::query::user as user_query;
use campus_db::model::user::{NewUser, User};

use super::password::{hash_password, validate_new_password};
use crate::error::ServiceResult;

/// ## Summary
/// Creates the configured administrator if no account uses its email yet.
///
/// Returns the created user, or `None` when nothing was configured or the
/// account already exists. An existing account is left untouched.
///
/// ## Side Effects
/// May insert an active admin account.
///
/// ## Errors
/// Returns an error if the configured password is too short or the insert fails.
#[tracing::instrument(skip(conn, settings))]
pub async fn ensure_bootstrap_admin(
    conn: &mut AsyncPgConnection,
    settings: &Settings,
) -> ServiceResult<Option<User>> {
    let Some(admin) = settings.auth.bootstrap_admin.as_ref() else {
        tracing::debug!("No bootstrap admin configured");
        return Ok(None);
    };

    if let Some(existing) = user_query::get_user_by_email(conn, &admin.email).await? {
        tracing::debug!(user_id = %existing.id, "Bootstrap admin already exists");
        return Ok(None);
    }

    validate_new_password(&admin.password)?;
    let password_hash = hash_password(&admin.password)?;
    let email = admin.email.trim().to_lowercase();

    let user = user_query::create_user(
        conn,
        &NewUser {
            id: uuid::Uuid::now_v7(),
            email: &email,
            first_name: admin.first_name.trim(),
            last_name: admin.last_name.trim(),
            role: Role::Admin,
            password_hash: Some(&password_hash),
            is_active: true,
            activation_token_hash: None,
            activation_expires_at: None,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, user_email = %user.email, "Bootstrap admin created");
    Ok(Some(user))
}
