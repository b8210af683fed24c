//! Per-user notification inbox, read by polling.

use diesel_async::AsyncPgConnection;
use serde::{Deserialize, Serialize};

use campus_db::db::enums::Role;
use campus_db::db::query::{notification as notification_query, user as user_query};
use campus_db::model::notification::{NewNotification, Notification};

use crate::error::{ServiceError, ServiceResult};
use crate::patch::{optional_text, required_text};

/// Administrator message addressed to one user or to every user of a role.
#[derive(Debug, Clone, Deserialize)]
pub struct SendNotification {
    pub user_id: Option<uuid::Uuid>,
    pub role: Option<Role>,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Delivered {
    pub delivered: usize,
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    unread_only: bool,
) -> ServiceResult<Vec<Notification>> {
    Ok(notification_query::list_for_user(conn, user_id, unread_only).await?)
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn unread_count(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
) -> ServiceResult<UnreadCount> {
    Ok(UnreadCount {
        unread: notification_query::unread_count(conn, user_id).await?,
    })
}

/// ## Summary
/// Marks one of the caller's notifications as read.
///
/// ## Errors
/// Returns `NotFound` if the notification does not exist or belongs to someone else.
pub async fn mark_read(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    id: uuid::Uuid,
) -> ServiceResult<Notification> {
    notification_query::mark_read(conn, user_id, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("notification {id}")))
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn mark_all_read(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
) -> ServiceResult<usize> {
    Ok(notification_query::mark_all_read(conn, user_id).await?)
}

/// ## Summary
/// Delivers the same notification to each recipient.
///
/// ## Errors
/// Returns a database error if the insert fails.
#[tracing::instrument(skip(conn, recipients, message, link), fields(recipients = recipients.len()))]
pub async fn notify_users(
    conn: &mut AsyncPgConnection,
    recipients: &[uuid::Uuid],
    title: &str,
    message: &str,
    link: Option<&str>,
) -> ServiceResult<usize> {
    let rows: Vec<NewNotification> = recipients
        .iter()
        .map(|user_id| NewNotification {
            id: uuid::Uuid::now_v7(),
            user_id: *user_id,
            title: title.to_string(),
            message: message.to_string(),
            link: link.map(str::to_string),
        })
        .collect();

    let inserted = notification_query::insert_notifications(conn, &rows).await?;
    tracing::debug!(inserted, "Notifications delivered");
    Ok(inserted)
}

/// ## Summary
/// Sends an administrator message.
///
/// ## Errors
/// - `ValidationError` unless exactly one of `user_id`/`role` is given and
///   title and message are non-blank.
/// - `NotFound` if `user_id` matches no account.
pub async fn send(
    conn: &mut AsyncPgConnection,
    request: SendNotification,
) -> ServiceResult<Delivered> {
    let title = required_text(&request.title, "titre")?;
    let message = required_text(&request.message, "message")?;
    let link = optional_text(request.link.as_deref());

    let recipients = match (request.user_id, request.role) {
        (Some(user_id), None) => {
            user_query::get_user(conn, user_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("user {user_id}")))?;
            vec![user_id]
        }
        (None, Some(role)) => user_query::ids_by_role(conn, role).await?,
        _ => {
            return Err(ServiceError::ValidationError(
                "Indiquez soit un destinataire, soit un rôle".to_string(),
            ));
        }
    };

    let delivered = notify_users(conn, &recipients, &title, &message, link.as_deref()).await?;
    Ok(Delivered { delivered })
}
