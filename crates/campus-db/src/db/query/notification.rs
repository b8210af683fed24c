//! Query functions for the notification inbox.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::notification;
use crate::model::notification::{NewNotification, Notification};

/// ## Summary
/// Lists a user's notifications, newest first.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_for_user(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    unread_only: bool,
) -> QueryResult<Vec<Notification>> {
    let mut query = notification::table
        .filter(notification::user_id.eq(user_id))
        .select(Notification::as_select())
        .order(notification::created_at.desc())
        .into_boxed();
    if unread_only {
        query = query.filter(notification::is_read.eq(false));
    }
    query.load(conn).await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn unread_count(conn: &mut AsyncPgConnection, user_id: uuid::Uuid) -> QueryResult<i64> {
    notification::table
        .filter(notification::user_id.eq(user_id))
        .filter(notification::is_read.eq(false))
        .count()
        .get_result(conn)
        .await
}

/// ## Summary
/// Marks one of the user's notifications as read. Already-read notifications
/// keep their first `read_at`.
///
/// ## Errors
/// Returns a database error if a query fails.
pub async fn mark_read(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    id: uuid::Uuid,
) -> QueryResult<Option<Notification>> {
    let updated = diesel::update(
        notification::table
            .filter(notification::id.eq(id))
            .filter(notification::user_id.eq(user_id))
            .filter(notification::is_read.eq(false)),
    )
        .set((
            notification::is_read.eq(true),
            notification::read_at.eq(chrono::Utc::now()),
        ))
        .returning(Notification::as_returning())
        .get_result(conn)
        .await
        .optional()?;

    match updated {
        Some(row) => Ok(Some(row)),
        None => notification::table
            .filter(notification::id.eq(id))
            .filter(notification::user_id.eq(user_id))
            .select(Notification::as_select())
            .first(conn)
            .await
            .optional(),
    }
}

/// ## Summary
/// Marks every unread notification of a user as read.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn mark_all_read(conn: &mut AsyncPgConnection, user_id: uuid::Uuid) -> QueryResult<usize> {
    diesel::update(
        notification::table
            .filter(notification::user_id.eq(user_id))
            .filter(notification::is_read.eq(false)),
    )
    .set((
        notification::is_read.eq(true),
        notification::read_at.eq(chrono::Utc::now()),
    ))
    .execute(conn)
    .await
}

/// ## Summary
/// Inserts a batch of notifications.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn insert_notifications(
    conn: &mut AsyncPgConnection,
    rows: &[NewNotification],
) -> QueryResult<usize> {
    if rows.is_empty() {
        return Ok(0);
    }
    diesel::insert_into(notification::table)
        .values(rows)
        .execute(conn)
        .await
}
