//! Query functions for login sessions.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::{session, user_account};
use crate::model::session::{NewSession, Session};
use crate::model::user::User;

/// ## Summary
/// Inserts a new session and returns it.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_session(
    conn: &mut AsyncPgConnection,
    new_session: &NewSession<'_>,
) -> QueryResult<Session> {
    diesel::insert_into(session::table)
        .values(new_session)
        .returning(Session::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Finds the unexpired session with this token hash together with its active user.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find_active_session(
    conn: &mut AsyncPgConnection,
    token_hash: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> QueryResult<Option<(Session, User)>> {
    session::table
        .inner_join(user_account::table)
        .filter(session::token_hash.eq(token_hash))
        .filter(session::expires_at.gt(now))
        .filter(user_account::is_active.eq(true))
        .select((Session::as_select(), User::as_select()))
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Deletes a single session.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_session(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<usize> {
    diesel::delete(session::table.filter(session::id.eq(id)))
        .execute(conn)
        .await
}

/// ## Summary
/// Deletes every session of a user except `keep`, if given.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_user_sessions(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    keep: Option<uuid::Uuid>,
) -> QueryResult<usize> {
    let query = session::table
        .filter(session::user_id.eq(user_id))
        .into_boxed();
    let query = match keep {
        Some(keep) => query.filter(session::id.ne(keep)),
        None => query,
    };
    let ids: Vec<uuid::Uuid> = query.select(session::id).load(conn).await?;

    diesel::delete(session::table.filter(session::id.eq_any(ids)))
        .execute(conn)
        .await
}

/// ## Summary
/// Removes expired sessions.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn purge_expired(
    conn: &mut AsyncPgConnection,
    now: chrono::DateTime<chrono::Utc>,
) -> QueryResult<usize> {
    diesel::delete(session::table.filter(session::expires_at.le(now)))
        .execute(conn)
        .await
}
