//! Query functions for user accounts.

use diesel::dsl::{AsSelect, SqlTypeOf};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::enums::Role;
use crate::db::schema::user_account;
use crate::model::user::{NewUser, User, UserChangeset};

type BoxedQuery<'a> = user_account::BoxedQuery<'a, Pg, SqlTypeOf<AsSelect<User, Pg>>>;

/// ## Summary
/// Returns a query to select all users, ordered by name.
#[must_use]
pub fn all() -> BoxedQuery<'static> {
    user_account::table
        .select(User::as_select())
        .order((user_account::last_name.asc(), user_account::first_name.asc()))
        .into_boxed()
}

/// ## Summary
/// Returns a query to find a user by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> BoxedQuery<'static> {
    all().filter(user_account::id.eq(id))
}

/// ## Summary
/// Returns a query to find a user by email (case-insensitive).
#[must_use]
pub fn by_email(email: &str) -> BoxedQuery<'_> {
    all().filter(user_account::email.eq(email.trim().to_lowercase()))
}

/// ## Summary
/// Returns a query to find users with a role.
#[must_use]
pub fn by_role(role: Role) -> BoxedQuery<'static> {
    all().filter(user_account::role.eq(role))
}

/// ## Summary
/// Returns a query to find the inactive user holding an activation token hash.
#[must_use]
pub fn by_activation_token_hash(token_hash: &str) -> BoxedQuery<'_> {
    all()
        .filter(user_account::activation_token_hash.eq(token_hash))
        .filter(user_account::is_active.eq(false))
}

/// ## Summary
/// Retrieves a user by ID.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_user(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<Option<User>> {
    by_id(id).first(conn).await.optional()
}

/// ## Summary
/// Retrieves a user by email.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_user_by_email(
    conn: &mut AsyncPgConnection,
    email: &str,
) -> QueryResult<Option<User>> {
    by_email(email).first(conn).await.optional()
}

/// ## Summary
/// Lists users, optionally restricted to a role.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_users(conn: &mut AsyncPgConnection, role: Option<Role>) -> QueryResult<Vec<User>> {
    match role {
        Some(role) => by_role(role).load(conn).await,
        None => all().load(conn).await,
    }
}

/// ## Summary
/// Inserts a new user and returns the inserted record.
///
/// ## Errors
/// Returns a database error if the insert fails (including duplicate emails).
pub async fn create_user(conn: &mut AsyncPgConnection, new_user: &NewUser<'_>) -> QueryResult<User> {
    diesel::insert_into(user_account::table)
        .values(new_user)
        .returning(User::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Applies a partial update and returns the updated record.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_user(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    changes: &UserChangeset,
) -> QueryResult<Option<User>> {
    diesel::update(user_account::table.filter(user_account::id.eq(id)))
        .set(changes)
        .returning(User::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Replaces the activation token of an inactive account.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn set_activation_token(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    token_hash: &str,
    expires_at: chrono::DateTime<chrono::Utc>,
) -> QueryResult<usize> {
    diesel::update(
        user_account::table
            .filter(user_account::id.eq(id))
            .filter(user_account::is_active.eq(false)),
    )
    .set((
        user_account::activation_token_hash.eq(token_hash),
        user_account::activation_expires_at.eq(expires_at),
        user_account::updated_at.eq(chrono::Utc::now()),
    ))
    .execute(conn)
    .await
}

/// ## Summary
/// Sets the password hash, activates the account and clears any activation token.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn set_password_and_activate(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    password_hash: &str,
) -> QueryResult<User> {
    diesel::update(user_account::table.filter(user_account::id.eq(id)))
        .set((
            user_account::password_hash.eq(password_hash),
            user_account::is_active.eq(true),
            user_account::activation_token_hash.eq(None::<String>),
            user_account::activation_expires_at.eq(None::<chrono::DateTime<chrono::Utc>>),
            user_account::updated_at.eq(chrono::Utc::now()),
        ))
        .returning(User::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Deletes a user; dependent rows cascade.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_user(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<usize> {
    diesel::delete(user_account::table.filter(user_account::id.eq(id)))
        .execute(conn)
        .await
}

/// ## Summary
/// Returns the IDs of every user with a role.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn ids_by_role(conn: &mut AsyncPgConnection, role: Role) -> QueryResult<Vec<uuid::Uuid>> {
    user_account::table
        .filter(user_account::role.eq(role))
        .select(user_account::id)
        .load(conn)
        .await
}

/// ## Summary
/// Retrieves the inactive user holding an activation token hash.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_user_by_activation_token_hash(
    conn: &mut AsyncPgConnection,
    token_hash: &str,
) -> QueryResult<Option<User>> {
    by_activation_token_hash(token_hash)
        .first(conn)
        .await
        .optional()
}
