//! Query functions for formations.

use diesel::dsl::{AsSelect, SqlTypeOf};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::formation;
use crate::model::formation::{Formation, FormationChangeset, NewFormation};

type BoxedQuery<'a> = formation::BoxedQuery<'a, Pg, SqlTypeOf<AsSelect<Formation, Pg>>>;

/// ## Summary
/// Returns a query to select all formations, ordered by name.
#[must_use]
pub fn all() -> BoxedQuery<'static> {
    formation::table
        .select(Formation::as_select())
        .order(formation::name.asc())
        .into_boxed()
}

/// ## Summary
/// Returns a query to find a formation by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> BoxedQuery<'static> {
    all().filter(formation::id.eq(id))
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_formations(conn: &mut AsyncPgConnection) -> QueryResult<Vec<Formation>> {
    all().load(conn).await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_formation(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> QueryResult<Option<Formation>> {
    by_id(id).first(conn).await.optional()
}

/// ## Summary
/// Inserts a formation and returns it.
///
/// ## Errors
/// Returns a database error if the insert fails (including duplicate names).
pub async fn create_formation(
    conn: &mut AsyncPgConnection,
    new_formation: &NewFormation<'_>,
) -> QueryResult<Formation> {
    diesel::insert_into(formation::table)
        .values(new_formation)
        .returning(Formation::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_formation(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    changes: &FormationChangeset,
) -> QueryResult<Option<Formation>> {
    diesel::update(formation::table.filter(formation::id.eq(id)))
        .set(changes)
        .returning(Formation::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Deletes a formation. Its courses and slots cascade; enrolled students keep
/// their profile with no formation.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_formation(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<usize> {
    diesel::delete(formation::table.filter(formation::id.eq(id)))
        .execute(conn)
        .await
}
