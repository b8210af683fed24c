//! Query functions for uploaded documents.

use diesel::dsl::{AsSelect, SqlTypeOf};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::document;
use crate::model::document::{DocumentContent, DocumentMeta, NewDocument};

type BoxedQuery<'a> = document::BoxedQuery<'a, Pg, SqlTypeOf<AsSelect<DocumentMeta, Pg>>>;

/// Which documents a listing may return.
#[derive(Debug, Clone)]
pub enum DocumentScope {
    All,
    /// Documents owned by `owner_id` or attached to one of `course_ids`.
    Visible {
        owner_id: uuid::Uuid,
        course_ids: Vec<uuid::Uuid>,
    },
}

/// ## Summary
/// Returns a query to select all document metadata, newest first.
#[must_use]
pub fn all() -> BoxedQuery<'static> {
    document::table
        .select(DocumentMeta::as_select())
        .order(document::created_at.desc())
        .into_boxed()
}

/// ## Summary
/// Returns a query restricted to a scope and, optionally, a course.
#[must_use]
pub fn scoped(scope: DocumentScope, course_id: Option<uuid::Uuid>) -> BoxedQuery<'static> {
    let mut query = all();
    if let DocumentScope::Visible {
        owner_id,
        course_ids,
    } = scope
    {
        query = query.filter(
            document::owner_id
                .eq(owner_id)
                .or(document::course_id.assume_not_null().eq_any(course_ids)),
        );
    }
    if let Some(course_id) = course_id {
        query = query.filter(document::course_id.eq(course_id));
    }
    query
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_documents(
    conn: &mut AsyncPgConnection,
    scope: DocumentScope,
    course_id: Option<uuid::Uuid>,
) -> QueryResult<Vec<DocumentMeta>> {
    scoped(scope, course_id).load(conn).await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_document(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> QueryResult<Option<DocumentMeta>> {
    all()
        .filter(document::id.eq(id))
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads the stored bytes of a document.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_content(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> QueryResult<Option<DocumentContent>> {
    document::table
        .filter(document::id.eq(id))
        .select(DocumentContent::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Stores a document and returns its metadata.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn insert_document(
    conn: &mut AsyncPgConnection,
    new_document: &NewDocument<'_>,
) -> QueryResult<DocumentMeta> {
    diesel::insert_into(document::table)
        .values(new_document)
        .returning(DocumentMeta::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_document(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<usize> {
    diesel::delete(document::table.filter(document::id.eq(id)))
        .execute(conn)
        .await
}
