use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::schema;

/// Document metadata, without the stored bytes.
#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Serialize)]
#[diesel(table_name = schema::document)]
#[diesel(check_for_backend(Pg))]
pub struct DocumentMeta {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub course_id: Option<uuid::Uuid>,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub sha256: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Stored bytes of a document, loaded only for downloads.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schema::document)]
#[diesel(check_for_backend(Pg))]
pub struct DocumentContent {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::document)]
pub struct NewDocument<'a> {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub course_id: Option<uuid::Uuid>,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub size_bytes: i64,
    pub sha256: &'a str,
    pub content: &'a [u8],
}
