use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::schema;

/// Training programme students are enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Serialize)]
#[diesel(table_name = schema::formation)]
#[diesel(check_for_backend(Pg))]
pub struct Formation {
    pub id: uuid::Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::formation)]
pub struct NewFormation<'a> {
    pub id: uuid::Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::formation)]
pub struct FormationChangeset {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<Option<chrono::NaiveDate>>,
    pub end_date: Option<Option<chrono::NaiveDate>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
