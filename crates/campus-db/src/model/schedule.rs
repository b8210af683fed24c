use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::schema;

/// One concrete class slot. Recurring entries are stored as independent
/// rows with no series reference.
#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Serialize)]
#[diesel(table_name = schema::schedule_slot)]
#[diesel(check_for_backend(Pg))]
pub struct ScheduleSlot {
    pub id: uuid::Uuid,
    pub course_id: uuid::Uuid,
    pub formation_id: uuid::Uuid,
    pub teacher_id: Option<uuid::Uuid>,
    pub room: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::schedule_slot)]
pub struct NewScheduleSlot<'a> {
    pub id: uuid::Uuid,
    pub course_id: uuid::Uuid,
    pub formation_id: uuid::Uuid,
    pub teacher_id: Option<uuid::Uuid>,
    pub room: &'a str,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::schedule_slot)]
pub struct ScheduleSlotChangeset {
    pub course_id: Option<uuid::Uuid>,
    pub formation_id: Option<uuid::Uuid>,
    pub teacher_id: Option<Option<uuid::Uuid>>,
    pub room: Option<String>,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
