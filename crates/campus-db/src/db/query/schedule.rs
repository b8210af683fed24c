//! Query functions for schedule slots.

use diesel::dsl::{AsSelect, SqlTypeOf};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::schedule_slot;
use crate::model::schedule::{NewScheduleSlot, ScheduleSlot, ScheduleSlotChangeset};

type BoxedQuery<'a> = schedule_slot::BoxedQuery<'a, Pg, SqlTypeOf<AsSelect<ScheduleSlot, Pg>>>;

/// Optional filters for [`list_slots`]. `from`/`to` select slots overlapping
/// the half-open window `[from, to)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotFilter {
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
    pub formation_id: Option<uuid::Uuid>,
    pub course_id: Option<uuid::Uuid>,
    pub teacher_id: Option<uuid::Uuid>,
}

/// ## Summary
/// Returns a query to select all slots, ordered by start time.
#[must_use]
pub fn all() -> BoxedQuery<'static> {
    schedule_slot::table
        .select(ScheduleSlot::as_select())
        .order((schedule_slot::start_time.asc(), schedule_slot::room.asc()))
        .into_boxed()
}

/// ## Summary
/// Returns a query to select slots matching a filter.
#[must_use]
pub fn filtered(filter: SlotFilter) -> BoxedQuery<'static> {
    let mut query = all();
    if let Some(from) = filter.from {
        query = query.filter(schedule_slot::end_time.gt(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(schedule_slot::start_time.lt(to));
    }
    if let Some(formation_id) = filter.formation_id {
        query = query.filter(schedule_slot::formation_id.eq(formation_id));
    }
    if let Some(course_id) = filter.course_id {
        query = query.filter(schedule_slot::course_id.eq(course_id));
    }
    if let Some(teacher_id) = filter.teacher_id {
        query = query.filter(schedule_slot::teacher_id.eq(teacher_id));
    }
    query
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_slots(
    conn: &mut AsyncPgConnection,
    filter: SlotFilter,
) -> QueryResult<Vec<ScheduleSlot>> {
    filtered(filter).load(conn).await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_slot(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> QueryResult<Option<ScheduleSlot>> {
    all()
        .filter(schedule_slot::id.eq(id))
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Inserts one slot. Recurring batches call this once per occurrence.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn insert_slot(
    conn: &mut AsyncPgConnection,
    new_slot: &NewScheduleSlot<'_>,
) -> QueryResult<ScheduleSlot> {
    diesel::insert_into(schedule_slot::table)
        .values(new_slot)
        .returning(ScheduleSlot::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Updates a single slot; sibling occurrences are unaffected.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_slot(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    changes: &ScheduleSlotChangeset,
) -> QueryResult<Option<ScheduleSlot>> {
    diesel::update(schedule_slot::table.filter(schedule_slot::id.eq(id)))
        .set(changes)
        .returning(ScheduleSlot::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_slot(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<usize> {
    diesel::delete(schedule_slot::table.filter(schedule_slot::id.eq(id)))
        .execute(conn)
        .await
}
