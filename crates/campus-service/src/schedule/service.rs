use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use chrono_tz::Tz;
use diesel_async::AsyncPgConnection;
use serde::{Deserialize, Serialize};

use campus_core::config::{ScheduleConfig, Settings};
use campus_db::db::DbProvider;
use campus_db::db::enums::Role;
use campus_db::db::query::{
    course as course_query, formation as formation_query, schedule as schedule_query,
    student as student_query,
};
use campus_db::model::schedule::{NewScheduleSlot, ScheduleSlot, ScheduleSlotChangeset};
use campus_db::model::user::User;

use super::batch::{self, BatchOutcome};
use super::recurrence::{
    self, BaseInterval, GeneratorPolicy, MonthlyMode, RecurrenceRule, RecurrenceType,
    SlotInstance,
};
use super::time::{local_to_utc, utc_to_local};
use crate::error::{ServiceError, ServiceResult};
use crate::patch::{double_option, required_text};

/// A stored slot with its times shown in school-local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub id: uuid::Uuid,
    pub course_id: uuid::Uuid,
    pub formation_id: uuid::Uuid,
    pub teacher_id: Option<uuid::Uuid>,
    pub room: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SlotView {
    #[must_use]
    pub fn new(slot: ScheduleSlot, tz: Tz) -> Self {
        Self {
            id: slot.id,
            course_id: slot.course_id,
            formation_id: slot.formation_id,
            teacher_id: slot.teacher_id,
            room: slot.room,
            start_time: utc_to_local(tz, slot.start_time),
            end_time: utc_to_local(tz, slot.end_time),
            created_at: slot.created_at,
            updated_at: slot.updated_at,
        }
    }
}

/// Body of a slot creation or preview. Times are school-local wall clock.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default)]
    pub course_id: Option<uuid::Uuid>,
    #[serde(default)]
    pub formation_id: Option<uuid::Uuid>,
    #[serde(default)]
    pub teacher_id: Option<uuid::Uuid>,
    #[serde(default)]
    pub room: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_type: RecurrenceType,
    #[serde(default)]
    pub recurrence_mode: MonthlyMode,
    #[serde(default = "default_count")]
    pub recurrence_count: i64,
}

const fn default_count() -> i64 {
    1
}

impl ScheduleRequest {
    /// ## Summary
    /// Recurrence parameters with the count clamped into the configured range.
    #[must_use]
    pub fn recurrence_rule(&self, config: &ScheduleConfig) -> RecurrenceRule {
        RecurrenceRule {
            is_recurring: self.is_recurring,
            recurrence_type: self.recurrence_type,
            recurrence_mode: self.recurrence_mode,
            recurrence_count: config.clamp_count(self.recurrence_count),
        }
    }

    #[must_use]
    pub const fn base(&self) -> BaseInterval {
        BaseInterval {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Generator output returned without touching storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub instances: Vec<SlotInstance>,
    pub requested: u32,
    pub skipped: u32,
}

/// Filters of a schedule listing. `from`/`to` are school-local.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotQuery {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub formation_id: Option<uuid::Uuid>,
    pub course_id: Option<uuid::Uuid>,
    pub teacher_id: Option<uuid::Uuid>,
}

/// Edit of a single slot; absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotUpdate {
    pub course_id: Option<uuid::Uuid>,
    pub formation_id: Option<uuid::Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    pub teacher_id: Option<Option<uuid::Uuid>>,
    pub room: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
}

/// ## Summary
/// Reads the generator policies from configuration.
#[must_use]
pub const fn generator_policy(config: &ScheduleConfig) -> GeneratorPolicy {
    GeneratorPolicy {
        invalid_date: config.invalid_monthly_date,
        ordinal_overflow: config.ordinal_overflow,
    }
}

fn requested_count(rule: &RecurrenceRule) -> u32 {
    if rule.is_recurring {
        rule.recurrence_count.max(1)
    } else {
        1
    }
}

fn validate_order<T: PartialOrd>(start: &T, end: &T) -> ServiceResult<()> {
    if end <= start {
        return Err(ServiceError::ValidationError(
            "L'heure de fin doit être postérieure à l'heure de début".to_string(),
        ));
    }
    Ok(())
}

fn to_utc(tz: Tz, local: NaiveDateTime) -> ServiceResult<DateTime<Utc>> {
    local_to_utc(tz, local).ok_or_else(|| {
        ServiceError::ValidationError(format!("L'heure {local} n'existe pas dans le fuseau {tz}"))
    })
}

async fn require_teacher(
    conn: &mut AsyncPgConnection,
    teacher_id: uuid::Uuid,
) -> ServiceResult<()> {
    crate::user::require_role(conn, teacher_id, Role::Teacher)
        .await
        .map(|_teacher| ())
}

/// ## Summary
/// Runs the generator for a request without persisting anything.
///
/// ## Errors
/// Returns `ValidationError` if the end is not after the start.
pub fn preview(settings: &Settings, request: &ScheduleRequest) -> ServiceResult<Preview> {
    validate_order(&request.start_time, &request.end_time)?;
    let rule = request.recurrence_rule(&settings.schedule);
    let expansion = recurrence::expand(
        &rule,
        request.base(),
        generator_policy(&settings.schedule),
    );
    Ok(Preview {
        requested: requested_count(&rule),
        skipped: expansion.skipped,
        instances: expansion.instances,
    })
}

/// ## Summary
/// Creates the slots of a (possibly recurring) schedule request.
///
/// Validates the shared fields, fills `formation_id` and `teacher_id` from
/// the course when absent, clamps the count, expands the recurrence, then
/// inserts every occurrence independently and concurrently. Occurrences
/// falling in a DST gap are counted as skipped.
///
/// ## Side Effects
/// - Inserts one `schedule_slot` row per created occurrence.
/// - Notifies the slot teacher when at least one slot was created.
///
/// ## Errors
/// Returns `ValidationError` for a missing course or room, an unknown course,
/// formation or teacher, or an end not after the start. Insert failures are
/// not errors; they are counted in the outcome.
#[tracing::instrument(skip(provider, settings, request), fields(
    course_id = ?request.course_id,
    is_recurring = request.is_recurring,
    count = request.recurrence_count
))]
pub async fn create(
    provider: &(dyn DbProvider + Send + Sync),
    settings: &Settings,
    request: &ScheduleRequest,
) -> ServiceResult<BatchOutcome<SlotView>> {
    let tz = settings.schedule.tz()?;
    let course_id = request
        .course_id
        .ok_or_else(|| ServiceError::ValidationError("Le cours est obligatoire".to_string()))?;
    let room = required_text(request.room.as_deref().unwrap_or_default(), "salle")?;
    validate_order(&request.start_time, &request.end_time)?;

    let (formation_id, teacher_id, course_title) = {
        let mut conn = provider.get_connection().await?;
        let course = course_query::get_course(&mut conn, course_id)
            .await?
            .ok_or_else(|| ServiceError::ValidationError("Cours introuvable".to_string()))?;

        if let Some(formation_id) = request.formation_id {
            formation_query::get_formation(&mut conn, formation_id)
                .await?
                .ok_or_else(|| ServiceError::ValidationError("Formation introuvable".to_string()))?;
        }
        if let Some(teacher_id) = request.teacher_id {
            require_teacher(&mut conn, teacher_id).await?;
        }

        (
            request.formation_id.unwrap_or(course.formation_id),
            request.teacher_id.or(course.teacher_id),
            course.title,
        )
    };

    let rule = request.recurrence_rule(&settings.schedule);
    let expansion = recurrence::expand(
        &rule,
        request.base(),
        generator_policy(&settings.schedule),
    );
    let mut skipped = expansion.skipped;

    let rows: Vec<NewScheduleSlot<'_>> = expansion
        .instances
        .iter()
        .filter_map(|instance| {
            match (
                local_to_utc(tz, instance.start_time),
                local_to_utc(tz, instance.end_time),
            ) {
                (Some(start_time), Some(end_time)) if end_time > start_time => {
                    Some(NewScheduleSlot {
                        id: uuid::Uuid::now_v7(),
                        course_id,
                        formation_id,
                        teacher_id,
                        room: &room,
                        start_time,
                        end_time,
                    })
                }
                _ => {
                    tracing::debug!(start = %instance.start_time, "Occurrence has no valid local time");
                    skipped += 1;
                    None
                }
            }
        })
        .collect();

    let (created, failed) = batch::fan_out(&rows, |row| async move {
        let mut conn = provider.get_connection().await?;
        let slot = schedule_query::insert_slot(&mut conn, row).await?;
        Ok::<_, ServiceError>(slot)
    })
    .await;

    tracing::info!(
        created = created.len(),
        skipped,
        failed,
        "Schedule batch persisted"
    );

    if let (Some(teacher_id), Some(first)) = (teacher_id, created.first()) {
        let message = format!(
            "{} créneau(x) planifié(s) pour « {course_title} » à partir du {}",
            created.len(),
            utc_to_local(tz, first.start_time).format("%d/%m/%Y %H:%M"),
        );
        if let Err(err) = notify_teacher(provider, teacher_id, &message).await {
            tracing::warn!(error = %err, %teacher_id, "Failed to notify teacher");
        }
    }

    let created = created.into_iter().map(|slot| SlotView::new(slot, tz)).collect();
    Ok(BatchOutcome::new(
        created,
        requested_count(&rule),
        skipped,
        failed,
    ))
}

async fn notify_teacher(
    provider: &(dyn DbProvider + Send + Sync),
    teacher_id: uuid::Uuid,
    message: &str,
) -> ServiceResult<()> {
    let mut conn = provider.get_connection().await?;
    crate::notification::notify_users(
        &mut conn,
        &[teacher_id],
        "Nouveaux créneaux",
        message,
        Some("/schedule"),
    )
    .await?;
    Ok(())
}

/// ## Summary
/// Lists slots ordered by start time.
///
/// Students who give no formation filter see their own formation's slots
/// (nothing when they are not enrolled).
///
/// ## Errors
/// Returns `ValidationError` if a bound does not exist in the school timezone.
#[tracing::instrument(skip(conn, actor), fields(user_id = %actor.id))]
pub async fn list(
    conn: &mut AsyncPgConnection,
    tz: Tz,
    actor: &User,
    query: &SlotQuery,
) -> ServiceResult<Vec<SlotView>> {
    let mut formation_id = query.formation_id;
    if actor.role == Role::Student && formation_id.is_none() {
        formation_id = student_query::formation_of(conn, actor.id).await?;
        if formation_id.is_none() {
            tracing::debug!("Student is not enrolled in a formation");
            return Ok(Vec::new());
        }
    }

    let filter = schedule_query::SlotFilter {
        from: query.from.map(|from| to_utc(tz, from)).transpose()?,
        to: query.to.map(|to| to_utc(tz, to)).transpose()?,
        formation_id,
        course_id: query.course_id,
        teacher_id: query.teacher_id,
    };

    let slots = schedule_query::list_slots(conn, filter).await?;
    Ok(slots.into_iter().map(|slot| SlotView::new(slot, tz)).collect())
}

/// ## Errors
/// Returns `NotFound` if the slot does not exist.
pub async fn get(conn: &mut AsyncPgConnection, tz: Tz, id: uuid::Uuid) -> ServiceResult<SlotView> {
    schedule_query::get_slot(conn, id)
        .await?
        .map(|slot| SlotView::new(slot, tz))
        .ok_or_else(|| ServiceError::NotFound(format!("slot {id}")))
}

/// ## Summary
/// Edits one slot. Other occurrences generated with it are unaffected.
///
/// ## Errors
/// - `NotFound` if the slot does not exist.
/// - `ValidationError` for a blank room, an unknown course or teacher, or an
///   end not after the start.
#[tracing::instrument(skip(conn, update))]
pub async fn update(
    conn: &mut AsyncPgConnection,
    tz: Tz,
    id: uuid::Uuid,
    update: &SlotUpdate,
) -> ServiceResult<SlotView> {
    let existing = schedule_query::get_slot(conn, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("slot {id}")))?;

    let start_time = match update.start_time {
        Some(local) => to_utc(tz, local)?,
        None => existing.start_time,
    };
    let end_time = match update.end_time {
        Some(local) => to_utc(tz, local)?,
        None => existing.end_time,
    };
    validate_order(&start_time, &end_time)?;

    if let Some(course_id) = update.course_id {
        course_query::get_course(conn, course_id)
            .await?
            .ok_or_else(|| ServiceError::ValidationError("Cours introuvable".to_string()))?;
    }
    if let Some(formation_id) = update.formation_id {
        formation_query::get_formation(conn, formation_id)
            .await?
            .ok_or_else(|| ServiceError::ValidationError("Formation introuvable".to_string()))?;
    }
    if let Some(Some(teacher_id)) = update.teacher_id {
        require_teacher(conn, teacher_id).await?;
    }
    let room = update
        .room
        .as_deref()
        .map(|room| required_text(room, "salle"))
        .transpose()?;

    let changes = ScheduleSlotChangeset {
        course_id: update.course_id,
        formation_id: update.formation_id,
        teacher_id: update.teacher_id,
        room,
        start_time: Some(start_time),
        end_time: Some(end_time),
        updated_at: Some(Utc::now()),
    };

    schedule_query::update_slot(conn, id, &changes)
        .await?
        .map(|slot| SlotView::new(slot, tz))
        .ok_or_else(|| ServiceError::NotFound(format!("slot {id}")))
}

/// ## Summary
/// Deletes one slot.
///
/// ## Errors
/// Returns `NotFound` if the slot does not exist.
pub async fn delete(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> ServiceResult<()> {
    if schedule_query::delete_slot(conn, id).await? == 0 {
        return Err(ServiceError::NotFound(format!("slot {id}")));
    }
    tracing::info!(slot_id = %id, "Slot deleted");
    Ok(())
}
