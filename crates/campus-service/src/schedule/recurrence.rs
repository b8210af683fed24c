//! Recurring slot generator.
//!
//! Expands one base interval into the concrete occurrences of a weekly,
//! biweekly, triweekly or monthly series. The expansion is pure: it reads no
//! clock, touches no storage and returns the same output for the same input.
//! Times are school-local wall-clock values; converting them to instants is
//! the caller's job.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use campus_core::types::{InvalidDatePolicy, OrdinalOverflow};

/// Repetition period of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    #[default]
    Weekly,
    Biweekly,
    Triweekly,
    Monthly,
}

impl RecurrenceType {
    /// Number of weeks between occurrences; `0` for monthly series.
    #[must_use]
    pub const fn week_interval(self) -> u64 {
        match self {
            Self::Weekly => 1,
            Self::Biweekly => 2,
            Self::Triweekly => 3,
            Self::Monthly => 0,
        }
    }
}

/// How a monthly series picks its day in each following month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthlyMode {
    /// Same weekday ordinal ("second Tuesday").
    Day,
    /// Same day of month ("the 15th").
    #[default]
    Date,
}

/// Recurrence parameters of a schedule request.
///
/// `recurrence_count` is taken as given; bounding it is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub is_recurring: bool,
    pub recurrence_type: RecurrenceType,
    pub recurrence_mode: MonthlyMode,
    pub recurrence_count: u32,
}

impl RecurrenceRule {
    /// A rule producing exactly the base interval.
    #[must_use]
    pub const fn single() -> Self {
        Self {
            is_recurring: false,
            recurrence_type: RecurrenceType::Weekly,
            recurrence_mode: MonthlyMode::Date,
            recurrence_count: 1,
        }
    }
}

/// Wall-clock start and end of the first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BaseInterval {
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// One generated occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SlotInstance {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

/// Edge-case handling for monthly series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GeneratorPolicy {
    pub invalid_date: InvalidDatePolicy,
    pub ordinal_overflow: OrdinalOverflow,
}

/// Result of an expansion: the occurrences in generation order plus the
/// number of requested occurrences that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub instances: Vec<SlotInstance>,
    pub skipped: u32,
}

/// ## Summary
/// Expands a recurrence with the default policies (skip impossible dates,
/// let ordinal weekdays spill into the next month).
#[must_use]
pub fn generate(rule: &RecurrenceRule, base: BaseInterval) -> Vec<SlotInstance> {
    expand(rule, base, GeneratorPolicy::default()).instances
}

/// ## Summary
/// Expands a recurrence into its occurrences.
///
/// A non-recurring rule, or a count of one or less, yields the base interval
/// alone. Otherwise occurrence `i` (for `i` in `0..count`) is derived from
/// the base start according to `rule.recurrence_type`; occurrence `0` is
/// the base itself. Every occurrence keeps the base duration.
///
/// Occurrences that cannot be placed (an impossible monthly date under
/// `SkipOnInvalidDate`, an ordinal outside the target month under
/// `SkipOutsideMonth`, or a date beyond chrono's range) are dropped and
/// counted in `skipped`.
#[must_use]
pub fn expand(rule: &RecurrenceRule, base: BaseInterval, policy: GeneratorPolicy) -> Expansion {
    let single = SlotInstance {
        start_time: base.start,
        end_time: base.end,
    };
    if !rule.is_recurring || rule.recurrence_count <= 1 {
        return Expansion {
            instances: vec![single],
            skipped: 0,
        };
    }

    let duration = base.duration();
    let mut expansion = Expansion {
        instances: Vec::with_capacity(rule.recurrence_count as usize),
        skipped: 0,
    };
    expansion.instances.push(single);

    for i in 1..rule.recurrence_count {
        let start = occurrence_start(rule, base.start, i, policy);
        let instance = start.and_then(|start_time| {
            start_time
                .checked_add_signed(duration)
                .map(|end_time| SlotInstance {
                    start_time,
                    end_time,
                })
        });
        match instance {
            Some(instance) => expansion.instances.push(instance),
            None => expansion.skipped += 1,
        }
    }

    expansion
}

fn occurrence_start(
    rule: &RecurrenceRule,
    base: NaiveDateTime,
    index: u32,
    policy: GeneratorPolicy,
) -> Option<NaiveDateTime> {
    let date = match rule.recurrence_type {
        RecurrenceType::Monthly => {
            let (year, month) = shift_month(base.date(), index)?;
            match rule.recurrence_mode {
                MonthlyMode::Date => same_date(base.date(), year, month, policy.invalid_date),
                MonthlyMode::Day => {
                    same_ordinal_weekday(base.date(), year, month, policy.ordinal_overflow)
                }
            }
        }
        weekly => {
            let days = weekly.week_interval() * 7 * u64::from(index);
            base.date().checked_add_days(Days::new(days))
        }
    }?;
    Some(date.and_time(base.time()))
}

/// Year and month `offset` months after `date`'s month.
fn shift_month(date: NaiveDate, offset: u32) -> Option<(i32, u32)> {
    let month0 = i64::from(date.month0()) + i64::from(offset);
    let year = i64::from(date.year()) + month0.div_euclid(12);
    let month = u32::try_from(month0.rem_euclid(12)).ok()? + 1;
    Some((i32::try_from(year).ok()?, month))
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn same_date(
    base: NaiveDate,
    year: i32,
    month: u32,
    policy: InvalidDatePolicy,
) -> Option<NaiveDate> {
    match NaiveDate::from_ymd_opt(year, month, base.day()) {
        Some(date) => Some(date),
        None => match policy {
            InvalidDatePolicy::SkipOnInvalidDate => None,
            InvalidDatePolicy::ClampToMonthEnd => last_day_of_month(year, month),
        },
    }
}

/// The base weekday's first occurrence in the target month, moved forward by
/// as many whole weeks as the base date lies into its own month.
fn same_ordinal_weekday(
    base: NaiveDate,
    year: i32,
    month: u32,
    policy: OrdinalOverflow,
) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let wanted = base.weekday().num_days_from_monday();
    let have = first.weekday().num_days_from_monday();
    let to_first_match = (wanted + 7 - have) % 7;
    let week_number = (base.day() - 1) / 7;

    let date = first.checked_add_days(Days::new(u64::from(to_first_match + 7 * week_number)))?;

    match policy {
        OrdinalOverflow::Spill => Some(date),
        OrdinalOverflow::SkipOutsideMonth => (date.month() == month).then_some(date),
    }
}
