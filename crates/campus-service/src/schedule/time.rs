use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// ## Summary
/// Interprets a school-local wall-clock time.
///
/// Times repeated by a backward DST shift resolve to their first occurrence;
/// times skipped by a forward shift do not exist and yield `None`.
#[must_use]
pub fn local_to_utc(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

/// ## Summary
/// Renders a stored instant in school-local time with its UTC offset.
#[must_use]
pub fn utc_to_local(tz: Tz, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&tz).fixed_offset()
}
