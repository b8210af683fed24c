use serde::{Deserialize, Serialize};

/// What the monthly "same date" rule does when the target month has no such
/// day (e.g. the 31st in April).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidDatePolicy {
    /// Drop the occurrence; the series simply has a gap.
    #[default]
    SkipOnInvalidDate,
    /// Move the occurrence to the last day of the target month.
    ClampToMonthEnd,
}

impl InvalidDatePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SkipOnInvalidDate => "skip_on_invalid_date",
            Self::ClampToMonthEnd => "clamp_to_month_end",
        }
    }
}

/// What the monthly "same weekday ordinal" rule does when the ordinal does
/// not exist in the target month (a 5th Tuesday in a month with four).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrdinalOverflow {
    /// Keep the computed date even though it falls in the following month.
    #[default]
    Spill,
    /// Drop occurrences that land outside the target month.
    SkipOutsideMonth,
}

impl OrdinalOverflow {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spill => "spill",
            Self::SkipOutsideMonth => "skip_outside_month",
        }
    }
}

impl std::fmt::Display for InvalidDatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for OrdinalOverflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
