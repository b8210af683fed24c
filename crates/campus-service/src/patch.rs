//! Serde helpers for partial updates.

use serde::{Deserialize, Deserializer};

/// ## Summary
/// Distinguishes an absent field (`None`, via `#[serde(default)]`) from an
/// explicit `null` (`Some(None)`), so nullable columns can be cleared.
///
/// ## Errors
/// Returns the deserializer's error if the value has the wrong type.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// ## Summary
/// Trims a required text field, rejecting blank values.
///
/// ## Errors
/// Returns `ValidationError` naming the field when it is blank.
pub fn required_text(value: &str, field: &str) -> crate::error::ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::ServiceError::ValidationError(format!(
            "Le champ {field} est obligatoire"
        )));
    }
    Ok(trimmed.to_string())
}

/// ## Summary
/// Trims an optional text field; blank becomes `None`.
#[must_use]
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
