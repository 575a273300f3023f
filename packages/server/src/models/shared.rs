use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Serde helper for detecting a key's presence.
///
/// * JSON field absent  => `None`
/// * JSON field = null  => `Some(None)`
/// * JSON field = value => `Some(Some(v))`
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Require a non-blank value, naming the field in the error.
pub fn require_non_blank<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!(
            "{field} cannot be empty or just blank"
        )));
    }
    Ok(trimmed)
}
