//! Field validators shared by the catalog entities.
//! Each returns the normalized value that should be stored.

use crate::errors::ModelError;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 4000;

/// Required, trimmed, at most `MAX_NAME_LEN` characters.
pub fn validate_name(entity: &str, name: &str) -> Result<String, ModelError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ModelError::Validation(format!("{entity} name is required")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ModelError::Validation(format!(
            "{entity} name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Optional text; blank becomes `None`.
pub fn normalize_description(description: Option<&str>) -> Result<Option<String>, ModelError> {
    match description.map(str::trim) {
        None | Some("") => Ok(None),
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(ModelError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        ))),
        Some(d) => Ok(Some(d.to_string())),
    }
}

/// Finite and not negative.
pub fn validate_amount(field: &str, value: f64) -> Result<f64, ModelError> {
    if !value.is_finite() {
        return Err(ModelError::Validation(format!("{field} must be a number")));
    }
    if value < 0.0 {
        return Err(ModelError::Validation(format!("{field} must not be negative")));
    }
    Ok(value)
}

pub fn validate_quantity(value: i64) -> Result<i32, ModelError> {
    if value < 0 {
        return Err(ModelError::Validation("quantity must not be negative".into()));
    }
    i32::try_from(value).map_err(|_| ModelError::Validation("quantity is too large".into()))
}
