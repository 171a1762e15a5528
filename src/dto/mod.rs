pub mod auth;
pub mod deliveries;
pub mod orders;
pub mod pizzas;
pub mod users;

use crate::error::{AppError, AppResult};

pub(crate) fn require_length(field: &str, value: &str, min: usize, max: usize) -> AppResult<()> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

pub(crate) fn require_present(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &str, value: i32) -> AppResult<()> {
    if value <= 0 {
        return Err(AppError::BadRequest(format!(
            "{field} must be a positive integer"
        )));
    }
    Ok(())
}

pub fn is_valid_zip_code(value: &str) -> bool {
    value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Strips everything but digits; Brazilian numbers carry 10 or 11 of them.
pub fn normalize_phone(value: &str) -> AppResult<String> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if !(10..=11).contains(&digits.len()) {
        return Err(AppError::BadRequest(
            "phone must contain 10 or 11 digits".into(),
        ));
    }
    Ok(digits)
}
