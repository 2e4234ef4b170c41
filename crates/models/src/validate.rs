//! Field checks shared by entity constructors and the service layer.
use chrono::NaiveDate;

use crate::errors::ModelError;

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ModelError::Validation("invalid email".into()));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || email.contains(char::is_whitespace) {
        return Err(ModelError::Validation("invalid email".into()));
    }
    if email.len() > 255 {
        return Err(ModelError::Validation("email too long".into()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ModelError::Validation("name required".into()));
    }
    if name.chars().count() > 128 {
        return Err(ModelError::Validation("name too long".into()));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ModelError> {
    if title.trim().is_empty() {
        return Err(ModelError::Validation("title required".into()));
    }
    Ok(())
}

pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ModelError> {
    if start > end {
        return Err(ModelError::Validation("start_date must not be after end_date".into()));
    }
    Ok(())
}

/// Largest amount accepted on a single line: £10,000,000.
pub const MAX_PENCE: i64 = 1_000_000_000;

/// Longest single journey accepted.
pub const MAX_DISTANCE_MILES: f64 = 10_000.0;

pub fn validate_pence(field: &str, pence: i64) -> Result<(), ModelError> {
    if pence < 0 {
        return Err(ModelError::Validation(format!("{field} must not be negative")));
    }
    if pence > MAX_PENCE {
        return Err(ModelError::Validation(format!("{field} must not exceed {MAX_PENCE} pence")));
    }
    Ok(())
}

pub fn validate_distance(miles: f64) -> Result<(), ModelError> {
    if !miles.is_finite() || miles <= 0.0 {
        return Err(ModelError::Validation("distance_miles must be positive".into()));
    }
    if miles > MAX_DISTANCE_MILES {
        return Err(ModelError::Validation(format!("distance_miles must not exceed {MAX_DISTANCE_MILES}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rules() {
        assert!(validate_email("ann@example.com").is_ok());
        assert!(validate_email("ann@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ann example@x.com").is_err());
        assert!(validate_email("no-at-sign").is_err());
    }

    #[test]
    fn date_range_allows_single_day() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(validate_date_range(d, d).is_ok());
        assert!(validate_date_range(d, d.pred_opt().unwrap()).is_err());
    }

    #[test]
    fn money_and_distance() {
        assert!(validate_pence("vat", 0).is_ok());
        assert!(validate_pence("vat", -1).is_err());
        assert!(validate_distance(0.1).is_ok());
        assert!(validate_distance(0.0).is_err());
        assert!(validate_distance(f64::NAN).is_err());
    }

    #[test]
    fn money_and_distance_upper_bounds() {
        assert!(validate_pence("amount", MAX_PENCE).is_ok());
        assert!(validate_pence("amount", MAX_PENCE + 1).is_err());
        assert!(validate_pence("amount", i64::MAX).is_err());
        assert!(validate_distance(MAX_DISTANCE_MILES).is_ok());
        assert!(validate_distance(MAX_DISTANCE_MILES + 0.1).is_err());
        assert!(validate_distance(f64::INFINITY).is_err());
    }

    #[test]
    fn names() {
        assert!(validate_name("  ").is_err());
        assert!(validate_name("Ann Lee").is_ok());
        assert!(validate_name(&"x".repeat(129)).is_err());
    }
}
