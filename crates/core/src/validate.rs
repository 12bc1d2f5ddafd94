//! Small field validators shared by the domain crates.

use crate::error::{DomainError, DomainResult};

/// Trim `value` and reject it when empty.
pub fn non_empty(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Minimal email shape check: one `@` with a non-empty local part and a
/// dotted domain.
pub fn email(field: &str, value: &str) -> DomainResult<String> {
    let value = non_empty(field, value)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::validation(format!("{field} is not a valid email address")));
    }
    Ok(value)
}

pub fn non_negative(field: &str, value: i64) -> DomainResult<i64> {
    if value < 0 {
        return Err(DomainError::validation(format!("{field} must not be negative")));
    }
    Ok(value)
}

pub fn positive(field: &str, value: i64) -> DomainResult<i64> {
    if value <= 0 {
        return Err(DomainError::validation(format!("{field} must be positive")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank() {
        assert_eq!(non_empty("name", "  Acme ").unwrap(), "Acme");
        assert!(non_empty("name", "   ").is_err());
    }

    #[test]
    fn email_shape() {
        assert!(email("email", "ops@acme.io").is_ok());
        assert!(email("email", "ops@acme").is_err());
        assert!(email("email", "@acme.io").is_err());
        assert!(email("email", "a@b@c.io").is_err());
        assert!(email("email", "ops@.io").is_err());
    }

    #[test]
    fn numeric_bounds() {
        assert!(non_negative("price", 0).is_ok());
        assert!(non_negative("price", -1).is_err());
        assert!(positive("quantity", 0).is_err());
    }
}
