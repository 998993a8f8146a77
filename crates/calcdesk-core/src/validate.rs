//! Form field and calculation input validation.
//!
//! All checks are pure. The boolean validators mirror what the login and
//! registration forms accept; the `Result` validators are used to reject a
//! request before it ever reaches the network.

use thiserror::Error;
use tracing::debug;

use crate::models::CalculationType;

/// Minimum password length in characters.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Username length bounds (inclusive).
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 20;

/// Largest page size the history endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Inputs must be a list with at least two numbers.")]
    InsufficientInput,

    #[error("Cannot divide by zero.")]
    DivisionByZero,

    #[error("Unsupported calculation type: {0}")]
    UnsupportedOperation(String),

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Username must be 3-20 characters: letters, numbers or underscores")]
    InvalidUsername,

    #[error("Password must be at least 8 characters with an uppercase letter, a lowercase letter and a number")]
    WeakPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Page number must be >= 1")]
    InvalidPage,

    #[error("Page size must be between 1 and {MAX_PAGE_SIZE}")]
    InvalidPageSize,
}

/// Check an email address against a permissive `local@domain.tld` shape.
///
/// The local part and domain may not contain whitespace or `@`, and the
/// domain needs a dot with at least one character on each side. This is not
/// a full RFC 5322 check.
pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    let clean = |part: &str| !part.is_empty() && !part.chars().any(|c| c == '@' || c.is_whitespace());
    if !clean(local) || !clean(domain) {
        return false;
    }

    // Any dot that is neither the first nor the last character of the domain
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// 3-20 characters, ASCII letters, digits or underscore.
pub fn validate_username(username: &str) -> bool {
    let len = username.chars().count();
    (MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len)
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a comma-separated list of numbers.
///
/// Segments are trimmed; empty segments and segments that are not a number
/// are skipped. Order and duplicates are preserved.
pub fn parse_number_inputs(input: &str) -> Vec<f64> {
    input
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| match segment.parse::<f64>() {
            Ok(value) if !value.is_nan() => Some(value),
            _ => {
                debug!(segment, "Skipping non-numeric input segment");
                None
            }
        })
        .collect()
}

/// Check that a calculation can be performed on `numbers`.
///
/// Requires at least two numbers, and for division no zero divisor (every
/// element after the first).
pub fn validate_calculation_inputs(
    numbers: &[f64],
    operation: CalculationType,
) -> Result<(), ValidationError> {
    if numbers.len() < 2 {
        return Err(ValidationError::InsufficientInput);
    }

    if operation == CalculationType::Division && numbers[1..].iter().any(|&n| n == 0.0) {
        return Err(ValidationError::DivisionByZero);
    }

    Ok(())
}

/// Validate the fields of the registration form in display order.
pub fn validate_registration(
    email: &str,
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    if !validate_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if !validate_username(username) {
        return Err(ValidationError::InvalidUsername);
    }
    if !validate_password(password) {
        return Err(ValidationError::WeakPassword);
    }
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Check history pagination parameters against the server's bounds.
pub fn validate_page_request(page: u32, page_size: u32) -> Result<(), ValidationError> {
    if page < 1 {
        return Err(ValidationError::InvalidPage);
    }
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ValidationError::InvalidPageSize);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("first.last+tag@mail.example.co.uk"));

        assert!(!validate_email("")); // empty
        assert!(!validate_email("userexample.com")); // no @
        assert!(!validate_email("@example.com")); // empty local part
        assert!(!validate_email("user@example")); // no dot in domain
        assert!(!validate_email("user@.com")); // dot is first
        assert!(!validate_email("user@example.")); // dot is last
        assert!(!validate_email("us er@example.com")); // whitespace
        assert!(!validate_email("user@@example.com")); // double @
        assert!(!validate_email("a@b@c.com")); // two @
    }

    #[test]
    fn test_email_without_at_is_rejected() {
        for s in ["plain", "with.dot.com", "spaces and words", "x.y", "😀.com"] {
            assert!(!validate_email(s), "{s} should be rejected");
        }
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Passw0rd"));
        assert!(validate_password("LongerPassword123"));

        assert!(!validate_password("password1")); // no uppercase
        assert!(!validate_password("PASSWORD1")); // no lowercase
        assert!(!validate_password("Password")); // no digit
    }

    #[test]
    fn test_short_password_is_rejected() {
        for s in ["", "A", "Ab1", "Abc123", "Abcde12"] {
            assert!(!validate_password(s), "{s} should be too short");
        }
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("valid_user1"));
        assert!(validate_username("abc"));
        assert!(validate_username("a_very_long_name_20c"));

        assert!(!validate_username("ab")); // too short
        assert!(!validate_username("a_very_long_name_21ch")); // too long
        assert!(!validate_username("user-name")); // hyphen
        assert!(!validate_username("user name")); // space
        assert!(!validate_username("usér")); // non-ascii
    }

    #[test]
    fn test_parse_number_inputs() {
        assert_eq!(parse_number_inputs("1, 2, abc, 3"), vec![1.0, 2.0, 3.0]);
        assert_eq!(parse_number_inputs(""), Vec::<f64>::new());
        assert_eq!(parse_number_inputs(" , ,"), Vec::<f64>::new());
        assert_eq!(parse_number_inputs("2.5,-1,2.5"), vec![2.5, -1.0, 2.5]);
        assert_eq!(parse_number_inputs("1e3, NaN, 4"), vec![1000.0, 4.0]);
    }

    #[test]
    fn test_validate_calculation_inputs() {
        assert_eq!(
            validate_calculation_inputs(&[5.0], CalculationType::Addition),
            Err(ValidationError::InsufficientInput)
        );
        assert_eq!(
            validate_calculation_inputs(&[], CalculationType::Division),
            Err(ValidationError::InsufficientInput)
        );
        assert_eq!(
            validate_calculation_inputs(&[5.0, 0.0], CalculationType::Division),
            Err(ValidationError::DivisionByZero)
        );
        assert_eq!(
            validate_calculation_inputs(&[5.0, 0.0], CalculationType::Addition),
            Ok(())
        );
        // A zero dividend is fine
        assert_eq!(
            validate_calculation_inputs(&[0.0, 5.0], CalculationType::Division),
            Ok(())
        );
        assert_eq!(
            validate_calculation_inputs(&[10.0, 2.0, -0.0], CalculationType::Division),
            Err(ValidationError::DivisionByZero)
        );
    }

    #[test]
    fn test_validate_registration() {
        assert_eq!(
            validate_registration("a@b.io", "valid_user1", "Passw0rd", "Passw0rd"),
            Ok(())
        );
        assert_eq!(
            validate_registration("nope", "valid_user1", "Passw0rd", "Passw0rd"),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_registration("a@b.io", "x", "Passw0rd", "Passw0rd"),
            Err(ValidationError::InvalidUsername)
        );
        assert_eq!(
            validate_registration("a@b.io", "valid_user1", "weak", "weak"),
            Err(ValidationError::WeakPassword)
        );
        assert_eq!(
            validate_registration("a@b.io", "valid_user1", "Passw0rd", "Passw0rD"),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_validate_page_request() {
        assert_eq!(validate_page_request(1, 10), Ok(()));
        assert_eq!(validate_page_request(3, 100), Ok(()));
        assert_eq!(validate_page_request(0, 10), Err(ValidationError::InvalidPage));
        assert_eq!(validate_page_request(1, 0), Err(ValidationError::InvalidPageSize));
        assert_eq!(validate_page_request(1, 101), Err(ValidationError::InvalidPageSize));
    }
}
