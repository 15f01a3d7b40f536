//! Field-level validators shared by every onboarding form.
//!
//! Each form implements [`Validate`] by running the checks below against a
//! [`FieldErrors`] collector; nothing reaches the database until the
//! collector is empty.

use rust_decimal::Decimal;

use crate::employee::ssn::{validate_social_security_number, INVALID_SSN};
use crate::errors::{AppError, FieldErrors};

pub const REQUIRED: &str = "This field is required.";

pub trait Validate {
    fn field_errors(&self) -> FieldErrors;

    fn validate(&self) -> Result<(), AppError> {
        self.field_errors().into_result()
    }
}

/// Non-empty and at most `max` characters.
pub fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
        return;
    }
    check_max_len(errors, field, value, max);
}

/// Optional text may be blank but not longer than `max` characters.
pub fn check_optional_text(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        check_max_len(errors, field, value, max);
    }
}

pub fn check_max_len(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

/// `value` must be one of the stored choice values accepted by `parse`.
pub fn check_choice<T>(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) {
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else if parse(value).is_none() {
        errors.add(
            field,
            format!("Select a valid choice. {value} is not one of the available choices."),
        );
    }
}

/// Minimal structural email check: one `@`, non-empty local part, dotted domain.
pub fn check_email(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return;
    }
    check_max_len(errors, field, value, 254);
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
                && domain
                    .split('.')
                    .filter(|label| !label.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        errors.add(field, "Enter a valid email address.");
    }
}

/// Absolute http(s) URL.
pub fn check_url(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return;
    }
    check_max_len(errors, field, value, max);
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {}
        _ => errors.add(field, "Enter a valid URL."),
    }
}

pub fn check_ssn(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if !validate_social_security_number(value) {
        errors.add(field, INVALID_SSN);
    }
}

/// Decimal with at most `max_digits` significant digits, `places` of them after the point.
pub fn check_decimal(
    errors: &mut FieldErrors,
    field: &str,
    value: &Decimal,
    max_digits: u32,
    places: u32,
) {
    let normalized = value.normalize();
    if normalized.scale() > places {
        errors.add(
            field,
            format!("Ensure that there are no more than {places} decimal places."),
        );
    }
    let whole = normalized.trunc().abs();
    let whole_digits = if whole.is_zero() {
        0
    } else {
        whole.to_string().len() as u32
    };
    let max_whole = max_digits.saturating_sub(places);
    if whole_digits > max_whole {
        errors.add(
            field,
            format!("Ensure that there are no more than {max_whole} digits before the decimal point."),
        );
    }
}

pub fn check_non_negative(errors: &mut FieldErrors, field: &str, value: i64) {
    if value < 0 {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
    }
}

/// A file name accepted for a fixed upload directory. Returns the stored path.
pub fn upload_path(
    errors: &mut FieldErrors,
    field: &str,
    dir: &str,
    file_name: &str,
    max: usize,
) -> String {
    let name = file_name.trim();
    if name.is_empty() {
        errors.add(field, "No file was submitted.");
        return String::new();
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        errors.add(field, "File name must not contain path separators.");
        return String::new();
    }
    let path = format!("{dir}{name}");
    if path.chars().count() > max {
        errors.add(
            field,
            format!("Ensure this filename has at most {} characters.", max - dir.len()),
        );
    }
    path
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::employee::choices::Gender;

    fn run(check: impl FnOnce(&mut FieldErrors)) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check(&mut errors);
        errors
    }

    #[test]
    fn test_text_required_and_max_len() {
        assert!(run(|e| check_text(e, "city", "Austin", 100)).is_empty());
        assert!(run(|e| check_text(e, "city", "   ", 100)).contains("city"));
        assert!(run(|e| check_text(e, "city", &"x".repeat(101), 100)).contains("city"));
    }

    #[test]
    fn test_max_len_counts_chars() {
        assert!(run(|e| check_max_len(e, "name", "ñññ", 3)).is_empty());
    }

    #[test]
    fn test_optional_text() {
        assert!(run(|e| check_optional_text(e, "d", None, 5)).is_empty());
        assert!(run(|e| check_optional_text(e, "d", Some(""), 5)).is_empty());
        assert!(run(|e| check_optional_text(e, "d", Some("toolong"), 5)).contains("d"));
    }

    #[test]
    fn test_choice() {
        assert!(run(|e| check_choice(e, "gender", "F", Gender::parse)).is_empty());
        let errors = run(|e| check_choice(e, "gender", "X", Gender::parse));
        assert!(errors.get("gender").unwrap()[0].contains("not one of the available choices"));
    }

    #[test]
    fn test_email() {
        assert!(run(|e| check_email(e, "email", "jane@example.com")).is_empty());
        assert!(run(|e| check_email(e, "email", "jane@example")).contains("email"));
        assert!(run(|e| check_email(e, "email", "@example.com")).contains("email"));
        assert!(run(|e| check_email(e, "email", "ja ne@example.com")).contains("email"));
        assert!(run(|e| check_email(e, "email", "jane@@example.com")).contains("email"));
    }

    #[test]
    fn test_url() {
        assert!(run(|e| check_url(e, "link", "https://tests.example.com/rust", 200)).is_empty());
        assert!(run(|e| check_url(e, "link", "ftp://example.com", 200)).contains("link"));
        assert!(run(|e| check_url(e, "link", "not a url", 200)).contains("link"));
    }

    #[test]
    fn test_ssn_field() {
        assert!(run(|e| check_ssn(e, "ssn", Some("078-05-1120"))).is_empty());
        let errors = run(|e| check_ssn(e, "ssn", Some("000-12-3456")));
        assert_eq!(errors.get("ssn").unwrap()[0], INVALID_SSN);
    }

    #[test]
    fn test_decimal_places_and_digits() {
        let ok = Decimal::from_str("12345678.90").unwrap();
        assert!(run(|e| check_decimal(e, "salary", &ok, 10, 2)).is_empty());

        let too_precise = Decimal::from_str("10.123").unwrap();
        assert!(run(|e| check_decimal(e, "salary", &too_precise, 10, 2)).contains("salary"));

        let too_big = Decimal::from_str("123456789.00").unwrap();
        assert!(run(|e| check_decimal(e, "salary", &too_big, 10, 2)).contains("salary"));

        let trailing_zeros = Decimal::from_str("50000.000").unwrap();
        assert!(run(|e| check_decimal(e, "salary", &trailing_zeros, 10, 2)).is_empty());
    }

    #[test]
    fn test_non_negative() {
        assert!(run(|e| check_non_negative(e, "years", 0)).is_empty());
        assert!(run(|e| check_non_negative(e, "years", -1)).contains("years"));
    }

    #[test]
    fn test_upload_path() {
        let mut errors = FieldErrors::new();
        let path = upload_path(&mut errors, "file", "certificationsEducation/", "cpr.pdf", 100);
        assert!(errors.is_empty());
        assert_eq!(path, "certificationsEducation/cpr.pdf");

        assert!(run(|e| {
            upload_path(e, "file", "certificationsEducation/", "../etc/passwd", 100);
        })
        .contains("file"));
        assert!(run(|e| {
            upload_path(e, "file", "certificationsEducation/", "", 100);
        })
        .contains("file"));
    }
}
