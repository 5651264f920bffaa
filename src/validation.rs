//! Request validation helpers.
//!
//! DTOs derive `validator::Validate`; this module turns the resulting
//! `ValidationErrors` into the `[{field, message}]` list the API renders and
//! hosts the custom rules the derive attributes refer to.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::{
    domain::parse_datetime,
    error::{AppError, FieldError, Result},
};

/// Key validator uses for struct-level (schema) errors.
const SCHEMA_KEY: &str = "__all__";

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9]\d{0,15}$").expect("valid phone regex"));

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{1,2}:)?[0-9]{1,2}:[0-9]{1,2}$").expect("valid duration regex")
});

/// Runs the derived rules and converts a rejection into `AppError::Validation`.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<()> {
    payload
        .validate()
        .map_err(|errors| AppError::Validation(flatten_errors(&errors)))
}

/// Flattens validator output into field errors sorted by field, then message.
///
/// Schema-level errors are attributed to the field named by their `field`
/// param (see [`schema_error`]).
pub fn flatten_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut flat = Vec::new();
    collect_errors(errors, "", &mut flat);
    flat.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    flat
}

/// Nested structs are reported as `parent.child`.
fn collect_errors(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldError>) {
    for (key, kind) in errors.errors() {
        let key: &str = key;
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let name = if key == SCHEMA_KEY {
                        error
                            .params
                            .get("field")
                            .and_then(|value| value.as_str())
                            .unwrap_or("body")
                            .to_string()
                    } else {
                        key.to_string()
                    };
                    let field = format!("{}{}", prefix, name);
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    out.push(FieldError { field, message });
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_errors(inner, &format!("{}{}.", prefix, key), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_errors(inner, &format!("{}{}[{}].", prefix, key, index), out);
                }
            }
        }
    }
}

pub fn rule_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// A struct-level error attributed to `field`.
pub fn schema_error(
    field: &'static str,
    code: &'static str,
    message: impl Into<Cow<'static, str>>,
) -> ValidationError {
    let mut err = rule_error(code, message);
    err.add_param(Cow::Borrowed("field"), &field);
    err
}

pub fn validate_slug(slug: &str) -> std::result::Result<(), ValidationError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(rule_error(
            "slug",
            "Slug may only contain lowercase letters, numbers and single hyphens",
        ))
    }
}

/// Phone numbers are checked after stripping spaces, dashes and parentheses.
pub fn validate_phone(phone: &str) -> std::result::Result<(), ValidationError> {
    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    if PHONE_RE.is_match(&compact) {
        Ok(())
    } else {
        Err(rule_error("phone", "Please provide a valid phone number"))
    }
}

pub fn validate_duration(duration: &str) -> std::result::Result<(), ValidationError> {
    if DURATION_RE.is_match(duration) {
        Ok(())
    } else {
        Err(rule_error("duration", "Duration must look like MM:SS or HH:MM:SS"))
    }
}

pub fn validate_not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(rule_error("blank", "Value cannot be blank"))
    } else {
        Ok(())
    }
}

/// Text dates from multipart forms: RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` or `YYYY-MM-DD`.
pub fn validate_date_text(value: &str) -> std::result::Result<(), ValidationError> {
    match parse_datetime(value) {
        Some(_) => Ok(()),
        None => Err(rule_error("date", "Must be a valid ISO 8601 date")),
    }
}

pub fn validate_positive_int_text(value: &str) -> std::result::Result<(), ValidationError> {
    match value.trim().parse::<i32>() {
        Ok(n) if n >= 1 => Ok(()),
        _ => Err(rule_error("positive_int", "Must be a positive integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    #[validate(schema(function = "window_is_ordered"))]
    struct Window {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(range(min = 1, message = "Size must be at least 1"))]
        size: i32,
        start: i32,
        end: i32,
    }

    fn window_is_ordered(w: &Window) -> std::result::Result<(), ValidationError> {
        if w.end < w.start {
            return Err(schema_error("end", "order", "End must not be before start"));
        }
        Ok(())
    }

    #[test]
    fn errors_are_flattened_and_sorted() {
        let window = Window { name: String::new(), size: 0, start: 5, end: 1 };
        let err = validate_payload(&window).unwrap_err();

        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["end", "name", "size"]);
        assert_eq!(errors[0].message, "End must not be before start");
    }

    #[test]
    fn valid_payload_passes() {
        let window = Window { name: "ok".into(), size: 2, start: 1, end: 1 };
        assert!(validate_payload(&window).is_ok());
    }

    #[test]
    fn slug_rule() {
        assert!(validate_slug("grace-and-truth-2024").is_ok());
        assert!(validate_slug("Grace").is_err());
        assert!(validate_slug("double--dash").is_err());
        assert!(validate_slug("-leading").is_err());
    }

    #[test]
    fn phone_rule_ignores_punctuation() {
        assert!(validate_phone("+1 (555) 123-4567").is_ok());
        assert!(validate_phone("237-699-000-000").is_ok());
        assert!(validate_phone("0123").is_err());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn duration_rule() {
        assert!(validate_duration("3:45").is_ok());
        assert!(validate_duration("01:02:03").is_ok());
        assert!(validate_duration("345").is_err());
    }

    #[test]
    fn text_rules() {
        assert!(validate_date_text("2024-05-01").is_ok());
        assert!(validate_date_text("2024-05-01T10:00").is_ok());
        assert!(validate_date_text("yesterday").is_err());
        assert!(validate_positive_int_text("12").is_ok());
        assert!(validate_positive_int_text("0").is_err());
        assert!(validate_not_blank("   ").is_err());
    }
}
