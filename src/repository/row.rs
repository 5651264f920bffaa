//! Column conversions shared by the SQLite repositories.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, Result};

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::Database(e.to_string()))
}

pub(crate) fn utc(naive: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(naive, Utc)
}

pub(crate) fn parse_enum<E>(value: &str) -> Result<E>
where
    E: FromStr<Err = String>,
{
    value.parse::<E>().map_err(AppError::Database)
}

/// String lists are stored as JSON arrays in TEXT columns.
pub(crate) fn decode_list(json: &str) -> Result<Vec<String>> {
    serde_json::from_str(json).map_err(|e| AppError::Database(format!("Invalid list column: {}", e)))
}

pub(crate) fn encode_list(items: &[String]) -> Result<String> {
    serde_json::to_string(items).map_err(|e| AppError::Internal(e.to_string()))
}

/// `%term%` for `LIKE ... ESCAPE '\'`, with wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" grace "), "%grace%");
        assert_eq!(like_pattern("100%_sure"), "%100\\%\\_sure%");
    }

    #[test]
    fn list_columns_round_trip() {
        let tags = vec!["hope".to_string(), "faith".to_string()];
        assert_eq!(decode_list(&encode_list(&tags).unwrap()).unwrap(), tags);
        assert!(decode_list("not json").is_err());
    }
}
