use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, FieldError, Result};

/// Parses the date formats clients send: RFC 3339, `YYYY-MM-DDTHH:MM[:SS]`
/// (read as UTC) or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Serde adapter for optional timestamps in JSON bodies.
pub fn deserialize_datetime<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_datetime(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", s))),
    }
}

/// Serde adapter for optional calendar dates; a full timestamp keeps its date part.
pub fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_datetime(&s)
            .map(|dt| Some(dt.date_naive()))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", s))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListInput {
    List(Vec<String>),
    Text(String),
}

/// Tag-like fields accept either `["a", "b"]` or `"a, b"`.
pub fn deserialize_list<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<ListInput> = Option::deserialize(deserializer)?;
    Ok(raw.map(|input| match input {
        ListInput::List(items) => normalize_list(items),
        ListInput::Text(text) => split_list(&text),
    }))
}

pub fn split_list(text: &str) -> Vec<String> {
    normalize_list(text.split(',').map(str::to_string))
}

/// Trims entries and drops empty ones.
pub fn normalize_list<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Trims an optional text field; blank becomes `None`.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validated `page`/`limit` pair for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32, max_limit: u32) -> Result<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(default_limit);

        let mut errors = Vec::new();
        if page < 1 {
            errors.push(FieldError::new("page", "Page must be a positive integer"));
        }
        if limit < 1 || limit > max_limit {
            errors.push(FieldError::new(
                "limit",
                format!("Limit must be between 1 and {}", max_limit),
            ));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(Self { page, limit })
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: Self::DEFAULT_LIMIT }
    }
}

/// Raw `page`/`limit` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    pub fn page_request(&self) -> Result<PageRequest> {
        PageRequest::new(self.page, self.limit, PageRequest::DEFAULT_LIMIT, PageRequest::MAX_LIMIT)
    }
}

/// One page of results plus the total row count behind it.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: PageRequest,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: PageRequest) -> Self {
        Self { items, total, page }
    }

    pub fn pages(&self) -> i64 {
        let limit = i64::from(self.page.limit);
        (self.total + limit - 1) / limit
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
        }
    }
}

/// `{current, pages, total}` metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current: u32,
    pub pages: i64,
    pub total: i64,
}

impl<T> From<&Paginated<T>> for Pagination {
    fn from(page: &Paginated<T>) -> Self {
        Self {
            current: page.page.page,
            pages: page.pages(),
            total: page.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_common_date_shapes() {
        let rfc = parse_datetime("2024-03-10T09:30:00+01:00").unwrap();
        assert_eq!(rfc.hour(), 8);

        let local = parse_datetime("2024-03-10T09:30").unwrap();
        assert_eq!((local.hour(), local.minute()), (9, 30));

        let day = parse_datetime("2024-03-10").unwrap();
        assert_eq!((day.month(), day.day(), day.hour()), (3, 10, 0));

        assert!(parse_datetime("10/03/2024").is_none());
    }

    #[derive(Deserialize)]
    struct Tagged {
        #[serde(default, deserialize_with = "deserialize_list")]
        tags: Option<Vec<String>>,
    }

    #[test]
    fn tags_accept_text_or_array() {
        let from_text: Tagged = serde_json::from_str(r#"{"tags": " grace, , hope ,faith"}"#).unwrap();
        assert_eq!(from_text.tags.unwrap(), vec!["grace", "hope", "faith"]);

        let from_array: Tagged = serde_json::from_str(r#"{"tags": ["  love ", ""]}"#).unwrap();
        assert_eq!(from_array.tags.unwrap(), vec!["love"]);

        let missing: Tagged = serde_json::from_str("{}").unwrap();
        assert!(missing.tags.is_none());
    }

    #[test]
    fn page_request_bounds() {
        let page = PageRequest::new(Some(3), Some(20), 10, 100).unwrap();
        assert_eq!(page.offset(), 40);
        assert_eq!(page.limit(), 20);

        assert!(PageRequest::new(Some(0), None, 10, 100).is_err());
        assert!(PageRequest::new(None, Some(101), 10, 100).is_err());
        assert_eq!(PageRequest::new(None, None, 50, 100).unwrap().limit, 50);
    }

    #[test]
    fn pagination_rounds_pages_up() {
        let page = PageRequest::new(Some(2), Some(10), 10, 100).unwrap();
        let result = Paginated::new(vec![1, 2, 3], 23, page);
        let meta = Pagination::from(&result);
        assert_eq!(meta, Pagination { current: 2, pages: 3, total: 23 });

        let empty: Paginated<i32> = Paginated::new(vec![], 0, page);
        assert_eq!(empty.pages(), 0);
    }
}
