use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    domain::{clean_optional, deserialize_datetime, parse_datetime},
    error::{AppError, FieldError, Result},
    validation::{
        flatten_errors, rule_error, schema_error, validate_date_text, validate_not_blank,
        validate_positive_int_text,
    },
};

text_enum! {
    pub enum EventType {
        Service => "service",
        Meeting => "meeting",
        Special => "special",
        Youth => "youth",
        Prayer => "prayer",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Option<String>,
    pub max_attendees: Option<i32>,
    pub created_by: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Text fields of a multipart event form, before parsing.
#[derive(Debug, Clone, Default, Validate)]
#[validate(schema(function = "validate_event_window"))]
pub struct EventForm {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 255, message = "Title cannot exceed 255 characters")
    )]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_event_type_text"))]
    pub event_type: Option<String>,
    #[validate(custom(function = "validate_date_text"))]
    pub start_date: Option<String>,
    #[validate(custom(function = "validate_date_text"))]
    pub end_date: Option<String>,
    #[validate(length(max = 255, message = "Location cannot exceed 255 characters"))]
    pub location: Option<String>,
    #[validate(custom(function = "validate_positive_int_text"))]
    pub max_attendees: Option<String>,
}

fn validate_event_type_text(value: &str) -> std::result::Result<(), ValidationError> {
    value
        .parse::<EventType>()
        .map(|_| ())
        .map_err(|_| rule_error("event_type", "Event type must be one of service, meeting, special, youth, prayer"))
}

fn validate_event_window(form: &EventForm) -> std::result::Result<(), ValidationError> {
    let start = form.start_date.as_deref().and_then(parse_datetime);
    let end = form.end_date.as_deref().and_then(parse_datetime);
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(schema_error("end_date", "date_order", "End date must be after start date"));
        }
    }
    Ok(())
}

impl EventForm {
    /// Builds the form from multipart text fields; blank values count as absent.
    pub fn from_fields(mut fields: HashMap<String, String>) -> Self {
        let mut take = |name: &str| clean_optional(fields.remove(name));
        Self {
            title: take("title"),
            description: take("description"),
            event_type: take("event_type"),
            start_date: take("start_date"),
            end_date: take("end_date"),
            location: take("location"),
            max_attendees: take("max_attendees"),
        }
    }

    /// Field rules plus, when creating, presence of the required fields.
    pub fn check(&self, creating: bool) -> Result<()> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => flatten_errors(&e),
        };

        if creating {
            if self.title.is_none() {
                errors.push(FieldError::new("title", "Title is required"));
            }
            if self.start_date.is_none() {
                errors.push(FieldError::new("start_date", "Start date is required"));
            }
            if self.end_date.is_none() {
                errors.push(FieldError::new("end_date", "End date is required"));
            }
        }

        if errors.is_empty() {
            return Ok(());
        }
        errors.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
        Err(AppError::Validation(errors))
    }

    pub fn parsed_event_type(&self) -> Result<Option<EventType>> {
        self.event_type
            .as_deref()
            .map(|s| s.parse::<EventType>().map_err(|e| AppError::invalid("event_type", e)))
            .transpose()
    }

    pub fn parsed_start(&self) -> Result<Option<DateTime<Utc>>> {
        parse_field("start_date", self.start_date.as_deref())
    }

    pub fn parsed_end(&self) -> Result<Option<DateTime<Utc>>> {
        parse_field("end_date", self.end_date.as_deref())
    }

    pub fn parsed_max_attendees(&self) -> Result<Option<i32>> {
        self.max_attendees
            .as_deref()
            .map(|s| {
                s.trim()
                    .parse::<i32>()
                    .map_err(|_| AppError::invalid("max_attendees", "Must be a positive integer"))
            })
            .transpose()
    }
}

fn parse_field(field: &'static str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|s| parse_datetime(s).ok_or_else(|| AppError::invalid(field, "Must be a valid ISO 8601 date")))
        .transpose()
}

/// Query parameters for `GET /events`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub event_type: Option<EventType>,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub to: Option<DateTime<Utc>>,
}
