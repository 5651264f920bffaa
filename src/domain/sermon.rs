use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::Owned,
    domain::{clean_optional, deserialize_date, deserialize_list},
    validation::validate_not_blank,
};

#[derive(Debug, Clone, Serialize)]
pub struct Sermon {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub pastor_name: String,
    pub sermon_date: NaiveDate,
    pub scripture_reference: Option<String>,
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    pub transcript: Option<String>,
    pub series: Option<String>,
    pub tags: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Sermon {
    fn owner(&self) -> &str {
        &self.created_by
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSermonRequest {
    #[serde(default)]
    #[validate(
        custom(function = "validate_not_blank", message = "Title is required"),
        length(max = 255, message = "Title cannot exceed 255 characters")
    )]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    #[validate(
        custom(function = "validate_not_blank", message = "Pastor name is required"),
        length(max = 100, message = "Pastor name cannot exceed 100 characters")
    )]
    pub pastor_name: String,
    #[serde(default, deserialize_with = "deserialize_date")]
    #[validate(required(message = "Sermon date is required"))]
    pub sermon_date: Option<NaiveDate>,
    #[validate(length(max = 100, message = "Scripture reference cannot exceed 100 characters"))]
    pub scripture_reference: Option<String>,
    #[validate(url(message = "Video URL must be a valid URL"))]
    pub video_url: Option<String>,
    #[validate(url(message = "Audio URL must be a valid URL"))]
    pub audio_url: Option<String>,
    pub transcript: Option<String>,
    #[validate(length(max = 100, message = "Series cannot exceed 100 characters"))]
    pub series: Option<String>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSermonRequest {
    #[validate(
        custom(function = "validate_not_blank", message = "Title cannot be empty"),
        length(max = 255, message = "Title cannot exceed 255 characters")
    )]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(
        custom(function = "validate_not_blank", message = "Pastor name cannot be empty"),
        length(max = 100, message = "Pastor name cannot exceed 100 characters")
    )]
    pub pastor_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub sermon_date: Option<NaiveDate>,
    #[validate(length(max = 100, message = "Scripture reference cannot exceed 100 characters"))]
    pub scripture_reference: Option<String>,
    #[validate(url(message = "Video URL must be a valid URL"))]
    pub video_url: Option<String>,
    #[validate(url(message = "Audio URL must be a valid URL"))]
    pub audio_url: Option<String>,
    pub transcript: Option<String>,
    #[validate(length(max = 100, message = "Series cannot exceed 100 characters"))]
    pub series: Option<String>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub tags: Option<Vec<String>>,
}

impl UpdateSermonRequest {
    pub fn apply_to(self, sermon: &mut Sermon) {
        if let Some(title) = self.title {
            sermon.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            sermon.description = clean_optional(Some(description));
        }
        if let Some(pastor_name) = self.pastor_name {
            sermon.pastor_name = pastor_name.trim().to_string();
        }
        if let Some(date) = self.sermon_date {
            sermon.sermon_date = date;
        }
        if let Some(reference) = self.scripture_reference {
            sermon.scripture_reference = clean_optional(Some(reference));
        }
        if let Some(url) = self.video_url {
            sermon.video_url = clean_optional(Some(url));
        }
        if let Some(url) = self.audio_url {
            sermon.audio_url = clean_optional(Some(url));
        }
        if let Some(transcript) = self.transcript {
            sermon.transcript = clean_optional(Some(transcript));
        }
        if let Some(series) = self.series {
            sermon.series = clean_optional(Some(series));
        }
        if let Some(tags) = self.tags {
            sermon.tags = tags;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SermonQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub pastor: Option<String>,
    pub series: Option<String>,
    pub tag: Option<String>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_payload;

    #[test]
    fn create_request_accepts_tag_text_and_plain_date() {
        let request: CreateSermonRequest = serde_json::from_str(
            r#"{"title": "Living Water", "pastor_name": "J. Mbarga",
                "sermon_date": "2024-02-18", "tags": "grace, john 4"}"#,
        )
        .unwrap();

        assert!(validate_payload(&request).is_ok());
        assert_eq!(request.sermon_date, NaiveDate::from_ymd_opt(2024, 2, 18));
        assert_eq!(request.tags.unwrap(), vec!["grace", "john 4"]);
    }

    #[test]
    fn create_request_reports_missing_fields() {
        let request: CreateSermonRequest =
            serde_json::from_str(r#"{"video_url": "not a url"}"#).unwrap();

        let crate::error::AppError::Validation(errors) = validate_payload(&request).unwrap_err() else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["pastor_name", "sermon_date", "title", "video_url"]);
    }
}
