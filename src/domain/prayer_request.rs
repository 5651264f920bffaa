use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{auth::Owned, domain::clean_optional, validation::validate_not_blank};

text_enum! {
    pub enum PrayerStatus {
        Active => "active",
        Answered => "answered",
        Archived => "archived",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PrayerRequest {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requester_name: Option<String>,
    pub requester_id: String,
    pub status: PrayerStatus,
    pub is_anonymous: bool,
    pub is_public: bool,
    pub prayer_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for PrayerRequest {
    fn owner(&self) -> &str {
        &self.requester_id
    }
}

/// Public projection: the requester's identity is never exposed.
#[derive(Debug, Clone, Serialize)]
pub struct PublicPrayerRequest {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requester_name: Option<String>,
    pub status: PrayerStatus,
    pub is_anonymous: bool,
    pub prayer_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<PrayerRequest> for PublicPrayerRequest {
    fn from(request: PrayerRequest) -> Self {
        Self {
            id: request.id,
            title: request.title,
            description: request.description,
            requester_name: if request.is_anonymous { None } else { request.requester_name },
            status: request.status,
            is_anonymous: request.is_anonymous,
            prayer_count: request.prayer_count,
            created_at: request.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePrayerRequest {
    #[serde(default)]
    #[validate(
        custom(function = "validate_not_blank", message = "Title is required"),
        length(max = 255, message = "Title cannot exceed 255 characters")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,
    #[validate(length(max = 100, message = "Requester name cannot exceed 100 characters"))]
    pub requester_name: Option<String>,
    pub status: Option<PrayerStatus>,
    pub is_anonymous: Option<bool>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePrayerRequest {
    #[validate(
        custom(function = "validate_not_blank", message = "Title cannot be empty"),
        length(max = 255, message = "Title cannot exceed 255 characters")
    )]
    pub title: Option<String>,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 100, message = "Requester name cannot exceed 100 characters"))]
    pub requester_name: Option<String>,
    pub status: Option<PrayerStatus>,
    pub is_anonymous: Option<bool>,
    pub is_public: Option<bool>,
}

impl UpdatePrayerRequest {
    pub fn apply_to(self, request: &mut PrayerRequest) {
        if let Some(title) = self.title {
            request.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            request.description = description.trim().to_string();
        }
        if let Some(name) = self.requester_name {
            request.requester_name = clean_optional(Some(name));
        }
        if let Some(status) = self.status {
            request.status = status;
        }
        if let Some(is_anonymous) = self.is_anonymous {
            request.is_anonymous = is_anonymous;
        }
        if let Some(is_public) = self.is_public {
            request.is_public = is_public;
        }
        if request.is_anonymous {
            request.requester_name = None;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrayerQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<PrayerStatus>,
    /// Only honoured by the authenticated listing.
    pub is_public: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PrayerRequest {
        let now = Utc::now();
        PrayerRequest {
            id: Uuid::new_v4(),
            title: "Healing".into(),
            description: "Please pray for my mother".into(),
            requester_name: Some("Ruth".into()),
            requester_id: "ruth@church.org".into(),
            status: PrayerStatus::Active,
            is_anonymous: false,
            is_public: true,
            prayer_count: 4,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn going_anonymous_clears_the_name() {
        let mut request = sample();
        UpdatePrayerRequest {
            is_anonymous: Some(true),
            requester_name: Some("Ruth N.".into()),
            ..Default::default()
        }
        .apply_to(&mut request);

        assert!(request.is_anonymous);
        assert_eq!(request.requester_name, None);
    }

    #[test]
    fn public_view_hides_requester_id() {
        let view = serde_json::to_value(PublicPrayerRequest::from(sample())).unwrap();
        assert!(view.get("requester_id").is_none());
        assert_eq!(view["prayer_count"], 4);
    }
}
