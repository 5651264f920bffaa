use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    domain::{clean_optional, deserialize_datetime},
    error::{AppError, Result},
    validation::{rule_error, schema_error, validate_not_blank},
};

/// Submissions allowed per email within [`RATE_LIMIT_WINDOW_HOURS`].
pub const MAX_SUBMISSIONS_PER_WINDOW: i64 = 3;
pub const RATE_LIMIT_WINDOW_HOURS: i64 = 24;
pub const MAX_TESTIMONY_IMAGES: usize = 3;

text_enum! {
    pub enum TestimonyCategory {
        Guerison => "guerison",
        Famille => "famille",
        Finances => "finances",
        Delivrance => "delivrance",
        Miracle => "miracle",
        Transformation => "transformation",
        Autre => "autre",
    }
}

text_enum! {
    pub enum TestimonyStatus {
        Pending => "pending",
        Approved => "approved",
        Scheduled => "scheduled",
        Archived => "archived",
        Rejected => "rejected",
    }
}

impl TestimonyStatus {
    /// Moderation moves. Re-asserting the current status is allowed so that
    /// `is_featured` can be flipped on its own; anything may be archived.
    pub fn can_transition_to(self, next: TestimonyStatus) -> bool {
        use TestimonyStatus::*;

        self == next
            || next == Archived
            || matches!((self, next), (Pending, Approved | Rejected) | (Approved, Scheduled))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Testimony {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub author_email: String,
    pub author_location: Option<String>,
    pub category: TestimonyCategory,
    pub status: TestimonyStatus,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub images: Vec<String>,
    pub is_featured: bool,
    pub likes: i64,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the public listing exposes: no author email, no moderator.
#[derive(Debug, Clone, Serialize)]
pub struct PublicTestimony {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub author_location: Option<String>,
    pub category: TestimonyCategory,
    pub images: Vec<String>,
    pub is_featured: bool,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Testimony> for PublicTestimony {
    fn from(t: Testimony) -> Self {
        Self {
            id: t.id,
            title: t.title,
            content: t.content,
            author_name: t.author_name,
            author_location: t.author_location,
            category: t.category,
            images: t.images,
            is_featured: t.is_featured,
            likes: t.likes,
            created_at: t.created_at,
        }
    }
}

/// Returned to the submitter.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub title: String,
    pub status: TestimonyStatus,
    pub images: Vec<String>,
}

/// Text fields of the multipart submission form.
#[derive(Debug, Clone, Default, Validate)]
pub struct SubmitTestimonyRequest {
    #[validate(
        custom(function = "validate_not_blank", message = "Title is required"),
        length(max = 100, message = "Title cannot exceed 100 characters")
    )]
    pub title: String,
    #[validate(length(min = 10, max = 2000, message = "Testimony must be between 10 and 2000 characters"))]
    pub content: String,
    #[validate(
        custom(function = "validate_not_blank", message = "Name is required"),
        length(max = 50, message = "Name cannot exceed 50 characters")
    )]
    pub author_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub author_email: String,
    #[validate(length(max = 50, message = "Location cannot exceed 50 characters"))]
    pub author_location: Option<String>,
    #[validate(custom(function = "validate_category_text"))]
    pub category: Option<String>,
}

fn validate_category_text(value: &str) -> std::result::Result<(), ValidationError> {
    value
        .parse::<TestimonyCategory>()
        .map(|_| ())
        .map_err(|_| rule_error("category", "Invalid category"))
}

impl SubmitTestimonyRequest {
    pub fn from_fields(mut fields: HashMap<String, String>) -> Self {
        let mut text = |name: &str| fields.remove(name).map(|v| v.trim().to_string()).unwrap_or_default();
        let title = text("title");
        let content = text("content");
        let author_name = text("author_name");
        let author_email = text("author_email").to_lowercase();
        let author_location = clean_optional(Some(text("author_location")));
        let category = clean_optional(Some(text("category")));

        Self {
            title,
            content,
            author_name,
            author_email,
            author_location,
            category,
        }
    }

    pub fn into_testimony(self, images: Vec<String>, now: DateTime<Utc>) -> Result<Testimony> {
        let category = self
            .category
            .as_deref()
            .map(|c| c.parse::<TestimonyCategory>().map_err(|_| AppError::invalid("category", "Invalid category")))
            .transpose()?
            .unwrap_or(TestimonyCategory::Autre);

        Ok(Testimony {
            id: Uuid::new_v4(),
            title: self.title,
            content: self.content,
            author_name: self.author_name,
            author_email: self.author_email,
            author_location: self.author_location,
            category,
            status: TestimonyStatus::Pending,
            scheduled_date: None,
            images,
            is_featured: false,
            likes: 0,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_schedule"))]
pub struct UpdateTestimonyStatusRequest {
    pub status: TestimonyStatus,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub scheduled_date: Option<DateTime<Utc>>,
    pub is_featured: Option<bool>,
}

fn validate_schedule(request: &UpdateTestimonyStatusRequest) -> std::result::Result<(), ValidationError> {
    if request.status == TestimonyStatus::Scheduled && request.scheduled_date.is_none() {
        return Err(schema_error(
            "scheduled_date",
            "required",
            "Scheduled date is required for the scheduled status",
        ));
    }
    Ok(())
}

impl Testimony {
    /// Applies a moderation decision made by `moderator` at `now`.
    pub fn moderate(
        &mut self,
        request: UpdateTestimonyStatusRequest,
        moderator: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let next = request.status;
        if !self.status.can_transition_to(next) {
            return Err(AppError::BadRequest(format!(
                "Cannot change testimony status from {} to {}",
                self.status, next
            )));
        }

        match next {
            TestimonyStatus::Approved if self.approved_at.is_none() => {
                self.approved_by = Some(moderator.to_string());
                self.approved_at = Some(now);
            }
            TestimonyStatus::Scheduled => {
                let date = request.scheduled_date.ok_or_else(|| {
                    AppError::invalid("scheduled_date", "Scheduled date is required for the scheduled status")
                })?;
                self.scheduled_date = Some(date);
            }
            _ => {}
        }

        self.status = next;
        if let Some(featured) = request.is_featured {
            self.is_featured = featured;
        }
        Ok(())
    }
}

/// `?category=` accepts a category or `all`.
pub fn parse_category_filter(value: Option<&str>) -> Result<Option<TestimonyCategory>> {
    match value {
        None | Some("all") | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| AppError::invalid("category", "Invalid category")),
    }
}

/// `?status=` accepts a status or `all`.
pub fn parse_status_filter(value: Option<&str>) -> Result<Option<TestimonyStatus>> {
    match value {
        None | Some("all") | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| AppError::invalid("status", "Invalid status")),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicTestimonyQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminTestimonyQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestimonyStatusCount {
    pub status: TestimonyStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestimonyStats {
    pub total: i64,
    pub featured: i64,
    pub by_status: Vec<TestimonyStatusCount>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn testimony() -> Testimony {
        SubmitTestimonyRequest {
            title: "Healed".into(),
            content: "I was sick and now I am well.".into(),
            author_name: "Paul".into(),
            author_email: "paul@example.org".into(),
            author_location: None,
            category: Some("guerison".into()),
        }
        .into_testimony(vec![], Utc::now())
        .unwrap()
    }

    fn status(status: TestimonyStatus) -> UpdateTestimonyStatusRequest {
        UpdateTestimonyStatusRequest { status, scheduled_date: None, is_featured: None }
    }

    #[test]
    fn transition_table() {
        use TestimonyStatus::*;

        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Scheduled));
        assert!(Rejected.can_transition_to(Archived));
        assert!(Scheduled.can_transition_to(Scheduled));

        assert!(!Pending.can_transition_to(Scheduled));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Archived.can_transition_to(Pending));
    }

    #[test]
    fn approval_stamps_once() {
        let mut t = testimony();
        let first = Utc::now();
        t.moderate(status(TestimonyStatus::Approved), "mod-1", first).unwrap();
        assert_eq!(t.approved_by.as_deref(), Some("mod-1"));
        assert_eq!(t.approved_at, Some(first));

        t.moderate(
            UpdateTestimonyStatusRequest { is_featured: Some(true), ..status(TestimonyStatus::Approved) },
            "mod-2",
            first + Duration::hours(1),
        )
        .unwrap();
        assert!(t.is_featured);
        assert_eq!(t.approved_by.as_deref(), Some("mod-1"));
        assert_eq!(t.approved_at, Some(first));

        t.moderate(status(TestimonyStatus::Archived), "mod-2", Utc::now()).unwrap();
        assert_eq!(t.approved_at, Some(first));
    }

    #[test]
    fn scheduling_requires_a_date() {
        let request = status(TestimonyStatus::Scheduled);
        assert!(crate::validation::validate_payload(&request).is_err());

        let mut t = testimony();
        t.moderate(status(TestimonyStatus::Approved), "mod", Utc::now()).unwrap();
        let when = Utc::now() + Duration::days(7);
        t.moderate(
            UpdateTestimonyStatusRequest { scheduled_date: Some(when), ..status(TestimonyStatus::Scheduled) },
            "mod",
            Utc::now(),
        )
        .unwrap();
        assert_eq!(t.status, TestimonyStatus::Scheduled);
        assert_eq!(t.scheduled_date, Some(when));
    }

    #[test]
    fn illegal_transition_leaves_state_untouched() {
        let mut t = testimony();
        let err = t.moderate(status(TestimonyStatus::Scheduled), "mod", Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(t.status, TestimonyStatus::Pending);
    }

    #[test]
    fn form_fields_are_trimmed_and_defaulted() {
        let fields: HashMap<String, String> = [
            ("title", " Joy "),
            ("content", "A long enough story."),
            ("author_name", "Ana"),
            ("author_email", "Ana@Example.ORG"),
            ("author_location", "  "),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let request = SubmitTestimonyRequest::from_fields(fields);
        assert_eq!(request.title, "Joy");
        assert_eq!(request.author_email, "ana@example.org");
        assert_eq!(request.author_location, None);

        let t = request.into_testimony(vec![], Utc::now()).unwrap();
        assert_eq!(t.category, TestimonyCategory::Autre);
        assert_eq!(t.status, TestimonyStatus::Pending);
    }

    #[test]
    fn category_filter_accepts_all() {
        assert_eq!(parse_category_filter(Some("all")).unwrap(), None);
        assert_eq!(parse_category_filter(Some("famille")).unwrap(), Some(TestimonyCategory::Famille));
        assert!(parse_category_filter(Some("sport")).is_err());
    }
}
