use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{clean_optional, deserialize_list},
    validation::{validate_duration, validate_not_blank},
};

text_enum! {
    pub enum ResourceCategory {
        Book => "book",
        Brochure => "brochure",
        Song => "song",
        Faq => "faq",
        Other => "other",
    }
}

text_enum! {
    pub enum FileType {
        Pdf => "pdf",
        Audio => "audio",
        Video => "video",
        Text => "text",
        Image => "image",
        NoFile => "none",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ResourceCategory,
    pub file_type: FileType,
    pub file_url: Option<String>,
    pub file_size: i64,
    pub pages: Option<i32>,
    pub duration: Option<String>,
    pub artist: Option<String>,
    pub download_count: i64,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Sets the publication flag; the first publication stamps `published_at`.
    pub fn set_published(&mut self, published: bool, now: DateTime<Utc>) {
        if published && self.published_at.is_none() {
            self.published_at = Some(now);
        }
        self.is_published = published;
    }
}

/// FAQ entries only expose their question and answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaqEntry {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateResourceRequest {
    #[serde(default)]
    #[validate(
        custom(function = "validate_not_blank", message = "Title is required"),
        length(max = 200, message = "Title cannot exceed 200 characters")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(
        custom(function = "validate_not_blank", message = "Description is required"),
        length(max = 1000, message = "Description cannot exceed 1000 characters")
    )]
    pub description: String,
    #[validate(required(message = "Category is required"))]
    pub category: Option<ResourceCategory>,
    #[validate(required(message = "File type is required"))]
    pub file_type: Option<FileType>,
    #[validate(url(message = "File URL must be a valid URL"))]
    pub file_url: Option<String>,
    #[validate(range(min = 0, message = "File size must be a positive number"))]
    pub file_size: Option<i64>,
    #[validate(range(min = 0, message = "Pages must be a positive number"))]
    pub pages: Option<i32>,
    #[validate(custom(function = "validate_duration"))]
    pub duration: Option<String>,
    #[validate(length(max = 100, message = "Artist cannot exceed 100 characters"))]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
    #[validate(range(min = 0, message = "Order must be a positive number"))]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateResourceRequest {
    #[validate(
        custom(function = "validate_not_blank", message = "Title cannot be empty"),
        length(max = 200, message = "Title cannot exceed 200 characters")
    )]
    pub title: Option<String>,
    #[validate(
        custom(function = "validate_not_blank", message = "Description cannot be empty"),
        length(max = 1000, message = "Description cannot exceed 1000 characters")
    )]
    pub description: Option<String>,
    pub category: Option<ResourceCategory>,
    pub file_type: Option<FileType>,
    #[validate(url(message = "File URL must be a valid URL"))]
    pub file_url: Option<String>,
    #[validate(range(min = 0, message = "File size must be a positive number"))]
    pub file_size: Option<i64>,
    #[validate(range(min = 0, message = "Pages must be a positive number"))]
    pub pages: Option<i32>,
    #[validate(custom(function = "validate_duration"))]
    pub duration: Option<String>,
    #[validate(length(max = 100, message = "Artist cannot exceed 100 characters"))]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
    #[validate(range(min = 0, message = "Order must be a positive number"))]
    pub order: Option<i32>,
}

impl Resource {
    pub fn from_request(request: CreateResourceRequest, now: DateTime<Utc>) -> Self {
        let mut resource = Self {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            category: request.category.unwrap_or(ResourceCategory::Other),
            file_type: request.file_type.unwrap_or(FileType::NoFile),
            file_url: clean_optional(request.file_url),
            file_size: request.file_size.unwrap_or(0),
            pages: request.pages,
            duration: clean_optional(request.duration),
            artist: clean_optional(request.artist),
            download_count: 0,
            is_published: false,
            published_at: None,
            tags: request.tags.unwrap_or_default(),
            order: request.order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };
        resource.set_published(request.is_published.unwrap_or(false), now);
        resource
    }
}

impl UpdateResourceRequest {
    pub fn apply_to(self, resource: &mut Resource, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            resource.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            resource.description = description.trim().to_string();
        }
        if let Some(category) = self.category {
            resource.category = category;
        }
        if let Some(file_type) = self.file_type {
            resource.file_type = file_type;
        }
        if let Some(url) = self.file_url {
            resource.file_url = clean_optional(Some(url));
        }
        if let Some(size) = self.file_size {
            resource.file_size = size;
        }
        if let Some(pages) = self.pages {
            resource.pages = Some(pages);
        }
        if let Some(duration) = self.duration {
            resource.duration = clean_optional(Some(duration));
        }
        if let Some(artist) = self.artist {
            resource.artist = clean_optional(Some(artist));
        }
        if let Some(tags) = self.tags {
            resource.tags = tags;
        }
        if let Some(order) = self.order {
            resource.order = order;
        }
        if let Some(published) = self.is_published {
            resource.set_published(published, now);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicResourceQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<ResourceCategory>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminResourceQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<ResourceCategory>,
    pub published: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: ResourceCategory,
    pub count: i64,
    pub published: i64,
    pub downloads: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceStats {
    pub total: i64,
    pub total_downloads: i64,
    pub by_category: Vec<CategoryStats>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn faq(published: bool) -> Resource {
        let request: CreateResourceRequest = serde_json::from_value(serde_json::json!({
            "title": "When is the Sunday service?",
            "description": "Every Sunday at 9am.",
            "category": "faq",
            "file_type": "none",
            "is_published": published,
        }))
        .unwrap();
        Resource::from_request(request, Utc::now())
    }

    #[test]
    fn publishing_on_create_stamps_the_date() {
        let before = Utc::now();
        let resource = faq(true);
        let stamp = resource.published_at.unwrap();
        assert!(stamp >= before && stamp <= Utc::now());
        assert!(faq(false).published_at.is_none());
    }

    #[test]
    fn republishing_keeps_the_first_stamp() {
        let mut resource = faq(true);
        let first = resource.published_at;

        UpdateResourceRequest { is_published: Some(false), ..Default::default() }
            .apply_to(&mut resource, Utc::now() + Duration::days(1));
        UpdateResourceRequest { is_published: Some(true), ..Default::default() }
            .apply_to(&mut resource, Utc::now() + Duration::days(2));

        assert!(resource.is_published);
        assert_eq!(resource.published_at, first);
    }
}
