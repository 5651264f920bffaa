use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::Owned,
    domain::{clean_optional, deserialize_list},
    validation::{validate_not_blank, validate_slug},
};

const WORDS_PER_MINUTE: usize = 200;

text_enum! {
    pub enum BlogStatus {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub status: BlogStatus,
    pub tags: Vec<String>,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub reading_time: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for BlogPost {
    fn owner(&self) -> &str {
        &self.author
    }
}

/// Minutes to read `content` at 200 words per minute, rounded up.
pub fn reading_time(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE) as i32
}

impl BlogPost {
    /// Replaces the content, recomputing the reading time only if it changed.
    pub fn set_content(&mut self, content: String) {
        if content != self.content {
            self.reading_time = reading_time(&content);
            self.content = content;
        }
    }

    /// Moves to `status`; the first move into `published` stamps `published_at`.
    pub fn set_status(&mut self, status: BlogStatus, now: DateTime<Utc>) {
        if status == BlogStatus::Published && self.published_at.is_none() {
            self.published_at = Some(now);
        }
        self.status = status;
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBlogPostRequest {
    #[serde(default)]
    #[validate(
        custom(function = "validate_not_blank", message = "Title is required"),
        length(max = 255, message = "Title cannot exceed 255 characters")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    #[serde(default)]
    #[validate(length(min = 100, message = "Content must be at least 100 characters"))]
    pub content: String,
    #[validate(length(max = 300, message = "Excerpt cannot exceed 300 characters"))]
    pub excerpt: Option<String>,
    #[validate(url(message = "Featured image must be a valid URL"))]
    pub featured_image: Option<String>,
    pub status: Option<BlogStatus>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBlogPostRequest {
    #[validate(
        custom(function = "validate_not_blank", message = "Title cannot be empty"),
        length(max = 255, message = "Title cannot exceed 255 characters")
    )]
    pub title: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(min = 100, message = "Content must be at least 100 characters"))]
    pub content: Option<String>,
    #[validate(length(max = 300, message = "Excerpt cannot exceed 300 characters"))]
    pub excerpt: Option<String>,
    #[validate(url(message = "Featured image must be a valid URL"))]
    pub featured_image: Option<String>,
    pub status: Option<BlogStatus>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub tags: Option<Vec<String>>,
}

impl UpdateBlogPostRequest {
    /// Applies the present fields. The slug is left to the caller, which must
    /// check it for uniqueness first.
    pub fn apply_to(self, post: &mut BlogPost, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            post.title = title.trim().to_string();
        }
        if let Some(content) = self.content {
            post.set_content(content.trim().to_string());
        }
        if let Some(excerpt) = self.excerpt {
            post.excerpt = clean_optional(Some(excerpt));
        }
        if let Some(image) = self.featured_image {
            post.featured_image = clean_optional(Some(image));
        }
        if let Some(status) = self.status {
            post.set_status(status, now);
        }
        if let Some(tags) = self.tags {
            post.tags = tags;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<BlogStatus>,
    pub author: Option<String>,
    pub tag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn post(content: &str) -> BlogPost {
        let now = Utc::now();
        BlogPost {
            id: Uuid::new_v4(),
            title: "Grace".into(),
            slug: "grace".into(),
            content: content.into(),
            excerpt: None,
            featured_image: None,
            status: BlogStatus::Draft,
            tags: vec![],
            author: "writer@church.org".into(),
            published_at: None,
            views: 0,
            reading_time: reading_time(content),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn reading_time_rounds_up_per_200_words() {
        assert_eq!(reading_time(""), 0);
        assert_eq!(reading_time("one"), 1);
        assert_eq!(reading_time(&"word ".repeat(200)), 1);
        assert_eq!(reading_time(&"word ".repeat(201)), 2);
        assert_eq!(reading_time(&"word\n\t".repeat(450)), 3);
    }

    #[test]
    fn content_change_recomputes_reading_time() {
        let mut p = post("short");
        p.set_content("word ".repeat(401));
        assert_eq!(p.reading_time, 3);
    }

    #[test]
    fn publish_stamp_is_set_once() {
        let mut p = post("text");
        let first = Utc::now();
        p.set_status(BlogStatus::Published, first);
        assert_eq!(p.published_at, Some(first));

        p.set_status(BlogStatus::Archived, first + Duration::hours(1));
        p.set_status(BlogStatus::Published, first + Duration::hours(2));
        assert_eq!(p.published_at, Some(first));
    }

    #[test]
    fn content_only_update_leaves_publish_stamp() {
        let mut p = post("text");
        let stamp = Utc::now() - Duration::days(3);
        p.set_status(BlogStatus::Published, stamp);

        UpdateBlogPostRequest {
            content: Some("fresh ".repeat(250)),
            ..Default::default()
        }
        .apply_to(&mut p, Utc::now());

        assert_eq!(p.published_at, Some(stamp));
        assert_eq!(p.reading_time, 2);
    }
}
