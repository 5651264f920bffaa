use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::{ensure_owner_or_admin, Principal},
    domain::{
        clean_optional, reading_time, BlogPost, BlogQuery, BlogStatus, CreateBlogPostRequest,
        PageRequest, Paginated, UpdateBlogPostRequest,
    },
    error::{AppError, Result},
    repository::{BlogPostFilter, BlogPostRepository},
    validation::validate_payload,
};

const DUPLICATE_SLUG: &str = "A post with this slug already exists";

pub struct BlogPostService {
    repo: Arc<dyn BlogPostRepository>,
}

impl BlogPostService {
    pub fn new(repo: Arc<dyn BlogPostRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, query: BlogQuery) -> Result<Paginated<BlogPost>> {
        let page = PageRequest::new(query.page, query.limit, PageRequest::DEFAULT_LIMIT, PageRequest::MAX_LIMIT)?;
        let filter = BlogPostFilter {
            status: query.status,
            author: clean_optional(query.author),
            tag: clean_optional(query.tag),
        };
        self.repo.list(&filter, page).await
    }

    /// Published posts, newest publication first. Only `tag` filters.
    pub async fn list_published(&self, query: BlogQuery) -> Result<Paginated<BlogPost>> {
        let page = PageRequest::new(query.page, query.limit, PageRequest::DEFAULT_LIMIT, PageRequest::MAX_LIMIT)?;
        let filter = BlogPostFilter {
            status: Some(BlogStatus::Published),
            author: None,
            tag: clean_optional(query.tag),
        };
        self.repo.list(&filter, page).await
    }

    /// Fetches a post by id and counts the view.
    pub async fn view(&self, id: Uuid) -> Result<BlogPost> {
        self.repo
            .increment_views(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    /// Fetches a published post by slug and counts the view.
    pub async fn view_by_slug(&self, slug: &str) -> Result<BlogPost> {
        let post = self
            .repo
            .find_by_slug(slug)
            .await?
            .filter(|post| post.status == BlogStatus::Published)
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        self.view(post.id).await
    }

    pub async fn create(&self, request: CreateBlogPostRequest, caller: &Principal) -> Result<BlogPost> {
        validate_payload(&request)?;

        let slug = request.slug.trim().to_string();
        if self.repo.slug_exists(&slug, None).await? {
            return Err(AppError::Conflict(DUPLICATE_SLUG.to_string()));
        }

        let now = Utc::now();
        let content = request.content.trim().to_string();
        let mut post = BlogPost {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            slug,
            reading_time: reading_time(&content),
            content,
            excerpt: clean_optional(request.excerpt),
            featured_image: clean_optional(request.featured_image),
            status: BlogStatus::Draft,
            tags: request.tags.unwrap_or_default(),
            author: caller.email.clone(),
            published_at: None,
            views: 0,
            created_at: now,
            updated_at: now,
        };
        post.set_status(request.status.unwrap_or(BlogStatus::Draft), now);

        let post = self.repo.create(post).await?;
        tracing::info!("Post {} ({}) created by {}", post.id, post.slug, caller.email);
        Ok(post)
    }

    pub async fn update(&self, id: Uuid, mut request: UpdateBlogPostRequest, caller: &Principal) -> Result<BlogPost> {
        validate_payload(&request)?;
        let mut post = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        ensure_owner_or_admin(&post, caller, "update this post")?;

        if let Some(slug) = request.slug.take().map(|s| s.trim().to_string()) {
            if slug != post.slug {
                if self.repo.slug_exists(&slug, Some(id)).await? {
                    return Err(AppError::Conflict(DUPLICATE_SLUG.to_string()));
                }
                post.slug = slug;
            }
        }

        let now = Utc::now();
        let was_published = post.published_at.is_some();
        request.apply_to(&mut post, now);
        post.updated_at = now;
        if !was_published && post.published_at.is_some() {
            tracing::info!("Post {} published", post.id);
        }

        self.repo.update(post).await
    }

    pub async fn delete(&self, id: Uuid, caller: &Principal) -> Result<()> {
        let post = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        ensure_owner_or_admin(&post, caller, "delete this post")?;

        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        Ok(())
    }
}
