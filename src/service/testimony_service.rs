use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    auth::Principal,
    domain::{
        parse_category_filter, parse_status_filter, AdminTestimonyQuery, PageRequest, Paginated,
        PublicTestimony, PublicTestimonyQuery, SubmissionReceipt, SubmitTestimonyRequest,
        Testimony, TestimonyStats, TestimonyStatus, UpdateTestimonyStatusRequest,
        MAX_SUBMISSIONS_PER_WINDOW, RATE_LIMIT_WINDOW_HOURS,
    },
    error::{AppError, Result},
    repository::{TestimonyFilter, TestimonyRepository},
    storage::{discard_blobs, discard_on_error, BlobStore},
    validation::validate_payload,
};

/// Public listings cap `limit` lower than the admin views.
const PUBLIC_MAX_LIMIT: u32 = 50;
const ADMIN_DEFAULT_LIMIT: u32 = 20;

pub struct TestimonyService {
    repo: Arc<dyn TestimonyRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl TestimonyService {
    pub fn new(repo: Arc<dyn TestimonyRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { repo, blobs }
    }

    /// Accepts a public submission into moderation. The already-stored
    /// `images` are discarded on any failure, including the rate limit.
    pub async fn submit(&self, request: SubmitTestimonyRequest, images: Vec<String>) -> Result<SubmissionReceipt> {
        let result = self.insert(request, images.clone()).await;
        discard_on_error(self.blobs.as_ref(), &images, result).await
    }

    async fn insert(&self, request: SubmitTestimonyRequest, images: Vec<String>) -> Result<SubmissionReceipt> {
        validate_payload(&request)?;

        let now = Utc::now();
        let since = now - Duration::hours(RATE_LIMIT_WINDOW_HOURS);
        let recent = self.repo.count_since(&request.author_email, since).await?;
        if recent >= MAX_SUBMISSIONS_PER_WINDOW {
            tracing::warn!("Testimony rate limit reached for {}", request.author_email);
            return Err(AppError::RateLimited(
                "Too many testimonies submitted recently. Please try again tomorrow.".to_string(),
            ));
        }

        let testimony = self.repo.create(request.into_testimony(images, now)?).await?;
        tracing::info!("Testimony {} submitted for moderation", testimony.id);

        Ok(SubmissionReceipt {
            id: testimony.id,
            title: testimony.title,
            status: testimony.status,
            images: testimony.images,
        })
    }

    /// Approved testimonies without author email or moderator.
    pub async fn list_public(&self, query: PublicTestimonyQuery) -> Result<Paginated<PublicTestimony>> {
        let page = PageRequest::new(query.page, query.limit, PageRequest::DEFAULT_LIMIT, PUBLIC_MAX_LIMIT)?;
        let filter = TestimonyFilter {
            status: Some(TestimonyStatus::Approved),
            category: parse_category_filter(query.category.as_deref())?,
            featured: query.featured.filter(|featured| *featured),
        };
        let page = self.repo.list(&filter, page).await?;
        Ok(page.map(PublicTestimony::from))
    }

    pub async fn list(&self, query: AdminTestimonyQuery) -> Result<Paginated<Testimony>> {
        let page = PageRequest::new(query.page, query.limit, ADMIN_DEFAULT_LIMIT, PageRequest::MAX_LIMIT)?;
        let filter = TestimonyFilter {
            status: parse_status_filter(query.status.as_deref())?,
            category: parse_category_filter(query.category.as_deref())?,
            featured: None,
        };
        self.repo.list(&filter, page).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Testimony> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Testimony not found".to_string()))
    }

    pub async fn moderate(
        &self,
        id: Uuid,
        request: UpdateTestimonyStatusRequest,
        moderator: &Principal,
    ) -> Result<Testimony> {
        validate_payload(&request)?;
        let mut testimony = self.get(id).await?;
        let previous = testimony.status;

        let now = Utc::now();
        testimony.moderate(request, &moderator.id, now)?;
        testimony.updated_at = now;

        let testimony = self.repo.update(testimony).await?;
        tracing::info!(
            "Testimony {} moved {} -> {} by {}",
            testimony.id,
            previous,
            testimony.status,
            moderator.email
        );
        Ok(testimony)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let testimony = self.get(id).await?;
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Testimony not found".to_string()));
        }
        discard_blobs(self.blobs.as_ref(), &testimony.images).await;
        Ok(())
    }

    pub async fn stats(&self) -> Result<TestimonyStats> {
        self.repo.stats().await
    }
}
