use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::{
        clean_optional, AdminResourceQuery, CreateResourceRequest, FaqEntry, PageRequest, Paginated,
        PublicResourceQuery, Resource, ResourceStats, UpdateResourceRequest,
    },
    error::{AppError, Result},
    repository::{ResourceFilter, ResourceRepository},
    validation::validate_payload,
};

const PUBLIC_DEFAULT_LIMIT: u32 = 50;
const ADMIN_DEFAULT_LIMIT: u32 = 20;

pub struct ResourceService {
    repo: Arc<dyn ResourceRepository>,
}

impl ResourceService {
    pub fn new(repo: Arc<dyn ResourceRepository>) -> Self {
        Self { repo }
    }

    fn not_found() -> AppError {
        AppError::NotFound("Resource not found".to_string())
    }

    pub async fn list_public(&self, query: PublicResourceQuery) -> Result<Paginated<Resource>> {
        let page = PageRequest::new(query.page, query.limit, PUBLIC_DEFAULT_LIMIT, PageRequest::MAX_LIMIT)?;
        let filter = ResourceFilter {
            category: query.category,
            published: Some(true),
            search: clean_optional(query.search),
        };
        self.repo.list(&filter, page).await
    }

    pub async fn get_public(&self, id: Uuid) -> Result<Resource> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|resource| resource.is_published)
            .ok_or_else(Self::not_found)
    }

    pub async fn faqs(&self) -> Result<Vec<FaqEntry>> {
        self.repo.list_faqs().await
    }

    /// Counts a download. Unpublished resources are reported as missing.
    pub async fn record_download(&self, id: Uuid) -> Result<Resource> {
        self.repo
            .increment_downloads(id)
            .await?
            .ok_or_else(Self::not_found)
    }

    pub async fn list(&self, query: AdminResourceQuery) -> Result<Paginated<Resource>> {
        let page = PageRequest::new(query.page, query.limit, ADMIN_DEFAULT_LIMIT, PageRequest::MAX_LIMIT)?;
        let filter = ResourceFilter {
            category: query.category,
            published: query.published,
            search: clean_optional(query.search),
        };
        self.repo.list(&filter, page).await
    }

    pub async fn create(&self, request: CreateResourceRequest) -> Result<Resource> {
        validate_payload(&request)?;
        let resource = self.repo.create(Resource::from_request(request, Utc::now())).await?;
        tracing::info!("Resource {} created ({})", resource.id, resource.category);
        Ok(resource)
    }

    pub async fn update(&self, id: Uuid, request: UpdateResourceRequest) -> Result<Resource> {
        validate_payload(&request)?;
        let mut resource = self.repo.find_by_id(id).await?.ok_or_else(Self::not_found)?;

        let now = Utc::now();
        request.apply_to(&mut resource, now);
        resource.updated_at = now;
        self.repo.update(resource).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(Self::not_found());
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<ResourceStats> {
        self.repo.stats().await
    }
}
