use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::{ensure_owner_or_admin, Principal},
    domain::{
        clean_optional, CreateSermonRequest, PageRequest, Paginated, Sermon, SermonQuery,
        UpdateSermonRequest,
    },
    error::{AppError, Result},
    repository::{SermonFilter, SermonRepository},
    validation::validate_payload,
};

pub struct SermonService {
    repo: Arc<dyn SermonRepository>,
}

impl SermonService {
    pub fn new(repo: Arc<dyn SermonRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, query: SermonQuery) -> Result<Paginated<Sermon>> {
        let page = PageRequest::new(query.page, query.limit, PageRequest::DEFAULT_LIMIT, PageRequest::MAX_LIMIT)?;
        let filter = SermonFilter {
            search: clean_optional(query.search),
            pastor: clean_optional(query.pastor),
            series: clean_optional(query.series),
            tag: clean_optional(query.tag),
            start_date: query.start_date,
            end_date: query.end_date,
        };
        self.repo.list(&filter, page).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Sermon> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sermon not found".to_string()))
    }

    pub async fn create(&self, request: CreateSermonRequest, caller: &Principal) -> Result<Sermon> {
        validate_payload(&request)?;
        let sermon_date = request
            .sermon_date
            .ok_or_else(|| AppError::invalid("sermon_date", "Sermon date is required"))?;

        let now = Utc::now();
        let sermon = Sermon {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: clean_optional(request.description),
            pastor_name: request.pastor_name.trim().to_string(),
            sermon_date,
            scripture_reference: clean_optional(request.scripture_reference),
            video_url: clean_optional(request.video_url),
            audio_url: clean_optional(request.audio_url),
            transcript: clean_optional(request.transcript),
            series: clean_optional(request.series),
            tags: request.tags.unwrap_or_default(),
            created_by: caller.email.clone(),
            created_at: now,
            updated_at: now,
        };

        let sermon = self.repo.create(sermon).await?;
        tracing::info!("Sermon {} created by {}", sermon.id, caller.email);
        Ok(sermon)
    }

    pub async fn update(&self, id: Uuid, request: UpdateSermonRequest, caller: &Principal) -> Result<Sermon> {
        validate_payload(&request)?;
        let mut sermon = self.get(id).await?;
        ensure_owner_or_admin(&sermon, caller, "update this sermon")?;

        request.apply_to(&mut sermon);
        sermon.updated_at = Utc::now();
        self.repo.update(sermon).await
    }

    pub async fn delete(&self, id: Uuid, caller: &Principal) -> Result<()> {
        let sermon = self.get(id).await?;
        ensure_owner_or_admin(&sermon, caller, "delete this sermon")?;

        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Sermon not found".to_string()));
        }
        tracing::info!("Sermon {} deleted by {}", id, caller.email);
        Ok(())
    }
}
