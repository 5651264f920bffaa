use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::{ensure_owner_or_admin, Principal},
    domain::{
        clean_optional, CreatePrayerRequest, PageRequest, Paginated, PrayerQuery, PrayerRequest,
        PrayerStatus, PublicPrayerRequest, UpdatePrayerRequest,
    },
    error::{AppError, Result},
    repository::{PrayerRequestFilter, PrayerRequestRepository},
    validation::validate_payload,
};

pub struct PrayerRequestService {
    repo: Arc<dyn PrayerRequestRepository>,
}

impl PrayerRequestService {
    pub fn new(repo: Arc<dyn PrayerRequestRepository>) -> Self {
        Self { repo }
    }

    fn page(query: &PrayerQuery) -> Result<PageRequest> {
        PageRequest::new(query.page, query.limit, PageRequest::DEFAULT_LIMIT, PageRequest::MAX_LIMIT)
    }

    /// Public requests, most prayed-for first. Defaults to active requests.
    pub async fn list_public(&self, query: PrayerQuery) -> Result<Paginated<PublicPrayerRequest>> {
        let filter = PrayerRequestFilter {
            status: Some(query.status.unwrap_or(PrayerStatus::Active)),
            is_public: Some(true),
            most_prayed_first: true,
        };
        let page = self.repo.list(&filter, Self::page(&query)?).await?;
        Ok(page.map(PublicPrayerRequest::from))
    }

    pub async fn list(&self, query: PrayerQuery) -> Result<Paginated<PrayerRequest>> {
        let filter = PrayerRequestFilter {
            status: query.status,
            is_public: query.is_public,
            most_prayed_first: false,
        };
        self.repo.list(&filter, Self::page(&query)?).await
    }

    pub async fn get(&self, id: Uuid) -> Result<PrayerRequest> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Prayer request not found".to_string()))
    }

    pub async fn create(&self, request: CreatePrayerRequest, caller: &Principal) -> Result<PrayerRequest> {
        validate_payload(&request)?;

        let is_anonymous = request.is_anonymous.unwrap_or(false);
        let now = Utc::now();
        let prayer = PrayerRequest {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            requester_name: if is_anonymous { None } else { clean_optional(request.requester_name) },
            requester_id: caller.email.clone(),
            status: request.status.unwrap_or(PrayerStatus::Active),
            is_anonymous,
            is_public: request.is_public.unwrap_or(true),
            prayer_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.repo.create(prayer).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdatePrayerRequest,
        caller: &Principal,
    ) -> Result<PrayerRequest> {
        validate_payload(&request)?;
        let mut prayer = self.get(id).await?;
        ensure_owner_or_admin(&prayer, caller, "update this prayer request")?;

        request.apply_to(&mut prayer);
        prayer.updated_at = Utc::now();
        self.repo.update(prayer).await
    }

    pub async fn delete(&self, id: Uuid, caller: &Principal) -> Result<()> {
        let prayer = self.get(id).await?;
        ensure_owner_or_admin(&prayer, caller, "delete this prayer request")?;

        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Prayer request not found".to_string()));
        }
        Ok(())
    }

    /// Records one prayer. Anyone may pray for any request.
    pub async fn pray(&self, id: Uuid) -> Result<PrayerRequest> {
        self.repo
            .increment_prayer_count(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Prayer request not found".to_string()))
    }
}
