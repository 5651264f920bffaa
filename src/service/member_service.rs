use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::{
        clean_optional, CreateMemberRequest, Member, MemberQuery, MemberStats, PageRequest,
        Paginated, UpdateMemberRequest,
    },
    error::{AppError, Result},
    repository::{MemberFilter, MemberRepository},
    validation::validate_payload,
};

const DUPLICATE_EMAIL: &str = "A member with this email already exists";

pub struct MemberService {
    repo: Arc<dyn MemberRepository>,
}

impl MemberService {
    pub fn new(repo: Arc<dyn MemberRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, request: CreateMemberRequest) -> Result<Member> {
        validate_payload(&request)?;

        let member = Member::from_request(request, Utc::now());
        if self.repo.email_exists(&member.email, None).await? {
            return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let member = self.repo.create(member).await?;
        tracing::info!("Member {} registered", member.id);
        Ok(member)
    }

    pub async fn get(&self, id: Uuid) -> Result<Member> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Member> {
        self.repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }

    pub async fn list(&self, query: MemberQuery) -> Result<Paginated<Member>> {
        let page = PageRequest::new(query.page, query.limit, PageRequest::DEFAULT_LIMIT, PageRequest::MAX_LIMIT)?;
        let filter = MemberFilter {
            membership_status: query.membership_status,
            role: query.role,
            search: clean_optional(query.search),
        };
        self.repo.list(&filter, page).await
    }

    pub async fn update(&self, id: Uuid, request: UpdateMemberRequest) -> Result<Member> {
        validate_payload(&request)?;
        let mut member = self.get(id).await?;
        let previous_status = member.membership_status;

        request.apply_to(&mut member);
        if self.repo.email_exists(&member.email, Some(id)).await? {
            return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        member.updated_at = Utc::now();

        let member = self.repo.update(member).await?;
        if member.membership_status != previous_status {
            tracing::info!(
                "Member {} status {} -> {}",
                member.id,
                previous_status,
                member.membership_status
            );
        }
        Ok(member)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Member not found".to_string()));
        }
        Ok(())
    }

    /// Stamps `last_activity` with the current time.
    pub async fn touch(&self, id: Uuid) -> Result<Member> {
        self.repo
            .touch(id, Utc::now())
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }

    pub async fn stats(&self) -> Result<MemberStats> {
        self.repo.stats().await
    }
}
