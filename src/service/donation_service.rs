use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    auth::Principal,
    domain::{
        CreateDonationRequest, DateRange, Donation, DonationQuery, DonationStats, ListParams,
        PageRequest, Paginated, UpdateDonationRequest,
    },
    error::{AppError, Result},
    repository::{DonationFilter, DonationRepository},
    validation::validate_payload,
};

/// `DON_<unix millis>_<10 hex chars>`, assigned once at creation.
pub fn generate_payment_id(now: DateTime<Utc>) -> String {
    let suffix: [u8; 5] = rand::random();
    format!("DON_{}_{}", now.timestamp_millis(), hex::encode_upper(suffix))
}

pub struct DonationService {
    repo: Arc<dyn DonationRepository>,
}

impl DonationService {
    pub fn new(repo: Arc<dyn DonationRepository>) -> Self {
        Self { repo }
    }

    /// Records a donation. Anonymous giving is allowed; a signed-in donor is
    /// linked through `donor_id`.
    pub async fn create(&self, request: CreateDonationRequest, donor: Option<&Principal>) -> Result<Donation> {
        validate_payload(&request)?;

        let now = Utc::now();
        let donation = Donation::from_request(
            request,
            donor.map(|p| p.id.clone()),
            generate_payment_id(now),
            now,
        )?;

        let donation = self.repo.create(donation).await?;
        tracing::info!(
            "Donation {} recorded: {} {} ({})",
            donation.payment_id,
            donation.amount,
            donation.currency,
            donation.payment_status
        );
        Ok(donation)
    }

    pub async fn list(&self, query: DonationQuery) -> Result<Paginated<Donation>> {
        let page = PageRequest::new(query.page, query.limit, PageRequest::DEFAULT_LIMIT, PageRequest::MAX_LIMIT)?;
        let filter = DonationFilter {
            donor_id: None,
            payment_status: query.payment_status,
            donation_type: query.donation_type,
            payment_method: query.payment_method,
            is_recurring: query.is_recurring,
            start_date: query.start_date,
            end_date: query.end_date,
        };
        self.repo.list(&filter, page).await
    }

    pub async fn list_for_donor(&self, donor_id: &str, params: ListParams) -> Result<Paginated<Donation>> {
        let filter = DonationFilter {
            donor_id: Some(donor_id.to_string()),
            ..Default::default()
        };
        self.repo.list(&filter, params.page_request()?).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Donation> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Donation not found".to_string()))
    }

    pub async fn update(&self, id: Uuid, request: UpdateDonationRequest) -> Result<Donation> {
        validate_payload(&request)?;
        let mut donation = self.get(id).await?;
        let previous = donation.payment_status;

        let now = Utc::now();
        donation.apply_update(request, now)?;
        donation.updated_at = now;

        let donation = self.repo.update(donation).await?;
        if donation.payment_status != previous {
            tracing::info!(
                "Donation {} payment status {} -> {}",
                donation.payment_id,
                previous,
                donation.payment_status
            );
        }
        Ok(donation)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Donation not found".to_string()));
        }
        Ok(())
    }

    pub async fn stats(&self, range: DateRange) -> Result<DonationStats> {
        if let (Some(start), Some(end)) = (range.start_date, range.end_date) {
            if end < start {
                return Err(AppError::invalid("end_date", "End date must be after start date"));
            }
        }
        self.repo.stats(&range).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn payment_ids_embed_the_timestamp_and_differ() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let a = generate_payment_id(now);
        let b = generate_payment_id(now);

        let prefix = format!("DON_{}_", now.timestamp_millis());
        assert!(a.starts_with(&prefix));
        assert_eq!(a.len(), prefix.len() + 10);
        assert_ne!(a, b);
    }
}
