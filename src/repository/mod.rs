use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use crate::domain::*;
use crate::error::{AppError, Result};

mod row;

pub mod event_repository;
pub mod sermon_repository;
pub mod prayer_request_repository;
pub mod blog_post_repository;
pub mod donation_repository;
pub mod member_repository;
pub mod testimony_repository;
pub mod resource_repository;

pub use event_repository::SqliteEventRepository;
pub use sermon_repository::SqliteSermonRepository;
pub use prayer_request_repository::SqlitePrayerRequestRepository;
pub use blog_post_repository::SqliteBlogPostRepository;
pub use donation_repository::SqliteDonationRepository;
pub use member_repository::SqliteMemberRepository;
pub use testimony_repository::SqliteTestimonyRepository;
pub use resource_repository::SqliteResourceRepository;

/// Maps a unique-index violation to a conflict with a domain message.
pub(crate) fn conflict_on_unique(message: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |err| match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict(message.to_string()),
        other => other,
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub event_type: Option<EventType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct SermonFilter {
    pub search: Option<String>,
    pub pastor: Option<String>,
    pub series: Option<String>,
    pub tag: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct PrayerRequestFilter {
    pub status: Option<PrayerStatus>,
    pub is_public: Option<bool>,
    /// Order by prayer count before recency, as the public wall does.
    pub most_prayed_first: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BlogPostFilter {
    pub status: Option<BlogStatus>,
    pub author: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DonationFilter {
    pub donor_id: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub donation_type: Option<DonationType>,
    pub payment_method: Option<PaymentMethod>,
    pub is_recurring: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct MemberFilter {
    pub membership_status: Option<MembershipStatus>,
    pub role: Option<MemberRole>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TestimonyFilter {
    pub status: Option<TestimonyStatus>,
    pub category: Option<TestimonyCategory>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub category: Option<ResourceCategory>,
    pub published: Option<bool>,
    pub search: Option<String>,
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: Event) -> Result<Event>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>>;
    async fn list(&self, filter: &EventFilter, page: PageRequest) -> Result<Paginated<Event>>;
    async fn update(&self, event: Event) -> Result<Event>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait SermonRepository: Send + Sync {
    async fn create(&self, sermon: Sermon) -> Result<Sermon>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Sermon>>;
    async fn list(&self, filter: &SermonFilter, page: PageRequest) -> Result<Paginated<Sermon>>;
    async fn update(&self, sermon: Sermon) -> Result<Sermon>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait PrayerRequestRepository: Send + Sync {
    async fn create(&self, request: PrayerRequest) -> Result<PrayerRequest>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PrayerRequest>>;
    async fn list(&self, filter: &PrayerRequestFilter, page: PageRequest) -> Result<Paginated<PrayerRequest>>;
    async fn update(&self, request: PrayerRequest) -> Result<PrayerRequest>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Atomically adds one prayer; `None` when the request does not exist.
    async fn increment_prayer_count(&self, id: Uuid) -> Result<Option<PrayerRequest>>;
}

#[async_trait]
pub trait BlogPostRepository: Send + Sync {
    async fn create(&self, post: BlogPost) -> Result<BlogPost>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BlogPost>>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;
    async fn slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool>;
    async fn list(&self, filter: &BlogPostFilter, page: PageRequest) -> Result<Paginated<BlogPost>>;
    async fn update(&self, post: BlogPost) -> Result<BlogPost>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn increment_views(&self, id: Uuid) -> Result<Option<BlogPost>>;
}

#[async_trait]
pub trait DonationRepository: Send + Sync {
    async fn create(&self, donation: Donation) -> Result<Donation>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Donation>>;
    async fn list(&self, filter: &DonationFilter, page: PageRequest) -> Result<Paginated<Donation>>;
    async fn update(&self, donation: Donation) -> Result<Donation>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Aggregates over completed donations created inside `range`.
    async fn stats(&self, range: &DateRange) -> Result<DonationStats>;
}

#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn create(&self, member: Member) -> Result<Member>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Member>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>>;
    async fn email_exists(&self, email: &str, exclude: Option<Uuid>) -> Result<bool>;
    async fn list(&self, filter: &MemberFilter, page: PageRequest) -> Result<Paginated<Member>>;
    async fn update(&self, member: Member) -> Result<Member>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Member>>;
    async fn stats(&self) -> Result<MemberStats>;
}

#[async_trait]
pub trait TestimonyRepository: Send + Sync {
    async fn create(&self, testimony: Testimony) -> Result<Testimony>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Testimony>>;
    async fn list(&self, filter: &TestimonyFilter, page: PageRequest) -> Result<Paginated<Testimony>>;
    async fn update(&self, testimony: Testimony) -> Result<Testimony>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn count_since(&self, author_email: &str, since: DateTime<Utc>) -> Result<i64>;
    async fn stats(&self) -> Result<TestimonyStats>;
}

#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn create(&self, resource: Resource) -> Result<Resource>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Resource>>;
    async fn list(&self, filter: &ResourceFilter, page: PageRequest) -> Result<Paginated<Resource>>;
    async fn list_faqs(&self) -> Result<Vec<FaqEntry>>;
    async fn update(&self, resource: Resource) -> Result<Resource>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Counts a download of a published resource; `None` if absent or unpublished.
    async fn increment_downloads(&self, id: Uuid) -> Result<Option<Resource>>;
    async fn stats(&self) -> Result<ResourceStats>;
}
