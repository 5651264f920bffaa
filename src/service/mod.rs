pub mod event_service;
pub mod sermon_service;
pub mod prayer_request_service;
pub mod blog_post_service;
pub mod donation_service;
pub mod member_service;
pub mod testimony_service;
pub mod resource_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::repository::*;
use crate::storage::BlobStore;
use event_service::EventService;
use sermon_service::SermonService;
use prayer_request_service::PrayerRequestService;
use blog_post_service::BlogPostService;
use donation_service::DonationService;
use member_service::MemberService;
use testimony_service::TestimonyService;
use resource_service::ResourceService;

pub struct ServiceContext {
    pub event_service: Arc<EventService>,
    pub sermon_service: Arc<SermonService>,
    pub prayer_request_service: Arc<PrayerRequestService>,
    pub blog_post_service: Arc<BlogPostService>,
    pub donation_service: Arc<DonationService>,
    pub member_service: Arc<MemberService>,
    pub testimony_service: Arc<TestimonyService>,
    pub resource_service: Arc<ResourceService>,
    pub blob_store: Arc<dyn BlobStore>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, blob_store: Arc<dyn BlobStore>) -> Self {
        let event_repo = Arc::new(SqliteEventRepository::new(db_pool.clone()));
        let sermon_repo = Arc::new(SqliteSermonRepository::new(db_pool.clone()));
        let prayer_repo = Arc::new(SqlitePrayerRequestRepository::new(db_pool.clone()));
        let blog_repo = Arc::new(SqliteBlogPostRepository::new(db_pool.clone()));
        let donation_repo = Arc::new(SqliteDonationRepository::new(db_pool.clone()));
        let member_repo = Arc::new(SqliteMemberRepository::new(db_pool.clone()));
        let testimony_repo = Arc::new(SqliteTestimonyRepository::new(db_pool.clone()));
        let resource_repo = Arc::new(SqliteResourceRepository::new(db_pool.clone()));

        Self {
            event_service: Arc::new(EventService::new(event_repo, blob_store.clone())),
            sermon_service: Arc::new(SermonService::new(sermon_repo)),
            prayer_request_service: Arc::new(PrayerRequestService::new(prayer_repo)),
            blog_post_service: Arc::new(BlogPostService::new(blog_repo)),
            donation_service: Arc::new(DonationService::new(donation_repo)),
            member_service: Arc::new(MemberService::new(member_repo)),
            testimony_service: Arc::new(TestimonyService::new(testimony_repo, blob_store.clone())),
            resource_service: Arc::new(ResourceService::new(resource_repo)),
            blob_store,
            db_pool,
        }
    }
}
