mod common;

use chrono::{Duration, Utc};
use sanctuary::{
    domain::{CreateMemberRequest, Member, MemberRole, MembershipStatus, PageRequest},
    error::AppError,
    repository::{MemberFilter, MemberRepository, SqliteMemberRepository},
};

fn member(email: &str, name: &str, status: MembershipStatus) -> Member {
    let request: CreateMemberRequest = serde_json::from_value(serde_json::json!({
        "email": email,
        "full_name": name,
        "ministries": ["choir"],
        "emergency_contact": { "name": "Ann", "phone": "+1 555 0100" }
    }))
    .expect("request parses");
    let mut member = Member::from_request(request, Utc::now());
    member.membership_status = status;
    member
}

#[tokio::test]
async fn member_crud() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteMemberRepository::new(pool);

    let created = repo.create(member("test@example.com", "Test User", MembershipStatus::Pending)).await?;
    assert_eq!(created.email, "test@example.com");
    assert_eq!(created.role, MemberRole::Member);
    assert_eq!(created.ministries, vec!["choir".to_string()]);
    assert_eq!(created.emergency_contact.as_ref().map(|c| c.name.as_str()), Some("Ann"));

    let found = repo.find_by_id(created.id).await?.expect("member by id");
    assert_eq!(found.id, created.id);
    assert!(repo.find_by_email("test@example.com").await?.is_some());

    let mut changed = found;
    changed.membership_status = MembershipStatus::Active;
    let updated = repo.update(changed).await?;
    assert_eq!(updated.membership_status, MembershipStatus::Active);

    let touched = repo.touch(created.id, Utc::now()).await?.expect("touched member");
    assert!(touched.last_activity.is_some());

    assert!(repo.delete(created.id).await?);
    assert!(repo.find_by_id(created.id).await?.is_none());
    assert!(!repo.delete(created.id).await?);
    Ok(())
}

#[tokio::test]
async fn unique_email_index_is_authoritative() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteMemberRepository::new(pool);

    repo.create(member("dup@example.com", "First", MembershipStatus::Active)).await?;
    let err = repo
        .create(member("dup@example.com", "Second", MembershipStatus::Active))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref msg) if msg == "A member with this email already exists"));
    Ok(())
}

#[tokio::test]
async fn member_listing_filters_and_counts() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteMemberRepository::new(pool);

    repo.create(member("b@example.com", "Boaz", MembershipStatus::Active)).await?;
    repo.create(member("a@example.com", "Abigail", MembershipStatus::Active)).await?;
    repo.create(member("c@example.com", "Caleb", MembershipStatus::Inactive)).await?;

    let page = repo.list(&MemberFilter::default(), PageRequest::new(Some(1), Some(2), 10, 100)?).await?;
    assert_eq!(page.total, 3);
    assert_eq!(page.pages(), 2);
    assert_eq!(page.items[0].full_name, "Abigail");

    let active = MemberFilter {
        membership_status: Some(MembershipStatus::Active),
        ..Default::default()
    };
    assert_eq!(repo.list(&active, PageRequest::default()).await?.total, 2);

    let search = MemberFilter {
        search: Some("CAL".to_string()),
        ..Default::default()
    };
    assert_eq!(repo.list(&search, PageRequest::default()).await?.items[0].full_name, "Caleb");

    let stats = repo.stats().await?;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.active, 2);
    Ok(())
}

#[tokio::test]
async fn testimony_window_counts_only_recent_submissions() -> anyhow::Result<()> {
    use sanctuary::{
        domain::SubmitTestimonyRequest,
        repository::{SqliteTestimonyRepository, TestimonyRepository},
    };
    use std::collections::HashMap;

    let pool = common::test_pool().await?;
    let repo = SqliteTestimonyRepository::new(pool);

    let fields: HashMap<String, String> = [
        ("title", "Provision"),
        ("content", "We were provided for in a hard season."),
        ("author_name", "Naomi"),
        ("author_email", "naomi@example.com"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let now = Utc::now();
    let old = SubmitTestimonyRequest::from_fields(fields.clone()).into_testimony(vec![], now - Duration::hours(30))?;
    let recent = SubmitTestimonyRequest::from_fields(fields).into_testimony(vec![], now)?;
    repo.create(old).await?;
    repo.create(recent).await?;

    assert_eq!(repo.count_since("naomi@example.com", now - Duration::hours(24)).await?, 1);
    assert_eq!(repo.count_since("someone@example.com", now - Duration::hours(24)).await?, 0);
    Ok(())
}
