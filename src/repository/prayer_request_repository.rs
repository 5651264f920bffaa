use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{PageRequest, Paginated, PrayerRequest},
    error::{AppError, Result},
    repository::{
        row::{parse_enum, parse_uuid, utc},
        PrayerRequestFilter, PrayerRequestRepository,
    },
};

const PRAYER_COLUMNS: &str = "id, title, description, requester_name, requester_id, status, \
    is_anonymous, is_public, prayer_count, created_at, updated_at";

#[derive(FromRow)]
struct PrayerRequestRow {
    id: String,
    title: String,
    description: String,
    requester_name: Option<String>,
    requester_id: String,
    status: String,
    is_anonymous: bool,
    is_public: bool,
    prayer_count: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqlitePrayerRequestRepository {
    pool: SqlitePool,
}

impl SqlitePrayerRequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_request(row: PrayerRequestRow) -> Result<PrayerRequest> {
        Ok(PrayerRequest {
            id: parse_uuid(&row.id)?,
            title: row.title,
            description: row.description,
            requester_name: row.requester_name,
            requester_id: row.requester_id,
            status: parse_enum(&row.status)?,
            is_anonymous: row.is_anonymous,
            is_public: row.is_public,
            prayer_count: row.prayer_count,
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }

    fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &PrayerRequestFilter) {
        if let Some(is_public) = filter.is_public {
            query.push(" AND is_public = ").push_bind(is_public);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
    }
}

#[async_trait]
impl PrayerRequestRepository for SqlitePrayerRequestRepository {
    async fn create(&self, request: PrayerRequest) -> Result<PrayerRequest> {
        sqlx::query(
            r#"
            INSERT INTO prayer_requests (
                id, title, description, requester_name, requester_id, status,
                is_anonymous, is_public, prayer_count, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.id.to_string())
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.requester_name)
        .bind(&request.requester_id)
        .bind(request.status.as_str())
        .bind(request.is_anonymous)
        .bind(request.is_public)
        .bind(request.prayer_count)
        .bind(request.created_at.naive_utc())
        .bind(request.updated_at.naive_utc())
        .execute(&self.pool)
        .await?;

        self.find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created prayer request".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PrayerRequest>> {
        let row = sqlx::query_as::<_, PrayerRequestRow>(&format!(
            "SELECT {} FROM prayer_requests WHERE id = ?",
            PRAYER_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_request).transpose()
    }

    async fn list(
        &self,
        filter: &PrayerRequestFilter,
        page: PageRequest,
    ) -> Result<Paginated<PrayerRequest>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM prayer_requests WHERE 1 = 1");
        Self::push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM prayer_requests WHERE 1 = 1",
            PRAYER_COLUMNS
        ));
        Self::push_filters(&mut select, filter);
        if filter.most_prayed_first {
            select.push(" ORDER BY prayer_count DESC, created_at DESC");
        } else {
            select.push(" ORDER BY created_at DESC");
        }
        select
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select
            .build_query_as::<PrayerRequestRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Self::row_to_request)
            .collect::<Result<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn update(&self, request: PrayerRequest) -> Result<PrayerRequest> {
        // prayer_count is only ever changed by increment_prayer_count.
        let result = sqlx::query(
            r#"
            UPDATE prayer_requests SET
                title = ?, description = ?, requester_name = ?, status = ?,
                is_anonymous = ?, is_public = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.requester_name)
        .bind(request.status.as_str())
        .bind(request.is_anonymous)
        .bind(request.is_public)
        .bind(request.updated_at.naive_utc())
        .bind(request.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Prayer request not found".to_string()));
        }

        self.find_by_id(request.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated prayer request".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM prayer_requests WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_prayer_count(&self, id: Uuid) -> Result<Option<PrayerRequest>> {
        let result = sqlx::query("UPDATE prayer_requests SET prayer_count = prayer_count + 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}
