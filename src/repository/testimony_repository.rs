use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{PageRequest, Paginated, Testimony, TestimonyStats, TestimonyStatusCount},
    error::{AppError, Result},
    repository::{
        row::{decode_list, encode_list, parse_enum, parse_uuid, utc},
        TestimonyFilter, TestimonyRepository,
    },
};

const TESTIMONY_COLUMNS: &str = "id, title, content, author_name, author_email, author_location, \
    category, status, scheduled_date, images, is_featured, likes, approved_by, approved_at, \
    created_at, updated_at";

#[derive(FromRow)]
struct TestimonyRow {
    id: String,
    title: String,
    content: String,
    author_name: String,
    author_email: String,
    author_location: Option<String>,
    category: String,
    status: String,
    scheduled_date: Option<NaiveDateTime>,
    images: String,
    is_featured: bool,
    likes: i64,
    approved_by: Option<String>,
    approved_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteTestimonyRepository {
    pool: SqlitePool,
}

impl SqliteTestimonyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_testimony(row: TestimonyRow) -> Result<Testimony> {
        Ok(Testimony {
            id: parse_uuid(&row.id)?,
            title: row.title,
            content: row.content,
            author_name: row.author_name,
            author_email: row.author_email,
            author_location: row.author_location,
            category: parse_enum(&row.category)?,
            status: parse_enum(&row.status)?,
            scheduled_date: row.scheduled_date.map(utc),
            images: decode_list(&row.images)?,
            is_featured: row.is_featured,
            likes: row.likes,
            approved_by: row.approved_by,
            approved_at: row.approved_at.map(utc),
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }

    fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &TestimonyFilter) {
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(featured) = filter.featured {
            query.push(" AND is_featured = ").push_bind(featured);
        }
    }
}

#[async_trait]
impl TestimonyRepository for SqliteTestimonyRepository {
    async fn create(&self, testimony: Testimony) -> Result<Testimony> {
        sqlx::query(
            r#"
            INSERT INTO testimonies (
                id, title, content, author_name, author_email, author_location, category,
                status, scheduled_date, images, is_featured, likes, approved_by, approved_at,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(testimony.id.to_string())
        .bind(&testimony.title)
        .bind(&testimony.content)
        .bind(&testimony.author_name)
        .bind(&testimony.author_email)
        .bind(&testimony.author_location)
        .bind(testimony.category.as_str())
        .bind(testimony.status.as_str())
        .bind(testimony.scheduled_date.map(|dt| dt.naive_utc()))
        .bind(encode_list(&testimony.images)?)
        .bind(testimony.is_featured)
        .bind(testimony.likes)
        .bind(&testimony.approved_by)
        .bind(testimony.approved_at.map(|dt| dt.naive_utc()))
        .bind(testimony.created_at.naive_utc())
        .bind(testimony.updated_at.naive_utc())
        .execute(&self.pool)
        .await?;

        self.find_by_id(testimony.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created testimony".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Testimony>> {
        let row = sqlx::query_as::<_, TestimonyRow>(&format!(
            "SELECT {} FROM testimonies WHERE id = ?",
            TESTIMONY_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_testimony).transpose()
    }

    async fn list(&self, filter: &TestimonyFilter, page: PageRequest) -> Result<Paginated<Testimony>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM testimonies WHERE 1 = 1");
        Self::push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM testimonies WHERE 1 = 1",
            TESTIMONY_COLUMNS
        ));
        Self::push_filters(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select
            .build_query_as::<TestimonyRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Self::row_to_testimony)
            .collect::<Result<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn update(&self, testimony: Testimony) -> Result<Testimony> {
        let result = sqlx::query(
            r#"
            UPDATE testimonies SET
                title = ?, content = ?, author_location = ?, category = ?, status = ?,
                scheduled_date = ?, images = ?, is_featured = ?, approved_by = ?,
                approved_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&testimony.title)
        .bind(&testimony.content)
        .bind(&testimony.author_location)
        .bind(testimony.category.as_str())
        .bind(testimony.status.as_str())
        .bind(testimony.scheduled_date.map(|dt| dt.naive_utc()))
        .bind(encode_list(&testimony.images)?)
        .bind(testimony.is_featured)
        .bind(&testimony.approved_by)
        .bind(testimony.approved_at.map(|dt| dt.naive_utc()))
        .bind(testimony.updated_at.naive_utc())
        .bind(testimony.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Testimony not found".to_string()));
        }

        self.find_by_id(testimony.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated testimony".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM testimonies WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_since(&self, author_email: &str, since: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM testimonies WHERE author_email = ? AND created_at >= ?",
        )
        .bind(author_email)
        .bind(since.naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn stats(&self) -> Result<TestimonyStats> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM testimonies GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let by_status = rows
            .into_iter()
            .map(|(status, count)| {
                Ok(TestimonyStatusCount {
                    status: parse_enum(&status)?,
                    count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let featured: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM testimonies WHERE is_featured = 1 AND status = 'approved'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TestimonyStats {
            total: by_status.iter().map(|s| s.count).sum(),
            featured,
            by_status,
        })
    }
}
