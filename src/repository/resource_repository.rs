use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CategoryStats, FaqEntry, PageRequest, Paginated, Resource, ResourceStats},
    error::{AppError, Result},
    repository::{
        row::{decode_list, encode_list, like_pattern, parse_enum, parse_uuid, utc},
        ResourceFilter, ResourceRepository,
    },
};

const RESOURCE_COLUMNS: &str = "id, title, description, category, file_type, file_url, file_size, \
    pages, duration, artist, download_count, is_published, published_at, tags, sort_order, \
    created_at, updated_at";

#[derive(FromRow)]
struct ResourceRow {
    id: String,
    title: String,
    description: String,
    category: String,
    file_type: String,
    file_url: Option<String>,
    file_size: i64,
    pages: Option<i32>,
    duration: Option<String>,
    artist: Option<String>,
    download_count: i64,
    is_published: bool,
    published_at: Option<NaiveDateTime>,
    tags: String,
    sort_order: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteResourceRepository {
    pool: SqlitePool,
}

impl SqliteResourceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_resource(row: ResourceRow) -> Result<Resource> {
        Ok(Resource {
            id: parse_uuid(&row.id)?,
            title: row.title,
            description: row.description,
            category: parse_enum(&row.category)?,
            file_type: parse_enum(&row.file_type)?,
            file_url: row.file_url,
            file_size: row.file_size,
            pages: row.pages,
            duration: row.duration,
            artist: row.artist,
            download_count: row.download_count,
            is_published: row.is_published,
            published_at: row.published_at.map(utc),
            tags: decode_list(&row.tags)?,
            order: row.sort_order,
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }

    fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &ResourceFilter) {
        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(published) = filter.published {
            query.push(" AND is_published = ").push_bind(published);
        }
        if let Some(search) = &filter.search {
            let pattern = like_pattern(search);
            query
                .push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR description LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
    }
}

#[async_trait]
impl ResourceRepository for SqliteResourceRepository {
    async fn create(&self, resource: Resource) -> Result<Resource> {
        sqlx::query(
            r#"
            INSERT INTO resources (
                id, title, description, category, file_type, file_url, file_size, pages,
                duration, artist, download_count, is_published, published_at, tags,
                sort_order, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(resource.id.to_string())
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(resource.category.as_str())
        .bind(resource.file_type.as_str())
        .bind(&resource.file_url)
        .bind(resource.file_size)
        .bind(resource.pages)
        .bind(&resource.duration)
        .bind(&resource.artist)
        .bind(resource.download_count)
        .bind(resource.is_published)
        .bind(resource.published_at.map(|dt| dt.naive_utc()))
        .bind(encode_list(&resource.tags)?)
        .bind(resource.order)
        .bind(resource.created_at.naive_utc())
        .bind(resource.updated_at.naive_utc())
        .execute(&self.pool)
        .await?;

        self.find_by_id(resource.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created resource".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Resource>> {
        let row = sqlx::query_as::<_, ResourceRow>(&format!(
            "SELECT {} FROM resources WHERE id = ?",
            RESOURCE_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_resource).transpose()
    }

    async fn list(&self, filter: &ResourceFilter, page: PageRequest) -> Result<Paginated<Resource>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM resources WHERE 1 = 1");
        Self::push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM resources WHERE 1 = 1",
            RESOURCE_COLUMNS
        ));
        Self::push_filters(&mut select, filter);
        select
            .push(" ORDER BY sort_order ASC, created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select
            .build_query_as::<ResourceRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Self::row_to_resource)
            .collect::<Result<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn list_faqs(&self) -> Result<Vec<FaqEntry>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT title, description FROM resources
            WHERE category = 'faq' AND is_published = 1
            ORDER BY sort_order ASC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(title, description)| FaqEntry { title, description })
            .collect())
    }

    async fn update(&self, resource: Resource) -> Result<Resource> {
        let result = sqlx::query(
            r#"
            UPDATE resources SET
                title = ?, description = ?, category = ?, file_type = ?, file_url = ?,
                file_size = ?, pages = ?, duration = ?, artist = ?, is_published = ?,
                published_at = ?, tags = ?, sort_order = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(resource.category.as_str())
        .bind(resource.file_type.as_str())
        .bind(&resource.file_url)
        .bind(resource.file_size)
        .bind(resource.pages)
        .bind(&resource.duration)
        .bind(&resource.artist)
        .bind(resource.is_published)
        .bind(resource.published_at.map(|dt| dt.naive_utc()))
        .bind(encode_list(&resource.tags)?)
        .bind(resource.order)
        .bind(resource.updated_at.naive_utc())
        .bind(resource.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Resource not found".to_string()));
        }

        self.find_by_id(resource.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated resource".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_downloads(&self, id: Uuid) -> Result<Option<Resource>> {
        let result = sqlx::query(
            "UPDATE resources SET download_count = download_count + 1 WHERE id = ? AND is_published = 1",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn stats(&self) -> Result<ResourceStats> {
        let rows: Vec<(String, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                category,
                COUNT(*),
                COALESCE(SUM(CASE WHEN is_published = 1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(download_count), 0)
            FROM resources
            GROUP BY category
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let by_category = rows
            .into_iter()
            .map(|(category, count, published, downloads)| {
                Ok(CategoryStats {
                    category: parse_enum(&category)?,
                    count,
                    published,
                    downloads,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ResourceStats {
            total: by_category.iter().map(|c| c.count).sum(),
            total_downloads: by_category.iter().map(|c| c.downloads).sum(),
            by_category,
        })
    }
}
