use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{PageRequest, Paginated, Sermon},
    error::{AppError, Result},
    repository::{
        row::{decode_list, encode_list, like_pattern, parse_uuid, utc},
        SermonFilter, SermonRepository,
    },
};

const SERMON_COLUMNS: &str = "id, title, description, pastor_name, sermon_date, scripture_reference, \
    video_url, audio_url, transcript, series, tags, created_by, created_at, updated_at";

#[derive(FromRow)]
struct SermonRow {
    id: String,
    title: String,
    description: Option<String>,
    pastor_name: String,
    sermon_date: NaiveDate,
    scripture_reference: Option<String>,
    video_url: Option<String>,
    audio_url: Option<String>,
    transcript: Option<String>,
    series: Option<String>,
    tags: String,
    created_by: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteSermonRepository {
    pool: SqlitePool,
}

impl SqliteSermonRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_sermon(row: SermonRow) -> Result<Sermon> {
        Ok(Sermon {
            id: parse_uuid(&row.id)?,
            title: row.title,
            description: row.description,
            pastor_name: row.pastor_name,
            sermon_date: row.sermon_date,
            scripture_reference: row.scripture_reference,
            video_url: row.video_url,
            audio_url: row.audio_url,
            transcript: row.transcript,
            series: row.series,
            tags: decode_list(&row.tags)?,
            created_by: row.created_by,
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }

    fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &SermonFilter) {
        if let Some(search) = &filter.search {
            let pattern = like_pattern(search);
            query
                .push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR description LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR transcript LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        if let Some(pastor) = &filter.pastor {
            query
                .push(" AND pastor_name LIKE ")
                .push_bind(like_pattern(pastor))
                .push(" ESCAPE '\\'");
        }
        if let Some(series) = &filter.series {
            query.push(" AND series = ").push_bind(series.clone());
        }
        if let Some(tag) = &filter.tag {
            query
                .push(" AND EXISTS (SELECT 1 FROM json_each(sermons.tags) WHERE json_each.value = ")
                .push_bind(tag.clone())
                .push(")");
        }
        if let Some(start) = filter.start_date {
            query.push(" AND sermon_date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND sermon_date <= ").push_bind(end);
        }
    }
}

#[async_trait]
impl SermonRepository for SqliteSermonRepository {
    async fn create(&self, sermon: Sermon) -> Result<Sermon> {
        sqlx::query(
            r#"
            INSERT INTO sermons (
                id, title, description, pastor_name, sermon_date, scripture_reference,
                video_url, audio_url, transcript, series, tags, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sermon.id.to_string())
        .bind(&sermon.title)
        .bind(&sermon.description)
        .bind(&sermon.pastor_name)
        .bind(sermon.sermon_date)
        .bind(&sermon.scripture_reference)
        .bind(&sermon.video_url)
        .bind(&sermon.audio_url)
        .bind(&sermon.transcript)
        .bind(&sermon.series)
        .bind(encode_list(&sermon.tags)?)
        .bind(&sermon.created_by)
        .bind(sermon.created_at.naive_utc())
        .bind(sermon.updated_at.naive_utc())
        .execute(&self.pool)
        .await?;

        self.find_by_id(sermon.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created sermon".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Sermon>> {
        let row = sqlx::query_as::<_, SermonRow>(&format!(
            "SELECT {} FROM sermons WHERE id = ?",
            SERMON_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_sermon).transpose()
    }

    async fn list(&self, filter: &SermonFilter, page: PageRequest) -> Result<Paginated<Sermon>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM sermons WHERE 1 = 1");
        Self::push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM sermons WHERE 1 = 1",
            SERMON_COLUMNS
        ));
        Self::push_filters(&mut select, filter);
        select
            .push(" ORDER BY sermon_date DESC, created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select
            .build_query_as::<SermonRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Self::row_to_sermon)
            .collect::<Result<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn update(&self, sermon: Sermon) -> Result<Sermon> {
        let result = sqlx::query(
            r#"
            UPDATE sermons SET
                title = ?, description = ?, pastor_name = ?, sermon_date = ?,
                scripture_reference = ?, video_url = ?, audio_url = ?, transcript = ?,
                series = ?, tags = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&sermon.title)
        .bind(&sermon.description)
        .bind(&sermon.pastor_name)
        .bind(sermon.sermon_date)
        .bind(&sermon.scripture_reference)
        .bind(&sermon.video_url)
        .bind(&sermon.audio_url)
        .bind(&sermon.transcript)
        .bind(&sermon.series)
        .bind(encode_list(&sermon.tags)?)
        .bind(sermon.updated_at.naive_utc())
        .bind(sermon.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Sermon not found".to_string()));
        }

        self.find_by_id(sermon.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated sermon".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sermons WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
