use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Event, PageRequest, Paginated},
    error::{AppError, Result},
    repository::{
        row::{decode_list, encode_list, parse_enum, parse_uuid, utc},
        EventFilter, EventRepository,
    },
};

const EVENT_COLUMNS: &str = "id, title, description, event_type, start_date, end_date, location, \
    max_attendees, created_by, images, created_at, updated_at";

#[derive(FromRow)]
struct EventRow {
    id: String,
    title: String,
    description: Option<String>,
    event_type: String,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
    location: Option<String>,
    max_attendees: Option<i32>,
    created_by: String,
    images: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_event(row: EventRow) -> Result<Event> {
        Ok(Event {
            id: parse_uuid(&row.id)?,
            title: row.title,
            description: row.description,
            event_type: parse_enum(&row.event_type)?,
            start_date: utc(row.start_date),
            end_date: utc(row.end_date),
            location: row.location,
            max_attendees: row.max_attendees,
            created_by: row.created_by,
            images: decode_list(&row.images)?,
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }

    fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &EventFilter) {
        if let Some(event_type) = filter.event_type {
            query.push(" AND event_type = ").push_bind(event_type.as_str());
        }
        if let Some(from) = filter.from {
            query.push(" AND start_date >= ").push_bind(from.naive_utc());
        }
        if let Some(to) = filter.to {
            query.push(" AND start_date <= ").push_bind(to.naive_utc());
        }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn create(&self, event: Event) -> Result<Event> {
        sqlx::query(
            r#"
            INSERT INTO events (
                id, title, description, event_type, start_date, end_date,
                location, max_attendees, created_by, images, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_type.as_str())
        .bind(event.start_date.naive_utc())
        .bind(event.end_date.naive_utc())
        .bind(&event.location)
        .bind(event.max_attendees)
        .bind(&event.created_by)
        .bind(encode_list(&event.images)?)
        .bind(event.created_at.naive_utc())
        .bind(event.updated_at.naive_utc())
        .execute(&self.pool)
        .await?;

        self.find_by_id(event.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created event".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = ?",
            EVENT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_event).transpose()
    }

    async fn list(&self, filter: &EventFilter, page: PageRequest) -> Result<Paginated<Event>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM events WHERE 1 = 1");
        Self::push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM events WHERE 1 = 1",
            EVENT_COLUMNS
        ));
        Self::push_filters(&mut select, filter);
        select
            .push(" ORDER BY start_date DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build_query_as::<EventRow>()
            .fetch_all(&self.pool)
            .await?;
        let items = rows
            .into_iter()
            .map(Self::row_to_event)
            .collect::<Result<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn update(&self, event: Event) -> Result<Event> {
        let result = sqlx::query(
            r#"
            UPDATE events SET
                title = ?, description = ?, event_type = ?, start_date = ?, end_date = ?,
                location = ?, max_attendees = ?, images = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_type.as_str())
        .bind(event.start_date.naive_utc())
        .bind(event.end_date.naive_utc())
        .bind(&event.location)
        .bind(event.max_attendees)
        .bind(encode_list(&event.images)?)
        .bind(event.updated_at.naive_utc())
        .bind(event.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        self.find_by_id(event.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated event".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
