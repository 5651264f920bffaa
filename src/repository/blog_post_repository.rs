use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{BlogPost, BlogStatus, PageRequest, Paginated},
    error::{AppError, Result},
    repository::{
        conflict_on_unique,
        row::{decode_list, encode_list, parse_enum, parse_uuid, utc},
        BlogPostFilter, BlogPostRepository,
    },
};

const POST_COLUMNS: &str = "id, title, slug, content, excerpt, featured_image, status, tags, \
    author, published_at, views, reading_time, created_at, updated_at";

const DUPLICATE_SLUG: &str = "A post with this slug already exists";

#[derive(FromRow)]
struct BlogPostRow {
    id: String,
    title: String,
    slug: String,
    content: String,
    excerpt: Option<String>,
    featured_image: Option<String>,
    status: String,
    tags: String,
    author: String,
    published_at: Option<NaiveDateTime>,
    views: i64,
    reading_time: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteBlogPostRepository {
    pool: SqlitePool,
}

impl SqliteBlogPostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_post(row: BlogPostRow) -> Result<BlogPost> {
        Ok(BlogPost {
            id: parse_uuid(&row.id)?,
            title: row.title,
            slug: row.slug,
            content: row.content,
            excerpt: row.excerpt,
            featured_image: row.featured_image,
            status: parse_enum(&row.status)?,
            tags: decode_list(&row.tags)?,
            author: row.author,
            published_at: row.published_at.map(utc),
            views: row.views,
            reading_time: row.reading_time,
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }

    fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &BlogPostFilter) {
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(author) = &filter.author {
            query.push(" AND author = ").push_bind(author.to_lowercase());
        }
        if let Some(tag) = &filter.tag {
            query
                .push(" AND EXISTS (SELECT 1 FROM json_each(blog_posts.tags) WHERE json_each.value = ")
                .push_bind(tag.clone())
                .push(")");
        }
    }
}

#[async_trait]
impl BlogPostRepository for SqliteBlogPostRepository {
    async fn create(&self, post: BlogPost) -> Result<BlogPost> {
        sqlx::query(
            r#"
            INSERT INTO blog_posts (
                id, title, slug, content, excerpt, featured_image, status, tags,
                author, published_at, views, reading_time, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post.id.to_string())
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.featured_image)
        .bind(post.status.as_str())
        .bind(encode_list(&post.tags)?)
        .bind(&post.author)
        .bind(post.published_at.map(|dt| dt.naive_utc()))
        .bind(post.views)
        .bind(post.reading_time)
        .bind(post.created_at.naive_utc())
        .bind(post.updated_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(conflict_on_unique(DUPLICATE_SLUG))?;

        self.find_by_id(post.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created post".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BlogPost>> {
        let row = sqlx::query_as::<_, BlogPostRow>(&format!(
            "SELECT {} FROM blog_posts WHERE id = ?",
            POST_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_post).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let row = sqlx::query_as::<_, BlogPostRow>(&format!(
            "SELECT {} FROM blog_posts WHERE slug = ?",
            POST_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_post).transpose()
    }

    async fn slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM blog_posts WHERE slug = ? AND (? IS NULL OR id != ?))",
        )
        .bind(slug)
        .bind(exclude.map(|id| id.to_string()))
        .bind(exclude.map(|id| id.to_string()))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list(&self, filter: &BlogPostFilter, page: PageRequest) -> Result<Paginated<BlogPost>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM blog_posts WHERE 1 = 1");
        Self::push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM blog_posts WHERE 1 = 1",
            POST_COLUMNS
        ));
        Self::push_filters(&mut select, filter);
        if filter.status == Some(BlogStatus::Published) {
            select.push(" ORDER BY published_at DESC, created_at DESC");
        } else {
            select.push(" ORDER BY created_at DESC");
        }
        select
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select
            .build_query_as::<BlogPostRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Self::row_to_post)
            .collect::<Result<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn update(&self, post: BlogPost) -> Result<BlogPost> {
        let result = sqlx::query(
            r#"
            UPDATE blog_posts SET
                title = ?, slug = ?, content = ?, excerpt = ?, featured_image = ?,
                status = ?, tags = ?, published_at = ?, reading_time = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.featured_image)
        .bind(post.status.as_str())
        .bind(encode_list(&post.tags)?)
        .bind(post.published_at.map(|dt| dt.naive_utc()))
        .bind(post.reading_time)
        .bind(post.updated_at.naive_utc())
        .bind(post.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(conflict_on_unique(DUPLICATE_SLUG))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        self.find_by_id(post.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated post".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<BlogPost>> {
        let result = sqlx::query("UPDATE blog_posts SET views = views + 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}
