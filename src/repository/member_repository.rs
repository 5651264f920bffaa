use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        EmergencyContact, Member, MemberStats, MembershipStatus, PageRequest, Paginated,
        StatusCount,
    },
    error::{AppError, Result},
    repository::{
        conflict_on_unique,
        row::{decode_list, encode_list, like_pattern, parse_enum, parse_uuid, utc},
        MemberFilter, MemberRepository,
    },
};

const MEMBER_COLUMNS: &str = "id, email, full_name, phone, address, membership_status, role, \
    date_of_birth, baptism_date, join_date, emergency_contact, spiritual_gifts, ministries, notes, \
    avatar_url, is_email_verified, last_activity, created_at, updated_at";

const DUPLICATE_EMAIL: &str = "A member with this email already exists";

#[derive(FromRow)]
struct MemberRow {
    id: String,
    email: String,
    full_name: String,
    phone: Option<String>,
    address: Option<String>,
    membership_status: String,
    role: String,
    date_of_birth: Option<NaiveDate>,
    baptism_date: Option<NaiveDate>,
    join_date: NaiveDateTime,
    emergency_contact: Option<String>,
    spiritual_gifts: String,
    ministries: String,
    notes: Option<String>,
    avatar_url: Option<String>,
    is_email_verified: bool,
    last_activity: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_member(row: MemberRow) -> Result<Member> {
        let emergency_contact = row
            .emergency_contact
            .as_deref()
            .map(|json| serde_json::from_str::<EmergencyContact>(json))
            .transpose()
            .map_err(|e| AppError::Database(format!("Invalid emergency contact: {}", e)))?;

        Ok(Member {
            id: parse_uuid(&row.id)?,
            email: row.email,
            full_name: row.full_name,
            phone: row.phone,
            address: row.address,
            membership_status: parse_enum(&row.membership_status)?,
            role: parse_enum(&row.role)?,
            date_of_birth: row.date_of_birth,
            baptism_date: row.baptism_date,
            join_date: utc(row.join_date),
            emergency_contact,
            spiritual_gifts: decode_list(&row.spiritual_gifts)?,
            ministries: decode_list(&row.ministries)?,
            notes: row.notes,
            avatar_url: row.avatar_url,
            is_email_verified: row.is_email_verified,
            last_activity: row.last_activity.map(utc),
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }

    fn encode_contact(contact: &Option<EmergencyContact>) -> Result<Option<String>> {
        contact
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &MemberFilter) {
        if let Some(status) = filter.membership_status {
            query.push(" AND membership_status = ").push_bind(status.as_str());
        }
        if let Some(role) = filter.role {
            query.push(" AND role = ").push_bind(role.as_str());
        }
        if let Some(search) = &filter.search {
            let pattern = like_pattern(&search.to_lowercase());
            query
                .push(" AND (LOWER(full_name) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR email LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
    }
}

#[async_trait]
impl MemberRepository for SqliteMemberRepository {
    async fn create(&self, member: Member) -> Result<Member> {
        sqlx::query(
            r#"
            INSERT INTO members (
                id, email, full_name, phone, address, membership_status, role,
                date_of_birth, baptism_date, join_date, emergency_contact, spiritual_gifts,
                ministries, notes, avatar_url, is_email_verified, last_activity,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(member.id.to_string())
        .bind(&member.email)
        .bind(&member.full_name)
        .bind(&member.phone)
        .bind(&member.address)
        .bind(member.membership_status.as_str())
        .bind(member.role.as_str())
        .bind(member.date_of_birth)
        .bind(member.baptism_date)
        .bind(member.join_date.naive_utc())
        .bind(Self::encode_contact(&member.emergency_contact)?)
        .bind(encode_list(&member.spiritual_gifts)?)
        .bind(encode_list(&member.ministries)?)
        .bind(&member.notes)
        .bind(&member.avatar_url)
        .bind(member.is_email_verified)
        .bind(member.last_activity.map(|dt| dt.naive_utc()))
        .bind(member.created_at.naive_utc())
        .bind(member.updated_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(conflict_on_unique(DUPLICATE_EMAIL))?;

        self.find_by_id(member.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created member".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members WHERE id = ?",
            MEMBER_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_member).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members WHERE email = ?",
            MEMBER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_member).transpose()
    }

    async fn email_exists(&self, email: &str, exclude: Option<Uuid>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM members WHERE email = ? AND (? IS NULL OR id != ?))",
        )
        .bind(email.trim().to_lowercase())
        .bind(exclude.map(|id| id.to_string()))
        .bind(exclude.map(|id| id.to_string()))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list(&self, filter: &MemberFilter, page: PageRequest) -> Result<Paginated<Member>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM members WHERE 1 = 1");
        Self::push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM members WHERE 1 = 1",
            MEMBER_COLUMNS
        ));
        Self::push_filters(&mut select, filter);
        select
            .push(" ORDER BY full_name ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select
            .build_query_as::<MemberRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Self::row_to_member)
            .collect::<Result<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn update(&self, member: Member) -> Result<Member> {
        let result = sqlx::query(
            r#"
            UPDATE members SET
                email = ?, full_name = ?, phone = ?, address = ?, membership_status = ?,
                role = ?, date_of_birth = ?, baptism_date = ?, emergency_contact = ?,
                spiritual_gifts = ?, ministries = ?, notes = ?, avatar_url = ?,
                is_email_verified = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&member.email)
        .bind(&member.full_name)
        .bind(&member.phone)
        .bind(&member.address)
        .bind(member.membership_status.as_str())
        .bind(member.role.as_str())
        .bind(member.date_of_birth)
        .bind(member.baptism_date)
        .bind(Self::encode_contact(&member.emergency_contact)?)
        .bind(encode_list(&member.spiritual_gifts)?)
        .bind(encode_list(&member.ministries)?)
        .bind(&member.notes)
        .bind(&member.avatar_url)
        .bind(member.is_email_verified)
        .bind(member.updated_at.naive_utc())
        .bind(member.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(conflict_on_unique(DUPLICATE_EMAIL))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        self.find_by_id(member.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated member".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Member>> {
        let result = sqlx::query("UPDATE members SET last_activity = ? WHERE id = ?")
            .bind(at.naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn stats(&self) -> Result<MemberStats> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT membership_status, COUNT(*) FROM members GROUP BY membership_status ORDER BY membership_status",
        )
        .fetch_all(&self.pool)
        .await?;

        let by_status = rows
            .into_iter()
            .map(|(status, count)| {
                Ok(StatusCount {
                    status: parse_enum(&status)?,
                    count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let total = by_status.iter().map(|s| s.count).sum();
        let active = by_status
            .iter()
            .filter(|s| s.status == MembershipStatus::Active)
            .map(|s| s.count)
            .sum();

        Ok(MemberStats { total, active, by_status })
    }
}
