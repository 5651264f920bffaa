use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{DateRange, Donation, DonationStats, DonationTypeTotal, PageRequest, Paginated},
    error::{AppError, Result},
    repository::{
        conflict_on_unique,
        row::{parse_enum, parse_uuid, utc},
        DonationFilter, DonationRepository,
    },
};

const DONATION_COLUMNS: &str = "id, donor_name, donor_email, donor_id, amount, currency, donation_type, \
    payment_method, payment_status, payment_id, notes, is_recurring, recurrence_frequency, \
    next_recurrence_date, is_anonymous, created_at, updated_at";

#[derive(FromRow)]
struct DonationRow {
    id: String,
    donor_name: Option<String>,
    donor_email: Option<String>,
    donor_id: Option<String>,
    amount: f64,
    currency: String,
    donation_type: String,
    payment_method: String,
    payment_status: String,
    payment_id: String,
    notes: Option<String>,
    is_recurring: bool,
    recurrence_frequency: Option<String>,
    next_recurrence_date: Option<NaiveDateTime>,
    is_anonymous: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteDonationRepository {
    pool: SqlitePool,
}

impl SqliteDonationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_donation(row: DonationRow) -> Result<Donation> {
        Ok(Donation {
            id: parse_uuid(&row.id)?,
            donor_name: row.donor_name,
            donor_email: row.donor_email,
            donor_id: row.donor_id,
            amount: row.amount,
            currency: parse_enum(&row.currency)?,
            donation_type: parse_enum(&row.donation_type)?,
            payment_method: parse_enum(&row.payment_method)?,
            payment_status: parse_enum(&row.payment_status)?,
            payment_id: row.payment_id,
            notes: row.notes,
            is_recurring: row.is_recurring,
            recurrence_frequency: row
                .recurrence_frequency
                .as_deref()
                .map(parse_enum)
                .transpose()?,
            next_recurrence_date: row.next_recurrence_date.map(utc),
            is_anonymous: row.is_anonymous,
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }

    fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &DonationFilter) {
        if let Some(donor_id) = &filter.donor_id {
            query.push(" AND donor_id = ").push_bind(donor_id.clone());
        }
        if let Some(status) = filter.payment_status {
            query.push(" AND payment_status = ").push_bind(status.as_str());
        }
        if let Some(donation_type) = filter.donation_type {
            query.push(" AND donation_type = ").push_bind(donation_type.as_str());
        }
        if let Some(method) = filter.payment_method {
            query.push(" AND payment_method = ").push_bind(method.as_str());
        }
        if let Some(recurring) = filter.is_recurring {
            query.push(" AND is_recurring = ").push_bind(recurring);
        }
        Self::push_range(query, filter.start_date.map(|d| d.naive_utc()), filter.end_date.map(|d| d.naive_utc()));
    }

    fn push_range(
        query: &mut QueryBuilder<'_, Sqlite>,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) {
        if let Some(start) = start {
            query.push(" AND created_at >= ").push_bind(start);
        }
        if let Some(end) = end {
            query.push(" AND created_at <= ").push_bind(end);
        }
    }
}

#[async_trait]
impl DonationRepository for SqliteDonationRepository {
    async fn create(&self, donation: Donation) -> Result<Donation> {
        sqlx::query(
            r#"
            INSERT INTO donations (
                id, donor_name, donor_email, donor_id, amount, currency, donation_type,
                payment_method, payment_status, payment_id, notes, is_recurring,
                recurrence_frequency, next_recurrence_date, is_anonymous, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(donation.id.to_string())
        .bind(&donation.donor_name)
        .bind(&donation.donor_email)
        .bind(&donation.donor_id)
        .bind(donation.amount)
        .bind(donation.currency.as_str())
        .bind(donation.donation_type.as_str())
        .bind(donation.payment_method.as_str())
        .bind(donation.payment_status.as_str())
        .bind(&donation.payment_id)
        .bind(&donation.notes)
        .bind(donation.is_recurring)
        .bind(donation.recurrence_frequency.map(|f| f.as_str()))
        .bind(donation.next_recurrence_date.map(|dt| dt.naive_utc()))
        .bind(donation.is_anonymous)
        .bind(donation.created_at.naive_utc())
        .bind(donation.updated_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(conflict_on_unique("A donation with this payment reference already exists"))?;

        self.find_by_id(donation.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created donation".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Donation>> {
        let row = sqlx::query_as::<_, DonationRow>(&format!(
            "SELECT {} FROM donations WHERE id = ?",
            DONATION_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_donation).transpose()
    }

    async fn list(&self, filter: &DonationFilter, page: PageRequest) -> Result<Paginated<Donation>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM donations WHERE 1 = 1");
        Self::push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM donations WHERE 1 = 1",
            DONATION_COLUMNS
        ));
        Self::push_filters(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select
            .build_query_as::<DonationRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Self::row_to_donation)
            .collect::<Result<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn update(&self, donation: Donation) -> Result<Donation> {
        // payment_id and created_at are fixed at creation.
        let result = sqlx::query(
            r#"
            UPDATE donations SET
                donor_name = ?, donor_email = ?, amount = ?, currency = ?, donation_type = ?,
                payment_method = ?, payment_status = ?, notes = ?, is_recurring = ?,
                recurrence_frequency = ?, next_recurrence_date = ?, is_anonymous = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&donation.donor_name)
        .bind(&donation.donor_email)
        .bind(donation.amount)
        .bind(donation.currency.as_str())
        .bind(donation.donation_type.as_str())
        .bind(donation.payment_method.as_str())
        .bind(donation.payment_status.as_str())
        .bind(&donation.notes)
        .bind(donation.is_recurring)
        .bind(donation.recurrence_frequency.map(|f| f.as_str()))
        .bind(donation.next_recurrence_date.map(|dt| dt.naive_utc()))
        .bind(donation.is_anonymous)
        .bind(donation.updated_at.naive_utc())
        .bind(donation.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Donation not found".to_string()));
        }

        self.find_by_id(donation.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated donation".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM donations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self, range: &DateRange) -> Result<DonationStats> {
        let start = range.start_date.map(|d| d.naive_utc());
        let end = range.end_date.map(|d| d.naive_utc());

        let mut totals = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                COALESCE(SUM(amount), 0.0),
                COUNT(*),
                COALESCE(AVG(amount), 0.0),
                COALESCE(MAX(amount), 0.0),
                COALESCE(MIN(amount), 0.0)
            FROM donations WHERE payment_status = 'completed'
            "#,
        );
        Self::push_range(&mut totals, start, end);
        let (total_amount, total_donations, average_amount, max_amount, min_amount): (f64, i64, f64, f64, f64) =
            totals.build_query_as().fetch_one(&self.pool).await?;

        let mut grouped = QueryBuilder::<Sqlite>::new(
            "SELECT donation_type, COALESCE(SUM(amount), 0.0), COUNT(*) FROM donations \
             WHERE payment_status = 'completed'",
        );
        Self::push_range(&mut grouped, start, end);
        grouped.push(" GROUP BY donation_type ORDER BY 2 DESC");
        let rows: Vec<(String, f64, i64)> = grouped.build_query_as().fetch_all(&self.pool).await?;

        let by_type = rows
            .into_iter()
            .map(|(donation_type, total_amount, count)| {
                Ok(DonationTypeTotal {
                    donation_type: parse_enum(&donation_type)?,
                    total_amount,
                    count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DonationStats {
            total_amount,
            total_donations,
            average_amount,
            max_amount,
            min_amount,
            by_type,
        })
    }
}
