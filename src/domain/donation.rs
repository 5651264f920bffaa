use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    domain::{clean_optional, deserialize_datetime},
    error::{AppError, Result},
    validation::rule_error,
};

text_enum! {
    pub enum Currency {
        Usd => "USD",
        Eur => "EUR",
        Cad => "CAD",
        Xaf => "XAF",
    }
}

text_enum! {
    pub enum DonationType {
        Tithe => "tithe",
        Offering => "offering",
        Mission => "mission",
        Building => "building",
        Other => "other",
    }
}

text_enum! {
    pub enum PaymentMethod {
        Card => "card",
        Bank => "bank",
        Cash => "cash",
        Check => "check",
        Mobile => "mobile",
    }
}

text_enum! {
    pub enum PaymentStatus {
        Pending => "pending",
        Completed => "completed",
        Failed => "failed",
        Refunded => "refunded",
        Cancelled => "cancelled",
    }
}

text_enum! {
    pub enum RecurrenceFrequency {
        Weekly => "weekly",
        Monthly => "monthly",
        Quarterly => "quarterly",
        Yearly => "yearly",
    }
}

impl PaymentStatus {
    /// Allowed moves; staying in the same status is always allowed.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;

        self == next
            || matches!(
                (self, next),
                (Pending, Completed | Failed | Cancelled) | (Completed, Refunded) | (Failed, Pending)
            )
    }
}

impl RecurrenceFrequency {
    /// Next collection date after `from`. Calendar months clamp to the last
    /// day of the target month (Jan 31 + 1 month = Feb 28/29).
    pub fn next_after(self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            RecurrenceFrequency::Weekly => from.checked_add_signed(Duration::days(7)),
            RecurrenceFrequency::Monthly => from.checked_add_months(Months::new(1)),
            RecurrenceFrequency::Quarterly => from.checked_add_months(Months::new(3)),
            RecurrenceFrequency::Yearly => from.checked_add_months(Months::new(12)),
        }
    }
}

fn next_recurrence(frequency: RecurrenceFrequency, from: DateTime<Utc>) -> Result<DateTime<Utc>> {
    frequency
        .next_after(from)
        .ok_or_else(|| AppError::BadRequest("Recurrence date is out of range".to_string()))
}

#[derive(Debug, Clone, Serialize)]
pub struct Donation {
    pub id: Uuid,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub donor_id: Option<String>,
    pub amount: f64,
    pub currency: Currency,
    pub donation_type: DonationType,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_id: String,
    pub notes: Option<String>,
    pub is_recurring: bool,
    pub recurrence_frequency: Option<RecurrenceFrequency>,
    pub next_recurrence_date: Option<DateTime<Utc>>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Amounts arrive as JSON numbers or numeric strings from form posts.
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    let amount = match Option::<Amount>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Amount::Number(n)) => n,
        Some(Amount::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount: {}", s)))?,
    };

    // "inf" and "NaN" parse as f64 but are not amounts.
    if !amount.is_finite() {
        return Err(serde::de::Error::custom("amount must be a finite number"));
    }
    Ok(Some(amount))
}

fn validate_currency(value: &str) -> std::result::Result<(), ValidationError> {
    value
        .trim()
        .to_ascii_uppercase()
        .parse::<Currency>()
        .map(|_| ())
        .map_err(|_| rule_error("currency", "Currency must be USD, EUR, CAD or XAF"))
}

pub fn parse_currency(value: Option<&str>) -> Result<Option<Currency>> {
    value
        .map(|v| {
            v.trim()
                .to_ascii_uppercase()
                .parse::<Currency>()
                .map_err(|_| AppError::invalid("currency", "Currency must be USD, EUR, CAD or XAF"))
        })
        .transpose()
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateDonationRequest {
    #[validate(length(max = 100, message = "Donor name cannot exceed 100 characters"))]
    pub donor_name: Option<String>,
    #[validate(email(message = "Donor email must be a valid email"))]
    pub donor_email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    #[validate(
        required(message = "Amount is required"),
        range(min = 0.01, message = "Amount must be greater than 0")
    )]
    pub amount: Option<f64>,
    #[validate(custom(function = "validate_currency"))]
    pub currency: Option<String>,
    #[validate(required(message = "Donation type is required"))]
    pub donation_type: Option<DonationType>,
    #[validate(required(message = "Payment method is required"))]
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
    pub is_recurring: Option<bool>,
    pub recurrence_frequency: Option<RecurrenceFrequency>,
    pub is_anonymous: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDonationRequest {
    #[validate(length(max = 100, message = "Donor name cannot exceed 100 characters"))]
    pub donor_name: Option<String>,
    #[validate(email(message = "Donor email must be a valid email"))]
    pub donor_email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    #[validate(range(min = 0.01, message = "Amount must be greater than 0"))]
    pub amount: Option<f64>,
    #[validate(custom(function = "validate_currency"))]
    pub currency: Option<String>,
    pub donation_type: Option<DonationType>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
    pub is_recurring: Option<bool>,
    pub recurrence_frequency: Option<RecurrenceFrequency>,
    pub is_anonymous: Option<bool>,
}

impl Donation {
    /// Builds a new donation at `now`. `payment_id` is assigned by the caller.
    pub fn from_request(
        request: CreateDonationRequest,
        donor_id: Option<String>,
        payment_id: String,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let is_anonymous = request.is_anonymous.unwrap_or(false);
        let is_recurring = request.is_recurring.unwrap_or(false);
        let recurrence_frequency = if is_recurring { request.recurrence_frequency } else { None };
        let next_recurrence_date = recurrence_frequency
            .map(|frequency| next_recurrence(frequency, now))
            .transpose()?;
        let amount = request
            .amount
            .ok_or_else(|| AppError::invalid("amount", "Amount is required"))?;

        Ok(Self {
            id: Uuid::new_v4(),
            donor_name: if is_anonymous { None } else { clean_optional(request.donor_name) },
            donor_email: if is_anonymous {
                None
            } else {
                clean_optional(request.donor_email).map(|e| e.to_lowercase())
            },
            donor_id,
            amount,
            currency: parse_currency(request.currency.as_deref())?.unwrap_or(Currency::Usd),
            donation_type: request.donation_type.unwrap_or(DonationType::Tithe),
            payment_method: request.payment_method.unwrap_or(PaymentMethod::Card),
            payment_status: request.payment_status.unwrap_or(PaymentStatus::Pending),
            payment_id,
            notes: clean_optional(request.notes),
            is_recurring,
            recurrence_frequency,
            next_recurrence_date,
            is_anonymous,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update. `payment_id` is never touched.
    pub fn apply_update(&mut self, request: UpdateDonationRequest, now: DateTime<Utc>) -> Result<()> {
        if let Some(status) = request.payment_status {
            if !self.payment_status.can_transition_to(status) {
                return Err(AppError::BadRequest(format!(
                    "Cannot change payment status from {} to {}",
                    self.payment_status, status
                )));
            }
            self.payment_status = status;
        }

        if let Some(name) = request.donor_name {
            self.donor_name = clean_optional(Some(name));
        }
        if let Some(email) = request.donor_email {
            self.donor_email = clean_optional(Some(email)).map(|e| e.to_lowercase());
        }
        if let Some(is_anonymous) = request.is_anonymous {
            self.is_anonymous = is_anonymous;
        }
        if self.is_anonymous {
            self.donor_name = None;
            self.donor_email = None;
        }

        if let Some(amount) = request.amount {
            self.amount = amount;
        }
        if let Some(currency) = parse_currency(request.currency.as_deref())? {
            self.currency = currency;
        }
        if let Some(kind) = request.donation_type {
            self.donation_type = kind;
        }
        if let Some(method) = request.payment_method {
            self.payment_method = method;
        }
        if let Some(notes) = request.notes {
            self.notes = clean_optional(Some(notes));
        }

        if let Some(is_recurring) = request.is_recurring {
            self.is_recurring = is_recurring;
        }
        if !self.is_recurring {
            self.recurrence_frequency = None;
            self.next_recurrence_date = None;
        } else if let Some(frequency) = request.recurrence_frequency {
            if self.recurrence_frequency != Some(frequency) {
                self.next_recurrence_date = Some(next_recurrence(frequency, now)?);
            }
            self.recurrence_frequency = Some(frequency);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub payment_status: Option<PaymentStatus>,
    pub donation_type: Option<DonationType>,
    pub payment_method: Option<PaymentMethod>,
    pub is_recurring: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub end_date: Option<DateTime<Utc>>,
}

/// `created_at` window for statistics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRange {
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationTypeTotal {
    pub donation_type: DonationType,
    pub total_amount: f64,
    pub count: i64,
}

/// Aggregates over completed donations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationStats {
    pub total_amount: f64,
    pub total_donations: i64,
    pub average_amount: f64,
    pub max_amount: f64,
    pub min_amount: f64,
    pub by_type: Vec<DonationTypeTotal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn monthly_recurrence_clamps_to_month_end() {
        assert_eq!(RecurrenceFrequency::Monthly.next_after(at(2024, 1, 31)), Some(at(2024, 2, 29)));
        assert_eq!(RecurrenceFrequency::Monthly.next_after(at(2023, 1, 31)), Some(at(2023, 2, 28)));
        assert_eq!(RecurrenceFrequency::Quarterly.next_after(at(2024, 11, 30)), Some(at(2025, 2, 28)));
        assert_eq!(RecurrenceFrequency::Yearly.next_after(at(2024, 2, 29)), Some(at(2025, 2, 28)));
        assert_eq!(RecurrenceFrequency::Weekly.next_after(at(2024, 12, 28)), Some(at(2025, 1, 4)));
    }

    #[test]
    fn payment_status_transitions() {
        use PaymentStatus::*;

        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Completed.can_transition_to(Refunded));
        assert!(Failed.can_transition_to(Pending));
        assert!(Refunded.can_transition_to(Refunded));

        assert!(!Completed.can_transition_to(Pending));
        assert!(!Refunded.can_transition_to(Completed));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    fn request() -> CreateDonationRequest {
        CreateDonationRequest {
            donor_name: Some("Esther".into()),
            donor_email: Some("Esther@Example.org".into()),
            amount: Some(50.0),
            currency: Some("eur".into()),
            donation_type: Some(DonationType::Mission),
            payment_method: Some(PaymentMethod::Mobile),
            ..Default::default()
        }
    }

    #[test]
    fn anonymous_donation_drops_donor_details() {
        let mut req = request();
        req.is_anonymous = Some(true);
        let donation = Donation::from_request(req, None, "DON_1".into(), Utc::now()).unwrap();

        assert_eq!(donation.donor_name, None);
        assert_eq!(donation.donor_email, None);
        assert_eq!(donation.currency, Currency::Eur);
        assert_eq!(donation.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn frequency_is_ignored_when_not_recurring() {
        let mut req = request();
        req.recurrence_frequency = Some(RecurrenceFrequency::Weekly);
        let donation = Donation::from_request(req, None, "DON_1".into(), Utc::now()).unwrap();

        assert!(!donation.is_recurring);
        assert_eq!(donation.recurrence_frequency, None);
        assert_eq!(donation.next_recurrence_date, None);
    }

    #[test]
    fn update_recomputes_next_date_only_on_frequency_change() {
        let created = at(2024, 1, 31);
        let mut req = request();
        req.is_recurring = Some(true);
        req.recurrence_frequency = Some(RecurrenceFrequency::Monthly);
        let mut donation = Donation::from_request(req, None, "DON_1".into(), created).unwrap();
        assert_eq!(donation.next_recurrence_date, Some(at(2024, 2, 29)));

        // Same frequency: date kept.
        donation
            .apply_update(
                UpdateDonationRequest {
                    recurrence_frequency: Some(RecurrenceFrequency::Monthly),
                    ..Default::default()
                },
                at(2024, 2, 10),
            )
            .unwrap();
        assert_eq!(donation.next_recurrence_date, Some(at(2024, 2, 29)));

        donation
            .apply_update(
                UpdateDonationRequest {
                    recurrence_frequency: Some(RecurrenceFrequency::Weekly),
                    ..Default::default()
                },
                at(2024, 2, 10),
            )
            .unwrap();
        assert_eq!(donation.next_recurrence_date, Some(at(2024, 2, 17)));

        donation
            .apply_update(
                UpdateDonationRequest { is_recurring: Some(false), ..Default::default() },
                at(2024, 2, 11),
            )
            .unwrap();
        assert_eq!(donation.recurrence_frequency, None);
        assert_eq!(donation.next_recurrence_date, None);
        assert_eq!(donation.payment_id, "DON_1");
    }

    #[test]
    fn illegal_status_change_is_rejected() {
        let mut donation = Donation::from_request(request(), None, "DON_1".into(), Utc::now()).unwrap();
        donation.payment_status = PaymentStatus::Refunded;

        let err = donation
            .apply_update(
                UpdateDonationRequest { payment_status: Some(PaymentStatus::Completed), ..Default::default() },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(donation.payment_status, PaymentStatus::Refunded);
    }

    #[test]
    fn amount_accepts_numeric_text() {
        let req: CreateDonationRequest =
            serde_json::from_str(r#"{"amount": "25.50", "donation_type": "tithe", "payment_method": "cash"}"#)
                .unwrap();
        assert_eq!(req.amount, Some(25.5));
    }
}
