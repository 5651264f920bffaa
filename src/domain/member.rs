use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{clean_optional, deserialize_date, deserialize_datetime, deserialize_list},
    validation::{validate_not_blank, validate_phone},
};

text_enum! {
    pub enum MembershipStatus {
        Active => "active",
        Inactive => "inactive",
        Pending => "pending",
        Suspended => "suspended",
    }
}

text_enum! {
    pub enum MemberRole {
        Admin => "admin",
        Pastor => "pastor",
        Leader => "leader",
        Member => "member",
        Volunteer => "volunteer",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: Option<String>,
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub membership_status: MembershipStatus,
    pub role: MemberRole,
    pub date_of_birth: Option<NaiveDate>,
    pub baptism_date: Option<NaiveDate>,
    pub join_date: DateTime<Utc>,
    pub emergency_contact: Option<EmergencyContact>,
    pub spiritual_gifts: Vec<String>,
    pub ministries: Vec<String>,
    pub notes: Option<String>,
    pub avatar_url: Option<String>,
    pub is_email_verified: bool,
    pub last_activity: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whole years between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Member as returned by the API, with the derived `age`.
#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    #[serde(flatten)]
    pub member: Member,
    pub age: Option<i32>,
}

impl From<Member> for MemberView {
    fn from(member: Member) -> Self {
        let today = Utc::now().date_naive();
        let age = member.date_of_birth.map(|dob| age_on(dob, today));
        Self { member, age }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EmergencyContactInput {
    #[validate(length(max = 100, message = "Emergency contact name cannot exceed 100 characters"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(max = 50, message = "Relationship cannot exceed 50 characters"))]
    pub relationship: Option<String>,
}

impl EmergencyContactInput {
    /// A contact is only kept when it has a name.
    pub fn into_contact(self) -> Option<EmergencyContact> {
        clean_optional(self.name).map(|name| EmergencyContact {
            name,
            phone: clean_optional(self.phone),
            relationship: clean_optional(self.relationship),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMemberRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(
        custom(function = "validate_not_blank", message = "Full name is required"),
        length(max = 100, message = "Full name cannot exceed 100 characters")
    )]
    pub full_name: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "Address cannot exceed 255 characters"))]
    pub address: Option<String>,
    pub membership_status: Option<MembershipStatus>,
    pub role: Option<MemberRole>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub baptism_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub join_date: Option<DateTime<Utc>>,
    #[validate(nested)]
    pub emergency_contact: Option<EmergencyContactInput>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub spiritual_gifts: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub ministries: Option<Vec<String>>,
    pub notes: Option<String>,
    #[validate(url(message = "Avatar URL must be a valid URL"))]
    pub avatar_url: Option<String>,
    pub is_email_verified: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMemberRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    #[validate(
        custom(function = "validate_not_blank", message = "Full name cannot be empty"),
        length(max = 100, message = "Full name cannot exceed 100 characters")
    )]
    pub full_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "Address cannot exceed 255 characters"))]
    pub address: Option<String>,
    pub membership_status: Option<MembershipStatus>,
    pub role: Option<MemberRole>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub baptism_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub join_date: Option<DateTime<Utc>>,
    #[validate(nested)]
    pub emergency_contact: Option<EmergencyContactInput>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub spiritual_gifts: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub ministries: Option<Vec<String>>,
    pub notes: Option<String>,
    #[validate(url(message = "Avatar URL must be a valid URL"))]
    pub avatar_url: Option<String>,
    pub is_email_verified: Option<bool>,
}

impl Member {
    pub fn from_request(request: CreateMemberRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: request.email.trim().to_lowercase(),
            full_name: request.full_name.trim().to_string(),
            phone: clean_optional(request.phone),
            address: clean_optional(request.address),
            membership_status: request.membership_status.unwrap_or(MembershipStatus::Pending),
            role: request.role.unwrap_or(MemberRole::Member),
            date_of_birth: request.date_of_birth,
            baptism_date: request.baptism_date,
            join_date: request.join_date.unwrap_or(now),
            emergency_contact: request.emergency_contact.and_then(EmergencyContactInput::into_contact),
            spiritual_gifts: request.spiritual_gifts.unwrap_or_default(),
            ministries: request.ministries.unwrap_or_default(),
            notes: clean_optional(request.notes),
            avatar_url: clean_optional(request.avatar_url),
            is_email_verified: request.is_email_verified.unwrap_or(false),
            last_activity: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl UpdateMemberRequest {
    /// Applies the present fields; the email is normalised but its
    /// uniqueness is the caller's concern.
    pub fn apply_to(self, member: &mut Member) {
        if let Some(email) = self.email {
            member.email = email.trim().to_lowercase();
        }
        if let Some(name) = self.full_name {
            member.full_name = name.trim().to_string();
        }
        if let Some(phone) = self.phone {
            member.phone = clean_optional(Some(phone));
        }
        if let Some(address) = self.address {
            member.address = clean_optional(Some(address));
        }
        if let Some(status) = self.membership_status {
            member.membership_status = status;
        }
        if let Some(role) = self.role {
            member.role = role;
        }
        if let Some(dob) = self.date_of_birth {
            member.date_of_birth = Some(dob);
        }
        if let Some(baptism) = self.baptism_date {
            member.baptism_date = Some(baptism);
        }
        if let Some(join) = self.join_date {
            member.join_date = join;
        }
        if let Some(contact) = self.emergency_contact {
            member.emergency_contact = contact.into_contact();
        }
        if let Some(gifts) = self.spiritual_gifts {
            member.spiritual_gifts = gifts;
        }
        if let Some(ministries) = self.ministries {
            member.ministries = ministries;
        }
        if let Some(notes) = self.notes {
            member.notes = clean_optional(Some(notes));
        }
        if let Some(url) = self.avatar_url {
            member.avatar_url = clean_optional(Some(url));
        }
        if let Some(verified) = self.is_email_verified {
            member.is_email_verified = verified;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub membership_status: Option<MembershipStatus>,
    pub role: Option<MemberRole>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: MembershipStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberStats {
    pub total: i64,
    pub active: i64,
    pub by_status: Vec<StatusCount>,
}
