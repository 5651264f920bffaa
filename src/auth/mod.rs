use serde::Serialize;

use crate::error::{AppError, Result};

pub mod jwt;

pub use jwt::{Claims, TokenVerifier};

/// The verified caller of a request.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub role: String,
    #[serde(skip)]
    pub(crate) is_admin: bool,
}

impl Principal {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
        is_admin: bool,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role: role.into(),
            is_admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

/// Records whose mutations are limited to their owner (or an admin).
pub trait Owned {
    /// Email of the principal that created the record.
    fn owner(&self) -> &str;
}

pub fn ensure_owner_or_admin<T: Owned>(resource: &T, caller: &Principal, action: &str) -> Result<()> {
    if caller.is_admin() || resource.owner().eq_ignore_ascii_case(&caller.email) {
        return Ok(());
    }
    Err(AppError::Forbidden(format!("Not authorized to {}", action)))
}
