//! Bearer token verification.
//!
//! Tokens are issued by the external identity provider and signed with a
//! shared HS256 secret. This module only verifies them.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    auth::Principal,
    error::{AppError, Result},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity provider user id)
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,
}

pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    admin_roles: Vec<String>,
}

impl TokenVerifier {
    pub fn new(secret: &str, admin_roles: Vec<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Provider tokens carry an audience we do not pin.
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            admin_roles,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Principal> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Unauthorized("Token expired".to_string()),
                ErrorKind::InvalidSignature => {
                    AppError::Unauthorized("Invalid token signature".to_string())
                }
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                    AppError::Unauthorized("Malformed token".to_string())
                }
                _ => AppError::Unauthorized("Invalid token".to_string()),
            }
        })?;

        let claims = data.claims;
        let email = claims
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| AppError::Unauthorized("Token has no email claim".to_string()))?
            .to_lowercase();
        let role = claims.role.unwrap_or_else(|| "member".to_string());
        let is_admin = self.admin_roles.iter().any(|r| r == &role);

        Ok(Principal {
            id: claims.sub,
            email,
            role,
            is_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(secret: &str, email: Option<&str>, role: Option<&str>, expires_in: Duration) -> String {
        let claims = Claims {
            sub: "user-1".to_string(),
            email: email.map(str::to_string),
            role: role.map(str::to_string),
            exp: (Utc::now() + expires_in).timestamp(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(SECRET, vec!["admin".into(), "super_admin".into()])
    }

    #[test]
    fn valid_token_yields_principal() {
        let principal = verifier()
            .verify(&token(SECRET, Some("Pastor@Church.org"), Some("pastor"), Duration::hours(1)))
            .unwrap();

        assert_eq!(principal.id, "user-1");
        assert_eq!(principal.email, "pastor@church.org");
        assert_eq!(principal.role, "pastor");
        assert!(!principal.is_admin());
    }

    #[test]
    fn admin_roles_are_recognised() {
        let admin = verifier()
            .verify(&token(SECRET, Some("a@b.org"), Some("super_admin"), Duration::hours(1)))
            .unwrap();
        assert!(admin.is_admin());
    }

    #[test]
    fn expired_token_is_rejected() {
        let err = verifier()
            .verify(&token(SECRET, Some("a@b.org"), None, Duration::hours(-2)))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Token expired"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let err = verifier()
            .verify(&token("other-secret", Some("a@b.org"), None, Duration::hours(1)))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = verifier().verify("not-a-jwt").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Malformed token"));
    }

    #[test]
    fn token_without_email_is_rejected() {
        let err = verifier()
            .verify(&token(SECRET, None, Some("admin"), Duration::hours(1)))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
