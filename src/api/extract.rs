use axum::extract::{
    rejection::{JsonRejection, QueryRejection},
    FromRequest, FromRequestParts,
};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// `Json` whose rejections render as the usual error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejections render as the usual error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Bodies that parse but do not fit the payload (wrong type, unknown enum
/// variant, bad number) are reported as a validation failure on `body`.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                AppError::invalid("body", rejection.body_text())
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::invalid("query", rejection.body_text())
    }
}

/// Path ids are taken as text so a malformed one reports which entity it named.
pub fn parse_id(raw: &str, entity: &'static str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidId(entity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_name_the_entity() {
        let err = parse_id("not-a-uuid", "sermon").unwrap_err();
        assert_eq!(err.to_string(), "Invalid sermon id");
    }

    #[tokio::test]
    async fn unknown_enum_variant_is_a_body_validation_error() {
        use axum::{body::Body, http::Request};

        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        enum Kind {
            #[serde(rename = "tithe")]
            Tithe,
        }

        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Payload {
            kind: Kind,
        }

        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"kind":"bribe"}"#))
            .unwrap();

        let err = match ApiJson::<Payload>::from_request(request, &()).await {
            Ok(_) => panic!("unknown variant accepted"),
            Err(err) => err,
        };
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "body");
                assert!(errors[0].message.contains("unknown variant"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn well_formed_ids_parse() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "event").unwrap(), id);
    }
}
