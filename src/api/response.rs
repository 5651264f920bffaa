use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::{Paginated, Pagination};

/// The `{success, message?, data?, pagination?}` envelope every route answers with.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            pagination: None,
            status: StatusCode::OK,
        }
    }

    pub fn created(data: T, message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            data: Some(data),
            pagination: None,
            status: StatusCode::CREATED,
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn page(page: Paginated<T>) -> Self {
        let pagination = Pagination::from(&page);
        Self {
            success: true,
            message: None,
            data: Some(page.items),
            pagination: Some(pagination),
            status: StatusCode::OK,
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            data: None,
            pagination: None,
            status: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PageRequest;
    use serde_json::json;

    #[test]
    fn page_envelope_carries_pagination_metadata() {
        let page = PageRequest::new(Some(2), Some(2), 10, 100).unwrap();
        let response = ApiResponse::page(Paginated::new(vec!["c", "d"], 5, page));
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(
            body,
            json!({
                "success": true,
                "data": ["c", "d"],
                "pagination": { "current": 2, "pages": 3, "total": 5 }
            })
        );
    }

    #[test]
    fn delete_envelope_has_no_data() {
        let body = serde_json::to_value(ApiResponse::message("Event deleted successfully")).unwrap();
        assert_eq!(body, json!({ "success": true, "message": "Event deleted successfully" }));
    }
}
