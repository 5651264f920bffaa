use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Sanctuary API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Church management backend",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "events": "/api/events",
            "sermons": "/api/sermons",
            "prayer_requests": "/api/prayer-requests",
            "blog": "/api/blog/posts",
            "donations": "/api/donations",
            "members": "/api/members",
            "testimonies": "/api/testimonies",
            "resources": "/api/resources"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
