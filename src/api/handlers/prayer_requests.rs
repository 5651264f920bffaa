use axum::{
    extract::{Path, State},
    Extension,
};

use crate::{
    api::{
        extract::{parse_id, ApiJson, ApiQuery},
        middleware::auth::CurrentUser,
        response::ApiResponse,
        state::AppState,
    },
    domain::{CreatePrayerRequest, PrayerQuery, PrayerRequest, PublicPrayerRequest, UpdatePrayerRequest},
    error::Result,
};

pub async fn list_public(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PrayerQuery>,
) -> Result<ApiResponse<Vec<PublicPrayerRequest>>> {
    let page = state.service_context.prayer_request_service.list_public(query).await?;
    Ok(ApiResponse::page(page))
}

pub async fn pray(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<PrayerRequest>> {
    let id = parse_id(&id, "prayer request")?;
    let request = state.service_context.prayer_request_service.pray(id).await?;
    Ok(ApiResponse::ok(request).with_message("Prayer count incremented"))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PrayerQuery>,
) -> Result<ApiResponse<Vec<PrayerRequest>>> {
    let page = state.service_context.prayer_request_service.list(query).await?;
    Ok(ApiResponse::page(page))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<PrayerRequest>> {
    let id = parse_id(&id, "prayer request")?;
    let request = state.service_context.prayer_request_service.get(id).await?;
    Ok(ApiResponse::ok(request))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiJson(request): ApiJson<CreatePrayerRequest>,
) -> Result<ApiResponse<PrayerRequest>> {
    let request = state
        .service_context
        .prayer_request_service
        .create(request, &current_user.principal)
        .await?;
    Ok(ApiResponse::created(request, "Prayer request created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdatePrayerRequest>,
) -> Result<ApiResponse<PrayerRequest>> {
    let id = parse_id(&id, "prayer request")?;
    let request = state
        .service_context
        .prayer_request_service
        .update(id, request, &current_user.principal)
        .await?;
    Ok(ApiResponse::ok(request).with_message("Prayer request updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>> {
    let id = parse_id(&id, "prayer request")?;
    state
        .service_context
        .prayer_request_service
        .delete(id, &current_user.principal)
        .await?;
    Ok(ApiResponse::message("Prayer request deleted successfully"))
}
