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
    domain::{CreateSermonRequest, Sermon, SermonQuery, UpdateSermonRequest},
    error::Result,
};

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SermonQuery>,
) -> Result<ApiResponse<Vec<Sermon>>> {
    let page = state.service_context.sermon_service.list(query).await?;
    Ok(ApiResponse::page(page))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<Sermon>> {
    let id = parse_id(&id, "sermon")?;
    let sermon = state.service_context.sermon_service.get(id).await?;
    Ok(ApiResponse::ok(sermon))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiJson(request): ApiJson<CreateSermonRequest>,
) -> Result<ApiResponse<Sermon>> {
    let sermon = state
        .service_context
        .sermon_service
        .create(request, &current_user.principal)
        .await?;
    Ok(ApiResponse::created(sermon, "Sermon created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateSermonRequest>,
) -> Result<ApiResponse<Sermon>> {
    let id = parse_id(&id, "sermon")?;
    let sermon = state
        .service_context
        .sermon_service
        .update(id, request, &current_user.principal)
        .await?;
    Ok(ApiResponse::ok(sermon).with_message("Sermon updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>> {
    let id = parse_id(&id, "sermon")?;
    state
        .service_context
        .sermon_service
        .delete(id, &current_user.principal)
        .await?;
    Ok(ApiResponse::message("Sermon deleted successfully"))
}
