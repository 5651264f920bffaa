use axum::extract::{Path, State};

use crate::{
    api::{
        extract::{parse_id, ApiJson, ApiQuery},
        response::ApiResponse,
        state::AppState,
    },
    domain::{
        AdminResourceQuery, CreateResourceRequest, FaqEntry, PublicResourceQuery, Resource,
        ResourceStats, UpdateResourceRequest,
    },
    error::Result,
};

pub async fn list_public(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PublicResourceQuery>,
) -> Result<ApiResponse<Vec<Resource>>> {
    let page = state.service_context.resource_service.list_public(query).await?;
    Ok(ApiResponse::page(page))
}

pub async fn faqs(State(state): State<AppState>) -> Result<ApiResponse<Vec<FaqEntry>>> {
    let faqs = state.service_context.resource_service.faqs().await?;
    Ok(ApiResponse::ok(faqs))
}

pub async fn get_public(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<Resource>> {
    let id = parse_id(&id, "resource")?;
    let resource = state.service_context.resource_service.get_public(id).await?;
    Ok(ApiResponse::ok(resource))
}

pub async fn record_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Resource>> {
    let id = parse_id(&id, "resource")?;
    let resource = state.service_context.resource_service.record_download(id).await?;
    Ok(ApiResponse::ok(resource).with_message("Download recorded"))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AdminResourceQuery>,
) -> Result<ApiResponse<Vec<Resource>>> {
    let page = state.service_context.resource_service.list(query).await?;
    Ok(ApiResponse::page(page))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateResourceRequest>,
) -> Result<ApiResponse<Resource>> {
    let resource = state.service_context.resource_service.create(request).await?;
    Ok(ApiResponse::created(resource, "Resource created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateResourceRequest>,
) -> Result<ApiResponse<Resource>> {
    let id = parse_id(&id, "resource")?;
    let resource = state.service_context.resource_service.update(id, request).await?;
    Ok(ApiResponse::ok(resource).with_message("Resource updated successfully"))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<()>> {
    let id = parse_id(&id, "resource")?;
    state.service_context.resource_service.delete(id).await?;
    Ok(ApiResponse::message("Resource deleted successfully"))
}

pub async fn stats(State(state): State<AppState>) -> Result<ApiResponse<ResourceStats>> {
    let stats = state.service_context.resource_service.stats().await?;
    Ok(ApiResponse::ok(stats))
}
