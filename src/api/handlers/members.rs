use axum::extract::{Path, State};

use crate::{
    api::{
        extract::{parse_id, ApiJson, ApiQuery},
        response::ApiResponse,
        state::AppState,
    },
    domain::{CreateMemberRequest, MemberQuery, MemberStats, MemberView, UpdateMemberRequest},
    error::Result,
};

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MemberQuery>,
) -> Result<ApiResponse<Vec<MemberView>>> {
    let page = state.service_context.member_service.list(query).await?;
    Ok(ApiResponse::page(page.map(MemberView::from)))
}

pub async fn stats(State(state): State<AppState>) -> Result<ApiResponse<MemberStats>> {
    let stats = state.service_context.member_service.stats().await?;
    Ok(ApiResponse::ok(stats))
}

pub async fn get_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<ApiResponse<MemberView>> {
    let member = state
        .service_context
        .member_service
        .get_by_email(&email.trim().to_lowercase())
        .await?;
    Ok(ApiResponse::ok(member.into()))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<MemberView>> {
    let id = parse_id(&id, "member")?;
    let member = state.service_context.member_service.get(id).await?;
    Ok(ApiResponse::ok(member.into()))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateMemberRequest>,
) -> Result<ApiResponse<MemberView>> {
    let member = state.service_context.member_service.create(request).await?;
    Ok(ApiResponse::created(member.into(), "Member created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateMemberRequest>,
) -> Result<ApiResponse<MemberView>> {
    let id = parse_id(&id, "member")?;
    let member = state.service_context.member_service.update(id, request).await?;
    Ok(ApiResponse::ok(MemberView::from(member)).with_message("Member updated successfully"))
}

pub async fn record_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<MemberView>> {
    let id = parse_id(&id, "member")?;
    let member = state.service_context.member_service.touch(id).await?;
    Ok(ApiResponse::ok(MemberView::from(member)).with_message("Last activity updated"))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<()>> {
    let id = parse_id(&id, "member")?;
    state.service_context.member_service.delete(id).await?;
    Ok(ApiResponse::message("Member deleted successfully"))
}
