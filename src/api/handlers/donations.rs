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
    domain::{
        CreateDonationRequest, DateRange, Donation, DonationQuery, DonationStats, ListParams,
        UpdateDonationRequest,
    },
    error::Result,
};

/// Open to anonymous donors; a valid bearer links the donation to its caller.
pub async fn create(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    ApiJson(request): ApiJson<CreateDonationRequest>,
) -> Result<ApiResponse<Donation>> {
    let donor = current_user.as_ref().map(|Extension(user)| &user.principal);
    let donation = state.service_context.donation_service.create(request, donor).await?;
    Ok(ApiResponse::created(donation, "Donation created successfully"))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DonationQuery>,
) -> Result<ApiResponse<Vec<Donation>>> {
    let page = state.service_context.donation_service.list(query).await?;
    Ok(ApiResponse::page(page))
}

pub async fn stats(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<DateRange>,
) -> Result<ApiResponse<DonationStats>> {
    let stats = state.service_context.donation_service.stats(range).await?;
    Ok(ApiResponse::ok(stats))
}

pub async fn list_for_donor(
    State(state): State<AppState>,
    Path(donor_id): Path<String>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<ApiResponse<Vec<Donation>>> {
    let page = state
        .service_context
        .donation_service
        .list_for_donor(&donor_id, params)
        .await?;
    Ok(ApiResponse::page(page))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<Donation>> {
    let id = parse_id(&id, "donation")?;
    let donation = state.service_context.donation_service.get(id).await?;
    Ok(ApiResponse::ok(donation))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateDonationRequest>,
) -> Result<ApiResponse<Donation>> {
    let id = parse_id(&id, "donation")?;
    let donation = state.service_context.donation_service.update(id, request).await?;
    Ok(ApiResponse::ok(donation).with_message("Donation updated successfully"))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<()>> {
    let id = parse_id(&id, "donation")?;
    state.service_context.donation_service.delete(id).await?;
    Ok(ApiResponse::message("Donation deleted successfully"))
}
