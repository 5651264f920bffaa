use axum::{
    extract::{Multipart, Path, State},
    Extension,
};

use crate::{
    api::{
        extract::{parse_id, ApiJson, ApiQuery},
        middleware::auth::CurrentUser,
        multipart::UploadForm,
        response::ApiResponse,
        state::AppState,
    },
    domain::{
        AdminTestimonyQuery, PublicTestimony, PublicTestimonyQuery, SubmissionReceipt,
        SubmitTestimonyRequest, Testimony, TestimonyStats, UpdateTestimonyStatusRequest,
    },
    error::Result,
    storage::UploadKind,
};

fn absolute_images(state: &AppState, images: Vec<String>) -> Vec<String> {
    images
        .iter()
        .map(|image| state.settings.server.absolute_url(image))
        .collect()
}

pub async fn submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<ApiResponse<SubmissionReceipt>> {
    let upload = UploadForm::receive(
        multipart,
        state.service_context.blob_store.as_ref(),
        UploadKind::Testimony,
        state.settings.uploads.max_file_size,
    )
    .await?;

    let request = SubmitTestimonyRequest::from_fields(upload.fields);
    let receipt = state
        .service_context
        .testimony_service
        .submit(request, upload.images)
        .await?;
    Ok(ApiResponse::created(
        receipt,
        "Testimony submitted successfully. It will be published after moderation.",
    ))
}

pub async fn list_public(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PublicTestimonyQuery>,
) -> Result<ApiResponse<Vec<PublicTestimony>>> {
    let page = state.service_context.testimony_service.list_public(query).await?;
    Ok(ApiResponse::page(page.map(|mut testimony| {
        testimony.images = absolute_images(&state, testimony.images);
        testimony
    })))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AdminTestimonyQuery>,
) -> Result<ApiResponse<Vec<Testimony>>> {
    let page = state.service_context.testimony_service.list(query).await?;
    Ok(ApiResponse::page(page.map(|mut testimony| {
        testimony.images = absolute_images(&state, testimony.images);
        testimony
    })))
}

pub async fn stats(State(state): State<AppState>) -> Result<ApiResponse<TestimonyStats>> {
    let stats = state.service_context.testimony_service.stats().await?;
    Ok(ApiResponse::ok(stats))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<Testimony>> {
    let id = parse_id(&id, "testimony")?;
    let mut testimony = state.service_context.testimony_service.get(id).await?;
    testimony.images = absolute_images(&state, testimony.images);
    Ok(ApiResponse::ok(testimony))
}

pub async fn moderate(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateTestimonyStatusRequest>,
) -> Result<ApiResponse<Testimony>> {
    let id = parse_id(&id, "testimony")?;
    let testimony = state
        .service_context
        .testimony_service
        .moderate(id, request, &current_user.principal)
        .await?;
    Ok(ApiResponse::ok(testimony).with_message("Testimony status updated"))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<()>> {
    let id = parse_id(&id, "testimony")?;
    state.service_context.testimony_service.delete(id).await?;
    Ok(ApiResponse::message("Testimony deleted successfully"))
}
