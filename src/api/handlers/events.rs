use axum::{
    extract::{Multipart, Path, State},
    Extension,
};

use crate::{
    api::{
        extract::{parse_id, ApiQuery},
        middleware::auth::CurrentUser,
        multipart::UploadForm,
        response::ApiResponse,
        state::AppState,
    },
    domain::{Event, EventForm, EventQuery},
    error::Result,
    storage::UploadKind,
};

async fn receive_form(state: &AppState, multipart: Multipart) -> Result<(EventForm, Vec<String>)> {
    let upload = UploadForm::receive(
        multipart,
        state.service_context.blob_store.as_ref(),
        UploadKind::Event,
        state.settings.uploads.max_file_size,
    )
    .await?;
    Ok((EventForm::from_fields(upload.fields), upload.images))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EventQuery>,
) -> Result<ApiResponse<Vec<Event>>> {
    let page = state.service_context.event_service.list(query).await?;
    Ok(ApiResponse::page(page))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<Event>> {
    let id = parse_id(&id, "event")?;
    let event = state.service_context.event_service.get(id).await?;
    Ok(ApiResponse::ok(event))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<ApiResponse<Event>> {
    let (form, images) = receive_form(&state, multipart).await?;
    let event = state
        .service_context
        .event_service
        .create(form, images, &current_user.principal)
        .await?;
    Ok(ApiResponse::created(event, "Event created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<ApiResponse<Event>> {
    let id = parse_id(&id, "event")?;
    let (form, images) = receive_form(&state, multipart).await?;
    let event = state.service_context.event_service.update(id, form, images).await?;
    Ok(ApiResponse::ok(event).with_message("Event updated successfully"))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<()>> {
    let id = parse_id(&id, "event")?;
    state.service_context.event_service.delete(id).await?;
    Ok(ApiResponse::message("Event deleted successfully"))
}
