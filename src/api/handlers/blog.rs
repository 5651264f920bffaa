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
    domain::{BlogPost, BlogQuery, CreateBlogPostRequest, UpdateBlogPostRequest},
    error::Result,
};

pub async fn list_published(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BlogQuery>,
) -> Result<ApiResponse<Vec<BlogPost>>> {
    let page = state.service_context.blog_post_service.list_published(query).await?;
    Ok(ApiResponse::page(page))
}

/// Public route: drafts and archived posts answer 404 even when the slug exists.
pub async fn get_by_slug(State(state): State<AppState>, Path(slug): Path<String>) -> Result<ApiResponse<BlogPost>> {
    let post = state.service_context.blog_post_service.view_by_slug(&slug).await?;
    Ok(ApiResponse::ok(post))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BlogQuery>,
) -> Result<ApiResponse<Vec<BlogPost>>> {
    let page = state.service_context.blog_post_service.list(query).await?;
    Ok(ApiResponse::page(page))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<ApiResponse<BlogPost>> {
    let id = parse_id(&id, "post")?;
    let post = state.service_context.blog_post_service.view(id).await?;
    Ok(ApiResponse::ok(post))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiJson(request): ApiJson<CreateBlogPostRequest>,
) -> Result<ApiResponse<BlogPost>> {
    let post = state
        .service_context
        .blog_post_service
        .create(request, &current_user.principal)
        .await?;
    Ok(ApiResponse::created(post, "Post created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateBlogPostRequest>,
) -> Result<ApiResponse<BlogPost>> {
    let id = parse_id(&id, "post")?;
    let post = state
        .service_context
        .blog_post_service
        .update(id, request, &current_user.principal)
        .await?;
    Ok(ApiResponse::ok(post).with_message("Post updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>> {
    let id = parse_id(&id, "post")?;
    state
        .service_context
        .blog_post_service
        .delete(id, &current_user.principal)
        .await?;
    Ok(ApiResponse::message("Post deleted successfully"))
}
