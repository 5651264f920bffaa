pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod response;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    auth::TokenVerifier,
    config::Settings,
    service::ServiceContext,
    storage::UploadKind,
};
use state::AppState;

/// Room for the text fields that travel alongside the largest allowed upload.
const FORM_OVERHEAD: usize = 1024 * 1024;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
    verifier: Arc<TokenVerifier>,
) -> Router {
    let uploads_dir = settings.server.uploads_dir.clone();
    let body_limit = settings.uploads.max_file_size * UploadKind::Event.max_files() + FORM_OVERHEAD;
    let app_state = AppState::new(service_context, settings, verifier);

    Router::new()
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        .nest("/api", api_routes(app_state.clone()))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(event_routes(state.clone()))
        .merge(sermon_routes(state.clone()))
        .merge(prayer_request_routes(state.clone()))
        .merge(blog_routes(state.clone()))
        .merge(donation_routes(state.clone()))
        .merge(member_routes(state.clone()))
        .merge(testimony_routes(state.clone()))
        .merge(resource_routes(state))
}

fn event_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/events", get(handlers::events::list))
        .route("/events/:id", get(handlers::events::get));

    let protected = Router::new()
        .route("/events", post(handlers::events::create))
        .route(
            "/events/:id",
            put(handlers::events::update).delete(handlers::events::delete),
        )
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth));

    public.merge(protected)
}

fn sermon_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/sermons",
            get(handlers::sermons::list).post(handlers::sermons::create),
        )
        .route(
            "/sermons/:id",
            get(handlers::sermons::get)
                .put(handlers::sermons::update)
                .delete(handlers::sermons::delete),
        )
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth))
}

fn prayer_request_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/prayer-requests/public", get(handlers::prayer_requests::list_public))
        .route("/prayer-requests/:id/pray", patch(handlers::prayer_requests::pray));

    let protected = Router::new()
        .route(
            "/prayer-requests",
            get(handlers::prayer_requests::list).post(handlers::prayer_requests::create),
        )
        .route(
            "/prayer-requests/:id",
            get(handlers::prayer_requests::get)
                .put(handlers::prayer_requests::update)
                .delete(handlers::prayer_requests::delete),
        )
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth));

    public.merge(protected)
}

fn blog_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/blog/posts/published", get(handlers::blog::list_published))
        .route("/blog/posts/slug/:slug", get(handlers::blog::get_by_slug));

    let protected = Router::new()
        .route(
            "/blog/posts",
            get(handlers::blog::list).post(handlers::blog::create),
        )
        .route(
            "/blog/posts/:id",
            get(handlers::blog::get)
                .put(handlers::blog::update)
                .delete(handlers::blog::delete),
        )
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth));

    public.merge(protected)
}

fn donation_routes(state: AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/donations", post(handlers::donations::create))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth::optional_auth));

    let protected = Router::new()
        .route("/donations", get(handlers::donations::list))
        .route("/donations/stats", get(handlers::donations::stats))
        .route("/donations/user/:id", get(handlers::donations::list_for_donor))
        .route(
            "/donations/:id",
            get(handlers::donations::get)
                .put(handlers::donations::update)
                .delete(handlers::donations::delete),
        )
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth));

    open.merge(protected)
}

fn member_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/members",
            get(handlers::members::list).post(handlers::members::create),
        )
        .route("/members/stats", get(handlers::members::stats))
        .route("/members/email/:email", get(handlers::members::get_by_email))
        .route(
            "/members/:id",
            get(handlers::members::get)
                .put(handlers::members::update)
                .delete(handlers::members::delete),
        )
        .route("/members/:id/activity", patch(handlers::members::record_activity))
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth))
}

fn testimony_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/testimonies/submit", post(handlers::testimonies::submit))
        .route("/testimonies/public", get(handlers::testimonies::list_public));

    let protected = Router::new()
        .route("/testimonies/admin", get(handlers::testimonies::list))
        .route("/testimonies/admin/stats", get(handlers::testimonies::stats))
        .route(
            "/testimonies/admin/:id",
            get(handlers::testimonies::get).delete(handlers::testimonies::delete),
        )
        .route("/testimonies/admin/:id/status", put(handlers::testimonies::moderate))
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth));

    public.merge(protected)
}

fn resource_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/resources/public", get(handlers::resources::list_public))
        .route("/resources/public/faqs", get(handlers::resources::faqs))
        .route("/resources/public/:id", get(handlers::resources::get_public))
        .route("/resources/public/:id/download", put(handlers::resources::record_download));

    let protected = Router::new()
        .route(
            "/resources/admin",
            get(handlers::resources::list).post(handlers::resources::create),
        )
        .route(
            "/resources/admin/:id",
            put(handlers::resources::update).delete(handlers::resources::delete),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::auth::require_auth));

    let admin = Router::new()
        .route("/resources/admin/stats", get(handlers::resources::stats))
        .route_layer(from_fn_with_state(state, middleware::auth::require_admin));

    public.merge(protected).merge(admin)
}
