pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    routing::{get, post, put, delete},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::service::ServiceContext;
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>) -> Router {
    let app_state = AppState::new(service_context);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        .nest("/api", api_routes())

        // Add state to the router
        .with_state(app_state)

        // Middleware
        .layer(axum::middleware::from_fn(middleware::identity::identify))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/events", event_routes())
        .nest("/helpers", helper_routes())
        .nest("/reminders", reminder_routes())
        .nest("/admin", admin_routes())
        .route("/me", get(handlers::admin::me))
        .route("/me/registrations", get(handlers::events::my_registrations))
        .route("/badges", get(handlers::admin::list_badges))
}

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::events::list).post(handlers::events::create))
        .route("/:id", get(handlers::events::get))
        .route("/:id", put(handlers::events::update))
        .route("/:id", delete(handlers::events::delete))
        // Registration
        .route("/:id/participants", get(handlers::events::participants))
        .route("/:id/seats", get(handlers::events::seats))
        .route("/:id/register", post(handlers::events::register))
        .route("/:id/cancel", post(handlers::events::cancel))
        .route("/:id/registration", get(handlers::events::registration_status))
        // Helpers
        .route("/:id/helpers", get(handlers::helpers::list).post(handlers::helpers::assign))
        .route("/:id/helpers/available", get(handlers::helpers::available_for_event))
        .route("/:id/helpers/:helper_id", put(handlers::helpers::confirm))
        .route("/:id/helpers/:helper_id", delete(handlers::helpers::remove))
        .route("/:id/volunteer", post(handlers::helpers::volunteer))
        // Attendance
        .route("/:id/attendance", get(handlers::attendance::list).post(handlers::attendance::check_in))
        .route("/:id/attendance/:user_id/check-out", post(handlers::attendance::check_out))
        // Reminders
        .route("/:id/reminders", get(handlers::reminders::list).post(handlers::reminders::create))
}

fn helper_routes() -> Router<AppState> {
    Router::new()
        .route("/available", get(handlers::helpers::available))
        .route("/:id/schedule", get(handlers::helpers::schedule))
}

fn reminder_routes() -> Router<AppState> {
    Router::new()
        .route("/pending", get(handlers::reminders::pending))
        .route("/:id/sent", post(handlers::reminders::mark_sent))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::admin::stats))
        .route("/users", put(handlers::admin::upsert_user))
        .route("/badges", put(handlers::admin::upsert_badge))
}
