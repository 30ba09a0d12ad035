use axum::{http::StatusCode, Json, response::IntoResponse};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Campfire API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Event scheduling and attendance for troops",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "events": "/api/events",
            "helpers": "/api/helpers",
            "reminders": "/api/reminders",
            "admin": "/api/admin"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
