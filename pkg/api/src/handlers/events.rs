use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    #[serde(default)]
    pub namespace: Option<String>,
}

/// GET /api/v1/events: the outcome log, optionally for one namespace.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> impl IntoResponse {
    match state.registry.list_events(query.namespace.as_deref()).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => {
            error!("Failed to list events: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list events").into_response()
        }
    }
}
