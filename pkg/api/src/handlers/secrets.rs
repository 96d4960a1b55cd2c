use axum::{
    Json,
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::IntoResponse,
};
use pkg_state::registry::Cluster;
use tracing::error;

use crate::AppState;

/// GET /api/v1/namespaces/{ns}/secrets: secrets delivered in a namespace.
pub async fn list_secrets(
    State(state): State<AppState>,
    AxumPath(ns): AxumPath<String>,
) -> impl IntoResponse {
    match state.registry.list_secrets_in(&ns).await {
        Ok(secrets) => (StatusCode::OK, Json(secrets)).into_response(),
        Err(e) => {
            error!("Failed to list secrets in {}: {}", ns, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list secrets").into_response()
        }
    }
}

/// GET /api/v1/namespaces/{ns}/secrets/{name}
pub async fn get_secret(
    State(state): State<AppState>,
    AxumPath((ns, name)): AxumPath<(String, String)>,
) -> impl IntoResponse {
    match state.registry.get_secret(&ns, &name).await {
        Ok(Some(secret)) => (StatusCode::OK, Json(secret)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to read secret {}/{}: {}", ns, name, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read secret").into_response()
        }
    }
}
