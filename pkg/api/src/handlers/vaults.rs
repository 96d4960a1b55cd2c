use axum::{
    Json,
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use pkg_state::registry::Cluster;
use pkg_types::event::EventType;
use pkg_types::vault::Vault;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::AppState;

async fn record(state: &AppState, kind: EventType, message: &str, vault: &Vault) {
    if let Err(e) = state.notifier.store_new_event(kind, message, vault).await {
        warn!("Failed to record {} event for {}: {}", kind, vault.identity(), e);
    }
}

/// POST /api/v1/namespaces/{ns}/vaults: declare a binding and deliver its
/// secret right away. The binding is kept even if delivery fails; the
/// scheduled refresh retries it.
pub async fn create_vault(
    State(state): State<AppState>,
    AxumPath(ns): AxumPath<String>,
    Json(mut vault): Json<Vault>,
) -> impl IntoResponse {
    vault.id = Uuid::new_v4().to_string();
    vault.namespace = ns.clone();
    vault.created_at = Utc::now();

    if let Err(e) = state.handler.validate(&vault) {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    match state.handler.insert_binding(&vault).await {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::CONFLICT,
                format!("vault {}/{} already exists", ns, vault.name),
            )
                .into_response();
        }
        Err(e) => {
            error!("Failed to store vault {}: {}", vault.identity(), e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store vault").into_response();
        }
    }
    info!("Created vault {} ({})", vault.identity(), vault.spec.vault_type);

    match state.handler.add_handler(&vault).await {
        Ok(()) => {
            record(&state, EventType::Addition, "Secret created", &vault).await;
            (StatusCode::CREATED, Json(vault)).into_response()
        }
        Err(e) => {
            warn!("Creation of secret {} failed: {}", vault.identity(), e);
            let message = format!("Creation of secret failed with exception {}", e);
            record(&state, EventType::AdditionFailed, &message, &vault).await;
            (StatusCode::BAD_GATEWAY, message).into_response()
        }
    }
}

/// GET /api/v1/namespaces/{ns}/vaults
pub async fn list_vaults(
    State(state): State<AppState>,
    AxumPath(ns): AxumPath<String>,
) -> impl IntoResponse {
    match state.registry.list_vaults_in(&ns).await {
        Ok(vaults) => (StatusCode::OK, Json(vaults)).into_response(),
        Err(e) => {
            error!("Failed to list vaults in {}: {}", ns, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list vaults").into_response()
        }
    }
}

/// GET /api/v1/namespaces/{ns}/vaults/{name}
pub async fn get_vault(
    State(state): State<AppState>,
    AxumPath((ns, name)): AxumPath<(String, String)>,
) -> impl IntoResponse {
    match state.registry.get_vault(&ns, &name).await {
        Ok(Some(vault)) => (StatusCode::OK, Json(vault)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to read vault {}/{}: {}", ns, name, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read vault").into_response()
        }
    }
}

/// DELETE /api/v1/namespaces/{ns}/vaults/{name}: remove a binding and the
/// secret it produced.
pub async fn delete_vault(
    State(state): State<AppState>,
    AxumPath((ns, name)): AxumPath<(String, String)>,
) -> impl IntoResponse {
    let vault = match state.registry.get_vault(&ns, &name).await {
        Ok(Some(vault)) => vault,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to read vault {}/{}: {}", ns, name, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read vault").into_response();
        }
    };

    if let Err(e) = state.handler.delete_handler(&vault).await {
        let message = format!("Deletion of secret failed with exception {}", e);
        record(&state, EventType::DeletionFailed, &message, &vault).await;
        return (StatusCode::INTERNAL_SERVER_ERROR, message).into_response();
    }

    record(&state, EventType::Deletion, "Secret deleted", &vault).await;
    info!("Deleted vault {}", vault.identity());
    StatusCode::NO_CONTENT.into_response()
}
