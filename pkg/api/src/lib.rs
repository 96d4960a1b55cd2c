pub mod auth;
pub mod handlers;
pub mod request_id;
pub mod server;

use std::sync::Arc;

use pkg_controllers::handler::EventHandler;
use pkg_controllers::notification::EventNotification;
use pkg_state::registry::Registry;

/// Shared application state injected into all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub handler: Arc<EventHandler>,
    pub notifier: Arc<dyn EventNotification>,
    pub api_token: String,
}
