use async_trait::async_trait;
use chrono::Utc;
use pkg_state::registry::Registry;
use pkg_types::event::{Event, EventType};
use pkg_types::vault::Vault;
use tracing::debug;
use uuid::Uuid;

/// Durable record of per-binding outcomes, for operators.
#[async_trait]
pub trait EventNotification: Send + Sync {
    /// Record an event for a binding known by namespace and name only, as
    /// for a stored binding that cannot be decoded.
    async fn store_binding_event(
        &self,
        kind: EventType,
        message: &str,
        namespace: &str,
        name: &str,
        binding_id: &str,
    ) -> anyhow::Result<()>;

    async fn store_new_event(
        &self,
        kind: EventType,
        message: &str,
        vault: &Vault,
    ) -> anyhow::Result<()> {
        self.store_binding_event(kind, message, &vault.namespace, &vault.name, &vault.id)
            .await
    }
}

/// Appends events to the state store's event log.
pub struct StoreEventNotification {
    registry: Registry,
}

impl StoreEventNotification {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl EventNotification for StoreEventNotification {
    async fn store_binding_event(
        &self,
        kind: EventType,
        message: &str,
        namespace: &str,
        name: &str,
        binding_id: &str,
    ) -> anyhow::Result<()> {
        let event = Event {
            id: Uuid::new_v4().to_string(),
            kind,
            message: message.to_string(),
            namespace: namespace.to_string(),
            binding_name: name.to_string(),
            binding_id: binding_id.to_string(),
            timestamp: Utc::now(),
        };
        debug!("Event {} for {}/{}: {}", kind, namespace, name, message);
        self.registry.append_event(&event).await
    }
}
