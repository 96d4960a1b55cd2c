use async_trait::async_trait;
use pkg_types::vault::{Vault, VaultType};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;

/// Type-specific refresh logic. One implementation per [`VaultType`].
#[async_trait]
pub trait RefreshStrategy: Send + Sync {
    fn vault_type(&self) -> VaultType;

    /// Whether the secret delivered for `vault` must be fetched again.
    async fn refresh_is_needed(&self, vault: &Vault) -> Result<bool>;

    /// Fetch fresh material from the backend and write the secret together
    /// with new staleness annotations. Nothing is written on failure.
    async fn fetch_and_apply(&self, vault: &Vault) -> Result<()>;
}

/// Registry of refresh strategies keyed by credential type.
#[derive(Default)]
pub struct TypeRefreshFactory {
    strategies: HashMap<VaultType, Arc<dyn RefreshStrategy>>,
}

impl TypeRefreshFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy, replacing any previous one for the same type.
    pub fn register(mut self, strategy: Arc<dyn RefreshStrategy>) -> Self {
        self.strategies.insert(strategy.vault_type(), strategy);
        self
    }

    pub fn get(&self, vault_type: VaultType) -> Option<Arc<dyn RefreshStrategy>> {
        self.strategies.get(&vault_type).cloned()
    }

    pub fn supports(&self, vault_type: VaultType) -> bool {
        self.strategies.contains_key(&vault_type)
    }
}
