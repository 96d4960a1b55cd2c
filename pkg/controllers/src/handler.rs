use dashmap::DashMap;
use pkg_state::registry::Cluster;
use pkg_types::validate::validate_vault;
use pkg_types::vault::Vault;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{RefreshError, Result};
use crate::refresh::{RefreshStrategy, TypeRefreshFactory};

/// Applies bindings: entry point shared by the creation path and the
/// scheduled refresh. Work on one binding is serialized; different bindings
/// proceed independently.
pub struct EventHandler {
    cluster: Arc<dyn Cluster>,
    factory: Arc<TypeRefreshFactory>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl EventHandler {
    pub fn new(cluster: Arc<dyn Cluster>, factory: Arc<TypeRefreshFactory>) -> Self {
        Self {
            cluster,
            factory,
            locks: DashMap::new(),
        }
    }

    /// Reject a binding that is malformed or whose type has no strategy.
    pub fn validate(&self, vault: &Vault) -> anyhow::Result<()> {
        validate_vault(vault)?;
        if !self.factory.supports(vault.spec.vault_type) {
            anyhow::bail!(
                "vault '{}' has unsupported type {}",
                vault.name,
                vault.spec.vault_type
            );
        }
        Ok(())
    }

    /// Store a new binding unless one with the same identity exists.
    /// Returns `false` when the identity is already taken.
    pub async fn insert_binding(&self, vault: &Vault) -> Result<bool> {
        let identity = vault.identity();
        let lock = self.lock_for(&identity);
        let _guard = lock.lock().await;

        let existing = self
            .cluster
            .get_vault(&vault.namespace, &vault.name)
            .await
            .map_err(|source| RefreshError::StoreReadFailed {
                binding: identity.clone(),
                source,
            })?;
        if existing.is_some() {
            return Ok(false);
        }
        self.cluster
            .put_vault(vault)
            .await
            .map_err(|source| RefreshError::StoreWriteFailed {
                binding: identity,
                source,
            })?;
        Ok(true)
    }

    /// A binding was declared: deliver its secret.
    pub async fn add_handler(&self, vault: &Vault) -> Result<()> {
        info!("Adding secret {} ({})", vault.identity(), vault.spec.vault_type);
        self.apply(vault).await.map(|_| ())
    }

    /// A binding is due: deliver fresh material. Returns `false` when the
    /// binding was removed or replaced since it was listed.
    pub async fn modify_handler(&self, vault: &Vault) -> Result<bool> {
        info!("Refreshing secret {} ({})", vault.identity(), vault.spec.vault_type);
        self.apply(vault).await
    }

    /// Remove a binding and the secret it produced.
    pub async fn delete_handler(&self, vault: &Vault) -> Result<()> {
        let identity = vault.identity();
        let lock = self.lock_for(&identity);
        let guard = lock.lock().await;

        // Binding first, so a refresh queued behind this lock finds nothing to do.
        self.cluster
            .delete_vault(&vault.namespace, &vault.name)
            .await
            .map_err(|source| RefreshError::StoreWriteFailed {
                binding: identity.clone(),
                source,
            })?;
        self.cluster
            .delete_secret(&vault.namespace, &vault.name)
            .await
            .map_err(|source| RefreshError::StoreWriteFailed {
                binding: identity.clone(),
                source,
            })?;

        // Only the map and this call hold the lock: nobody is waiting on it.
        self.locks
            .remove_if(&identity, |_, held| Arc::strong_count(held) == 2);
        drop(guard);
        info!("Deleted secret {}", identity);
        Ok(())
    }

    async fn apply(&self, vault: &Vault) -> Result<bool> {
        let strategy = self.strategy(vault)?;
        let identity = vault.identity();
        let lock = self.lock_for(&identity);
        let _guard = lock.lock().await;

        let current = self
            .cluster
            .get_vault(&vault.namespace, &vault.name)
            .await
            .map_err(|source| RefreshError::StoreReadFailed {
                binding: identity.clone(),
                source,
            })?;
        match current {
            Some(current) if current.id == vault.id => {}
            _ => {
                debug!("Binding {} is gone, skipping", identity);
                return Ok(false);
            }
        }

        strategy.fetch_and_apply(vault).await?;
        Ok(true)
    }

    fn strategy(&self, vault: &Vault) -> Result<Arc<dyn RefreshStrategy>> {
        self.factory
            .get(vault.spec.vault_type)
            .ok_or_else(|| RefreshError::InvalidConfiguration {
                binding: vault.identity(),
                reason: format!("no refresh strategy for type {}", vault.spec.vault_type),
            })
    }

    fn lock_for(&self, identity: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(identity.to_string())
            .or_default()
            .clone()
    }
}
