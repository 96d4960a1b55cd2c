use async_trait::async_trait;
use chrono::Utc;
use pkg_constants::state::{EVENTS_PREFIX, SECRETS_PREFIX, VAULTS_PREFIX};
use pkg_types::event::Event;
use pkg_types::secret::Secret;
use pkg_types::vault::Vault;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use crate::client::StateStore;

/// The cluster as seen by the refresh engine: where bindings are declared
/// and where delivered secrets are read and written.
#[async_trait]
pub trait Cluster: Send + Sync {
    /// All bindings across all namespaces, in store order.
    async fn list_vaults(&self) -> anyhow::Result<VaultListing>;

    async fn get_vault(&self, namespace: &str, name: &str) -> anyhow::Result<Option<Vault>>;

    async fn put_vault(&self, vault: &Vault) -> anyhow::Result<()>;

    async fn delete_vault(&self, namespace: &str, name: &str) -> anyhow::Result<()>;

    async fn get_secret(&self, namespace: &str, name: &str) -> anyhow::Result<Option<Secret>>;

    /// Replace the secret (data and annotations) in a single write.
    async fn write_secret(&self, secret: &Secret) -> anyhow::Result<()>;

    async fn delete_secret(&self, namespace: &str, name: &str) -> anyhow::Result<()>;
}

/// Result of listing bindings. Stored bindings that fail to decode are kept
/// apart so callers can report them.
#[derive(Debug, Default)]
pub struct VaultListing {
    pub vaults: Vec<Vault>,
    pub undecodable: Vec<UndecodableVault>,
}

impl From<Vec<Vault>> for VaultListing {
    fn from(vaults: Vec<Vault>) -> Self {
        Self {
            vaults,
            undecodable: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UndecodableVault {
    pub namespace: String,
    pub name: String,
    pub reason: String,
}

impl UndecodableVault {
    pub fn identity(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Typed access to bindings, secrets and events on top of [`StateStore`].
#[derive(Clone)]
pub struct Registry {
    store: StateStore,
    event_seq: Arc<AtomicU64>,
}

fn vault_key(namespace: &str, name: &str) -> String {
    format!("{}{}/{}", VAULTS_PREFIX, namespace, name)
}

fn secret_key(namespace: &str, name: &str) -> String {
    format!("{}{}/{}", SECRETS_PREFIX, namespace, name)
}

impl Registry {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            event_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Bindings of one namespace.
    pub async fn list_vaults_in(&self, namespace: &str) -> anyhow::Result<Vec<Vault>> {
        self.decode_prefix(&format!("{}{}/", VAULTS_PREFIX, namespace))
            .await
    }

    pub async fn list_secrets_in(&self, namespace: &str) -> anyhow::Result<Vec<Secret>> {
        self.decode_prefix(&format!("{}{}/", SECRETS_PREFIX, namespace))
            .await
    }

    /// Append an event. Keys sort in append order.
    pub async fn append_event(&self, event: &Event) -> anyhow::Result<()> {
        let seq = self.event_seq.fetch_add(1, Ordering::Relaxed);
        let key = format!(
            "{}{}/{}-{:010}-{}",
            EVENTS_PREFIX,
            event.namespace,
            event.timestamp.format("%Y%m%dT%H%M%S%f"),
            seq,
            event.id
        );
        let data = serde_json::to_vec(event)?;
        self.store.put(&key, &data).await
    }

    /// Events of one namespace, or of all namespaces when `namespace` is `None`.
    /// Either way they come back in append order.
    pub async fn list_events(&self, namespace: Option<&str>) -> anyhow::Result<Vec<Event>> {
        let prefix = match namespace {
            Some(ns) => format!("{}{}/", EVENTS_PREFIX, ns),
            None => EVENTS_PREFIX.to_string(),
        };
        let mut entries = self.store.list_prefix(&prefix).await?;
        if namespace.is_none() {
            // `<ns>/<ts>-<seq>-<id>`: order on what follows the namespace.
            entries.sort_by(|(a, _), (b, _)| event_suffix(a).cmp(event_suffix(b)));
        }
        Ok(decode_entries(entries))
    }

    async fn decode_prefix<T: serde::de::DeserializeOwned>(
        &self,
        prefix: &str,
    ) -> anyhow::Result<Vec<T>> {
        let entries = self.store.list_prefix(prefix).await?;
        Ok(decode_entries(entries))
    }
}

fn event_suffix(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

fn decode_entries<T: serde::de::DeserializeOwned>(entries: Vec<(String, Vec<u8>)>) -> Vec<T> {
    entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_slice(&value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Skipping undecodable record {}: {}", key, e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl Cluster for Registry {
    async fn list_vaults(&self) -> anyhow::Result<VaultListing> {
        let mut listing = VaultListing::default();
        for (key, value) in self.store.list_prefix(VAULTS_PREFIX).await? {
            match serde_json::from_slice::<Vault>(&value) {
                Ok(vault) => listing.vaults.push(vault),
                Err(e) => {
                    warn!("Undecodable binding {}: {}", key, e);
                    let (namespace, name) = key
                        .strip_prefix(VAULTS_PREFIX)
                        .and_then(|rest| rest.split_once('/'))
                        .unwrap_or(("", key.as_str()));
                    listing.undecodable.push(UndecodableVault {
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(listing)
    }

    async fn get_vault(&self, namespace: &str, name: &str) -> anyhow::Result<Option<Vault>> {
        match self.store.get(&vault_key(namespace, name)).await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    async fn put_vault(&self, vault: &Vault) -> anyhow::Result<()> {
        let data = serde_json::to_vec(vault)?;
        self.store
            .put(&vault_key(&vault.namespace, &vault.name), &data)
            .await
    }

    async fn delete_vault(&self, namespace: &str, name: &str) -> anyhow::Result<()> {
        self.store.delete(&vault_key(namespace, name)).await
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> anyhow::Result<Option<Secret>> {
        match self.store.get(&secret_key(namespace, name)).await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    async fn write_secret(&self, secret: &Secret) -> anyhow::Result<()> {
        let mut secret = secret.clone();
        if let Some(existing) = self.get_secret(&secret.namespace, &secret.name).await? {
            secret.created_at = existing.created_at;
        }
        secret.updated_at = Utc::now();
        let data = serde_json::to_vec(&secret)?;
        self.store
            .put(&secret_key(&secret.namespace, &secret.name), &data)
            .await
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> anyhow::Result<()> {
        self.store.delete(&secret_key(namespace, name)).await
    }
}
