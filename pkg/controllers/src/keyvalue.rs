use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use pkg_constants::annotations::{SECRET_TYPE_OPAQUE, compare_key, last_update_key};
use pkg_state::registry::Cluster;
use pkg_types::secret::Secret;
use pkg_types::vault::{Vault, VaultType};
use pkg_vault::VaultClient;
use pkg_vault::types::KeyValueData;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::error::{RefreshError, Result};
use crate::refresh::RefreshStrategy;
use crate::staleness;

/// Mirrors a key/value backend secret. Unlike PKI, deciding whether a refresh
/// is needed requires reading the backend: the secret is due whenever the
/// digest of the backend data differs from the `compare` annotation.
pub struct KeyValueRefresh {
    cluster: Arc<dyn Cluster>,
    vault: VaultClient,
}

impl KeyValueRefresh {
    pub fn new(cluster: Arc<dyn Cluster>, vault: VaultClient) -> Self {
        Self { cluster, vault }
    }
}

/// Hex SHA-256 of the data's JSON form. `BTreeMap` keeps key order stable.
fn digest(data: &KeyValueData) -> String {
    let canonical = serde_json::to_vec(data).unwrap_or_default();
    hex::encode(Sha256::digest(&canonical))
}

#[async_trait]
impl RefreshStrategy for KeyValueRefresh {
    fn vault_type(&self) -> VaultType {
        VaultType::KeyValue
    }

    async fn refresh_is_needed(&self, vault: &Vault) -> Result<bool> {
        let secret = self
            .cluster
            .get_secret(&vault.namespace, &vault.name)
            .await
            .map_err(|source| RefreshError::StoreReadFailed {
                binding: vault.identity(),
                source,
            })?;
        let Some(secret) = secret else {
            return Ok(true);
        };

        let current = self
            .vault
            .read_key_value(&vault.spec.path)
            .await
            .map_err(|source| RefreshError::BackendUnreachable {
                binding: vault.identity(),
                source,
            })?;

        Ok(secret.annotations.get(&compare_key()) != Some(&digest(&current)))
    }

    async fn fetch_and_apply(&self, vault: &Vault) -> Result<()> {
        let binding = vault.identity();
        let data = self
            .vault
            .read_key_value(&vault.spec.path)
            .await
            .map_err(|source| RefreshError::SecretNotAccessible {
                binding: binding.clone(),
                source,
            })?;

        let now = Utc::now();
        let secret = Secret {
            name: vault.name.clone(),
            namespace: vault.namespace.clone(),
            secret_type: SECRET_TYPE_OPAQUE.to_string(),
            data: data
                .iter()
                .map(|(k, v)| (k.clone(), STANDARD.encode(v)))
                .collect(),
            annotations: HashMap::from([
                (last_update_key(), staleness::format_timestamp(now)),
                (compare_key(), digest(&data)),
            ]),
            owner_ref: Some(vault.id.clone()),
            created_at: now,
            updated_at: now,
        };

        self.cluster
            .write_secret(&secret)
            .await
            .map_err(|source| RefreshError::StoreWriteFailed { binding: binding.clone(), source })?;

        info!("Synced {} keys from {} into {}", data.len(), vault.spec.path, binding);
        Ok(())
    }
}
