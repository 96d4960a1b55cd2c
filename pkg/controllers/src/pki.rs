use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, Utc};
use pkg_constants::annotations::{SECRET_TYPE_OPAQUE, TLS_CERT_KEY, TLS_PRIVATE_KEY};
use pkg_state::registry::Cluster;
use pkg_types::secret::Secret;
use pkg_types::ttl::parse_ttl;
use pkg_types::vault::{Vault, VaultType};
use pkg_vault::VaultClient;
use pkg_vault::types::PkiRequest;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{RefreshError, Result};
use crate::refresh::RefreshStrategy;
use crate::staleness;

/// Certificate issuance against a PKI backend role.
///
/// The staleness check is local: it only reads the delivered secret's
/// `compare` annotation, which is set to `issued_at + ttl - margin` rounded
/// down to the minute.
pub struct PkiRefresh {
    cluster: Arc<dyn Cluster>,
    vault: VaultClient,
    refresh_margin: Duration,
}

impl PkiRefresh {
    pub fn new(cluster: Arc<dyn Cluster>, vault: VaultClient) -> Self {
        Self {
            cluster,
            vault,
            refresh_margin: Duration::zero(),
        }
    }

    /// Make secrets due `margin` before `issued_at + ttl`.
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }
}

#[async_trait]
impl RefreshStrategy for PkiRefresh {
    fn vault_type(&self) -> VaultType {
        VaultType::Pki
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
            debug!("Secret {} does not exist yet", vault.identity());
            return Ok(true);
        };

        match staleness::decode(&secret.annotations) {
            Ok(compare) => Ok(staleness::is_stale(compare, Utc::now())),
            Err(e) => {
                warn!("Secret {} will be refreshed: {}", vault.identity(), e);
                Ok(true)
            }
        }
    }

    async fn fetch_and_apply(&self, vault: &Vault) -> Result<()> {
        let binding = vault.identity();
        let pki = vault.spec.pki_configuration.as_ref().ok_or_else(|| {
            RefreshError::InvalidConfiguration {
                binding: binding.clone(),
                reason: "missing pkiConfiguration".to_string(),
            }
        })?;
        let ttl = parse_ttl(&pki.ttl).map_err(|e| RefreshError::InvalidConfiguration {
            binding: binding.clone(),
            reason: e.to_string(),
        })?;

        let request = PkiRequest {
            common_name: pki.common_name.clone(),
            ttl: pki.ttl.clone(),
            alt_names: pki.alt_names.clone(),
            ip_sans: pki.ip_sans.clone(),
        };

        let request_time = Utc::now();
        let issued = self
            .vault
            .issue_certificate(&vault.spec.path, &request)
            .await
            .map_err(|source| RefreshError::SecretNotAccessible {
                binding: binding.clone(),
                source,
            })?;

        let valid_for = (ttl - self.refresh_margin).max(Duration::zero());
        let secret = Secret {
            name: vault.name.clone(),
            namespace: vault.namespace.clone(),
            secret_type: SECRET_TYPE_OPAQUE.to_string(),
            data: HashMap::from([
                (TLS_CERT_KEY.to_string(), STANDARD.encode(&issued.certificate)),
                (TLS_PRIVATE_KEY.to_string(), STANDARD.encode(&issued.private_key)),
            ]),
            annotations: staleness::encode(request_time, valid_for),
            owner_ref: Some(vault.id.clone()),
            created_at: request_time,
            updated_at: request_time,
        };

        self.cluster
            .write_secret(&secret)
            .await
            .map_err(|source| RefreshError::StoreWriteFailed {
                binding: binding.clone(),
                source,
            })?;

        info!(
            "Issued certificate for {} (cn={}, ttl={}, serial={})",
            binding,
            pki.common_name,
            pki.ttl,
            issued.serial_number.as_deref().unwrap_or("-")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        self, TEST_PKI_PATH, generate_key_pair, mount_pki_failure, mount_pki_success,
    };
    use pkg_constants::annotations::{compare_key, last_update_key};
    use pkg_state::registry::Registry;
    use wiremock::MockServer;

    async fn strategy(server: &MockServer) -> (PkiRefresh, Registry) {
        let registry = testutil::registry().await;
        let pki = PkiRefresh::new(Arc::new(registry.clone()), testutil::vault_client(server));
        (pki, registry)
    }

    fn secret_with_annotations(annotations: HashMap<String, String>) -> Secret {
        Secret {
            name: "pki".to_string(),
            namespace: "default".to_string(),
            secret_type: SECRET_TYPE_OPAQUE.to_string(),
            data: HashMap::new(),
            annotations,
            owner_ref: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn refresh_needed_when_secret_is_absent() {
        let server = MockServer::start().await;
        let (pki, _) = strategy(&server).await;
        let vault = testutil::pki_vault("pki", TEST_PKI_PATH);
        assert!(pki.refresh_is_needed(&vault).await.unwrap());
    }

    #[tokio::test]
    async fn refresh_follows_compare_annotation() {
        let server = MockServer::start().await;
        let (pki, registry) = strategy(&server).await;
        let vault = testutil::pki_vault("pki", TEST_PKI_PATH);

        let past = staleness::encode(Utc::now() - Duration::minutes(20), Duration::minutes(10));
        registry
            .write_secret(&secret_with_annotations(past))
            .await
            .unwrap();
        assert!(pki.refresh_is_needed(&vault).await.unwrap());

        let future = staleness::encode(Utc::now(), Duration::minutes(10));
        registry
            .write_secret(&secret_with_annotations(future))
            .await
            .unwrap();
        assert!(!pki.refresh_is_needed(&vault).await.unwrap());
    }

    #[tokio::test]
    async fn missing_metadata_means_refresh() {
        let server = MockServer::start().await;
        let (pki, registry) = strategy(&server).await;
        let vault = testutil::pki_vault("pki", TEST_PKI_PATH);

        registry
            .write_secret(&secret_with_annotations(HashMap::new()))
            .await
            .unwrap();
        assert!(pki.refresh_is_needed(&vault).await.unwrap());
    }

    #[tokio::test]
    async fn issues_certificate_into_secret() {
        let server = MockServer::start().await;
        let (certificate, private_key) = generate_key_pair("test.url.de");
        mount_pki_success(&server, TEST_PKI_PATH, &certificate, &private_key).await;
        let (pki, registry) = strategy(&server).await;
        let vault = testutil::pki_vault("pki", TEST_PKI_PATH);

        let before = Utc::now();
        pki.fetch_and_apply(&vault).await.unwrap();
        let after = Utc::now();

        let secret = registry.get_secret("default", "pki").await.unwrap().unwrap();
        assert_eq!(secret.name, "pki");
        assert_eq!(secret.namespace, "default");
        assert_eq!(secret.secret_type, "Opaque");
        assert_eq!(secret.owner_ref.as_deref(), Some("pki-id"));
        assert!(secret.annotations.contains_key(&last_update_key()));

        let compare = staleness::parse_timestamp(&secret.annotations[&compare_key()]).unwrap();
        let earliest = staleness::truncate_to_minute(before + Duration::minutes(10));
        let latest = staleness::truncate_to_minute(after + Duration::minutes(10));
        assert!(compare == earliest || compare == latest);

        let crt = STANDARD.decode(&secret.data["tls.crt"]).unwrap();
        let key = STANDARD.decode(&secret.data["tls.key"]).unwrap();
        assert_eq!(String::from_utf8(crt).unwrap(), certificate);
        assert_eq!(String::from_utf8(key).unwrap(), private_key);
        assert!(certificate.contains('\n'));
    }

    #[tokio::test]
    async fn refresh_margin_moves_compare_earlier() {
        let server = MockServer::start().await;
        let (certificate, private_key) = generate_key_pair("test.url.de");
        mount_pki_success(&server, TEST_PKI_PATH, &certificate, &private_key).await;
        let registry = testutil::registry().await;
        let pki = PkiRefresh::new(Arc::new(registry.clone()), testutil::vault_client(&server))
            .with_refresh_margin(Duration::minutes(2));
        let vault = testutil::pki_vault("pki", TEST_PKI_PATH);

        let before = Utc::now();
        pki.fetch_and_apply(&vault).await.unwrap();
        let after = Utc::now();

        let secret = registry.get_secret("default", "pki").await.unwrap().unwrap();
        let compare = staleness::decode(&secret.annotations).unwrap();
        assert!(
            compare == staleness::truncate_to_minute(before + Duration::minutes(8))
                || compare == staleness::truncate_to_minute(after + Duration::minutes(8))
        );
    }

    #[tokio::test]
    async fn backend_failure_writes_nothing() {
        let server = MockServer::start().await;
        mount_pki_failure(&server, TEST_PKI_PATH, 500).await;
        let (pki, registry) = strategy(&server).await;
        let vault = testutil::pki_vault("pki", TEST_PKI_PATH);

        let err = pki.fetch_and_apply(&vault).await.unwrap_err();
        match err {
            RefreshError::SecretNotAccessible { binding, .. } => {
                assert_eq!(binding, "default/pki")
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.get_secret("default", "pki").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_configuration_is_rejected_before_any_call() {
        let server = MockServer::start().await;
        let (pki, _) = strategy(&server).await;
        let mut vault = testutil::pki_vault("pki", TEST_PKI_PATH);
        vault.spec.pki_configuration = None;

        let err = pki.fetch_and_apply(&vault).await.unwrap_err();
        assert!(matches!(err, RefreshError::InvalidConfiguration { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
