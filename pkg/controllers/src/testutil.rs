//! Fixtures shared by the controller tests.

use chrono::Utc;
use pkg_state::client::StateStore;
use pkg_state::registry::Registry;
use pkg_types::vault::{Vault, VaultPkiConfiguration, VaultSpec, VaultType};
use pkg_vault::{VaultClient, VaultClientConfig};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_PKI_PATH: &str = "testpki/issue/testrole";

pub async fn registry() -> Registry {
    Registry::new(StateStore::in_memory().await.unwrap())
}

pub fn vault_client(server: &MockServer) -> VaultClient {
    VaultClient::new(VaultClientConfig {
        base_url: format!("{}/v1/", server.uri()),
        token: Some("s.test".to_string()),
        request_timeout: Duration::from_secs(2),
    })
    .unwrap()
}

pub fn pki_vault(name: &str, backend_path: &str) -> Vault {
    Vault {
        id: format!("{}-id", name),
        name: name.to_string(),
        namespace: "default".to_string(),
        spec: VaultSpec {
            vault_type: VaultType::Pki,
            path: backend_path.to_string(),
            pki_configuration: Some(VaultPkiConfiguration {
                common_name: "test.url.de".to_string(),
                ttl: "10m".to_string(),
                alt_names: None,
                ip_sans: None,
            }),
        },
        created_at: Utc::now(),
    }
}

pub fn kv_vault(name: &str, backend_path: &str) -> Vault {
    Vault {
        id: format!("{}-id", name),
        name: name.to_string(),
        namespace: "default".to_string(),
        spec: VaultSpec {
            vault_type: VaultType::KeyValue,
            path: backend_path.to_string(),
            pki_configuration: None,
        },
        created_at: Utc::now(),
    }
}

/// A self-signed certificate and its key, both as PEM text.
pub fn generate_key_pair(common_name: &str) -> (String, String) {
    let certified = rcgen::generate_simple_self_signed(vec![common_name.to_string()]).unwrap();
    (certified.cert.pem(), certified.key_pair.serialize_pem())
}

pub async fn mount_pki_success(
    server: &MockServer,
    backend_path: &str,
    certificate: &str,
    private_key: &str,
) {
    Mock::given(method("POST"))
        .and(path(format!("/v1/{}", backend_path)))
        .and(body_partial_json(serde_json::json!({
            "common_name": "test.url.de",
            "ttl": "10m"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "request_id": "6cc090a8-3821-8244-73e4-5ab62b605587",
            "lease_id": "",
            "renewable": false,
            "lease_duration": 2764800,
            "data": {
                "certificate": certificate,
                "private_key": private_key
            },
            "wrap_info": null,
            "warnings": null,
            "auth": null
        })))
        .mount(server)
        .await;
}

pub async fn mount_pki_failure(server: &MockServer, backend_path: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path(format!("/v1/{}", backend_path)))
        .respond_with(ResponseTemplate::new(status).set_body_string("permission denied"))
        .mount(server)
        .await;
}

pub async fn mount_key_value(server: &MockServer, backend_path: &str, data: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/{}", backend_path)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "request_id": "kv-request",
            "lease_id": "",
            "renewable": false,
            "lease_duration": 2764800,
            "data": data,
            "wrap_info": null,
            "warnings": null,
            "auth": null
        })))
        .mount(server)
        .await;
}
