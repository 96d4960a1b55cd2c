use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Vault type ---

/// Kind of credential a binding delivers. Each variant has exactly one
/// refresh strategy registered in the controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VaultType {
    #[serde(rename = "PKI")]
    Pki,
    #[serde(rename = "KEYVALUE")]
    KeyValue,
}

impl std::fmt::Display for VaultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultType::Pki => write!(f, "PKI"),
            VaultType::KeyValue => write!(f, "KEYVALUE"),
        }
    }
}

// --- PKI configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultPkiConfiguration {
    #[serde(alias = "commonName")]
    pub common_name: String,
    /// Passed through to the backend untouched, e.g. `"10m"`.
    pub ttl: String,
    #[serde(default, alias = "altNames", skip_serializing_if = "Option::is_none")]
    pub alt_names: Option<String>,
    #[serde(default, alias = "ipSans", skip_serializing_if = "Option::is_none")]
    pub ip_sans: Option<String>,
}

// --- Vault spec ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultSpec {
    #[serde(rename = "type")]
    pub vault_type: VaultType,
    /// Backend-relative path, e.g. `testpki/issue/testrole`.
    pub path: String,
    #[serde(
        default,
        alias = "pkiConfiguration",
        skip_serializing_if = "Option::is_none"
    )]
    pub pki_configuration: Option<VaultPkiConfiguration>,
}

/// A secret binding: links a backend path to the secret delivered under the
/// same namespace and name.
/// Stored at `/registry/vaults/<namespace>/<name>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vault {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    pub spec: VaultSpec,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Vault {
    /// `namespace/name`, used for logging and per-binding locking.
    pub fn identity(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_declaration() {
        let json = r#"{
            "name": "pki",
            "spec": {
                "type": "PKI",
                "path": "testpki/issue/testrole",
                "pkiConfiguration": { "commonName": "test.url.de", "ttl": "10m" }
            }
        }"#;
        let vault: Vault = serde_json::from_str(json).unwrap();
        assert_eq!(vault.spec.vault_type, VaultType::Pki);
        let pki = vault.spec.pki_configuration.unwrap();
        assert_eq!(pki.common_name, "test.url.de");
        assert_eq!(pki.ttl, "10m");
        assert!(pki.alt_names.is_none());
    }

    #[test]
    fn rejects_unknown_type() {
        let json = r#"{"name": "x", "spec": {"type": "DOCKERCFG", "path": "a/b"}}"#;
        assert!(serde_json::from_str::<Vault>(json).is_err());
    }
}
