use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Envelope every backend read or issue call responds with.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultResponse<T> {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub lease_id: String,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default)]
    pub lease_duration: u64,
    pub data: Option<T>,
    #[serde(default)]
    pub wrap_info: Option<serde_json::Value>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default)]
    pub auth: Option<serde_json::Value>,
}

/// Body of `POST <pki-mount>/issue/<role>`.
#[derive(Debug, Clone, Serialize)]
pub struct PkiRequest {
    pub common_name: String,
    pub ttl: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_names: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_sans: Option<String>,
}

/// `data` of a PKI issue response. Both fields are PEM text.
#[derive(Debug, Clone, Deserialize)]
pub struct PkiResponseData {
    pub certificate: String,
    pub private_key: String,
    #[serde(default)]
    pub issuing_ca: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
}

/// `data` of a key/value read: flat string map.
pub type KeyValueData = BTreeMap<String, String>;
