use serde::{Deserialize, Serialize};

/// Operator configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// port: 8080
/// data-dir: /var/lib/vault-crd/data
/// token: my-api-token
/// vault-url: http://vault:8200/v1/
/// vault-token: s.xxxxx
/// interval: 60
/// initial-delay: 30
/// request-timeout: 10
/// refresh-margin: 0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorConfigFile {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, alias = "data-dir")]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, alias = "vault-url")]
    pub vault_url: Option<String>,
    #[serde(default, alias = "vault-token")]
    pub vault_token: Option<String>,
    /// Seconds between reconciliation passes.
    #[serde(default)]
    pub interval: Option<u64>,
    /// Seconds before the first reconciliation pass.
    #[serde(default, alias = "initial-delay")]
    pub initial_delay: Option<u64>,
    /// Seconds a single backend request may take.
    #[serde(default, alias = "request-timeout")]
    pub request_timeout: Option<u64>,
    /// Seconds a PKI secret is refreshed ahead of `issued_at + ttl`.
    #[serde(default, alias = "refresh-margin")]
    pub refresh_margin: Option<u64>,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}
