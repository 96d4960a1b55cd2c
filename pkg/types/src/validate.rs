use anyhow::{Result, bail};

use crate::ttl::parse_ttl;
use crate::vault::{Vault, VaultType};

/// Validate a Kubernetes-style resource name.
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    if name.len() > 63 {
        bail!("name '{}' exceeds 63 characters (got {})", name, name.len());
    }
    if name.starts_with('-') || name.ends_with('-') {
        bail!("name '{}' must not start or end with a hyphen", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!(
            "name '{}' must contain only lowercase letters, digits, and hyphens [a-z0-9-]",
            name
        );
    }
    Ok(())
}

/// Validate a binding before it is accepted.
/// A PKI binding must carry a common name and a parseable TTL.
pub fn validate_vault(vault: &Vault) -> Result<()> {
    validate_name(&vault.name)?;
    validate_name(&vault.namespace)?;
    if vault.spec.path.trim_matches('/').is_empty() {
        bail!("vault '{}' must declare a backend path", vault.name);
    }
    if vault.spec.vault_type == VaultType::Pki {
        let Some(pki) = &vault.spec.pki_configuration else {
            bail!("PKI vault '{}' requires a pkiConfiguration", vault.name);
        };
        if pki.common_name.trim().is_empty() {
            bail!("PKI vault '{}' requires a commonName", vault.name);
        }
        parse_ttl(&pki.ttl)?;
    }
    Ok(())
}
