use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A delivered secret. Written as one record, so data and annotations are
/// always replaced together.
/// Stored at `/registry/secrets/<namespace>/<name>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub secret_type: String,
    /// Secret data stored as base64-encoded values.
    pub data: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    /// Id of the binding this secret was produced for.
    #[serde(default)]
    pub owner_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
