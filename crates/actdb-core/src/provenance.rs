//! Provenance attached to every persisted result table.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{ActError, ErrorInfo};

/// Serializes `value` to JSON with object keys in sorted order.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, ActError> {
    // Round-tripping through `Value` sorts map keys (serde_json uses a BTreeMap).
    let value = serde_json::to_value(value)
        .map_err(|err| ActError::Config(ErrorInfo::new("json-encode", err.to_string())))?;
    serde_json::to_vec(&value)
        .map_err(|err| ActError::Config(ErrorInfo::new("json-encode", err.to_string())))
}

/// Computes a stable hexadecimal hash for the provided serializable payload.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, ActError> {
    let bytes = canonical_json_bytes(value)?;
    let digest = Sha256::digest(bytes);
    Ok(format!("{:x}", digest))
}

/// Provenance information recorded next to every result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Hash of the input configuration used to produce the data.
    pub input_hash: String,
    /// Name of the energy group structure the flux was binned with.
    pub group_structure: String,
    /// Labels of the runs merged into the result table.
    pub run_labels: Vec<String>,
    /// RFC 3339 timestamp recording when the artifact was generated.
    pub created_at: String,
    /// Version map for all tools involved in the run.
    pub tool_versions: BTreeMap<String, String>,
}

impl RunProvenance {
    /// Builds provenance for `config`, stamped with the current time.
    pub fn for_config<T: Serialize>(
        config: &T,
        group_structure: &str,
        run_labels: Vec<String>,
    ) -> Result<Self, ActError> {
        let mut tool_versions = BTreeMap::new();
        tool_versions.insert(
            "actdb-core".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        Ok(Self {
            input_hash: stable_hash_string(config)?,
            group_structure: group_structure.to_string(),
            run_labels,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            tool_versions,
        })
    }
}
