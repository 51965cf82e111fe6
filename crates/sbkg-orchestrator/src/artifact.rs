//! Stable on-disk artifact layout (§6.5): every stage reads its
//! predecessor's file and writes its own as `{meta, records}`, so a reader
//! can validate the producer and schema version without decoding every
//! record first.

use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub schema_version: u32,
    pub producer_stage: String,
    pub count: usize,
    pub run_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactFile<T> {
    pub meta: ArtifactMeta,
    pub records: Vec<T>,
}

impl<T: Serialize + DeserializeOwned> ArtifactFile<T> {
    pub fn new(producer_stage: &str, run_id: &str, records: Vec<T>) -> Self {
        let count = records.len();
        Self {
            meta: ArtifactMeta { schema_version: CURRENT_SCHEMA_VERSION, producer_stage: producer_stage.to_string(), count, run_id: run_id.to_string() },
            records,
        }
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(self)?;
        fs::write(path, body)?;
        Ok(())
    }

    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let body = fs::read(path)?;
        let file: Self = serde_json::from_slice(&body)?;
        if file.meta.schema_version > CURRENT_SCHEMA_VERSION {
            anyhow::bail!(
                "artifact {} has schema_version {} newer than supported {}",
                path.display(),
                file.meta.schema_version,
                CURRENT_SCHEMA_VERSION
            );
        }
        Ok(file)
    }
}

/// A lightweight schema probe used by `resume`: checks the artifact exists
/// and its `meta.schema_version` is one this binary understands, without
/// deserializing every record.
pub fn probe_valid(path: &Path) -> bool {
    let Ok(body) = fs::read(path) else { return false };
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(&body) else { return false };
    value
        .get("meta")
        .and_then(|m| m.get("schema_version"))
        .and_then(|v| v.as_u64())
        .map(|v| v as u32 <= CURRENT_SCHEMA_VERSION)
        .unwrap_or(false)
}
