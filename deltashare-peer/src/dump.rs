//! Diagnostic dumps of what a peer shared each round.
//!
//! One JSON file per round, `<round + 1>_shared_params.json`, under the
//! peer's dump folder. The protocol never reads these back.

use deltashare_core::{ShapeRegistry, SharingError, SparseUpdate};
use serde_json::{json, Map, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Writes per-round shared-parameter dumps into one folder.
#[derive(Debug, Clone)]
pub struct SharedParamsDump {
    folder: PathBuf,
}

impl SharedParamsDump {
    /// Use `folder`, creating it if needed.
    pub fn create(folder: impl Into<PathBuf>) -> Result<Self, SharingError> {
        let folder = folder.into();
        fs::create_dir_all(&folder)?;
        Ok(Self { folder })
    }

    pub fn path_for(&self, round: u64) -> PathBuf {
        self.folder.join(format!("{}_shared_params.json", round + 1))
    }

    /// Record the layout and the round's shared positions and values.
    ///
    /// ```text
    /// {
    ///   "order": ["fc.weight", "fc.bias"],
    ///   "shapes": {"fc.bias": [2], "fc.weight": [2, 3]},
    ///   "fingerprint": "9f2c…",
    ///   "<round>": {"indices": [...], "params": [...]}
    /// }
    /// ```
    pub fn write(
        &self,
        round: u64,
        registry: &ShapeRegistry,
        update: &SparseUpdate,
    ) -> Result<PathBuf, SharingError> {
        let shapes: Map<String, Value> = registry
            .iter()
            .map(|(name, shape)| (name.to_string(), json!(shape)))
            .collect();

        let mut doc = Map::new();
        doc.insert("order".into(), json!(registry.order().collect::<Vec<_>>()));
        doc.insert("shapes".into(), Value::Object(shapes));
        doc.insert("fingerprint".into(), json!(registry.fingerprint()));
        doc.insert(
            round.to_string(),
            json!({ "indices": update.indices(), "params": update.values() }),
        );

        let path = self.path_for(round);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, &Value::Object(doc))?;
        writer.flush()?;
        Ok(path)
    }
}
