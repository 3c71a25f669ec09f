// ============================================================
// Layer 6: Artifact Store
// ============================================================
// Persists what a `prepare` run decided, so a later `inspect`
// run can rebuild the exact same pipeline.
//
// File layout:
//   artifacts/
//     data_config.json    ← DataModuleConfig used for the run
//     scaler.json         ← per-column mean / scale fitted on train
//     split_summary.json  ← rows, windows and batches per split
//
// Reference: serde_json crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::application::prepare_use_case::SplitSummary;
use crate::data::module::DataModuleConfig;
use crate::data::scaler::ScalerParams;

const CONFIG_FILE:  &str = "data_config.json";
const SCALER_FILE:  &str = "scaler.json";
const SUMMARY_FILE: &str = "split_summary.json";

/// Scaler parameters tagged with the columns they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerRecord {
    pub columns: Vec<String>,
    pub params:  ScalerParams,
}

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    pub fn save_config(&self, cfg: &DataModuleConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<DataModuleConfig> {
        self.read_json(CONFIG_FILE)
    }

    pub fn save_scaler(&self, record: &ScalerRecord) -> Result<()> {
        self.write_json(SCALER_FILE, record)
    }

    pub fn load_scaler(&self) -> Result<ScalerRecord> {
        self.read_json(SCALER_FILE)
    }

    pub fn save_summary(&self, summary: &[SplitSummary]) -> Result<()> {
        self.write_json(SUMMARY_FILE, summary)
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read '{}'. Have you run 'prepare' first?",
                path.display()
            )
        })?;

        serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not valid", path.display()))
    }
}
