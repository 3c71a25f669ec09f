// ============================================================
// Layer 2: InspectUseCase
// ============================================================
// Rebuilds the pipeline a previous `prepare` run saved and
// pulls out one window of one split.
//
// Only the stage that owns the requested split is set up, so
// inspecting a test window never transforms train rows it
// does not need (the scaler is still fitted on train).
//
// If the freshly fitted scaler differs from the saved one, the
// source file changed since `prepare`; that is reported as a
// warning and the fresh parameters are used.

use anyhow::{Context, Result};
use burn::data::dataset::Dataset;

use crate::application::PipelineBackend;
use crate::data::dataset::WindowSample;
use crate::data::module::{DataModuleConfig, ForecastDataModule};
use crate::domain::split::Split;
use crate::infra::artifacts::ArtifactStore;

/// One window, with the column names needed to read it.
#[derive(Debug, Clone)]
pub struct WindowReport {
    pub split:   Split,
    pub index:   usize,
    pub windows: usize,
    pub columns: Vec<String>,
    pub sample:  WindowSample,
}

pub struct InspectUseCase {
    store:  ArtifactStore,
    config: DataModuleConfig,
}

impl InspectUseCase {
    pub fn new(artifacts_dir: impl Into<String>) -> Result<Self> {
        let store  = ArtifactStore::new(artifacts_dir.into());
        let config = store.load_config()?;
        Ok(Self { store, config })
    }

    pub fn window(&self, split: Split, index: usize) -> Result<WindowReport> {
        let mut module = ForecastDataModule::<PipelineBackend>::new(self.config.clone(), Default::default())
            .context("Saved data configuration is invalid")?;

        module
            .setup(Some(split.stage()))
            .with_context(|| format!("Cannot set up the '{}' stage", split.stage()))?;

        match (self.store.load_scaler(), module.scaler_params()) {
            (Ok(saved), Some(fresh)) if saved.params != *fresh => {
                tracing::warn!(
                    "Scaler fitted now differs from the one saved in '{}'; the source data changed",
                    self.store.dir().display()
                );
            }
            (Err(e), _) => tracing::warn!("No saved scaler to compare against: {e:#}"),
            _ => {}
        }

        let dataset = module.dataset(split)?;
        let windows = dataset.len();
        let sample  = dataset
            .item(index)
            .with_context(|| format!("Cannot read window {index} of the {split} split"))?;

        Ok(WindowReport {
            split,
            index,
            windows,
            columns: module.columns().to_vec(),
            sample,
        })
    }
}
