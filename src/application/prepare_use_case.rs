// ============================================================
// Layer 2: PrepareUseCase
// ============================================================
// Runs the data pipeline end to end:
//
//   Step 1: Validate config and build the data module  (Layer 4)
//   Step 2: Load the CSV once                          (Layer 4)
//   Step 3: Setup every stage (clean, split, scale)    (Layer 4)
//   Step 4: Walk each split's loader, count batches    (Layer 4)
//   Step 5: Save config, scaler and summary            (Layer 6)
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::PipelineBackend;
use crate::data::module::{DataModuleConfig, ForecastDataModule};
use crate::domain::error::DataError;
use crate::domain::split::Split;
use crate::infra::artifacts::{ArtifactStore, ScalerRecord};

// ─── Configuration ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareConfig {
    pub data:          DataModuleConfig,
    pub artifacts_dir: String,
}

/// What one split looks like once windowed and batched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSummary {
    pub split:   String,
    pub rows:    usize,
    pub windows: usize,
    pub batches: usize,

    /// `[batch, seq_len, n_features]` of the first batch
    pub first_batch_shape: [usize; 3],
}

pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<SplitSummary>> {
        let cfg = &self.config;

        // ── Steps 1-3: build and set up the data module ───────────────────────
        let mut module = ForecastDataModule::<PipelineBackend>::new(cfg.data.clone(), Default::default())
            .context("Invalid data configuration")?;

        module
            .prepare()
            .with_context(|| format!("Cannot load '{}'", cfg.data.source_path))?;
        module.setup(None).context("Data setup failed")?;

        tracing::info!(
            "{} feature columns: {:?}",
            module.n_features(),
            module.columns()
        );

        // ── Step 4: one full pass over every loader ───────────────────────────
        let mut summaries = Vec::with_capacity(Split::ALL.len());

        for split in Split::ALL {
            let rows = module.split_data(split)?.len();

            // A split too short for one window is reported, not fatal
            let loader = match module.dataloader(split) {
                Ok(loader) => loader,
                Err(DataError::InvalidConfiguration(reason)) => {
                    tracing::warn!("{} split has no windows: {}", split, reason);
                    summaries.push(SplitSummary {
                        split:             split.to_string(),
                        rows,
                        windows:           0,
                        batches:           0,
                        first_batch_shape: [0, cfg.data.seq_len, module.n_features()],
                    });
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Cannot window the {split} split"));
                }
            };

            let mut batches           = 0usize;
            let mut first_batch_shape = [0usize; 3];

            for batch in loader.iter() {
                let batch = batch.with_context(|| format!("{split} batch {batches} failed"))?;
                if batches == 0 {
                    first_batch_shape = batch.inputs.dims();
                }
                batches += 1;
            }

            tracing::info!(
                "{}: {} rows → {} windows → {} batches",
                split,
                rows,
                loader.num_items(),
                batches
            );

            summaries.push(SplitSummary {
                split:   split.to_string(),
                rows,
                windows: loader.num_items(),
                batches,
                first_batch_shape,
            });
        }

        // ── Step 5: save artifacts ────────────────────────────────────────────
        let store = ArtifactStore::new(&cfg.artifacts_dir);
        store.save_config(&cfg.data)?;
        if let Some(params) = module.scaler_params() {
            store.save_scaler(&ScalerRecord {
                columns: module.columns().to_vec(),
                params:  params.clone(),
            })?;
        }
        store.save_summary(&summaries)?;
        tracing::info!("Artifacts saved to '{}'", cfg.artifacts_dir);

        Ok(summaries)
    }
}
