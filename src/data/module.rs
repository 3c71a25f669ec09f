// ============================================================
// Layer 4: Forecast Data Module
// ============================================================
// Owns the whole data lifecycle for one source file:
//
//   prepare()      → read the CSV once, cache the RawTable
//   setup(stage)   → clean → split → fit scaler on train →
//                    transform the splits the stage needs
//   *_dataloader() → WindowedDataset + SequenceLoader per split
//
// Setup state is an explicit enum instead of a handful of
// optional fields:
//
//   Uninitialized ──setup(Fit)──▶ FitReady ──setup(Test)──▶ AllReady
//        │                                                   ▲
//        └──setup(Test)──▶ TestReady ──setup(Fit)────────────┘
//
//   setup(None) goes straight to AllReady.
//   Asking for a stage that is already built is a no-op.
//
// Built splits are immutable and shared behind Arc, so any
// number of loaders can read them concurrently.
//
// Reference: Rust Book §6 (Enums), §16 (Shared-State: Arc)
//            Burn Book §4 (Datasets and Dataloaders)

use std::sync::Arc;

use burn::{data::dataset::Dataset, prelude::*};
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::SequenceBatcher,
    dataloader::SequenceLoader,
    dataset::WindowedDataset,
    loader::CsvTableLoader,
    preprocessor::Preprocessor,
    scaler::{ScalerParams, StandardScaler},
    splitter::SplitRanges,
};
use crate::domain::error::{DataError, DataResult};
use crate::domain::split::{Split, SplitData, Stage};
use crate::domain::table::RawTable;
use crate::domain::traits::{ForecastDataSource, TableSource};

// ─── Configuration ────────────────────────────────────────────────────────────
/// Every knob of the data pipeline. Serialisable so a run's
/// exact settings can be saved beside its artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataModuleConfig {
    pub source_path:       String,
    pub seq_len:           usize,
    pub batch_size:        usize,
    pub num_workers:       usize,
    pub test_fraction:     f64,
    pub val_fraction:      f64,
    pub date_column:       String,
    pub region_column:     String,
    pub target_column:     String,
    pub drop_columns:      Vec<String>,
    pub missing_markers:   Vec<String>,
    pub segment_by_region: bool,
}

impl Default for DataModuleConfig {
    fn default() -> Self {
        Self {
            source_path:       "data/train_trendency.csv".to_string(),
            seq_len:           1,
            batch_size:        128,
            num_workers:       0,
            test_fraction:     0.10,
            val_fraction:      0.05,
            date_column:       "Date".to_string(),
            region_column:     "Province_State".to_string(),
            target_column:     "Deaths".to_string(),
            drop_columns:      default_drop_columns(),
            missing_markers:   default_missing_markers(),
            segment_by_region: true,
        }
    }
}

/// Cumulative, rate and ratio columns that leak the target or
/// restate it.
pub fn default_drop_columns() -> Vec<String> {
    [
        "Recovered",
        "Active",
        "Incident_Rate",
        "Total_Test_Results",
        "Case_Fatality_Ratio",
        "Testing_Rate",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// "?" plus every string a dataframe reader treats as NA by default.
pub fn default_missing_markers() -> Vec<String> {
    [
        "", "?", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan",
        "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a",
        "nan", "null",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl DataModuleConfig {
    pub fn validate(&self) -> DataResult<()> {
        if self.seq_len == 0 {
            return Err(DataError::InvalidConfiguration("seq_len must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(DataError::InvalidConfiguration("batch_size must be at least 1".into()));
        }
        for (name, f) in [("test_fraction", self.test_fraction), ("val_fraction", self.val_fraction)] {
            if !(0.0..1.0).contains(&f) {
                return Err(DataError::InvalidConfiguration(format!(
                    "{name} must be in [0, 1), got {f}"
                )));
            }
        }
        Ok(())
    }
}

// ─── Setup State ──────────────────────────────────────────────────────────────
/// Scaled train and validation splits.
#[derive(Debug, Clone)]
pub struct FitData {
    pub train:      Arc<SplitData>,
    pub validation: Arc<SplitData>,
}

#[derive(Debug, Clone, Default)]
pub enum SetupState {
    #[default]
    Uninitialized,
    FitReady(FitData),
    TestReady(Arc<SplitData>),
    AllReady(FitData, Arc<SplitData>),
}

impl SetupState {
    /// Whether `setup(stage)` has nothing left to do.
    pub fn covers(&self, stage: Option<Stage>) -> bool {
        match stage {
            Some(Stage::Fit)  => self.fit().is_some(),
            Some(Stage::Test) => self.test().is_some(),
            None              => matches!(self, SetupState::AllReady(..)),
        }
    }

    pub fn fit(&self) -> Option<&FitData> {
        match self {
            SetupState::FitReady(fit) | SetupState::AllReady(fit, _) => Some(fit),
            _ => None,
        }
    }

    pub fn test(&self) -> Option<&Arc<SplitData>> {
        match self {
            SetupState::TestReady(test) | SetupState::AllReady(_, test) => Some(test),
            _ => None,
        }
    }

    fn with_fit(self, fit: FitData) -> Self {
        match self {
            SetupState::TestReady(test) | SetupState::AllReady(_, test) => SetupState::AllReady(fit, test),
            _ => SetupState::FitReady(fit),
        }
    }

    fn with_test(self, test: Arc<SplitData>) -> Self {
        match self {
            SetupState::FitReady(fit) | SetupState::AllReady(fit, _) => SetupState::AllReady(fit, test),
            _ => SetupState::TestReady(test),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SetupState::Uninitialized => "uninitialized",
            SetupState::FitReady(_)   => "fit-ready",
            SetupState::TestReady(_)  => "test-ready",
            SetupState::AllReady(..)  => "all-ready",
        }
    }
}

// ─── ForecastDataModule ───────────────────────────────────────────────────────
pub struct ForecastDataModule<B: Backend> {
    config:  DataModuleConfig,
    source:  Box<dyn TableSource + Send + Sync>,
    device:  B::Device,
    raw:     Option<RawTable>,
    columns: Vec<String>,
    scaler:  Option<ScalerParams>,
    state:   SetupState,
}

impl<B: Backend> ForecastDataModule<B> {
    /// Module reading the CSV named by `config.source_path`.
    pub fn new(config: DataModuleConfig, device: B::Device) -> DataResult<Self> {
        let source = CsvTableLoader::new(
            &config.source_path,
            &config.date_column,
            config.missing_markers.clone(),
        );
        Self::with_source(config, Box::new(source), device)
    }

    /// Module reading from any TableSource.
    pub fn with_source(
        config: DataModuleConfig,
        source: Box<dyn TableSource + Send + Sync>,
        device: B::Device,
    ) -> DataResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            device,
            raw:     None,
            columns: Vec::new(),
            scaler:  None,
            state:   SetupState::Uninitialized,
        })
    }

    pub fn state(&self) -> &SetupState {
        &self.state
    }

    /// Feature column names after cleaning. Empty before setup.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// Parameters of the scaler fitted by the latest setup.
    pub fn scaler_params(&self) -> Option<&ScalerParams> {
        self.scaler.as_ref()
    }

    /// Read the raw table unless it is already cached.
    pub fn prepare(&mut self) -> DataResult<()> {
        if self.raw.is_none() {
            self.raw = Some(self.source.load()?);
        }
        Ok(())
    }

    /// Build the splits for `stage`; `None` builds all of them.
    pub fn setup(&mut self, stage: Option<Stage>) -> DataResult<()> {
        if self.state.covers(stage) {
            tracing::debug!("Setup for {:?} skipped: state is {}", stage, self.state.name());
            return Ok(());
        }

        self.prepare()?;
        let raw = self.raw.as_ref().ok_or(DataError::EmptyDataset)?;

        // ── Clean ─────────────────────────────────────────────────────────────
        let preprocessor = Preprocessor::new(
            &self.config.region_column,
            &self.config.target_column,
            self.config.drop_columns.clone(),
            self.config.segment_by_region,
        );
        let table = preprocessor.clean(raw)?;
        tracing::info!("Cleaned feature table:\n{}", table);

        // ── Split ─────────────────────────────────────────────────────────────
        let ranges = SplitRanges::new(
            table.len(),
            self.config.test_fraction,
            self.config.val_fraction,
        )?;
        tracing::info!(
            "Split {} rows: {} train, {} validation, {} test",
            table.len(),
            ranges.train.len(),
            ranges.validation.len(),
            ranges.test.len()
        );

        // ── Fit on train only, transform what the stage needs ─────────────────
        let mut scaler = StandardScaler::new();
        let train_raw  = table.split_data(ranges.train.clone());
        scaler.fit(&train_raw.features)?;

        let scale = |data: SplitData| -> DataResult<Arc<SplitData>> {
            Ok(Arc::new(SplitData {
                features: scaler.transform(&data.features)?,
                ..data
            }))
        };

        let fit = match stage {
            Some(Stage::Fit) | None => Some(FitData {
                train:      scale(train_raw)?,
                validation: scale(table.split_data(ranges.validation.clone()))?,
            }),
            Some(Stage::Test) => None,
        };
        let test = match stage {
            Some(Stage::Test) | None => Some(scale(table.split_data(ranges.test.clone()))?),
            Some(Stage::Fit) => None,
        };

        // Only touch the state once every transform has succeeded
        let mut state = std::mem::take(&mut self.state);
        if let Some(fit) = fit {
            state = state.with_fit(fit);
        }
        if let Some(test) = test {
            state = state.with_test(test);
        }

        self.state   = state;
        self.columns = table.columns;
        self.scaler  = scaler.params().cloned();

        tracing::info!("Setup complete: state is {}", self.state.name());
        Ok(())
    }

    /// Scaled rows of `split`, or `NotInitialized` if its stage has not run.
    pub fn split_data(&self, split: Split) -> DataResult<Arc<SplitData>> {
        let data = match split {
            Split::Train      => self.state.fit().map(|f| f.train.clone()),
            Split::Validation => self.state.fit().map(|f| f.validation.clone()),
            Split::Test       => self.state.test().cloned(),
        };
        data.ok_or(DataError::NotInitialized { split, stage: split.stage() })
    }

    /// Sliding-window view over `split` with the configured `seq_len`.
    pub fn dataset(&self, split: Split) -> DataResult<WindowedDataset> {
        WindowedDataset::from_split(
            self.split_data(split)?,
            self.config.seq_len,
            self.config.segment_by_region,
        )
    }

    pub fn dataloader(&self, split: Split) -> DataResult<SequenceLoader<B>> {
        let dataset = self.dataset(split)?;
        tracing::debug!("Building {} loader over {} windows", split, dataset.len());
        SequenceLoader::new(
            dataset,
            SequenceBatcher::new(self.device.clone()),
            self.config.batch_size,
            self.config.num_workers,
        )
    }

    pub fn train_dataloader(&self) -> DataResult<SequenceLoader<B>> {
        self.dataloader(Split::Train)
    }

    pub fn val_dataloader(&self) -> DataResult<SequenceLoader<B>> {
        self.dataloader(Split::Validation)
    }

    pub fn test_dataloader(&self) -> DataResult<SequenceLoader<B>> {
        self.dataloader(Split::Test)
    }
}

impl<B: Backend> ForecastDataSource for ForecastDataModule<B> {
    type Loader = SequenceLoader<B>;

    fn prepare(&mut self) -> DataResult<()> {
        ForecastDataModule::prepare(self)
    }

    fn setup(&mut self, stage: Option<Stage>) -> DataResult<()> {
        ForecastDataModule::setup(self, stage)
    }

    fn train_source(&self) -> DataResult<Self::Loader> {
        self.train_dataloader()
    }

    fn val_source(&self) -> DataResult<Self::Loader> {
        self.val_dataloader()
    }

    fn test_source(&self) -> DataResult<Self::Loader> {
        self.test_dataloader()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use chrono::NaiveDate;
    use ndarray::Axis;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// `days` rows per region, Deaths = day index, Confirmed = 10 x day.
    fn write_source(regions: &[&str], days: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            ",Province_State,Date,Confirmed,Deaths,Recovered,Active,Incident_Rate,\
             Total_Test_Results,Case_Fatality_Ratio,Testing_Rate"
        )
        .unwrap();
        let start = NaiveDate::from_ymd_opt(2020, 4, 12).unwrap();
        let mut idx = 0;
        // Written newest-first so sorting has work to do
        for region in regions {
            for d in (0..days).rev() {
                let date = start + chrono::Days::new(d as u64);
                writeln!(
                    file,
                    "{idx},{region},{},{},{},?,,1.5,100,0.1,2.0",
                    date.format("%m-%d-%Y"),
                    d * 10,
                    d
                )
                .unwrap();
                idx += 1;
            }
        }
        file
    }

    fn config(path: &std::path::Path, seq_len: usize) -> DataModuleConfig {
        DataModuleConfig {
            source_path: path.display().to_string(),
            seq_len,
            batch_size: 16,
            ..DataModuleConfig::default()
        }
    }

    fn module(cfg: DataModuleConfig) -> ForecastDataModule<NdArray> {
        ForecastDataModule::new(cfg, Default::default()).unwrap()
    }

    #[test]
    fn test_end_to_end_split_sizes_and_windows() {
        let file = write_source(&["Texas"], 100);
        let mut dm = module(config(file.path(), 3));
        dm.setup(None).unwrap();

        assert_eq!(dm.split_data(Split::Train).unwrap().len(), 85);
        assert_eq!(dm.split_data(Split::Validation).unwrap().len(), 5);
        assert_eq!(dm.split_data(Split::Test).unwrap().len(), 10);
        assert_eq!(dm.columns(), &["Confirmed".to_string(), "Deaths".to_string()]);

        let loader = dm.train_dataloader().unwrap();
        assert_eq!(loader.num_items(), 83);

        let first = loader.iter().next().unwrap().unwrap();
        assert_eq!(first.inputs.dims(), [16, 3, 2]);
        assert_eq!(first.targets.dims(), [16, 1]);

        // Targets are the unscaled next-day deaths of each window's last row
        let targets = first.targets.into_data().to_vec::<f32>().unwrap();
        assert_eq!(targets[0], 3.0);
        assert_eq!(targets[1], 4.0);
    }

    #[test]
    fn test_train_features_are_standardised() {
        let file = write_source(&["Texas"], 100);
        let mut dm = module(config(file.path(), 1));
        dm.setup(Some(Stage::Fit)).unwrap();

        let train = dm.split_data(Split::Train).unwrap();
        let mean = train.features.view().mean_axis(Axis(0)).unwrap();
        let var  = train.features.view().var_axis(Axis(0), 0.0);
        assert!(mean.iter().all(|m| m.abs() < 1e-9), "{mean}");
        assert!(var.iter().all(|v| (v - 1.0).abs() < 1e-9), "{var}");

        // Validation rows lie after train in time, so they sit above the train mean
        let val = dm.split_data(Split::Validation).unwrap();
        assert!(val.features.column(0).iter().all(|&z| z > 1.0));
    }

    #[test]
    fn test_dataloader_before_setup_is_not_initialized() {
        let file = write_source(&["Texas"], 50);
        let dm   = module(config(file.path(), 2));
        assert!(matches!(
            dm.train_dataloader(),
            Err(DataError::NotInitialized { split: Split::Train, stage: Stage::Fit })
        ));
    }

    #[test]
    fn test_fit_stage_does_not_build_test() {
        let file = write_source(&["Texas"], 50);
        let mut dm = module(config(file.path(), 2));
        dm.setup(Some(Stage::Fit)).unwrap();

        assert!(matches!(dm.state(), SetupState::FitReady(_)));
        assert!(dm.val_dataloader().is_ok());
        assert!(matches!(
            dm.test_dataloader(),
            Err(DataError::NotInitialized { split: Split::Test, stage: Stage::Test })
        ));

        dm.setup(Some(Stage::Test)).unwrap();
        assert!(matches!(dm.state(), SetupState::AllReady(..)));
        assert!(dm.test_dataloader().is_ok());
    }

    #[test]
    fn test_test_stage_alone() {
        let file = write_source(&["Texas"], 50);
        let mut dm = module(config(file.path(), 1));
        dm.setup(Some(Stage::Test)).unwrap();
        assert!(matches!(dm.state(), SetupState::TestReady(_)));
        assert!(dm.train_dataloader().is_err());
    }

    #[test]
    fn test_setup_is_idempotent() {
        let file = write_source(&["Alaska", "Texas"], 60);
        let mut dm = module(config(file.path(), 4));

        dm.setup(None).unwrap();
        let first: Vec<_> = Split::ALL.iter().map(|&s| dm.split_data(s).unwrap()).collect();

        dm.setup(None).unwrap();
        let second: Vec<_> = Split::ALL.iter().map(|&s| dm.split_data(s).unwrap()).collect();

        // Skipped entirely: the very same allocations are still in place
        for (a, b) in first.iter().zip(&second) {
            assert!(Arc::ptr_eq(a, b));
        }

        // A fresh module over the same file rebuilds identical arrays
        let mut again = module(config(file.path(), 4));
        again.setup(None).unwrap();
        for (s, a) in Split::ALL.iter().zip(&first) {
            assert_eq!(**a, *again.split_data(*s).unwrap());
        }
    }

    #[test]
    fn test_raw_table_is_read_once() {
        let file = write_source(&["Texas"], 40);
        let mut dm = module(config(file.path(), 1));
        dm.prepare().unwrap();

        // Deleting the file after prepare must not break setup
        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());

        dm.setup(None).unwrap();
        assert_eq!(dm.split_data(Split::Test).unwrap().len(), 4);
    }

    #[test]
    fn test_segmented_windows_respect_regions() {
        // Alaska rows sort first; its train rows are all 40 days,
        // Texas contributes the rest
        let file = write_source(&["Alaska", "Texas"], 40);
        let mut dm = module(config(file.path(), 5));
        dm.setup(Some(Stage::Fit)).unwrap();

        let train = dm.split_data(Split::Train).unwrap();
        let ds    = dm.dataset(Split::Train).unwrap();
        let segments = train.region_segments();
        assert_eq!(segments.len(), 2);
        let expected: usize = segments.iter().map(|s| s.len() - 5 + 1).sum();
        assert_eq!(ds.len(), expected);

        for i in 0..ds.len() {
            let w = ds.item(i).unwrap();
            assert_eq!(train.regions[w.start], train.regions[w.start + 4]);
        }
    }

    #[test]
    fn test_global_windows_may_straddle_regions() {
        let file = write_source(&["Alaska", "Texas"], 40);
        let mut cfg = config(file.path(), 5);
        cfg.segment_by_region = false;
        let mut dm = module(cfg);
        dm.setup(Some(Stage::Fit)).unwrap();

        let train = dm.split_data(Split::Train).unwrap();
        assert_eq!(dm.dataset(Split::Train).unwrap().len(), train.len() - 5 + 1);
    }

    #[test]
    fn test_default_na_strings_drop_their_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Province_State,Date,Confirmed,Deaths").unwrap();
        let start = NaiveDate::from_ymd_opt(2020, 4, 12).unwrap();
        for d in 0..40u64 {
            let confirmed = match d {
                7  => "NA".to_string(),
                20 => "null".to_string(),
                30 => "N/A".to_string(),
                _  => (d * 10).to_string(),
            };
            let date = start + chrono::Days::new(d);
            writeln!(file, "Texas,{},{},{}", date.format("%Y-%m-%d"), confirmed, d).unwrap();
        }

        let mut dm = module(config(file.path(), 1));
        dm.setup(None).unwrap();

        let rows: usize = Split::ALL
            .iter()
            .map(|&s| dm.split_data(s).unwrap().len())
            .sum();
        assert_eq!(rows, 37);
    }

    #[test]
    fn test_missing_source_file() {
        let mut dm = module(config(std::path::Path::new("/no/such/file.csv"), 1));
        assert!(matches!(dm.setup(None), Err(DataError::DataSourceUnavailable { .. })));
    }

    #[test]
    fn test_seq_len_longer_than_split() {
        let file = write_source(&["Texas"], 100);
        let mut dm = module(config(file.path(), 20));
        dm.setup(None).unwrap();
        assert!(dm.train_dataloader().is_ok());
        // validation has 5 rows
        assert!(matches!(dm.val_dataloader(), Err(DataError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = DataModuleConfig { seq_len: 0, ..DataModuleConfig::default() };
        assert!(ForecastDataModule::<NdArray>::new(cfg, Default::default()).is_err());

        let cfg = DataModuleConfig { test_fraction: 1.0, ..DataModuleConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_lifecycle_trait_drives_module() {
        fn drive<S: ForecastDataSource>(source: &mut S) -> DataResult<S::Loader> {
            source.prepare()?;
            source.setup(None)?;
            source.val_source()?;
            source.test_source()?;
            source.train_source()
        }

        let file = write_source(&["Texas"], 100);
        let mut dm = module(config(file.path(), 2));
        let loader = drive(&mut dm).unwrap();
        assert_eq!(loader.num_items(), 84);
    }
}
