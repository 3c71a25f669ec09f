// ============================================================
// Layer 4: Windowed Sequence Dataset
// ============================================================
// A read-only view over one split that turns rows into
// overlapping fixed-length windows:
//
//   rows:     r0 r1 r2 r3 r4 r5        (L = 6, seq_len = 3)
//   window 0: r0 r1 r2   → target[2]
//   window 1:    r1 r2 r3   → target[3]
//   window 2:       r2 r3 r4   → target[4]
//   window 3:          r3 r4 r5   → target[5]
//
//   length = L - seq_len + 1 = 4
//
// The target of a window is the target of its LAST row, which
// the preprocessor already set to the next day's value.
//
// With region segmentation the rows are grouped into runs that
// share a region, and only windows lying fully inside one run
// are enumerated. Window indices stay dense: index i is the
// i-th valid window in row order.
//
// Reference: Burn Book §4 (Datasets)
//            Rust Book §8 (Slices)

use std::ops::Range;
use std::sync::Arc;

use burn::data::dataset::Dataset;

use crate::domain::error::{DataError, DataResult};
use crate::domain::split::SplitData;
use crate::domain::table::FeatureMatrix;

/// One model input: `seq_len` consecutive rows and a scalar target.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSample {
    /// Row index (within the split) of the window's first row
    pub start:      usize,
    pub seq_len:    usize,
    pub n_features: usize,

    /// Row-major `[seq_len, n_features]` values
    pub inputs: Vec<f32>,

    pub target: f32,
}

impl WindowSample {
    /// Features of time step `t` inside the window.
    pub fn step(&self, t: usize) -> &[f32] {
        &self.inputs[t * self.n_features..(t + 1) * self.n_features]
    }
}

/// Sliding-window adapter over one split.
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    data:     Arc<SplitData>,
    seq_len:  usize,
    segments: Vec<Range<usize>>,

    /// `offsets[k]` = number of windows in segments before `k`
    offsets: Vec<usize>,
    len:     usize,
}

impl WindowedDataset {
    /// Window a bare feature matrix and target vector.
    pub fn new(features: FeatureMatrix, targets: Vec<f64>, seq_len: usize) -> DataResult<Self> {
        let regions = vec![String::new(); targets.len()];
        let data    = SplitData { features, targets, regions };
        Self::from_split(Arc::new(data), seq_len, false)
    }

    /// Window an existing split, optionally keeping windows inside
    /// each region.
    pub fn from_split(
        data:              Arc<SplitData>,
        seq_len:           usize,
        segment_by_region: bool,
    ) -> DataResult<Self> {
        if seq_len == 0 {
            return Err(DataError::InvalidConfiguration("seq_len must be at least 1".into()));
        }
        if data.targets.len() != data.len() {
            return Err(DataError::InvalidConfiguration(format!(
                "{} feature rows but {} targets",
                data.len(),
                data.targets.len()
            )));
        }

        let segments = if segment_by_region {
            data.region_segments()
        } else {
            vec![0..data.len()]
        };

        let mut offsets = Vec::with_capacity(segments.len());
        let mut len     = 0usize;
        for seg in &segments {
            offsets.push(len);
            len += (seg.len() + 1).saturating_sub(seq_len);
        }

        if len == 0 {
            return Err(DataError::InvalidConfiguration(format!(
                "seq_len {} leaves no window over {} rows",
                seq_len,
                data.len()
            )));
        }

        Ok(Self { data, seq_len, segments, offsets, len })
    }

    pub fn n_features(&self) -> usize {
        self.data.features.n_cols()
    }

    /// First row of window `index`.
    fn window_start(&self, index: usize) -> usize {
        // Last segment whose first window index is <= index.
        // Empty segments share an offset with their successor,
        // so partition_point lands on the non-empty one.
        let k = self.offsets.partition_point(|&o| o <= index) - 1;
        self.segments[k].start + (index - self.offsets[k])
    }

    /// Window `index`, or `IndexOutOfRange` outside `[0, len)`.
    pub fn item(&self, index: usize) -> DataResult<WindowSample> {
        if index >= self.len {
            return Err(DataError::IndexOutOfRange { index, len: self.len });
        }

        let start = self.window_start(index);
        let end   = start + self.seq_len;

        Ok(WindowSample {
            start,
            seq_len:    self.seq_len,
            n_features: self.n_features(),
            inputs:     self.data.features.rows(start..end).iter().map(|&v| v as f32).collect(),
            target:     self.data.targets[end - 1] as f32,
        })
    }
}

// Makes WindowedDataset usable with Burn's DataLoader
impl Dataset<WindowSample> for WindowedDataset {
    fn get(&self, index: usize) -> Option<WindowSample> {
        self.item(index).ok()
    }

    fn len(&self) -> usize {
        self.len
    }
}
