// ============================================================
// Layer 3: Splits and Lifecycle Stages
// ============================================================
// The cleaned table is cut into three contiguous, disjoint
// partitions in time order:
//
//   [ train ............................ | val | test ]
//     earliest                                  latest
//
// Train and validation belong to the "fit" stage, test to
// the "test" stage. Setup can materialise either stage on
// its own, or both at once.
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use std::fmt;

use crate::domain::table::FeatureMatrix;

/// One of the three chronological partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Validation, Split::Test];

    /// The setup stage that materialises this split.
    pub fn stage(self) -> Stage {
        match self {
            Split::Train | Split::Validation => Stage::Fit,
            Split::Test                      => Stage::Test,
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train      => write!(f, "train"),
            Split::Validation => write!(f, "validation"),
            Split::Test       => write!(f, "test"),
        }
    }
}

/// A lifecycle stage passed to `setup`. `None` at the call
/// site means "every stage".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fit,
    Test,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fit  => write!(f, "fit"),
            Stage::Test => write!(f, "test"),
        }
    }
}

/// The rows of one split: features, one-step-ahead targets,
/// and the region each row came from.
///
/// Immutable once built; shared behind an `Arc` by the data
/// module and every dataset created over it.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitData {
    pub features: FeatureMatrix,

    /// Column vector of targets, one per feature row
    pub targets: Vec<f64>,

    /// Region label per row, used to keep windows inside a region
    pub regions: Vec<String>,
}

impl SplitData {
    pub fn len(&self) -> usize {
        self.features.n_rows()
    }

    /// Contiguous runs of rows that share a region label.
    pub fn region_segments(&self) -> Vec<std::ops::Range<usize>> {
        let mut segments = Vec::new();
        let mut start    = 0usize;

        for i in 1..=self.regions.len() {
            if i == self.regions.len() || self.regions[i] != self.regions[start] {
                segments.push(start..i);
                start = i;
            }
        }

        segments
    }
}
