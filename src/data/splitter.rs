// ============================================================
// Layer 4: Chronological Splitter
// ============================================================
// Cuts the cleaned rows into train / validation / test WITHOUT
// shuffling. Rows are already in time order per region, so
// every cut is a prefix / suffix split:
//
//   1. test       = last ceil(10% of all rows)
//   2. validation = last ceil(5% of the remaining rows)
//   3. train      = everything before that
//
// Example with 100 rows:
//   test = 10, validation = ceil(0.05 * 90) = 5, train = 85
//
// Shuffling here would leak the future into training: a model
// validated on days that precede some of its training days
// looks better than it is.
//
// Reference: Rust Book §8 (Vectors)

use std::ops::Range;

use crate::domain::error::{DataError, DataResult};
use crate::domain::split::Split;

/// Number of trailing rows a `fraction` of `total` claims.
///
/// Rounds up, so any non-zero fraction of a non-empty table
/// claims at least one row.
pub fn tail_len(total: usize, fraction: f64) -> usize {
    ((total as f64) * fraction).ceil().min(total as f64) as usize
}

/// Split `total` ordered rows into (head, tail) at `fraction`.
pub fn split_chronological(total: usize, fraction: f64) -> (Range<usize>, Range<usize>) {
    let split_at = total - tail_len(total, fraction);
    (0..split_at, split_at..total)
}

/// Row ranges of the three splits over one cleaned table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRanges {
    pub train:      Range<usize>,
    pub validation: Range<usize>,
    pub test:       Range<usize>,
}

impl SplitRanges {
    pub fn new(total: usize, test_fraction: f64, val_fraction: f64) -> DataResult<Self> {
        let (cv, test)          = split_chronological(total, test_fraction);
        let (train, validation) = split_chronological(cv.len(), val_fraction);

        if train.is_empty() {
            return Err(DataError::InvalidConfiguration(format!(
                "{} rows leave nothing for training after carving off test ({}) and validation ({})",
                total,
                test.len(),
                validation.len()
            )));
        }

        tracing::debug!(
            "Chronological split: {} train, {} validation, {} test",
            train.len(),
            validation.len(),
            test.len()
        );

        Ok(Self { train, validation, test })
    }

    pub fn get(&self, split: Split) -> Range<usize> {
        match split {
            Split::Train      => self.train.clone(),
            Split::Validation => self.validation.clone(),
            Split::Test       => self.test.clone(),
        }
    }
}
