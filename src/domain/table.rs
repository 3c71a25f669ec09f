// ============================================================
// Layer 3: Tables and Feature Matrices
// ============================================================
// Three shapes of data flow through the pipeline:
//
//   RawTable      → every column as text, missing cells = None,
//                   one parsed date per record
//   CleanTable    → sorted, pruned, fully numeric, with the
//                   one-step-ahead target already derived
//   FeatureMatrix → dense f64 ndarray matrix; the unit that
//                   gets split, scaled and windowed
//
// Reference: Rust Book §5 (Structs)
//            ndarray crate documentation (Array2, s! slicing)

use std::fmt;
use std::ops::Range;

use chrono::NaiveDate;
use ndarray::{s, Array2, ArrayView1, ArrayView2};

use crate::domain::error::{DataError, DataResult};
use crate::domain::split::SplitData;

// ─── Raw Table ────────────────────────────────────────────────────────────────

/// One record as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Parsed value of the date column
    pub date: NaiveDate,

    /// Every other column, in header order. `None` marks a missing cell.
    pub cells: Vec<Option<String>>,
}

/// The source file after parsing, before any cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Header names, date column excluded
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

// ─── Feature Matrix ───────────────────────────────────────────────────────────

/// Dense `[rows, columns]` matrix of feature values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn from_array(values: Array2<f64>) -> Self {
        Self { values }
    }

    /// Build from nested rows; every row must have the same width.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> DataResult<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut flat = Vec::with_capacity(n_rows * n_cols);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(DataError::InvalidConfiguration(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            flat.extend(row);
        }

        let values = Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| DataError::InvalidConfiguration(e.to_string()))?;
        Ok(Self { values })
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    /// The contiguous block of rows `range`.
    pub fn rows(&self, range: Range<usize>) -> ArrayView2<'_, f64> {
        self.values.slice(s![range, ..])
    }

    /// A copy of rows `range` as its own matrix.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self { values: self.rows(range).to_owned() }
    }

    pub fn column(&self, j: usize) -> ArrayView1<'_, f64> {
        self.values.column(j)
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }
}

// ─── Clean Table ──────────────────────────────────────────────────────────────

/// The cleaned, numeric table the splitter works on.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTable {
    /// Feature column names, in matrix column order
    pub columns:  Vec<String>,
    pub dates:    Vec<NaiveDate>,
    pub regions:  Vec<String>,
    pub features: FeatureMatrix,
    pub targets:  Vec<f64>,
}

impl CleanTable {
    pub fn len(&self) -> usize {
        self.features.n_rows()
    }

    /// Copy rows `range` out as one split, unscaled.
    pub fn split_data(&self, range: Range<usize>) -> SplitData {
        SplitData {
            features: self.features.slice(range.clone()),
            targets:  self.targets[range.clone()].to_vec(),
            regions:  self.regions[range].to_vec(),
        }
    }
}

/// Rows shown at each end of the diagnostic dump.
const PREVIEW_ROWS: usize = 5;

// Renders like a dataframe preview: header, head, "...", tail, shape.
impl fmt::Display for CleanTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12}{:<20}", "date", "region")?;
        for col in &self.columns {
            write!(f, "{:>14}", col)?;
        }
        writeln!(f)?;

        let n = self.len();
        let write_row = |f: &mut fmt::Formatter<'_>, i: usize| -> fmt::Result {
            write!(f, "{:<12}{:<20}", self.dates[i].to_string(), self.regions[i])?;
            for v in self.features.row(i) {
                write!(f, "{:>14.4}", v)?;
            }
            writeln!(f)
        };

        if n <= PREVIEW_ROWS * 2 {
            for i in 0..n {
                write_row(f, i)?;
            }
        } else {
            for i in 0..PREVIEW_ROWS {
                write_row(f, i)?;
            }
            writeln!(f, "...")?;
            for i in n - PREVIEW_ROWS..n {
                write_row(f, i)?;
            }
        }

        write!(f, "[{} rows x {} columns]", n, self.columns.len())
    }
}
