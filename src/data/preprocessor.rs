// ============================================================
// Layer 4: Table Preprocessor
// ============================================================
// Turns a RawTable into a CleanTable the splitter can cut.
//
// Cleaning steps (applied in order):
//   1. Sort records by (region, date) ascending
//   2. Drop the index column, the region column and the
//      configured leakage-prone columns (cumulative totals,
//      rates and ratios)
//   3. Drop every record with a missing value in what is left
//      (no imputation)
//   4. Parse the remaining cells as f64
//   5. Derive the target: next row's value of the target
//      column, last slot forward-filled
//
// When segmenting by region, step 5 runs per region so the
// last day of one region never borrows the first day of the
// next as its target.
//
// Reference: Rust Book §8 (Vectors), §13 (Iterators)

use std::cmp::Ordering;

use ndarray::Array2;

use crate::domain::error::{DataError, DataResult};
use crate::domain::table::{CleanTable, FeatureMatrix, RawRecord, RawTable};

pub struct Preprocessor {
    region_column:     String,
    target_column:     String,
    drop_columns:      Vec<String>,
    segment_by_region: bool,
}

impl Preprocessor {
    pub fn new(
        region_column:     impl Into<String>,
        target_column:     impl Into<String>,
        drop_columns:      Vec<String>,
        segment_by_region: bool,
    ) -> Self {
        Self {
            region_column: region_column.into(),
            target_column: target_column.into(),
            drop_columns,
            segment_by_region,
        }
    }

    /// Run every cleaning step over `raw`.
    pub fn clean(&self, raw: &RawTable) -> DataResult<CleanTable> {
        let region_idx = raw
            .column_index(&self.region_column)
            .ok_or_else(|| DataError::MissingColumn(self.region_column.clone()))?;

        // ── Step 1: sort by (region, date) ────────────────────────────────────
        // Stable, so records sharing a key keep their file order.
        // Records without a region sort last.
        let mut order: Vec<(usize, &RawRecord)> = raw.records.iter().enumerate().collect();
        order.sort_by(|(_, a), (_, b)| {
            compare_region(&a.cells[region_idx], &b.cells[region_idx])
                .then_with(|| a.date.cmp(&b.date))
        });

        // ── Step 2: choose the surviving feature columns ──────────────────────
        for col in &self.drop_columns {
            if raw.column_index(col).is_none() {
                tracing::warn!("Configured drop column '{}' is not in the source table", col);
            }
        }

        let keep: Vec<usize> = raw
            .columns
            .iter()
            .enumerate()
            .filter(|(i, name)| *i != region_idx && !self.is_dropped(name))
            .map(|(i, _)| i)
            .collect();

        let columns: Vec<String> = keep.iter().map(|&i| raw.columns[i].clone()).collect();

        let target_idx = columns
            .iter()
            .position(|c| *c == self.target_column)
            .ok_or_else(|| DataError::MissingColumn(self.target_column.clone()))?;

        // ── Steps 3 and 4: drop incomplete rows, parse the rest ───────────────
        let mut dates   = Vec::with_capacity(order.len());
        let mut regions = Vec::with_capacity(order.len());
        let mut values  = Vec::with_capacity(order.len() * keep.len());
        let mut dropped = 0usize;

        for &(row, record) in &order {
            let cells: Option<Vec<&str>> = keep
                .iter()
                .map(|&i| record.cells[i].as_deref())
                .collect();

            let Some(cells) = cells else {
                dropped += 1;
                continue;
            };

            let mut parsed = Vec::with_capacity(cells.len());
            for (cell, name) in cells.iter().zip(&columns) {
                let v: f64 = cell.parse().map_err(|_| DataError::MalformedValue {
                    row:    row + 1,
                    column: name.clone(),
                    value:  cell.to_string(),
                })?;
                parsed.push(v);
            }

            // A literal NaN that slipped past the missing markers is still missing
            if parsed.iter().any(|v| v.is_nan()) {
                dropped += 1;
                continue;
            }

            values.extend(parsed);
            dates.push(record.date);
            regions.push(record.cells[region_idx].clone().unwrap_or_default());
        }

        if dates.is_empty() {
            return Err(DataError::EmptyDataset);
        }
        if dropped > 0 {
            tracing::warn!("Dropped {} records with missing values", dropped);
        }

        let features = Array2::from_shape_vec((dates.len(), columns.len()), values)
            .map(FeatureMatrix::from_array)
            .map_err(|e| DataError::InvalidConfiguration(e.to_string()))?;

        // ── Step 5: one-step-ahead target ─────────────────────────────────────
        let deaths: Vec<f64> = features.column(target_idx).to_vec();
        let targets = if self.segment_by_region {
            let mut targets = Vec::with_capacity(deaths.len());
            let mut start   = 0usize;
            for i in 1..=regions.len() {
                if i == regions.len() || regions[i] != regions[start] {
                    targets.extend(shift_forward_fill(&deaths[start..i]));
                    start = i;
                }
            }
            targets
        } else {
            shift_forward_fill(&deaths)
        };

        tracing::debug!(
            "Cleaned table: {} rows, feature columns {:?}",
            dates.len(),
            columns
        );

        Ok(CleanTable { columns, dates, regions, features, targets })
    }

    fn is_dropped(&self, name: &str) -> bool {
        is_index_column(name) || self.drop_columns.iter().any(|d| d == name)
    }
}

/// Index columns written by a dataframe library: unnamed or "Unnamed: N".
fn is_index_column(name: &str) -> bool {
    name.is_empty() || name.starts_with("Unnamed:")
}

fn compare_region(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None)    => Ordering::Less,
        (None, Some(_))    => Ordering::Greater,
        (None, None)       => Ordering::Equal,
    }
}

/// Shift `values` one step earlier and forward-fill the final gap.
///
/// `[10, 12, 15, 15]` becomes `[12, 15, 15, 15]`.
pub fn shift_forward_fill(values: &[f64]) -> Vec<f64> {
    match values.last() {
        Some(&last) => values.iter().skip(1).copied().chain(std::iter::once(last)).collect(),
        None        => Vec::new(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, cells: &[&str]) -> RawRecord {
        RawRecord {
            date:  NaiveDate::from_ymd_opt(2020, 4, day).unwrap(),
            cells: cells
                .iter()
                .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
                .collect(),
        }
    }

    fn raw(records: Vec<RawRecord>) -> RawTable {
        RawTable {
            columns: vec![
                "".into(),
                "Province_State".into(),
                "Confirmed".into(),
                "Deaths".into(),
                "Recovered".into(),
            ],
            records,
        }
    }

    fn preprocessor(segment: bool) -> Preprocessor {
        Preprocessor::new("Province_State", "Deaths", vec!["Recovered".into()], segment)
    }

    #[test]
    fn test_shift_forward_fill() {
        assert_eq!(
            shift_forward_fill(&[10.0, 12.0, 15.0, 15.0]),
            vec![12.0, 15.0, 15.0, 15.0]
        );
        assert_eq!(shift_forward_fill(&[7.0]), vec![7.0]);
        assert!(shift_forward_fill(&[]).is_empty());
    }

    #[test]
    fn test_sorts_by_region_then_date() {
        let table = raw(vec![
            record(3, &["0", "Texas",   "30", "3", "1"]),
            record(1, &["1", "Alaska",  "10", "1", "1"]),
            record(1, &["2", "Texas",   "20", "2", "1"]),
            record(2, &["3", "Alaska",  "11", "2", "1"]),
        ]);
        let clean = preprocessor(false).clean(&table).unwrap();

        assert_eq!(clean.regions, vec!["Alaska", "Alaska", "Texas", "Texas"]);
        assert_eq!(clean.features.column(0).to_vec(), vec![10.0, 11.0, 20.0, 30.0]);
    }

    #[test]
    fn test_drops_index_region_and_configured_columns() {
        let table = raw(vec![record(1, &["0", "Texas", "10", "1", "9"])]);
        let clean = preprocessor(false).clean(&table).unwrap();
        assert_eq!(clean.columns, vec!["Confirmed", "Deaths"]);
    }

    #[test]
    fn test_drops_rows_with_missing_values() {
        let table = raw(vec![
            record(1, &["0", "Texas", "10", "1", ""]),  // missing only in a dropped column
            record(2, &["1", "Texas", "",   "2", "1"]),
            record(3, &["2", "Texas", "12", "3", "1"]),
        ]);
        let clean = preprocessor(false).clean(&table).unwrap();
        assert_eq!(clean.len(), 2);
        assert_eq!(clean.features.column(0).to_vec(), vec![10.0, 12.0]);
    }

    #[test]
    fn test_target_is_next_deaths_value() {
        let table = raw(vec![
            record(1, &["0", "Texas", "1", "10", "0"]),
            record(2, &["1", "Texas", "1", "12", "0"]),
            record(3, &["2", "Texas", "1", "15", "0"]),
            record(4, &["3", "Texas", "1", "15", "0"]),
        ]);
        let clean = preprocessor(false).clean(&table).unwrap();
        assert_eq!(clean.targets, vec![12.0, 15.0, 15.0, 15.0]);
    }

    #[test]
    fn test_segmented_targets_stay_inside_region() {
        let table = raw(vec![
            record(1, &["0", "Alaska", "1", "1", "0"]),
            record(2, &["1", "Alaska", "1", "2", "0"]),
            record(1, &["2", "Texas",  "1", "7", "0"]),
            record(2, &["3", "Texas",  "1", "9", "0"]),
        ]);

        let global = preprocessor(false).clean(&table).unwrap();
        assert_eq!(global.targets, vec![2.0, 7.0, 9.0, 9.0]);

        let segmented = preprocessor(true).clean(&table).unwrap();
        assert_eq!(segmented.targets, vec![2.0, 2.0, 9.0, 9.0]);
    }

    #[test]
    fn test_all_rows_dropped_is_empty_dataset() {
        let table = raw(vec![record(1, &["0", "Texas", "", "1", "0"])]);
        assert!(matches!(preprocessor(false).clean(&table), Err(DataError::EmptyDataset)));
    }

    #[test]
    fn test_non_numeric_feature_is_malformed() {
        let table = raw(vec![record(1, &["0", "Texas", "many", "1", "0"])]);
        match preprocessor(false).clean(&table) {
            Err(DataError::MalformedValue { column, value, .. }) => {
                assert_eq!(column, "Confirmed");
                assert_eq!(value, "many");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_target_column() {
        let table = raw(vec![record(1, &["0", "Texas", "1", "1", "0"])]);
        let p = Preprocessor::new("Province_State", "Deaths", vec!["Deaths".into()], false);
        assert!(matches!(p.clean(&table), Err(DataError::MissingColumn(c)) if c == "Deaths"));
    }
}
