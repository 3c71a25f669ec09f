// ============================================================
// Layer 4: Standard Scaler
// ============================================================
// Per-column standardisation: z = (x - mean) / scale
//
//   mean  = column mean over the TRAIN rows only
//   scale = population standard deviation (ddof = 0) over the
//           same rows, or 1.0 for a constant column
//
// The parameters are fitted once on train and then applied
// unchanged to validation and test, so no statistic ever
// depends on a row the model will be evaluated on.
//
// Targets are never scaled.
//
// Reference: ndarray crate documentation (mean_axis, std_axis)

use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

use crate::domain::error::{DataError, DataResult};
use crate::domain::table::FeatureMatrix;

/// Fitted per-column parameters. Saved next to the config so a
/// later run can tell whether the source data drifted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean:  Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    params: Option<ScalerParams>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute mean and scale of every column of `train`.
    pub fn fit(&mut self, train: &FeatureMatrix) -> DataResult<()> {
        let view = train.view();
        let mean = view.mean_axis(Axis(0)).ok_or_else(|| {
            DataError::InvalidConfiguration("cannot fit a scaler on an empty matrix".into())
        })?;
        let scale = view
            .std_axis(Axis(0), 0.0)
            .mapv(|sd| if sd > f64::EPSILON { sd } else { 1.0 });

        tracing::debug!("Scaler fitted on {} rows: mean={} scale={}", train.n_rows(), mean, scale);
        self.params = Some(ScalerParams {
            mean:  mean.to_vec(),
            scale: scale.to_vec(),
        });
        Ok(())
    }

    /// Apply the fitted parameters to any matrix with the same width.
    pub fn transform(&self, matrix: &FeatureMatrix) -> DataResult<FeatureMatrix> {
        let params = self.params.as_ref().ok_or(DataError::ScalerNotFitted)?;

        if matrix.n_cols() != params.mean.len() {
            return Err(DataError::InvalidConfiguration(format!(
                "scaler fitted on {} columns cannot transform {}",
                params.mean.len(),
                matrix.n_cols()
            )));
        }

        let mean  = Array1::from(params.mean.clone());
        let scale = Array1::from(params.scale.clone());
        let z     = (&matrix.view() - &mean) / &scale;

        Ok(FeatureMatrix::from_array(z))
    }

    pub fn params(&self) -> Option<&ScalerParams> {
        self.params.as_ref()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn matrix(rows: &[[f64; 2]]) -> FeatureMatrix {
        FeatureMatrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn test_transformed_train_is_standardised() {
        let train = matrix(&[[1.0, 100.0], [2.0, 300.0], [3.0, 200.0], [6.0, 400.0]]);
        let mut scaler = StandardScaler::new();
        scaler.fit(&train).unwrap();
        let z = scaler.transform(&train).unwrap();

        let mean = z.view().mean_axis(Axis(0)).unwrap();
        let var  = z.view().var_axis(Axis(0), 0.0);
        for j in 0..2 {
            assert!(mean[j].abs() < 1e-9, "column {j} mean {}", mean[j]);
            assert!((var[j] - 1.0).abs() < 1e-9, "column {j} variance {}", var[j]);
        }
    }

    #[test]
    fn test_other_splits_use_train_parameters() {
        let train = matrix(&[[0.0, 0.0], [2.0, 4.0]]);
        let test  = matrix(&[[4.0, 8.0]]);
        let mut scaler = StandardScaler::new();
        scaler.fit(&train).unwrap();

        // mean (1, 2), scale (1, 2)
        let z = scaler.transform(&test).unwrap();
        assert_eq!(z.row(0), array![3.0, 3.0]);
        assert_eq!(scaler.params().unwrap().mean, vec![1.0, 2.0]);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let train = matrix(&[[5.0, 1.0], [5.0, 2.0]]);
        let mut scaler = StandardScaler::new();
        scaler.fit(&train).unwrap();
        let z = scaler.transform(&train).unwrap();
        assert_eq!(z.column(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_fit_on_empty_matrix() {
        let empty = matrix(&[[1.0, 2.0]]).slice(0..0);
        let mut scaler = StandardScaler::new();
        assert!(matches!(scaler.fit(&empty), Err(DataError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_transform_before_fit() {
        let scaler = StandardScaler::new();
        let err    = scaler.transform(&matrix(&[[1.0, 2.0]])).unwrap_err();
        assert!(matches!(err, DataError::ScalerNotFitted));
    }

    #[test]
    fn test_column_count_mismatch() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&matrix(&[[1.0, 2.0], [3.0, 4.0]])).unwrap();
        let narrow = FeatureMatrix::from_rows(vec![vec![1.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&narrow),
            Err(DataError::InvalidConfiguration(_))
        ));
    }
}
