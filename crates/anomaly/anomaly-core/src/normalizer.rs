//! Per-dimension standardization of feature rows.

use anomaly_spi::{AnomalyError, Result};
use serde::{Deserialize, Serialize};

/// Standard deviations below this are treated as zero.
const MIN_STD_DEV: f64 = 1e-10;

/// Zero-mean / unit-variance scaler over feature rows.
///
/// A dimension with no variance keeps a scale of 1, so it standardizes to 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute mean and population standard deviation per dimension.
    pub fn fit(&mut self, rows: &[Vec<f64>]) -> Result<()> {
        let dims = row_dimensions(rows)?;
        let n = rows.len() as f64;

        let mut mean = vec![0.0; dims];
        for row in rows {
            for (acc, x) in mean.iter_mut().zip(row) {
                *acc += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut variance = vec![0.0; dims];
        for row in rows {
            for ((acc, x), m) in variance.iter_mut().zip(row).zip(&mean) {
                *acc += (x - m).powi(2);
            }
        }

        self.scale = variance
            .into_iter()
            .map(|v| {
                let std_dev = (v / n).sqrt();
                if std_dev < MIN_STD_DEV {
                    1.0
                } else {
                    std_dev
                }
            })
            .collect();
        self.mean = mean;
        Ok(())
    }

    /// Apply previously fitted parameters.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        if !self.is_fitted() {
            return Err(AnomalyError::NotFitted);
        }
        rows.iter()
            .map(|row| {
                if row.len() != self.mean.len() {
                    return Err(dimension_mismatch(self.mean.len(), row.len()));
                }
                Ok(row
                    .iter()
                    .zip(self.mean.iter().zip(&self.scale))
                    .map(|(x, (m, s))| (x - m) / s)
                    .collect())
            })
            .collect()
    }

    /// Fit on `rows`, replacing any previous parameters, then transform them.
    pub fn fit_transform(&mut self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.fit(rows)?;
        self.transform(rows)
    }

    pub fn is_fitted(&self) -> bool {
        !self.mean.is_empty()
    }

    /// Check parameters that did not come from [`Normalizer::fit`], such as a
    /// deserialized normalizer.
    pub fn validate(&self) -> Result<()> {
        if self.mean.len() != self.scale.len() {
            return Err(dimension_mismatch(self.mean.len(), self.scale.len()));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(AnomalyError::invalid("mean", "values must be finite"));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(AnomalyError::invalid("scale", "values must be finite and positive"));
        }
        Ok(())
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

/// Shared dimensionality of `rows`; rejects empty or ragged input.
pub(crate) fn row_dimensions(rows: &[Vec<f64>]) -> Result<usize> {
    let first = rows.first().ok_or(AnomalyError::InsufficientData {
        required: 1,
        got: 0,
    })?;
    let dims = first.len();
    if dims == 0 {
        return Err(AnomalyError::invalid("rows", "rows must have at least one dimension"));
    }
    if let Some(row) = rows.iter().find(|row| row.len() != dims) {
        return Err(dimension_mismatch(dims, row.len()));
    }
    Ok(dims)
}

pub(crate) fn dimension_mismatch(expected: usize, got: usize) -> AnomalyError {
    AnomalyError::invalid(
        "rows",
        format!("expected {} dimensions, got {}", expected, got),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardizes_each_dimension() {
        let rows = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]];
        let mut normalizer = Normalizer::new();
        let scaled = normalizer.fit_transform(&rows).unwrap();

        for dim in 0..2 {
            let column: Vec<f64> = scaled.iter().map(|r| r[dim]).collect();
            let mean = column.iter().sum::<f64>() / 3.0;
            let var = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
        assert_eq!(normalizer.mean(), &[2.0, 20.0]);
    }

    #[test]
    fn test_constant_dimension_maps_to_zero() {
        let rows = vec![vec![5.0, 1.0], vec![5.0, 3.0]];
        let mut normalizer = Normalizer::new();
        let scaled = normalizer.fit_transform(&rows).unwrap();
        assert_eq!(normalizer.scale()[0], 1.0);
        assert_eq!(scaled[0][0], 0.0);
        assert_eq!(scaled[1][0], 0.0);
    }

    #[test]
    fn test_refit_replaces_parameters() {
        let mut normalizer = Normalizer::new();
        normalizer.fit(&[vec![0.0], vec![2.0]]).unwrap();
        normalizer.fit(&[vec![10.0], vec![30.0]]).unwrap();
        assert_eq!(normalizer.mean(), &[20.0]);
        assert_eq!(normalizer.scale(), &[10.0]);
    }

    #[test]
    fn test_transform_uses_fitted_parameters() {
        let mut normalizer = Normalizer::new();
        normalizer.fit(&[vec![0.0], vec![2.0]]).unwrap();
        let out = normalizer.transform(&[vec![3.0]]).unwrap();
        assert_eq!(out, vec![vec![2.0]]);
    }

    #[test]
    fn test_validate_rejects_zero_scale() {
        let mut normalizer = Normalizer::new();
        normalizer.fit(&[vec![0.0, 1.0], vec![2.0, 5.0]]).unwrap();
        assert!(normalizer.validate().is_ok());

        normalizer.scale[1] = 0.0;
        assert!(normalizer.validate().is_err());

        normalizer.scale.pop();
        assert!(normalizer.validate().is_err());
    }

    #[test]
    fn test_transform_before_fit_errors() {
        let normalizer = Normalizer::new();
        assert!(matches!(
            normalizer.transform(&[vec![1.0]]),
            Err(AnomalyError::NotFitted)
        ));
    }

    #[test]
    fn test_empty_and_ragged_rows_rejected() {
        let mut normalizer = Normalizer::new();
        assert!(matches!(
            normalizer.fit(&[]),
            Err(AnomalyError::InsufficientData { .. })
        ));
        assert!(normalizer.fit(&[vec![1.0, 2.0], vec![1.0]]).is_err());
    }

    #[test]
    fn test_round_trips_through_json() {
        let mut normalizer = Normalizer::new();
        normalizer.fit(&[vec![1.0, 4.0], vec![3.0, 8.0]]).unwrap();
        let json = serde_json::to_string(&normalizer).unwrap();
        let restored: Normalizer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, normalizer);
    }
}
