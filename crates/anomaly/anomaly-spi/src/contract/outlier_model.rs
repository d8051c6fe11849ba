//! Outlier model and detector trait definitions.

use crate::error::Result;
use crate::model::{DetectionKind, DetectionResult, LocationPoint, OutlierScore};

/// Unsupervised outlier model over numeric feature rows.
///
/// Implementations are trained on a batch of rows and then score rows of the
/// same dimensionality.
pub trait OutlierModel: Send + Sync {
    /// Fit the model to training rows.
    fn fit(&mut self, rows: &[Vec<f64>]) -> Result<()>;

    /// Score each row against the fitted model.
    fn score(&self, rows: &[Vec<f64>]) -> Result<Vec<OutlierScore>>;

    /// Decision threshold on the raw score, once fitted.
    fn threshold(&self) -> Option<f64>;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool;
}

/// Detector operating on a raw location sequence.
pub trait LocationDetector: Send + Sync {
    /// The anomaly this detector reports.
    fn kind(&self) -> DetectionKind;

    /// Evaluate a location sequence.
    ///
    /// Fewer than two points yields a non-anomalous zero-score result, not an
    /// error.
    fn detect(&self, points: &[LocationPoint]) -> Result<DetectionResult>;
}
