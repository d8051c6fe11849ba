//! Location drop-off detection.
//!
//! Feature extraction, standardization and isolation-forest scoring over a
//! window of recent fixes. Only the most recent step of the window is
//! reported: the question answered is whether the latest movement is
//! anomalous relative to the rest of the window.

use anomaly_api::IsolationForestConfig;
use anomaly_spi::{
    AnomalyError, DetectionKind, DetectionResult, LocationDetector, LocationPoint, OutlierModel,
    OutlierScore, Result,
};

use crate::features::{extract_features, feature_rows};
use crate::state::TrainedModel;

/// Isolation-forest detector for sudden stoppage or signal loss.
#[derive(Debug, Clone, Default)]
pub struct LocationDropoffDetector {
    config: IsolationForestConfig,
}

impl LocationDropoffDetector {
    pub fn new(config: IsolationForestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Refit the normalizer and forest on this window, then score it.
    pub fn detect_in_window(&self, points: &[LocationPoint]) -> Result<DetectionResult> {
        let Some(features) = extract_features(points)? else {
            return Ok(DetectionResult::insufficient_data(DetectionKind::LocationDropoff));
        };
        let (model, scaled) = TrainedModel::fit_scaled(&feature_rows(&features), &self.config)?;
        latest_result(&model, &scaled)
    }

    /// Score the window with a previously trained normalizer and forest.
    pub fn detect_with_model(
        &self,
        points: &[LocationPoint],
        model: &TrainedModel,
    ) -> Result<DetectionResult> {
        let Some(features) = extract_features(points)? else {
            return Ok(DetectionResult::insufficient_data(DetectionKind::LocationDropoff));
        };
        let scaled = model.normalizer.transform(&feature_rows(&features))?;
        latest_result(model, &scaled)
    }
}

impl LocationDetector for LocationDropoffDetector {
    fn kind(&self) -> DetectionKind {
        DetectionKind::LocationDropoff
    }

    fn detect(&self, points: &[LocationPoint]) -> Result<DetectionResult> {
        self.detect_in_window(points)
    }
}

/// Report the last row's score; confidence is its distance from the
/// decision threshold.
fn latest_result(model: &TrainedModel, scaled: &[Vec<f64>]) -> Result<DetectionResult> {
    let threshold = model.forest.threshold().ok_or(AnomalyError::NotFitted)?;
    let scores = model.forest.score(scaled)?;
    let OutlierScore { score, is_outlier } =
        *scores.last().ok_or(AnomalyError::InsufficientData {
            required: 1,
            got: 0,
        })?;
    Ok(DetectionResult::new(
        DetectionKind::LocationDropoff,
        is_outlier,
        score,
        (score - threshold).abs().min(1.0),
    ))
}
