//! Trained engine state.

use std::collections::BTreeMap;

use anomaly_api::IsolationForestConfig;
use anomaly_spi::{AnomalyError, DetectionKind, OutlierModel, Result};
use serde::{Deserialize, Serialize};

use crate::isolation_forest::IsolationForest;
use crate::normalizer::Normalizer;

/// Normalizer and forest fitted together on one detector's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub normalizer: Normalizer,
    pub forest: IsolationForest,
}

impl TrainedModel {
    /// Standardize `rows`, then fit a forest on the standardized rows.
    pub fn fit(rows: &[Vec<f64>], config: &IsolationForestConfig) -> Result<Self> {
        Self::fit_scaled(rows, config).map(|(model, _)| model)
    }

    /// Like [`TrainedModel::fit`], also returning the standardized rows.
    pub fn fit_scaled(
        rows: &[Vec<f64>],
        config: &IsolationForestConfig,
    ) -> Result<(Self, Vec<Vec<f64>>)> {
        let mut normalizer = Normalizer::new();
        let scaled = normalizer.fit_transform(rows)?;
        let mut forest = IsolationForest::new(config.clone())?;
        forest.fit(&scaled)?;
        Ok((Self { normalizer, forest }, scaled))
    }

    /// Both parts fitted, consistent with each other and structurally sound.
    pub fn validate(&self) -> Result<()> {
        if !self.normalizer.is_fitted() || !self.forest.is_fitted() {
            return Err(AnomalyError::NotFitted);
        }
        self.normalizer.validate()?;
        self.forest.validate()?;
        if self.normalizer.mean().len() != self.forest.dimensions() {
            return Err(AnomalyError::invalid(
                "normalizer",
                format!(
                    "{} dimensions, forest expects {}",
                    self.normalizer.mean().len(),
                    self.forest.dimensions()
                ),
            ));
        }
        Ok(())
    }
}

/// Everything `train` produces and `save` / `load` move as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    /// Set by any call to `train`, even one that trained no detector.
    pub trained: bool,
    /// Models for the detectors that received training data.
    pub models: BTreeMap<DetectionKind, TrainedModel>,
}

impl EngineState {
    pub fn model(&self, kind: DetectionKind) -> Option<&TrainedModel> {
        self.models.get(&kind)
    }

    pub fn trained_detectors(&self) -> Vec<DetectionKind> {
        self.models.keys().copied().collect()
    }

    /// Validate every model; the error names the offending detector.
    pub fn validate(&self) -> Result<()> {
        for (kind, model) in &self.models {
            model
                .validate()
                .map_err(|e| AnomalyError::invalid(kind.as_str(), e.to_string()))?;
        }
        Ok(())
    }
}
