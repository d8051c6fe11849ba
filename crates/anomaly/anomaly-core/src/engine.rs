//! Anomaly scoring engine.
//!
//! Owns the configuration and the trained [`EngineState`], runs the three
//! detectors and manages the train / save / load lifecycle.

use std::collections::BTreeMap;
use std::path::Path;

use anomaly_api::{EngineConfig, ScoringMode};
use anomaly_spi::{
    AnomalyError, DetectionKind, DetectionResult, LocationPoint, OperationStatus, PathPoint,
    Result, TrainingBatch,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dropoff::LocationDropoffDetector;
use crate::features::{extract_features, feature_rows};
use crate::inactivity::InactivityDetector;
use crate::persistence::{read_bundle, write_bundle, ModelBundle};
use crate::route_deviation::RouteDeviationScorer;
use crate::state::{EngineState, TrainedModel};

/// Service name reported by [`AnomalyEngine::health`].
pub const SERVICE_NAME: &str = "Anomaly Detection Engine";

/// Liveness summary of an engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineHealth {
    pub status: String,
    pub service: String,
    pub version: String,
    pub trained: bool,
    pub trained_detectors: Vec<DetectionKind>,
}

/// Anomaly scoring engine.
#[derive(Debug, Clone)]
pub struct AnomalyEngine {
    config: EngineConfig,
    state: EngineState,
    dropoff: LocationDropoffDetector,
    inactivity: InactivityDetector,
    route: RouteDeviationScorer,
}

impl AnomalyEngine {
    /// Create an untrained engine.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dropoff: LocationDropoffDetector::new(config.isolation_forest.clone())?,
            inactivity: InactivityDetector::new(config.inactivity.clone())?,
            route: RouteDeviationScorer::new(config.route_deviation.clone())?,
            state: EngineState::default(),
            config,
        })
    }

    /// Rebuild an engine from a saved bundle.
    pub fn from_bundle(bundle: ModelBundle) -> Result<Self> {
        let mut engine = Self::new(bundle.config)?;
        engine.state = bundle.state;
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_trained(&self) -> bool {
        self.state.trained
    }

    pub fn health(&self) -> EngineHealth {
        EngineHealth {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained: self.state.trained,
            trained_detectors: self.state.trained_detectors(),
        }
    }

    // ------------------------------------------------------------------------
    // Detection
    // ------------------------------------------------------------------------

    /// Is the latest movement step anomalous?
    ///
    /// With [`ScoringMode::WindowRefit`] the model is refit on `location_data`
    /// itself; with [`ScoringMode::Trained`] the trained location model is
    /// used and [`AnomalyError::NotFitted`] returned if there is none.
    pub fn detect_location_dropoff(&self, location_data: &[LocationPoint]) -> Result<DetectionResult> {
        match self.config.scoring_mode {
            ScoringMode::WindowRefit => self.dropoff.detect_in_window(location_data),
            ScoringMode::Trained => {
                let model = self
                    .state
                    .model(DetectionKind::LocationDropoff)
                    .ok_or(AnomalyError::NotFitted)?;
                self.dropoff.detect_with_model(location_data, model)
            }
        }
    }

    /// Longest gap between fixes against `threshold_minutes`, or the
    /// configured threshold when `None`.
    pub fn detect_prolonged_inactivity(
        &self,
        location_data: &[LocationPoint],
        threshold_minutes: Option<f64>,
    ) -> Result<DetectionResult> {
        let threshold = threshold_minutes.unwrap_or(self.inactivity.threshold_minutes());
        self.inactivity.detect_with_threshold(location_data, threshold)
    }

    pub fn detect_route_deviation(
        &self,
        current_path: &[PathPoint],
        planned_itinerary: &[PathPoint],
    ) -> Result<DetectionResult> {
        self.route.score(current_path, planned_itinerary)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Fit a model for every detector with data in `batch`.
    ///
    /// Sequences under every key that resolves to the same detector are
    /// pooled before that detector is fit once. Detectors without data keep
    /// their previous model. The trained flag is set even when nothing was
    /// fit. On error the state is left untouched.
    pub fn train(&mut self, batch: &TrainingBatch) -> Result<OperationStatus> {
        let mut pooled: BTreeMap<DetectionKind, Vec<Vec<f64>>> = BTreeMap::new();
        for (key, sequences) in batch.iter() {
            let Some(kind) = DetectionKind::from_training_key(key) else {
                warn!(key = %key, "Skipping unrecognized training key");
                continue;
            };
            let rows = pooled.entry(kind).or_default();
            for sequence in sequences {
                if let Some(features) = extract_features(sequence)? {
                    rows.extend(feature_rows(&features));
                }
            }
        }

        let mut staged = self.state.clone();
        let mut fitted = Vec::new();
        for (kind, rows) in pooled {
            if rows.is_empty() {
                debug!(detector = %kind, "No usable sequences; detector left as is");
                continue;
            }

            let model = TrainedModel::fit(&rows, &self.config.isolation_forest)?;
            debug!(
                detector = %kind,
                rows = rows.len(),
                sample_size = model.forest.sample_size(),
                "Fitted detector model"
            );
            staged.models.insert(kind, model);
            fitted.push(kind);
        }

        staged.trained = true;
        self.state = staged;
        info!(detectors = ?fitted, "Training complete");
        Ok(OperationStatus::success("Models trained successfully"))
    }

    /// Save configuration and state to `path`.
    pub fn save_models(&self, path: impl AsRef<Path>) -> Result<OperationStatus> {
        let path = path.as_ref();
        write_bundle(
            path,
            &ModelBundle::new(self.config.clone(), self.state.clone()),
        )?;
        info!(path = %path.display(), "Saved model bundle");
        Ok(OperationStatus::success(format!(
            "Models saved to {}",
            path.display()
        )))
    }

    /// Replace configuration and state with the bundle at `path`.
    ///
    /// On failure the engine is unchanged.
    pub fn load_models(&mut self, path: impl AsRef<Path>) -> Result<OperationStatus> {
        let path = path.as_ref();
        let loaded = read_bundle(path).and_then(Self::from_bundle);
        match loaded {
            Ok(engine) => {
                *self = engine;
                info!(path = %path.display(), trained = self.state.trained, "Loaded model bundle");
                Ok(OperationStatus::success("Models loaded successfully"))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load model bundle");
                Err(e)
            }
        }
    }
}

impl Default for AnomalyEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            state: EngineState::default(),
            dropoff: LocationDropoffDetector::default(),
            inactivity: InactivityDetector::default(),
            route: RouteDeviationScorer::default(),
        }
    }
}
