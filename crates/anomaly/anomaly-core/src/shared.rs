//! Thread-safe engine handle.
//!
//! Detection runs against an immutable snapshot. `train` and `load_models`
//! build a new engine off to the side and swap it in, so concurrent readers
//! always see either the previous state or the new one, never a mix. Writers,
//! saves included, run one at a time.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anomaly_api::EngineConfig;
use anomaly_spi::{
    DetectionResult, LocationPoint, OperationStatus, PathPoint, Result, TrainingBatch,
};

use crate::engine::{AnomalyEngine, EngineHealth};

/// Shareable handle around an [`AnomalyEngine`].
#[derive(Debug, Default)]
pub struct SharedEngine {
    current: RwLock<Arc<AnomalyEngine>>,
    // Serializes writers so two trainings cannot both start from the same
    // snapshot and lose one result.
    writer: Mutex<()>,
}

impl SharedEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self::from_engine(AnomalyEngine::new(config)?))
    }

    pub fn from_engine(engine: AnomalyEngine) -> Self {
        Self {
            current: RwLock::new(Arc::new(engine)),
            writer: Mutex::new(()),
        }
    }

    /// The engine as of now. Later writes do not affect the returned value.
    pub fn snapshot(&self) -> Arc<AnomalyEngine> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn detect_location_dropoff(&self, location_data: &[LocationPoint]) -> Result<DetectionResult> {
        self.snapshot().detect_location_dropoff(location_data)
    }

    pub fn detect_prolonged_inactivity(
        &self,
        location_data: &[LocationPoint],
        threshold_minutes: Option<f64>,
    ) -> Result<DetectionResult> {
        self.snapshot()
            .detect_prolonged_inactivity(location_data, threshold_minutes)
    }

    pub fn detect_route_deviation(
        &self,
        current_path: &[PathPoint],
        planned_itinerary: &[PathPoint],
    ) -> Result<DetectionResult> {
        self.snapshot()
            .detect_route_deviation(current_path, planned_itinerary)
    }

    pub fn train(&self, batch: &TrainingBatch) -> Result<OperationStatus> {
        self.update(|engine| engine.train(batch))
    }

    /// Save the current engine. Holds the writer lock, so saves are
    /// serialized with each other and with train / load.
    pub fn save_models(&self, path: impl AsRef<Path>) -> Result<OperationStatus> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.snapshot().save_models(path)
    }

    pub fn load_models(&self, path: impl AsRef<Path>) -> Result<OperationStatus> {
        self.update(|engine| engine.load_models(path))
    }

    pub fn is_trained(&self) -> bool {
        self.snapshot().is_trained()
    }

    pub fn health(&self) -> EngineHealth {
        self.snapshot().health()
    }

    fn update<F>(&self, apply: F) -> Result<OperationStatus>
    where
        F: FnOnce(&mut AnomalyEngine) -> Result<OperationStatus>,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = (*self.snapshot()).clone();
        let status = apply(&mut next)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        Ok(status)
    }
}
