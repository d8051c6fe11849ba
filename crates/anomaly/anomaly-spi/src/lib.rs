//! Anomaly Engine Service Provider Interface
//!
//! Defines the data model, error taxonomy and traits shared by every layer of
//! the tourist-safety anomaly engine.

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{LocationDetector, OutlierModel};
pub use error::{AnomalyError, Result};
pub use model::{
    parse_timestamp, DetectionKind, DetectionResult, FeatureVector, LocationPoint,
    OperationStatus, OutlierScore, PathPoint, Status, TrainingBatch, FEATURE_DIMENSIONS,
    FEATURE_NAMES,
};
