//! Data models for the anomaly engine.
//!
//! This module contains data structures shared by every engine layer.

mod detection_result;
mod location;
mod outlier_score;
mod status;
mod training;

pub use detection_result::{DetectionKind, DetectionResult};
pub use location::{
    parse_timestamp, FeatureVector, LocationPoint, PathPoint, FEATURE_DIMENSIONS, FEATURE_NAMES,
};
pub use outlier_score::OutlierScore;
pub use status::{OperationStatus, Status};
pub use training::TrainingBatch;
