//! Contract definitions for the anomaly engine.
//!
//! This module contains trait definitions that model implementations must satisfy.

mod outlier_model;

pub use outlier_model::{LocationDetector, OutlierModel};
