//! # anomaly
//!
//! Anomaly scoring for tourist GPS data.
//! Provides location drop-off, prolonged inactivity and route deviation
//! detection, plus training and persistence of the underlying models.

pub use anomaly_facade::*;
