//! Per-vector outlier scores.

use serde::{Deserialize, Serialize};

/// Score of one feature vector under a fitted outlier model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierScore {
    /// Raw anomaly score; higher is more anomalous.
    pub score: f64,
    /// Whether the score exceeds the calibrated decision threshold.
    pub is_outlier: bool,
}
