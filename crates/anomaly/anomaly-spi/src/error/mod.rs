//! Error types for the anomaly engine.
//!
//! This module contains the error taxonomy and the Result alias.

mod anomaly_error;

pub use anomaly_error::{AnomalyError, Result};
