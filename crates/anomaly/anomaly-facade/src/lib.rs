//! Anomaly Scoring Facade
//!
//! Unified re-exports for the anomaly scoring module:
//! - Data model, errors and the `OutlierModel` / `LocationDetector` traits from SPI
//! - Configuration and request types from API
//! - Detectors, the isolation forest and `AnomalyEngine` from Core

// Re-export everything from SPI
pub use anomaly_spi::*;

// Re-export everything from API
pub use anomaly_api::*;

// Re-export everything from Core
pub use anomaly_core::*;
