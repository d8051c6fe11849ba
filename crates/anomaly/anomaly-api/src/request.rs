//! Request contracts for the engine operations.
//!
//! Field names match the JSON documents callers submit.

use serde::{Deserialize, Serialize};

use anomaly_spi::{AnomalyError, LocationPoint, PathPoint, Result, TrainingBatch};

/// Bundle path used when a save/load request names none.
pub const DEFAULT_MODEL_PATH: &str = "models/anomaly_detection_model.json";

/// Input to `detect_location_dropoff`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DropoffRequest {
    #[serde(default)]
    pub location_data: Vec<LocationPoint>,
}

impl DropoffRequest {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("location_data", self.location_data.len())
    }
}

/// Input to `detect_prolonged_inactivity`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InactivityRequest {
    #[serde(default)]
    pub location_data: Vec<LocationPoint>,
    /// Overrides the configured threshold when present.
    #[serde(default)]
    pub threshold_minutes: Option<f64>,
}

impl InactivityRequest {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("location_data", self.location_data.len())
    }
}

/// Input to `detect_route_deviation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteDeviationRequest {
    #[serde(default)]
    pub current_path: Vec<PathPoint>,
    #[serde(default)]
    pub planned_itinerary: Vec<PathPoint>,
}

impl RouteDeviationRequest {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("current_path", self.current_path.len())?;
        require_non_empty("planned_itinerary", self.planned_itinerary.len())
    }
}

/// Input to `train`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainRequest {
    #[serde(default)]
    pub training_data: TrainingBatch,
}

/// Input to `save_models` / `load_models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPathRequest {
    #[serde(default = "default_model_path")]
    pub filepath: String,
}

impl Default for ModelPathRequest {
    fn default() -> Self {
        Self {
            filepath: default_model_path(),
        }
    }
}

fn default_model_path() -> String {
    DEFAULT_MODEL_PATH.to_string()
}

fn require_non_empty(name: &str, len: usize) -> Result<()> {
    if len == 0 {
        Err(AnomalyError::invalid(name, "missing or empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactivity_request_threshold_optional() {
        let json = r#"{"location_data": [{"latitude": 1.0, "longitude": 2.0, "timestamp": "2025-09-08T10:00:00Z"}]}"#;
        let request: InactivityRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.threshold_minutes, None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_missing_location_data_rejected() {
        let request: DropoffRequest = serde_json::from_str("{}").unwrap();
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameter: location_data - missing or empty");
    }

    #[test]
    fn test_route_request_requires_both_paths() {
        let json = r#"{"current_path": [{"latitude": 1.0, "longitude": 2.0}]}"#;
        let request: RouteDeviationRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_model_path_default() {
        let request: ModelPathRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.filepath, DEFAULT_MODEL_PATH);
    }

    #[test]
    fn test_train_request_parses_batch() {
        let json = r#"{"training_data": {"location_data": []}}"#;
        let request: TrainRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.training_data.len(), 1);
    }
}
