//! Detection result types.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// The behavioral anomaly a detector looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionKind {
    /// Sudden stoppage or loss of the location signal.
    LocationDropoff,
    /// Long gap between consecutive fixes.
    ProlongedInactivity,
    /// Travelled path diverges from the planned itinerary.
    RouteDeviation,
}

impl DetectionKind {
    pub const ALL: [DetectionKind; 3] = [
        DetectionKind::LocationDropoff,
        DetectionKind::ProlongedInactivity,
        DetectionKind::RouteDeviation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionKind::LocationDropoff => "location_dropoff",
            DetectionKind::ProlongedInactivity => "prolonged_inactivity",
            DetectionKind::RouteDeviation => "route_deviation",
        }
    }

    /// Resolve a training-batch key to the detector it trains.
    ///
    /// Accepts both the detector name and the historical `*_data` keys.
    pub fn from_training_key(key: &str) -> Option<Self> {
        match key {
            "location_data" | "location_dropoff" => Some(DetectionKind::LocationDropoff),
            "inactivity_data" | "prolonged_inactivity" => Some(DetectionKind::ProlongedInactivity),
            "route_data" | "route_deviation" => Some(DetectionKind::RouteDeviation),
            _ => None,
        }
    }
}

impl std::fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Outcome of one detector invocation.
///
/// Created fresh per call. Detector-specific fields are `None` for the
/// detectors that do not produce them and are omitted from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub anomaly: bool,
    pub score: f64,
    /// Bounded to [0, 1].
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_inactivity_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid_deviation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_deviation: Option<f64>,
    /// Wall-clock time the result was produced (RFC 3339, UTC).
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: DetectionKind,
}

impl DetectionResult {
    /// Create a result stamped with the current time.
    pub fn new(kind: DetectionKind, anomaly: bool, score: f64, confidence: f64) -> Self {
        Self {
            anomaly,
            score,
            confidence: confidence.clamp(0.0, 1.0),
            max_inactivity_minutes: None,
            threshold_minutes: None,
            centroid_deviation: None,
            length_deviation: None,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            kind,
        }
    }

    /// Safe default returned when fewer than two points were supplied.
    pub fn insufficient_data(kind: DetectionKind) -> Self {
        Self::new(kind, false, 0.0, 0.0)
    }

    pub fn with_inactivity(mut self, max_inactivity_minutes: f64, threshold_minutes: f64) -> Self {
        self.max_inactivity_minutes = Some(max_inactivity_minutes);
        self.threshold_minutes = Some(threshold_minutes);
        self
    }

    pub fn with_route_metrics(mut self, centroid_deviation: f64, length_deviation: f64) -> Self {
        self.centroid_deviation = Some(centroid_deviation);
        self.length_deviation = Some(length_deviation);
        self
    }

    /// Compare everything but the production timestamp.
    pub fn same_outcome(&self, other: &Self) -> bool {
        Self {
            timestamp: String::new(),
            ..self.clone()
        } == Self {
            timestamp: String::new(),
            ..other.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&DetectionKind::ProlongedInactivity).unwrap();
        assert_eq!(json, "\"prolonged_inactivity\"");
    }

    #[test]
    fn test_training_keys() {
        assert_eq!(
            DetectionKind::from_training_key("location_data"),
            Some(DetectionKind::LocationDropoff)
        );
        assert_eq!(
            DetectionKind::from_training_key("route_deviation"),
            Some(DetectionKind::RouteDeviation)
        );
        assert_eq!(DetectionKind::from_training_key("health_data"), None);
    }

    #[test]
    fn test_insufficient_data_is_safe_default() {
        let result = DetectionResult::insufficient_data(DetectionKind::RouteDeviation);
        assert!(!result.anomaly);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let result = DetectionResult::new(DetectionKind::LocationDropoff, true, 4.2, 4.2);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_json_shape_omits_unused_fields() {
        let result = DetectionResult::new(DetectionKind::LocationDropoff, false, 0.4, 0.1);
        let value = serde_json::to_value(&result).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["type"], "location_dropoff");
        assert!(obj.contains_key("timestamp"));
        assert!(!obj.contains_key("max_inactivity_minutes"));
        assert!(!obj.contains_key("centroid_deviation"));
    }

    #[test]
    fn test_json_shape_inactivity_fields() {
        let result = DetectionResult::new(DetectionKind::ProlongedInactivity, true, 0.5, 0.5)
            .with_inactivity(45.0, 30.0);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["max_inactivity_minutes"], 45.0);
        assert_eq!(value["threshold_minutes"], 30.0);
        assert_eq!(value["type"], "prolonged_inactivity");
    }

    #[test]
    fn test_same_outcome_ignores_timestamp() {
        let a = DetectionResult::new(DetectionKind::RouteDeviation, false, 0.1, 0.1);
        let mut b = a.clone();
        b.timestamp = "2000-01-01T00:00:00Z".to_string();
        assert!(a.same_outcome(&b));
        b.score = 0.2;
        assert!(!a.same_outcome(&b));
    }
}
