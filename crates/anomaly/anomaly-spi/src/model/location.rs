//! Location and motion feature types.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnomalyError, Result};

/// Accepted layouts for timestamps that carry no UTC offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// A single timestamped GPS fix reported by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// ISO-8601 timestamp as received from the ingestion pipeline.
    pub timestamp: String,
}

impl LocationPoint {
    pub fn new(latitude: f64, longitude: f64, timestamp: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: timestamp.into(),
        }
    }

    /// Parse the raw timestamp into a UTC instant.
    pub fn parsed_timestamp(&self) -> Result<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// Reject coordinates that are NaN or infinite.
    pub fn validate_coordinates(&self) -> Result<()> {
        validate_coordinate("latitude", self.latitude)?;
        validate_coordinate("longitude", self.longitude)
    }
}

/// A coordinate pair on a path or itinerary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl PathPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn validate_coordinates(&self) -> Result<()> {
        validate_coordinate("latitude", self.latitude)?;
        validate_coordinate("longitude", self.longitude)
    }
}

impl From<&LocationPoint> for PathPoint {
    fn from(point: &LocationPoint) -> Self {
        Self::new(point.latitude, point.longitude)
    }
}

impl From<LocationPoint> for PathPoint {
    fn from(point: LocationPoint) -> Self {
        Self::new(point.latitude, point.longitude)
    }
}

/// Number of dimensions in a [`FeatureVector`].
pub const FEATURE_DIMENSIONS: usize = 5;

/// Column names of a [`FeatureVector`] row, in row order.
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSIONS] =
    ["latitude", "longitude", "time_diff_seconds", "distance", "speed"];

/// Motion descriptor derived from one consecutive pair of location points.
///
/// `latitude` and `longitude` are those of the later point of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub latitude: f64,
    pub longitude: f64,
    pub time_diff_seconds: f64,
    /// Planar distance in degree-space.
    pub distance: f64,
    pub speed: f64,
}

impl FeatureVector {
    /// Flatten into a row ordered as [`FEATURE_NAMES`].
    pub fn to_row(&self) -> Vec<f64> {
        vec![
            self.latitude,
            self.longitude,
            self.time_diff_seconds,
            self.distance,
            self.speed,
        ]
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Offsets are honored; naive timestamps are read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| AnomalyError::parse("timestamp", raw, "expected an ISO-8601 date-time"))
}

fn validate_coordinate(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AnomalyError::parse(field, value.to_string(), "coordinate must be finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339_utc() {
        let ts = parse_timestamp("2025-09-08T10:00:00Z").unwrap();
        assert_eq!(ts.timestamp(), 1_757_325_600);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let utc = parse_timestamp("2025-09-08T10:00:00Z").unwrap();
        let offset = parse_timestamp("2025-09-08T15:30:00+05:30").unwrap();
        assert_eq!(utc, offset);
    }

    #[test]
    fn test_parse_naive_as_utc() {
        let naive = parse_timestamp("2025-09-08T10:00:00").unwrap();
        let spaced = parse_timestamp("2025-09-08 10:00:00").unwrap();
        let utc = parse_timestamp("2025-09-08T10:00:00Z").unwrap();
        assert_eq!(naive, utc);
        assert_eq!(spaced, utc);
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let ts = parse_timestamp("2025-09-08T10:00:00.250").unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_timestamp("half past ten").unwrap_err();
        assert!(matches!(err, AnomalyError::ParseFailure { .. }));
    }

    #[test]
    fn test_location_point_deserializes() {
        let json = r#"{"latitude": 27.175015, "longitude": 78.042155, "timestamp": "2025-09-08T10:00:00Z"}"#;
        let point: LocationPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.latitude, 27.175015);
        assert!(point.parsed_timestamp().is_ok());
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let point = LocationPoint::new(f64::NAN, 78.0, "2025-09-08T10:00:00Z");
        assert!(point.validate_coordinates().is_err());
        assert!(PathPoint::new(27.0, f64::INFINITY).validate_coordinates().is_err());
    }

    #[test]
    fn test_path_point_ignores_timestamp() {
        let json = r#"{"latitude": 1.0, "longitude": 2.0, "timestamp": "2025-09-08T10:00:00Z"}"#;
        let point: PathPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point, PathPoint::new(1.0, 2.0));
    }

    #[test]
    fn test_feature_row_order() {
        let fv = FeatureVector {
            latitude: 1.0,
            longitude: 2.0,
            time_diff_seconds: 3.0,
            distance: 4.0,
            speed: 5.0,
        };
        assert_eq!(fv.to_row(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(FEATURE_NAMES.len(), fv.to_row().len());
    }
}
