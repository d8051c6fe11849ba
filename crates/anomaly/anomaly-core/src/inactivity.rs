//! Prolonged inactivity detection.

use anomaly_api::{validate_threshold_minutes, InactivityConfig};
use anomaly_spi::{DetectionKind, DetectionResult, LocationDetector, LocationPoint, Result};

use crate::features::{seconds_between, sort_by_timestamp};

/// Flags gaps between consecutive fixes longer than a threshold.
///
/// Pure rule over timestamps; coordinates are ignored.
#[derive(Debug, Clone, Default)]
pub struct InactivityDetector {
    config: InactivityConfig,
}

impl InactivityDetector {
    pub fn new(config: InactivityConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn threshold_minutes(&self) -> f64 {
        self.config.threshold_minutes
    }

    /// Detect with an explicit threshold in place of the configured one.
    pub fn detect_with_threshold(
        &self,
        points: &[LocationPoint],
        threshold_minutes: f64,
    ) -> Result<DetectionResult> {
        validate_threshold_minutes(threshold_minutes)?;
        if points.len() < 2 {
            return Ok(DetectionResult::insufficient_data(DetectionKind::ProlongedInactivity));
        }

        let timed = sort_by_timestamp(points)?;
        let max_gap_minutes = timed
            .windows(2)
            .map(|pair| seconds_between(pair[0].0, pair[1].0) / 60.0)
            .fold(f64::NEG_INFINITY, f64::max);

        let score = ((max_gap_minutes - threshold_minutes) / threshold_minutes).max(0.0);
        Ok(DetectionResult::new(
            DetectionKind::ProlongedInactivity,
            max_gap_minutes > threshold_minutes,
            score,
            score.min(1.0),
        )
        .with_inactivity(max_gap_minutes, threshold_minutes))
    }
}

impl LocationDetector for InactivityDetector {
    fn kind(&self) -> DetectionKind {
        DetectionKind::ProlongedInactivity
    }

    fn detect(&self, points: &[LocationPoint]) -> Result<DetectionResult> {
        self.detect_with_threshold(points, self.config.threshold_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Points at the given minute offsets after 10:00 UTC.
    fn points_at(minutes: &[u32]) -> Vec<LocationPoint> {
        minutes
            .iter()
            .map(|m| {
                LocationPoint::new(
                    27.175,
                    78.042,
                    format!("2025-09-08T{:02}:{:02}:00Z", 10 + m / 60, m % 60),
                )
            })
            .collect()
    }

    #[test]
    fn test_insufficient_points() {
        let detector = InactivityDetector::default();
        let result = detector.detect(&points_at(&[0])).unwrap();
        assert!(!result.anomaly);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.max_inactivity_minutes, None);
    }

    #[test]
    fn test_gap_exactly_at_threshold_is_not_anomalous() {
        let detector = InactivityDetector::default();
        let result = detector.detect(&points_at(&[0, 30, 60])).unwrap();
        assert!(!result.anomaly);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.max_inactivity_minutes, Some(30.0));
        assert_eq!(result.threshold_minutes, Some(30.0));
    }

    #[test]
    fn test_one_minute_over_fifteen() {
        let detector = InactivityDetector::default();
        let result = detector
            .detect_with_threshold(&points_at(&[0, 16]), 15.0)
            .unwrap();
        assert!(result.anomaly);
        assert!((result.score - 1.0 / 15.0).abs() < 1e-12);
        assert!((result.confidence - 1.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_unbounded_confidence_capped() {
        let detector = InactivityDetector::new(InactivityConfig::new(10.0)).unwrap();
        let result = detector.detect(&points_at(&[0, 45])).unwrap();
        assert!((result.score - 3.5).abs() < 1e-12);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_uses_maximum_gap_after_sorting() {
        let mut points = points_at(&[0, 5, 50, 55]);
        points.reverse();
        let result = InactivityDetector::default().detect(&points).unwrap();
        assert_eq!(result.max_inactivity_minutes, Some(45.0));
        assert!(result.anomaly);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let detector = InactivityDetector::default();
        assert!(detector.detect_with_threshold(&points_at(&[0, 5]), 0.0).is_err());
        assert!(InactivityDetector::new(InactivityConfig::new(-1.0)).is_err());
    }

    #[test]
    fn test_malformed_timestamp_is_error() {
        let points = vec![
            LocationPoint::new(0.0, 0.0, "2025-09-08T10:00:00Z"),
            LocationPoint::new(0.0, 0.0, "08/09/2025"),
        ];
        assert!(InactivityDetector::default().detect(&points).is_err());
    }

    #[test]
    fn test_kind() {
        assert_eq!(
            InactivityDetector::default().kind(),
            DetectionKind::ProlongedInactivity
        );
    }
}
