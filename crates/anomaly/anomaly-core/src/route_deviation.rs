//! Route deviation scoring.
//!
//! Compares a travelled path with the planned itinerary on two axes: how far
//! apart their centroids sit (relative to the magnitude of the planned
//! centroid) and how different their lengths are (relative to the planned
//! length). Distances are planar in degree-space. The centroid term depends
//! on the absolute coordinate frame, so the score is not translation
//! invariant.

use anomaly_api::RouteDeviationConfig;
use anomaly_spi::{DetectionKind, DetectionResult, PathPoint, Result};

/// Guard added to both deviation denominators.
pub const DEVIATION_EPSILON: f64 = 1e-6;

/// Sub-metrics of a route comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteMetrics {
    pub centroid_deviation: f64,
    pub length_deviation: f64,
    pub deviation_score: f64,
}

/// Scores how far a travelled path strays from a planned itinerary.
#[derive(Debug, Clone, Default)]
pub struct RouteDeviationScorer {
    config: RouteDeviationConfig,
}

impl RouteDeviationScorer {
    pub fn new(config: RouteDeviationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Compute the deviation metrics; `None` when either path has fewer
    /// than two points.
    pub fn metrics(&self, current: &[PathPoint], planned: &[PathPoint]) -> Result<Option<RouteMetrics>> {
        if current.len() < 2 || planned.len() < 2 {
            return Ok(None);
        }
        for point in current.iter().chain(planned) {
            point.validate_coordinates()?;
        }

        let current_centroid = centroid(current);
        let planned_centroid = centroid(planned);
        let centroid_distance = distance(current_centroid, planned_centroid);
        let planned_magnitude = planned_centroid.0.hypot(planned_centroid.1);
        let centroid_deviation = centroid_distance / (planned_magnitude + DEVIATION_EPSILON);

        let current_length = path_length(current);
        let planned_length = path_length(planned);
        let length_deviation =
            (current_length - planned_length).abs() / (planned_length + DEVIATION_EPSILON);

        let deviation_score = self.config.centroid_weight * centroid_deviation
            + self.config.length_weight * length_deviation;

        Ok(Some(RouteMetrics {
            centroid_deviation,
            length_deviation,
            deviation_score,
        }))
    }

    /// Score a path against an itinerary.
    pub fn score(&self, current: &[PathPoint], planned: &[PathPoint]) -> Result<DetectionResult> {
        let Some(metrics) = self.metrics(current, planned)? else {
            return Ok(DetectionResult::insufficient_data(DetectionKind::RouteDeviation));
        };
        Ok(DetectionResult::new(
            DetectionKind::RouteDeviation,
            metrics.deviation_score > self.config.threshold,
            metrics.deviation_score,
            metrics.deviation_score.min(1.0),
        )
        .with_route_metrics(metrics.centroid_deviation, metrics.length_deviation))
    }
}

/// Arithmetic mean position as `(latitude, longitude)`.
fn centroid(path: &[PathPoint]) -> (f64, f64) {
    let n = path.len() as f64;
    let (lat, lon) = path
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.latitude, lon + p.longitude));
    (lat / n, lon / n)
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Sum of consecutive-point distances.
pub fn path_length(path: &[PathPoint]) -> f64 {
    path.windows(2)
        .map(|pair| {
            distance(
                (pair[0].latitude, pair[0].longitude),
                (pair[1].latitude, pair[1].longitude),
            )
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(coords: &[(f64, f64)]) -> Vec<PathPoint> {
        coords.iter().map(|&(lat, lon)| PathPoint::new(lat, lon)).collect()
    }

    fn shifted(points: &[PathPoint], dlat: f64, dlon: f64) -> Vec<PathPoint> {
        points
            .iter()
            .map(|p| PathPoint::new(p.latitude + dlat, p.longitude + dlon))
            .collect()
    }

    #[test]
    fn test_short_paths_are_not_anomalous() {
        let scorer = RouteDeviationScorer::default();
        let one = path(&[(1.0, 1.0)]);
        let two = path(&[(1.0, 1.0), (2.0, 2.0)]);
        for (current, planned) in [(&one, &two), (&two, &one)] {
            let result = scorer.score(current, planned).unwrap();
            assert!(!result.anomaly);
            assert_eq!(result.score, 0.0);
        }
    }

    #[test]
    fn test_out_and_back_against_itself() {
        let out_and_back = path(&[
            (27.175, 78.042),
            (27.176, 78.043),
            (27.177, 78.044),
            (27.176, 78.043),
            (27.175, 78.042),
        ]);
        let result = RouteDeviationScorer::default()
            .score(&out_and_back, &out_and_back)
            .unwrap();
        assert_eq!(result.score, 0.0);
        assert!(!result.anomaly);
        assert_eq!(result.centroid_deviation, Some(0.0));
        assert_eq!(result.length_deviation, Some(0.0));
    }

    #[test]
    fn test_weighted_combination() {
        let planned = path(&[(3.0, 0.0), (3.0, 4.0)]);
        let current = path(&[(6.0, 0.0), (6.0, 8.0)]);
        let metrics = RouteDeviationScorer::default()
            .metrics(&current, &planned)
            .unwrap()
            .unwrap();

        // Centroids (3, 2) and (6, 4); lengths 4 and 8.
        let expected_centroid = 13f64.sqrt() / (13f64.sqrt() + DEVIATION_EPSILON);
        let expected_length = 4.0 / (4.0 + DEVIATION_EPSILON);
        assert!((metrics.centroid_deviation - expected_centroid).abs() < 1e-12);
        assert!((metrics.length_deviation - expected_length).abs() < 1e-12);
        assert!(
            (metrics.deviation_score - (0.6 * expected_centroid + 0.4 * expected_length)).abs()
                < 1e-12
        );
    }

    #[test]
    fn test_threshold_and_confidence() {
        let planned = path(&[(3.0, 0.0), (3.0, 4.0)]);
        let current = path(&[(6.0, 0.0), (6.0, 8.0)]);
        let result = RouteDeviationScorer::default()
            .score(&current, &planned)
            .unwrap();
        assert!(result.anomaly);
        assert!(result.score > 0.3);
        assert_eq!(result.confidence, result.score.min(1.0));
    }

    #[test]
    fn test_not_translation_invariant() {
        let planned = path(&[(10.0, 10.0), (10.0, 11.0), (11.0, 11.0)]);
        let current = path(&[(10.5, 10.0), (10.5, 11.0), (11.5, 11.0)]);
        let scorer = RouteDeviationScorer::default();
        let base = scorer.metrics(&current, &planned).unwrap().unwrap();

        let moved = scorer
            .metrics(&shifted(&current, 40.0, -25.0), &shifted(&planned, 40.0, -25.0))
            .unwrap()
            .unwrap();
        assert!((base.centroid_deviation - moved.centroid_deviation).abs() > 1e-6);
        assert!((base.length_deviation - moved.length_deviation).abs() < 1e-9);

        let unmoved = scorer
            .metrics(&shifted(&current, 0.0, 0.0), &shifted(&planned, 0.0, 0.0))
            .unwrap()
            .unwrap();
        assert_eq!(base, unmoved);
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        let good = path(&[(1.0, 1.0), (2.0, 2.0)]);
        let bad = path(&[(1.0, f64::NAN), (2.0, 2.0)]);
        assert!(RouteDeviationScorer::default().score(&bad, &good).is_err());
    }

    #[test]
    fn test_path_length() {
        assert_eq!(path_length(&path(&[(0.0, 0.0), (3.0, 4.0), (3.0, 0.0)])), 9.0);
        assert_eq!(path_length(&path(&[(0.0, 0.0)])), 0.0);
    }
}
