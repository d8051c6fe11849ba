//! Motion feature extraction from location sequences.

use anomaly_spi::{FeatureVector, LocationPoint, Result};
use chrono::{DateTime, Utc};

/// Guard added to the time delta before dividing distance by it.
pub const SPEED_EPSILON: f64 = 1e-6;

/// Parse every timestamp and stable-sort the points ascending by instant.
pub(crate) fn sort_by_timestamp(
    points: &[LocationPoint],
) -> Result<Vec<(DateTime<Utc>, &LocationPoint)>> {
    let mut timed = points
        .iter()
        .map(|point| Ok((point.parsed_timestamp()?, point)))
        .collect::<Result<Vec<_>>>()?;
    timed.sort_by_key(|(instant, _)| *instant);
    Ok(timed)
}

/// Seconds from `start` to `end`, with sub-second precision.
pub(crate) fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let delta = end - start;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Turn a location sequence into per-step motion features.
///
/// Points are sorted by timestamp first, so out-of-order batches are
/// accepted. Returns `Ok(None)` for fewer than two points; otherwise one
/// vector per consecutive pair. Malformed timestamps or non-finite
/// coordinates are errors.
pub fn extract_features(points: &[LocationPoint]) -> Result<Option<Vec<FeatureVector>>> {
    if points.len() < 2 {
        return Ok(None);
    }
    for point in points {
        point.validate_coordinates()?;
    }

    let timed = sort_by_timestamp(points)?;
    let features = timed
        .windows(2)
        .map(|pair| {
            let (start, previous) = pair[0];
            let (end, current) = pair[1];
            let time_diff_seconds = seconds_between(start, end);
            let distance = (current.latitude - previous.latitude)
                .hypot(current.longitude - previous.longitude);
            FeatureVector {
                latitude: current.latitude,
                longitude: current.longitude,
                time_diff_seconds,
                distance,
                speed: distance / (time_diff_seconds + SPEED_EPSILON),
            }
        })
        .collect();

    Ok(Some(features))
}

/// Flatten feature vectors into model rows.
pub fn feature_rows(features: &[FeatureVector]) -> Vec<Vec<f64>> {
    features.iter().map(FeatureVector::to_row).collect()
}
