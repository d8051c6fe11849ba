//! Anomaly Engine API
//!
//! Configuration types and request contracts for the anomaly engine.

use serde::{Deserialize, Serialize};

mod request;

pub use request::{
    DropoffRequest, InactivityRequest, ModelPathRequest, RouteDeviationRequest, TrainRequest,
    DEFAULT_MODEL_PATH,
};

// Re-export SPI types
pub use anomaly_spi::{
    AnomalyError, DetectionKind, DetectionResult, LocationPoint, OperationStatus, PathPoint,
    Result, TrainingBatch,
};

// ============================================================================
// Isolation Forest Configuration
// ============================================================================

/// Per-tree subsample size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxSamples {
    /// `min(256, n)` rows per tree.
    Auto,
    /// A fixed row count, capped at the training set size.
    Count(usize),
}

impl MaxSamples {
    /// Upper bound on the automatic subsample size.
    pub const AUTO_LIMIT: usize = 256;

    /// Rows drawn per tree for a training set of `n` rows.
    pub fn resolve(&self, n: usize) -> usize {
        match self {
            MaxSamples::Auto => n.min(Self::AUTO_LIMIT),
            MaxSamples::Count(count) => n.min(*count),
        }
    }
}

impl Default for MaxSamples {
    fn default() -> Self {
        MaxSamples::Auto
    }
}

/// Isolation forest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationForestConfig {
    /// Fraction of training rows treated as anomalous when calibrating the
    /// decision threshold (default: 0.1).
    pub contamination: f64,
    /// Ensemble size (default: 100).
    pub tree_count: usize,
    /// Per-tree subsample size (default: auto).
    pub max_samples: MaxSamples,
    /// Random seed for tree induction (default: 42).
    pub seed: u64,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            contamination: 0.1,
            tree_count: 100,
            max_samples: MaxSamples::Auto,
            seed: 42,
        }
    }
}

impl IsolationForestConfig {
    pub fn new(contamination: f64, tree_count: usize) -> Self {
        Self {
            contamination,
            tree_count,
            ..Self::default()
        }
    }

    pub fn with_max_samples(mut self, max_samples: MaxSamples) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(AnomalyError::invalid(
                "contamination",
                format!("must be in (0, 0.5], got {}", self.contamination),
            ));
        }
        if self.tree_count == 0 {
            return Err(AnomalyError::invalid("tree_count", "must be at least 1"));
        }
        if self.max_samples == MaxSamples::Count(0) {
            return Err(AnomalyError::invalid("max_samples", "must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Rule Detector Configuration
// ============================================================================

/// Inactivity detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InactivityConfig {
    /// Longest tolerated gap between fixes in minutes (default: 30).
    pub threshold_minutes: f64,
}

impl Default for InactivityConfig {
    fn default() -> Self {
        Self {
            threshold_minutes: 30.0,
        }
    }
}

impl InactivityConfig {
    pub fn new(threshold_minutes: f64) -> Self {
        Self { threshold_minutes }
    }

    pub fn validate(&self) -> Result<()> {
        validate_threshold_minutes(self.threshold_minutes)
    }
}

/// Check an inactivity threshold supplied by config or by a request.
pub fn validate_threshold_minutes(threshold_minutes: f64) -> Result<()> {
    if threshold_minutes.is_finite() && threshold_minutes > 0.0 {
        Ok(())
    } else {
        Err(AnomalyError::invalid(
            "threshold_minutes",
            format!("must be positive and finite, got {}", threshold_minutes),
        ))
    }
}

/// Route deviation scorer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteDeviationConfig {
    /// Weight of the centroid deviation term (default: 0.6).
    pub centroid_weight: f64,
    /// Weight of the path length deviation term (default: 0.4).
    pub length_weight: f64,
    /// Combined score above which the path is anomalous (default: 0.3).
    pub threshold: f64,
}

impl Default for RouteDeviationConfig {
    fn default() -> Self {
        Self {
            centroid_weight: 0.6,
            length_weight: 0.4,
            threshold: 0.3,
        }
    }
}

impl RouteDeviationConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("centroid_weight", self.centroid_weight),
            ("length_weight", self.length_weight),
            ("threshold", self.threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnomalyError::invalid(
                    name,
                    format!("must be finite and non-negative, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Engine Configuration
// ============================================================================

/// How the location-dropoff detector obtains its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Refit the normalizer and forest on every scoring window (default).
    WindowRefit,
    /// Reuse the normalizer and forest produced by `train`.
    Trained,
}

impl Default for ScoringMode {
    fn default() -> Self {
        ScoringMode::WindowRefit
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub isolation_forest: IsolationForestConfig,
    pub inactivity: InactivityConfig,
    pub route_deviation: RouteDeviationConfig,
    pub scoring_mode: ScoringMode,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_isolation_forest(mut self, config: IsolationForestConfig) -> Self {
        self.isolation_forest = config;
        self
    }

    pub fn with_inactivity(mut self, config: InactivityConfig) -> Self {
        self.inactivity = config;
        self
    }

    pub fn with_route_deviation(mut self, config: RouteDeviationConfig) -> Self {
        self.route_deviation = config;
        self
    }

    pub fn with_scoring_mode(mut self, mode: ScoringMode) -> Self {
        self.scoring_mode = mode;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.isolation_forest.validate()?;
        self.inactivity.validate()?;
        self.route_deviation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.isolation_forest.contamination, 0.1);
        assert_eq!(config.isolation_forest.tree_count, 100);
        assert_eq!(config.isolation_forest.max_samples, MaxSamples::Auto);
        assert_eq!(config.isolation_forest.seed, 42);
        assert_eq!(config.inactivity.threshold_minutes, 30.0);
        assert_eq!(config.route_deviation.threshold, 0.3);
        assert_eq!(config.scoring_mode, ScoringMode::WindowRefit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_samples_resolve() {
        assert_eq!(MaxSamples::Auto.resolve(10), 10);
        assert_eq!(MaxSamples::Auto.resolve(1000), 256);
        assert_eq!(MaxSamples::Count(64).resolve(1000), 64);
        assert_eq!(MaxSamples::Count(64).resolve(8), 8);
    }

    #[test]
    fn test_contamination_bounds() {
        assert!(IsolationForestConfig::new(0.0, 10).validate().is_err());
        assert!(IsolationForestConfig::new(0.6, 10).validate().is_err());
        assert!(IsolationForestConfig::new(0.5, 10).validate().is_ok());
        assert!(IsolationForestConfig::new(f64::NAN, 10).validate().is_err());
    }

    #[test]
    fn test_tree_count_and_samples_must_be_positive() {
        assert!(IsolationForestConfig::new(0.1, 0).validate().is_err());
        let config = IsolationForestConfig::default().with_max_samples(MaxSamples::Count(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_minutes_validation() {
        assert!(InactivityConfig::new(15.0).validate().is_ok());
        assert!(InactivityConfig::new(0.0).validate().is_err());
        assert!(InactivityConfig::new(-5.0).validate().is_err());
        assert!(validate_threshold_minutes(f64::INFINITY).is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{"isolation_forest": {"tree_count": 25}, "scoring_mode": "trained"}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.isolation_forest.tree_count, 25);
        assert_eq!(config.isolation_forest.contamination, 0.1);
        assert_eq!(config.inactivity.threshold_minutes, 30.0);
        assert_eq!(config.scoring_mode, ScoringMode::Trained);
    }

    #[test]
    fn test_max_samples_json() {
        let auto: MaxSamples = serde_json::from_str("\"auto\"").unwrap();
        let count: MaxSamples = serde_json::from_str(r#"{"count": 64}"#).unwrap();
        assert_eq!(auto, MaxSamples::Auto);
        assert_eq!(count, MaxSamples::Count(64));
    }
}
