//! Training batch types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::location::LocationPoint;

/// Historical location sequences keyed by detector.
///
/// Keys are resolved with [`DetectionKind::from_training_key`]; keys that
/// resolve to nothing are ignored during training.
///
/// [`DetectionKind::from_training_key`]: super::DetectionKind::from_training_key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingBatch {
    sequences: BTreeMap<String, Vec<Vec<LocationPoint>>>,
}

impl TrainingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_sequences(
        mut self,
        key: impl Into<String>,
        sequences: Vec<Vec<LocationPoint>>,
    ) -> Self {
        self.insert(key, sequences);
        self
    }

    /// Add sequences under `key`, appending to any already present.
    pub fn insert(&mut self, key: impl Into<String>, sequences: Vec<Vec<LocationPoint>>) {
        self.sequences.entry(key.into()).or_default().extend(sequences);
    }

    pub fn get(&self, key: &str) -> Option<&[Vec<LocationPoint>]> {
        self.sequences.get(key).map(Vec::as_slice)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Vec<LocationPoint>])> {
        self.sequences
            .iter()
            .map(|(key, sequences)| (key.as_str(), sequences.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }
}
