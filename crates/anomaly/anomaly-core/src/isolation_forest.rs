//! Isolation forest outlier model.
//!
//! An ensemble of randomized partitioning trees. Each tree recursively splits
//! a random subsample on a random dimension at a random threshold; points that
//! are isolated after few splits are anomalous. The score of a row is
//! `2^(-E[h] / c(ψ))` where `E[h]` is its mean path length over the ensemble
//! and `c(ψ)` the expected path length of an unsuccessful binary-search-tree
//! lookup among `ψ` subsampled rows. Scores lie in (0, 1]; higher means more
//! anomalous.

use anomaly_api::IsolationForestConfig;
use anomaly_spi::{AnomalyError, OutlierModel, OutlierScore, Result};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::normalizer::{dimension_mismatch, row_dimensions};

const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Node of an isolation tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Split {
        dimension: usize,
        /// Rows with `row[dimension] <= value` descend left.
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

/// One randomized partitioning tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn grow(rows: &[Vec<f64>], sample: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        Self {
            root: grow_node(rows, sample, 0, max_depth, rng),
        }
    }

    /// Depth of the leaf `row` lands in, adjusted for the leaf's size.
    fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                Node::Split {
                    dimension,
                    value,
                    left,
                    right,
                } => {
                    node = if row[*dimension] <= *value {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                    depth += 1;
                }
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
            }
        }
    }

    /// Every split must address an existing dimension at a finite value.
    fn validate(&self, dimensions: usize) -> Result<()> {
        let mut pending = vec![&self.root];
        while let Some(node) = pending.pop() {
            if let Node::Split {
                dimension,
                value,
                left,
                right,
            } = node
            {
                if *dimension >= dimensions {
                    return Err(AnomalyError::invalid(
                        "trees",
                        format!(
                            "split on dimension {} of a {}-dimensional forest",
                            dimension, dimensions
                        ),
                    ));
                }
                if !value.is_finite() {
                    return Err(AnomalyError::invalid("trees", "split value must be finite"));
                }
                pending.push(left.as_ref());
                pending.push(right.as_ref());
            }
        }
        Ok(())
    }
}

fn grow_node(
    rows: &[Vec<f64>],
    indices: Vec<usize>,
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> Node {
    if indices.len() <= 1 || depth >= max_depth {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let dims = rows[indices[0]].len();
    let splittable: Vec<(usize, f64, f64)> = (0..dims)
        .filter_map(|dimension| {
            let (min, max) = indices.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), &i| (lo.min(rows[i][dimension]), hi.max(rows[i][dimension])),
            );
            (max > min).then_some((dimension, min, max))
        })
        .collect();

    if splittable.is_empty() {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let (dimension, min, max) = splittable[rng.gen_range(0..splittable.len())];
    let value = rng.gen_range(min..max);
    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| rows[i][dimension] <= value);

    Node::Split {
        dimension,
        value,
        left: Box::new(grow_node(rows, left, depth + 1, max_depth, rng)),
        right: Box::new(grow_node(rows, right, depth + 1, max_depth, rng)),
    }
}

/// Expected path length `c(n)` of an unsuccessful search among `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated quantile of `values`, `q` in [0, 1].
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

/// Isolation forest with a contamination-calibrated decision threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    config: IsolationForestConfig,
    trees: Vec<IsolationTree>,
    sample_size: usize,
    dimensions: usize,
    threshold: Option<f64>,
}

impl IsolationForest {
    pub fn new(config: IsolationForestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            trees: Vec::new(),
            sample_size: 0,
            dimensions: 0,
            threshold: None,
        })
    }

    pub fn config(&self) -> &IsolationForestConfig {
        &self.config
    }

    /// Number of trees in the fitted ensemble.
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Rows drawn per tree during the last fit.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Dimensionality of the rows the forest was fitted on.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Check the structure of a forest that did not come from
    /// [`OutlierModel::fit`], such as a deserialized one. An unfitted forest
    /// is valid; a fitted one must be scorable without indexing outside its
    /// rows.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        let Some(threshold) = self.threshold else {
            return Ok(());
        };
        if !threshold.is_finite() {
            return Err(AnomalyError::invalid("threshold", "must be finite"));
        }
        if self.trees.is_empty() {
            return Err(AnomalyError::invalid("trees", "a fitted forest needs at least one tree"));
        }
        if self.dimensions == 0 {
            return Err(AnomalyError::invalid("dimensions", "must be at least 1"));
        }
        if self.sample_size == 0 {
            return Err(AnomalyError::invalid("sample_size", "must be at least 1"));
        }
        self.trees
            .iter()
            .try_for_each(|tree| tree.validate(self.dimensions))
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        let mean_path = self
            .trees
            .iter()
            .map(|tree| tree.path_length(row))
            .sum::<f64>()
            / self.trees.len() as f64;
        let normalizer = average_path_length(self.sample_size);
        let exponent = if normalizer == 0.0 {
            1.0
        } else {
            mean_path / normalizer
        };
        2f64.powf(-exponent)
    }
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self {
            config: IsolationForestConfig::default(),
            trees: Vec::new(),
            sample_size: 0,
            dimensions: 0,
            threshold: None,
        }
    }
}

impl OutlierModel for IsolationForest {
    fn fit(&mut self, rows: &[Vec<f64>]) -> Result<()> {
        let dimensions = row_dimensions(rows)?;
        if rows.iter().flatten().any(|x| !x.is_finite()) {
            return Err(AnomalyError::invalid("rows", "values must be finite"));
        }

        let n = rows.len();
        let sample_size = self.config.max_samples.resolve(n);
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;
        let seed = self.config.seed;

        // Per-tree seeds keep the ensemble independent of rayon scheduling.
        let trees: Vec<IsolationTree> = (0..self.config.tree_count)
            .into_par_iter()
            .map(|tree_index| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(tree_index as u64));
                let sample = index::sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::grow(rows, sample, max_depth, &mut rng)
            })
            .collect();

        self.trees = trees;
        self.sample_size = sample_size;
        self.dimensions = dimensions;

        let training_scores: Vec<f64> = rows.iter().map(|row| self.score_row(row)).collect();
        self.threshold = Some(quantile(
            &training_scores,
            1.0 - self.config.contamination,
        ));
        Ok(())
    }

    fn score(&self, rows: &[Vec<f64>]) -> Result<Vec<OutlierScore>> {
        let threshold = self.threshold.ok_or(AnomalyError::NotFitted)?;
        rows.iter()
            .map(|row| {
                if row.len() != self.dimensions {
                    return Err(dimension_mismatch(self.dimensions, row.len()));
                }
                let score = self.score_row(row);
                Ok(OutlierScore {
                    score,
                    is_outlier: score > threshold,
                })
            })
            .collect()
    }

    fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    fn is_fitted(&self) -> bool {
        self.threshold.is_some()
    }
}
