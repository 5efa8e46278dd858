//! Decision trees and the bagged ensemble.
//!
//! # Algorithm
//!
//! Each tree is grown by recursively choosing the (feature, threshold)
//! split with the highest information gain over the entropy of the
//! crew-size distribution in the node. Leaves store the **median** crew
//! size of their samples, which is robust against the occasional
//! six-person outlier in the history. The ensemble bags trees over
//! bootstrap resamples with per-tree feature subsampling; prediction is
//! the mean of the tree outputs, and the spread across trees doubles as
//! a confidence signal.
//!
//! This is a heuristic predictor, not a learned statistical model — no
//! training framework is involved by design.
//!
//! # Reference
//! Breiman (1996), "Bagging Predictors", *Machine Learning* 24(2)
//! Quinlan (1986), "Induction of Decision Trees", *Machine Learning* 1(1)

use rand::Rng;

use super::features::FEATURE_COUNT;

/// One training sample: feature vector plus observed crew size.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Feature vector.
    pub features: [f64; FEATURE_COUNT],
    /// Crew size actually used.
    pub crew_size: u32,
}

/// Tree growth limits.
#[derive(Debug, Clone, Copy)]
pub struct TreeConfig {
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum samples required to attempt a split.
    pub min_split: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_split: 5,
        }
    }
}

/// Ensemble hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct EnsembleConfig {
    /// Number of bagged trees.
    pub n_trees: usize,
    /// Per-tree growth limits.
    pub tree: TreeConfig,
    /// Fraction of features each tree may split on.
    pub feature_fraction: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            tree: TreeConfig::default(),
            feature_fraction: 0.7,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A single regression-by-median decision tree.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    /// Grows a tree on the given samples, splitting only on the listed
    /// candidate features.
    pub fn grow(samples: &[Sample], candidate_features: &[usize], config: &TreeConfig) -> Self {
        let indices: Vec<usize> = (0..samples.len()).collect();
        let root = build_node(samples, &indices, candidate_features, config, 0);
        Self { root }
    }

    /// Predicted crew size for a feature vector.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

fn build_node(
    samples: &[Sample],
    indices: &[usize],
    candidates: &[usize],
    config: &TreeConfig,
    depth: usize,
) -> Node {
    if depth >= config.max_depth || indices.len() < config.min_split {
        return Node::Leaf(median_crew_size(samples, indices));
    }

    let parent_entropy = crew_entropy(samples, indices);
    if parent_entropy == 0.0 {
        // Node is pure.
        return Node::Leaf(median_crew_size(samples, indices));
    }

    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, gain)
    for &feature in candidates {
        let mut values: Vec<f64> = indices.iter().map(|&i| samples[i].features[feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| samples[i].features[feature] <= threshold);
            if left.is_empty() || right.is_empty() {
                continue;
            }

            let n = indices.len() as f64;
            let gain = parent_entropy
                - (left.len() as f64 / n) * crew_entropy(samples, &left)
                - (right.len() as f64 / n) * crew_entropy(samples, &right);

            if best.map_or(gain > 1e-12, |(_, _, g)| gain > g) {
                best = Some((feature, threshold, gain));
            }
        }
    }

    match best {
        None => Node::Leaf(median_crew_size(samples, indices)),
        Some((feature, threshold, _)) => {
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| samples[i].features[feature] <= threshold);
            Node::Split {
                feature,
                threshold,
                left: Box::new(build_node(samples, &left, candidates, config, depth + 1)),
                right: Box::new(build_node(samples, &right, candidates, config, depth + 1)),
            }
        }
    }
}

/// Shannon entropy of the crew-size distribution in a node.
fn crew_entropy(samples: &[Sample], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    let mut counts = std::collections::HashMap::new();
    for &i in indices {
        *counts.entry(samples[i].crew_size).or_insert(0usize) += 1;
    }
    let n = indices.len() as f64;
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

/// Median crew size of a node's samples.
fn median_crew_size(samples: &[Sample], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 2.0; // sensible default crew
    }
    let mut sizes: Vec<u32> = indices.iter().map(|&i| samples[i].crew_size).collect();
    sizes.sort_unstable();
    let mid = sizes.len() / 2;
    if sizes.len() % 2 == 1 {
        sizes[mid] as f64
    } else {
        (sizes[mid - 1] + sizes[mid]) as f64 / 2.0
    }
}

/// A bootstrap-aggregated collection of decision trees.
#[derive(Debug, Clone)]
pub struct Ensemble {
    trees: Vec<DecisionTree>,
}

impl Ensemble {
    /// Trains the ensemble on the given samples.
    ///
    /// Each tree sees a bootstrap resample (same size, drawn with
    /// replacement) and a random subset of the features. Training is the
    /// only randomized phase; prediction is deterministic afterwards.
    pub fn train<R: Rng>(samples: &[Sample], config: &EnsembleConfig, rng: &mut R) -> Self {
        let n = samples.len();
        let n_features = ((FEATURE_COUNT as f64 * config.feature_fraction).ceil() as usize)
            .clamp(1, FEATURE_COUNT);

        let trees = (0..config.n_trees)
            .map(|_| {
                let bootstrap: Vec<Sample> = (0..n)
                    .map(|_| samples[rng.random_range(0..n)].clone())
                    .collect();

                // Sample a feature subset without replacement.
                let mut features: Vec<usize> = (0..FEATURE_COUNT).collect();
                for i in (1..features.len()).rev() {
                    let j = rng.random_range(0..=i);
                    features.swap(i, j);
                }
                features.truncate(n_features);

                DecisionTree::grow(&bootstrap, &features, &config.tree)
            })
            .collect();

        Self { trees }
    }

    /// Mean and variance of the per-tree predictions.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> (f64, f64) {
        if self.trees.is_empty() {
            return (2.0, 0.0);
        }
        let outputs: Vec<f64> = self.trees.iter().map(|t| t.predict(features)).collect();
        let n = outputs.len() as f64;
        let mean = outputs.iter().sum::<f64>() / n;
        let variance = outputs.iter().map(|o| (o - mean).powi(2)).sum::<f64>() / n;
        (mean, variance)
    }

    /// Number of trees in the ensemble.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Whether the ensemble holds no trees.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}
