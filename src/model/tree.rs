//! CART classification tree
//!
//! Exact-greedy splits on Gini impurity. The feature visiting order at each
//! node comes from a seeded shuffle and ties keep the first candidate seen,
//! so a fixed seed always yields the same tree.

use serde::Serialize;

use super::deterministic::LcgRng;
use crate::data::{EncodedRecord, NUM_FEATURES};

/// Structural parameters for a single tree
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Leaf {
        class: u32,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Fitted classification tree
#[derive(Clone, Debug)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    depth: usize,
}

impl DecisionTree {
    /// Predicted class code for one feature vector
    pub fn predict(&self, features: &[f64; NUM_FEATURES]) -> u32 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    #[cfg(test)]
    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Best split found for a node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Sum over children of `n_child * gini_child`
    weighted_impurity: f64,
}

/// Builds a [`DecisionTree`] from encoded records
pub struct CartBuilder<'a> {
    records: &'a [EncodedRecord],
    config: &'a TreeConfig,
    num_classes: usize,
    rng: LcgRng,
    nodes: Vec<Node>,
    depth: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        records: &'a [EncodedRecord],
        config: &'a TreeConfig,
        num_classes: usize,
        seed: u64,
    ) -> Self {
        Self {
            records,
            config,
            num_classes,
            rng: LcgRng::new(seed),
            nodes: Vec::new(),
            depth: 0,
        }
    }

    /// Grow the tree. Callers guarantee at least one record.
    pub fn build(mut self) -> DecisionTree {
        let indices: Vec<usize> = (0..self.records.len()).collect();
        self.build_node(&indices, 0);

        DecisionTree {
            nodes: self.nodes,
            depth: self.depth,
        }
    }

    fn build_node(&mut self, indices: &[usize], depth: usize) -> usize {
        let current_idx = self.nodes.len();
        self.depth = self.depth.max(depth);

        let counts = self.class_counts(indices);
        let leaf = Node::Leaf {
            class: majority_class(&counts),
        };

        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if is_pure || depth_reached || indices.len() < self.config.min_samples_split {
            self.nodes.push(leaf);
            return current_idx;
        }

        let split = match self.find_best_split(indices) {
            Some(s) => s,
            None => {
                self.nodes.push(leaf);
                return current_idx;
            }
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| self.records[i].features[split.feature] <= split.threshold);

        // Reserve the slot, children are patched in after they are built
        self.nodes.push(leaf);
        let left = self.build_node(&left_indices, depth + 1);
        let right = self.build_node(&right_indices, depth + 1);

        self.nodes[current_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        current_idx
    }

    fn find_best_split(&mut self, indices: &[usize]) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..NUM_FEATURES).collect();
        self.rng.shuffle(&mut features);

        let mut best: Option<SplitCandidate> = None;
        for feature in features {
            if let Some(candidate) = self.best_split_on(indices, feature) {
                let better = best
                    .map(|b| candidate.weighted_impurity < b.weighted_impurity)
                    .unwrap_or(true);
                if better {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Sweep the sorted values of one feature, scoring every boundary
    fn best_split_on(&self, indices: &[usize], feature: usize) -> Option<SplitCandidate> {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_by(|&a, &b| {
            self.records[a].features[feature].total_cmp(&self.records[b].features[feature])
        });

        let n = sorted.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let mut left_counts = vec![0usize; self.num_classes];
        let mut right_counts = self.class_counts(indices);
        let mut best: Option<SplitCandidate> = None;

        for k in 0..n.saturating_sub(1) {
            let class = self.records[sorted[k]].target as usize;
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let current = self.records[sorted[k]].features[feature];
            let next = self.records[sorted[k + 1]].features[feature];
            if current >= next {
                continue;
            }

            let n_left = k + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let weighted_impurity = weighted_gini(&left_counts, n_left)
                + weighted_gini(&right_counts, n_right);

            if best.map_or(true, |b| weighted_impurity < b.weighted_impurity) {
                let mut threshold = (current + next) / 2.0;
                if threshold >= next {
                    threshold = current;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    weighted_impurity,
                });
            }
        }

        best
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.num_classes];
        for &i in indices {
            counts[self.records[i].target as usize] += 1;
        }
        counts
    }
}

/// `n * gini`, i.e. `n - sum(c^2) / n`
fn weighted_gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = counts.iter().map(|&c| (c * c) as f64).sum();
    n as f64 - sum_sq / n as f64
}

/// Most frequent class, lowest code on ties
fn majority_class(counts: &[usize]) -> u32 {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best as u32
}
