//! Tire classifier: deterministic CART training and the fitted model

pub mod deterministic;
pub mod trainer;
pub mod tree;

use serde::Serialize;

use crate::data::{EncodedRecord, NUM_FEATURES};
use tree::DecisionTree;

pub use trainer::{Trainer, DEFAULT_SEED};
pub use tree::TreeConfig;

/// Anything that maps a feature vector to a `next_tire` code
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &[f64; NUM_FEATURES]) -> u32;
}

/// Trained classifier, immutable after construction
#[derive(Debug, Clone)]
pub struct Model {
    tree: DecisionTree,
    seed: u64,
    trained_on: usize,
}

/// Shape of a trained model for status displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub records: usize,
    pub depth: usize,
    pub leaves: usize,
    pub seed: u64,
}

impl Model {
    /// Predicted `next_tire` code
    pub fn predict(&self, features: &[f64; NUM_FEATURES]) -> u32 {
        self.tree.predict(features)
    }

    pub fn trained_on(&self) -> usize {
        self.trained_on
    }

    /// Fraction of records the model labels correctly
    ///
    /// Diagnostic only. Computed on the same data the model was fit on.
    pub fn training_accuracy(&self, records: &[EncodedRecord]) -> f64 {
        if records.is_empty() {
            return 0.0;
        }
        let correct = records
            .iter()
            .filter(|r| self.predict(&r.features) == r.target)
            .count();
        correct as f64 / records.len() as f64
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            records: self.trained_on,
            depth: self.tree.depth(),
            leaves: self.tree.leaf_count(),
            seed: self.seed,
        }
    }
}

impl Classifier for Model {
    fn predict(&self, features: &[f64; NUM_FEATURES]) -> u32 {
        Model::predict(self, features)
    }
}
