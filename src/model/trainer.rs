//! Single-fit trainer for the tire classifier

use tracing::info;

use super::tree::{CartBuilder, TreeConfig};
use super::Model;
use crate::data::EncodedRecord;
use crate::error::DataError;
use crate::registry::{Category, Field, TireCompound};

/// Seed used when none is configured
pub const DEFAULT_SEED: u64 = 42;

/// Fits one decision tree on every record, no hold-out split
#[derive(Debug, Clone)]
pub struct Trainer {
    seed: u64,
    config: TreeConfig,
}

impl Trainer {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: TreeConfig::default(),
        }
    }

    pub fn with_config(seed: u64, config: TreeConfig) -> Self {
        Self { seed, config }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn train(&self, records: &[EncodedRecord]) -> Result<Model, DataError> {
        if records.is_empty() {
            return Err(DataError::EmptyDataset);
        }

        // Class space is the whole registry, not just the labels present
        let num_classes = TireCompound::ALL.len();
        if let Some(bad) = records.iter().find(|r| r.target as usize >= num_classes) {
            return Err(DataError::InvalidCategory {
                field: Field::NextTire.name(),
                value: bad.target.to_string(),
                allowed: Field::NextTire.allowed(),
            });
        }
        let tree = CartBuilder::new(records, &self.config, num_classes, self.seed).build();

        info!(
            "Trained decision tree on {} records (depth {}, {} leaves, seed {})",
            records.len(),
            tree.depth(),
            tree.leaf_count(),
            self.seed
        );

        Ok(Model {
            tree,
            seed: self.seed,
            trained_on: records.len(),
        })
    }
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{encode_records, DatasetLoader};
    use crate::registry::Registry;
    use std::path::Path;

    fn sample_records() -> Vec<EncodedRecord> {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/tire_strategy_data.csv");
        let records = DatasetLoader::new(Registry::new()).load(path).unwrap();
        encode_records(&records)
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = Trainer::default().train(&[]).unwrap_err();
        assert!(matches!(err, DataError::EmptyDataset));
    }

    #[test]
    fn test_target_outside_registry_is_rejected() {
        let records = vec![
            EncodedRecord {
                features: [10.0, 30.0, 0.0, 0.0, 5.0],
                target: 1,
            },
            EncodedRecord {
                features: [20.0, 30.0, 0.0, 0.0, 5.0],
                target: 6,
            },
        ];

        match Trainer::default().train(&records).unwrap_err() {
            DataError::InvalidCategory { field, value, .. } => {
                assert_eq!(field, "next_tire");
                assert_eq!(value, "6");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let records = sample_records();
        let a = Trainer::new(42).train(&records).unwrap();
        let b = Trainer::new(42).train(&records).unwrap();

        let queries = [
            [25.0, 35.0, 0.0, 1.0, 10.0],
            [60.0, 20.0, 0.0, 2.0, 30.0],
            [12.0, 41.5, 1.0, 0.0, 2.0],
            [3.0, 15.0, 3.0, 4.0, 0.0],
        ];
        for q in &queries {
            assert_eq!(a.predict(q), b.predict(q));
        }
        assert_eq!(a.summary(), b.summary());
    }

    #[test]
    fn test_fits_training_data() {
        let records = sample_records();
        let model = Trainer::default().train(&records).unwrap();

        // Sample rows have unique feature vectors, so a fully grown tree memorizes them
        assert!((model.training_accuracy(&records) - 1.0).abs() < 1e-12);
        assert_eq!(model.trained_on(), records.len());
    }

    #[test]
    fn test_depth_limit_from_config() {
        let records = sample_records();
        let config = TreeConfig {
            max_depth: Some(2),
            ..TreeConfig::default()
        };
        let model = Trainer::with_config(7, config).train(&records).unwrap();
        assert!(model.summary().depth <= 2);
        assert_eq!(model.summary().seed, 7);
    }
}
