//! Dataset loading and feature encoding

pub mod dataset;

// Re-export commonly used types
pub use dataset::{
    encode_records, feature_vector, DatasetLoader, EncodedRecord, TrainingRecord, NUM_FEATURES,
    REQUIRED_COLUMNS,
};
