//! Tire Strategy - next compound recommendation for motorsport races
//!
//! This library provides:
//! - A fixed category registry with stable integer encoding
//! - CSV loading and validation of historical strategy data
//! - Deterministic decision tree training
//! - A predictor that validates race state and recommends a compound
//!
//! # Example
//!
//! ```no_run
//! use tire_strategy::{Predictor, PredictorConfig};
//!
//! let predictor = Predictor::startup(&PredictorConfig::from_env());
//!
//! match predictor.recommend(25, 35.0, "Dry", "Medium", 10) {
//!     Ok(tire) => println!("Recommended tire: {} ({})", tire, tire.description()),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod predictor;
pub mod registry;

// Re-export commonly used types
pub use config::PredictorConfig;
pub use data::{DatasetLoader, EncodedRecord, TrainingRecord};
pub use error::{DataError, RecommendError};
pub use model::{Model, ModelSummary, Trainer, TreeConfig};
pub use predictor::{build_model, Predictor, Query};
pub use registry::{Category, Field, Registry, TireCompound, Weather};
