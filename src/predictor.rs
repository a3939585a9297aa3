use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::PredictorConfig;
use crate::data::{encode_records, feature_vector, DatasetLoader};
use crate::error::{validate_track_temp, DataError, RecommendError};
use crate::model::{Classifier, Model, ModelSummary, Trainer};
use crate::registry::{Field, Registry, TireCompound};

/// Raw race state as entered by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub lap: u32,
    pub track_temp: f64,
    pub weather: String,
    pub current_tire: String,
    pub stint_laps: u32,
}

/// Readiness of a predictor, fixed at construction
#[derive(Debug)]
enum Readiness<M> {
    Ready(M),
    Uninitialized { reason: String },
}

/// Tire recommender owning its trained model
///
/// Inference only reads the model, so a single instance can be shared
/// across threads behind `&` or `Arc`.
#[derive(Debug)]
pub struct Predictor<M = Model> {
    registry: Registry,
    state: Readiness<M>,
}

/// Load, encode and train in one blocking step
pub fn build_model(config: &PredictorConfig) -> Result<Model, DataError> {
    let registry = Registry::new();
    let records = DatasetLoader::new(registry).load(&config.data_path)?;
    let encoded = encode_records(&records);
    Trainer::with_config(config.seed, config.tree.clone()).train(&encoded)
}

impl Predictor<Model> {
    /// Build the model, falling back to the uninitialized state on any failure
    pub fn startup(config: &PredictorConfig) -> Self {
        info!("Training tire model from {:?}", config.data_path);

        match build_model(config) {
            Ok(model) => {
                info!("Tire model ready");
                Self::ready(model)
            }
            Err(e) => {
                match &e {
                    DataError::Csv(_) => error!("Failed to load tire model: {}", e),
                    _ => warn!("Failed to load tire model: {}", e),
                }
                Self::uninitialized(e.to_string())
            }
        }
    }

    pub fn summary(&self) -> Option<ModelSummary> {
        match &self.state {
            Readiness::Ready(model) => Some(model.summary()),
            Readiness::Uninitialized { .. } => None,
        }
    }
}

impl<M: Classifier> Predictor<M> {
    pub fn ready(model: M) -> Self {
        Self {
            registry: Registry::new(),
            state: Readiness::Ready(model),
        }
    }

    pub fn uninitialized<S: Into<String>>(reason: S) -> Self {
        Self {
            registry: Registry::new(),
            state: Readiness::Uninitialized {
                reason: reason.into(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, Readiness::Ready(_))
    }

    /// Why the model is missing, if it is
    pub fn startup_error(&self) -> Option<&str> {
        match &self.state {
            Readiness::Ready(_) => None,
            Readiness::Uninitialized { reason } => Some(reason),
        }
    }

    /// Recommend the next compound for the given race state
    pub fn recommend(
        &self,
        lap: u32,
        track_temp: f64,
        weather: &str,
        current_tire: &str,
        stint_laps: u32,
    ) -> Result<TireCompound, RecommendError> {
        let model = match &self.state {
            Readiness::Ready(model) => model,
            Readiness::Uninitialized { reason } => {
                return Err(RecommendError::ModelUnavailable {
                    reason: reason.clone(),
                })
            }
        };

        let weather = self.registry.weather(weather).map_err(invalid_input)?;
        let current_tire = self
            .registry
            .tire(Field::CurrentTire, current_tire)
            .map_err(invalid_input)?;
        validate_track_temp(track_temp)?;

        let features = feature_vector(lap, track_temp, weather, current_tire, stint_laps);
        let code = model.predict(&features);

        let recommended =
            self.registry
                .decode_tire(code)
                .map_err(|e| RecommendError::ModelUnavailable {
                    reason: e.to_string(),
                })?;

        debug!(
            "lap={} temp={} weather={} tire={} stint={} -> {}",
            lap, track_temp, weather, current_tire, stint_laps, recommended
        );
        Ok(recommended)
    }

    pub fn recommend_query(&self, query: &Query) -> Result<TireCompound, RecommendError> {
        self.recommend(
            query.lap,
            query.track_temp,
            &query.weather,
            &query.current_tire,
            query.stint_laps,
        )
    }

    /// String form for display layers: the compound label, or `Error: ...`
    pub fn recommend_message(
        &self,
        lap: u32,
        track_temp: f64,
        weather: &str,
        current_tire: &str,
        stint_laps: u32,
    ) -> String {
        match self.recommend(lap, track_temp, weather, current_tire, stint_laps) {
            Ok(tire) => tire.to_string(),
            Err(e) => format!("Error: {}", e),
        }
    }
}

fn invalid_input(err: DataError) -> RecommendError {
    match err {
        DataError::InvalidCategory {
            field,
            value,
            allowed,
        } => RecommendError::InvalidInput {
            field,
            value,
            allowed,
        },
        other => RecommendError::ModelUnavailable {
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NUM_FEATURES;
    use crate::registry::{Category, Weather};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sample_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("data/tire_strategy_data.csv")
    }

    fn sample_predictor() -> Predictor {
        let predictor = Predictor::startup(&PredictorConfig::new(sample_path()));
        assert!(predictor.is_ready(), "{:?}", predictor.startup_error());
        predictor
    }

    /// Always answers one code and counts calls
    struct CountingClassifier {
        code: u32,
        calls: AtomicUsize,
    }

    impl CountingClassifier {
        fn new(code: u32) -> Self {
            Self {
                code,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Classifier for CountingClassifier {
        fn predict(&self, _features: &[f64; NUM_FEATURES]) -> u32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.code
        }
    }

    #[test]
    fn test_recommend_returns_a_compound() {
        let predictor = sample_predictor();
        let tire = predictor.recommend(25, 35.0, "Dry", "Medium", 10).unwrap();
        assert!(TireCompound::ALL.contains(&tire));

        let message = predictor.recommend_message(25, 35.0, "Dry", "Medium", 10);
        assert!(TireCompound::labels().contains(&message.as_str()));
    }

    #[test]
    fn test_recommend_matches_training_rows() {
        let predictor = sample_predictor();
        // Rows taken verbatim from the sample dataset
        assert_eq!(
            predictor.recommend(8, 36.8, "Heavy Rain", "Intermediate", 3),
            Ok(TireCompound::FullWet)
        );
        assert_eq!(
            predictor.recommend(13, 27.7, "Moderate Rain", "Soft", 32),
            Ok(TireCompound::Wet)
        );
        assert_eq!(
            predictor.recommend(12, 30.6, "Dry", "Soft", 15),
            Ok(TireCompound::Hard)
        );
    }

    #[test]
    fn test_invalid_weather_skips_model() {
        let predictor = Predictor::ready(CountingClassifier::new(0));
        let err = predictor
            .recommend(25, 35.0, "Scorching", "Medium", 10)
            .unwrap_err();

        match &err {
            RecommendError::InvalidInput {
                field,
                value,
                allowed,
            } => {
                assert_eq!(*field, "weather");
                assert_eq!(value, "Scorching");
                assert_eq!(allowed, &Weather::labels());
            }
            other => panic!("unexpected error: {other:?}"),
        }

        if let Readiness::Ready(model) = &predictor.state {
            assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_invalid_current_tire() {
        let predictor = Predictor::ready(CountingClassifier::new(0));
        let err = predictor
            .recommend(25, 35.0, "Dry", "Slick", 10)
            .unwrap_err();

        assert!(err.is_input_error());
        assert!(err.to_string().contains("current_tire"));
        assert!(err.to_string().contains("Full Wet"));
    }

    #[test]
    fn test_non_finite_temperature_is_rejected() {
        let predictor = Predictor::ready(CountingClassifier::new(0));
        let err = predictor
            .recommend(25, f64::NAN, "Dry", "Soft", 10)
            .unwrap_err();
        assert!(matches!(
            err,
            RecommendError::InvalidInput {
                field: "track_temp",
                ..
            }
        ));
    }

    #[test]
    fn test_valid_input_invokes_model_once() {
        let predictor = Predictor::ready(CountingClassifier::new(4));
        let tire = predictor.recommend(30, 22.0, "Moderate Rain", "Wet", 6).unwrap();
        assert_eq!(tire, TireCompound::Wet);

        if let Readiness::Ready(model) = &predictor.state {
            assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_unknown_class_code_is_model_unavailable() {
        let predictor = Predictor::ready(CountingClassifier::new(42));
        let err = predictor.recommend(30, 22.0, "Dry", "Soft", 6).unwrap_err();
        assert!(matches!(err, RecommendError::ModelUnavailable { .. }));
    }

    #[test]
    fn test_uninitialized_predictor_never_panics() {
        let predictor: Predictor = Predictor::uninitialized("dataset missing");
        assert!(!predictor.is_ready());
        assert!(predictor.summary().is_none());

        let err = predictor.recommend(25, 35.0, "Dry", "Medium", 10).unwrap_err();
        assert_eq!(
            err,
            RecommendError::ModelUnavailable {
                reason: "dataset missing".to_string()
            }
        );

        // Readiness is checked before input validation
        let err = predictor
            .recommend(25, 35.0, "Scorching", "Medium", 10)
            .unwrap_err();
        assert!(!err.is_input_error());

        let message = predictor.recommend_message(25, 35.0, "Dry", "Medium", 10);
        assert!(message.starts_with("Error"));
    }

    #[test]
    fn test_startup_with_missing_dataset_is_uninitialized() {
        let predictor = Predictor::startup(&PredictorConfig::new("/no/such/tire_data.csv"));
        assert!(!predictor.is_ready());
        assert!(predictor
            .startup_error()
            .unwrap()
            .contains("Dataset not found"));
    }

    #[test]
    fn test_startup_with_header_only_dataset_is_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(
            &path,
            "lap,track_temp,weather,current_tire,stint_laps,next_tire\n",
        )
        .unwrap();

        let predictor = Predictor::startup(&PredictorConfig::new(&path));
        assert!(!predictor.is_ready());
        assert!(matches!(
            predictor.recommend(1, 20.0, "Dry", "Soft", 0),
            Err(RecommendError::ModelUnavailable { .. })
        ));
    }

    #[test]
    fn test_same_seed_same_recommendations() {
        let config = PredictorConfig::new(sample_path()).with_seed(42);
        let a = Predictor::startup(&config);
        let b = Predictor::startup(&config);

        for (lap, temp, weather, tire, stint) in [
            (25, 35.0, "Dry", "Medium", 10),
            (62, 19.5, "Dry", "Hard", 28),
            (5, 44.0, "Light Rain", "Soft", 1),
        ] {
            assert_eq!(
                a.recommend(lap, temp, weather, tire, stint),
                b.recommend(lap, temp, weather, tire, stint)
            );
        }
        assert_eq!(a.summary(), b.summary());
    }

    #[test]
    fn test_concurrent_recommendations_agree() {
        let predictor = Arc::new(sample_predictor());
        let expected = predictor.recommend(40, 28.0, "Dry", "Soft", 14).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let p = Arc::clone(&predictor);
                std::thread::spawn(move || p.recommend(40, 28.0, "Dry", "Soft", 14).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_recommend_query() {
        let predictor = sample_predictor();
        let query = Query {
            lap: 25,
            track_temp: 35.0,
            weather: "Dry".to_string(),
            current_tire: "Medium".to_string(),
            stint_laps: 10,
        };
        assert_eq!(
            predictor.recommend_query(&query),
            predictor.recommend(25, 35.0, "Dry", "Medium", 10)
        );
    }
}
