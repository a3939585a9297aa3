//! CSV loading for historical tire strategy records

use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::error::DataError;
use crate::registry::{Category, Field, Registry, TireCompound, Weather};

/// Columns every dataset must provide, in feature order followed by the target
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "lap",
    "track_temp",
    "weather",
    "current_tire",
    "stint_laps",
    "next_tire",
];

/// Number of model input features
pub const NUM_FEATURES: usize = 5;

/// One historical pit decision
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub lap: u32,
    pub track_temp: f64,
    pub weather: Weather,
    pub current_tire: TireCompound,
    pub stint_laps: u32,
    pub next_tire: TireCompound,
}

impl TrainingRecord {
    /// Convert to the numeric layout consumed by the trainer
    pub fn encode(&self) -> EncodedRecord {
        EncodedRecord {
            features: feature_vector(
                self.lap,
                self.track_temp,
                self.weather,
                self.current_tire,
                self.stint_laps,
            ),
            target: self.next_tire.code(),
        }
    }
}

/// Training record with categorical fields replaced by registry codes
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub features: [f64; NUM_FEATURES],
    pub target: u32,
}

/// Build the model input vector shared by training and inference
pub fn feature_vector(
    lap: u32,
    track_temp: f64,
    weather: Weather,
    current_tire: TireCompound,
    stint_laps: u32,
) -> [f64; NUM_FEATURES] {
    [
        lap as f64,
        track_temp,
        weather.code() as f64,
        current_tire.code() as f64,
        stint_laps as f64,
    ]
}

/// Encode every record in order
pub fn encode_records(records: &[TrainingRecord]) -> Vec<EncodedRecord> {
    records.iter().map(TrainingRecord::encode).collect()
}

/// Reads and validates strategy datasets
pub struct DatasetLoader {
    registry: Registry,
}

impl DatasetLoader {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Load all records from a CSV file
    ///
    /// Extra columns are ignored. Any invalid cell aborts the load.
    pub fn load<P: AsRef<Path>>(&self, csv_path: P) -> Result<Vec<TrainingRecord>, DataError> {
        let path = csv_path.as_ref();
        if !path.is_file() || File::open(path).is_err() {
            return Err(DataError::DatasetNotFound {
                path: path.to_path_buf(),
            });
        }

        let df = match CsvReadOptions::default()
            .with_has_header(true)
            // Scan every row so late fractional or malformed cells don't break inference
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
        {
            Ok(df) => df,
            // A file without even a header row
            Err(PolarsError::NoData(_)) => return Err(DataError::EmptyDataset),
            Err(e) => return Err(e.into()),
        };

        let records = self.dataframe_to_records(&df)?;
        info!("Loaded {} training records from {:?}", records.len(), path);
        Ok(records)
    }

    fn dataframe_to_records(&self, df: &DataFrame) -> Result<Vec<TrainingRecord>, DataError> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| df.column(name).is_err())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DataError::Schema { missing });
        }

        if df.height() == 0 {
            return Err(DataError::EmptyDataset);
        }

        // Non-strict casts turn unparseable cells into nulls, reported per row below
        let lap = df.column("lap")?.cast(&DataType::Float64)?;
        let track_temp = df.column("track_temp")?.cast(&DataType::Float64)?;
        let weather = df.column("weather")?.cast(&DataType::String)?;
        let current_tire = df.column("current_tire")?.cast(&DataType::String)?;
        let stint_laps = df.column("stint_laps")?.cast(&DataType::Float64)?;
        let next_tire = df.column("next_tire")?.cast(&DataType::String)?;

        let lap_col = lap.f64()?;
        let temp_col = track_temp.f64()?;
        let weather_col = weather.str()?;
        let current_col = current_tire.str()?;
        let stint_col = stint_laps.f64()?;
        let next_col = next_tire.str()?;

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let row = i + 1;

            let record = TrainingRecord {
                lap: count_cell(lap_col.get(i), row, "lap")?,
                track_temp: temp_col
                    .get(i)
                    .filter(|t| t.is_finite())
                    .ok_or(DataError::InvalidRecord {
                        row,
                        column: "track_temp",
                    })?,
                weather: self
                    .registry
                    .weather(text_cell(weather_col.get(i), row, "weather")?)?,
                current_tire: self.registry.tire(
                    Field::CurrentTire,
                    text_cell(current_col.get(i), row, "current_tire")?,
                )?,
                stint_laps: count_cell(stint_col.get(i), row, "stint_laps")?,
                next_tire: self
                    .registry
                    .tire(Field::NextTire, text_cell(next_col.get(i), row, "next_tire")?)?,
            };
            records.push(record);
        }

        debug!("Parsed {} rows", records.len());
        Ok(records)
    }
}

/// Non-negative whole number cell
fn count_cell(value: Option<f64>, row: usize, column: &'static str) -> Result<u32, DataError> {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => {
            Ok(v as u32)
        }
        _ => Err(DataError::InvalidRecord { row, column }),
    }
}

fn text_cell<'a>(
    value: Option<&'a str>,
    row: usize,
    column: &'static str,
) -> Result<&'a str, DataError> {
    value
        .map(str::trim)
        .ok_or(DataError::InvalidRecord { row, column })
}
