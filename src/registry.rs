//! Fixed category registry and integer encoding
//!
//! Codes come from the declaration order of the closed value sets, never from
//! the labels observed in a dataset, so training and inference always share
//! the same feature space.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// A closed set of labels with a stable integer code per label
pub trait Category: Copy + Eq + fmt::Debug + 'static {
    /// Every member, in code order
    const ALL: &'static [Self];

    /// Human readable label as it appears in datasets
    fn label(self) -> &'static str;

    /// Zero-based position in [`Category::ALL`]
    fn code(self) -> u32 {
        Self::ALL
            .iter()
            .position(|c| *c == self)
            .map(|i| i as u32)
            .unwrap_or_default()
    }

    fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }

    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.label()).collect()
    }
}

/// Track weather condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    #[serde(rename = "Dry")]
    Dry,
    #[serde(rename = "Light Rain")]
    LightRain,
    #[serde(rename = "Moderate Rain")]
    ModerateRain,
    #[serde(rename = "Heavy Rain")]
    HeavyRain,
}

impl Category for Weather {
    const ALL: &'static [Self] = &[
        Weather::Dry,
        Weather::LightRain,
        Weather::ModerateRain,
        Weather::HeavyRain,
    ];

    fn label(self) -> &'static str {
        match self {
            Weather::Dry => "Dry",
            Weather::LightRain => "Light Rain",
            Weather::ModerateRain => "Moderate Rain",
            Weather::HeavyRain => "Heavy Rain",
        }
    }
}

/// Tire compound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TireCompound {
    #[serde(rename = "Soft")]
    Soft,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "Hard")]
    Hard,
    #[serde(rename = "Intermediate")]
    Intermediate,
    #[serde(rename = "Wet")]
    Wet,
    #[serde(rename = "Full Wet")]
    FullWet,
}

impl TireCompound {
    /// Short trade-off note shown next to a recommendation
    pub fn description(self) -> &'static str {
        match self {
            TireCompound::Soft => "Best performance but shortest lifespan",
            TireCompound::Medium => "Balanced performance and durability",
            TireCompound::Hard => "Longest lasting but slower lap times",
            TireCompound::Intermediate => "For light wet conditions",
            TireCompound::Wet => "For moderate wet conditions",
            TireCompound::FullWet => "For heavy rain conditions",
        }
    }
}

impl Category for TireCompound {
    const ALL: &'static [Self] = &[
        TireCompound::Soft,
        TireCompound::Medium,
        TireCompound::Hard,
        TireCompound::Intermediate,
        TireCompound::Wet,
        TireCompound::FullWet,
    ];

    fn label(self) -> &'static str {
        match self {
            TireCompound::Soft => "Soft",
            TireCompound::Medium => "Medium",
            TireCompound::Hard => "Hard",
            TireCompound::Intermediate => "Intermediate",
            TireCompound::Wet => "Wet",
            TireCompound::FullWet => "Full Wet",
        }
    }
}

macro_rules! impl_label_traits {
    ($ty:ty, $field:expr, $allowed:expr) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = DataError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as Category>::from_label(s).ok_or_else(|| DataError::InvalidCategory {
                    field: $field,
                    value: s.to_string(),
                    allowed: $allowed,
                })
            }
        }
    };
}

impl_label_traits!(Weather, Field::Weather.name(), Weather::labels());
// Parsed outside a dataset column, so the field is not known
impl_label_traits!(TireCompound, "tire", TireCompound::labels());

/// Categorical columns of the feature layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Weather,
    CurrentTire,
    NextTire,
}

impl Field {
    /// Column name used in datasets and error messages
    pub fn name(self) -> &'static str {
        match self {
            Field::Weather => "weather",
            Field::CurrentTire => "current_tire",
            Field::NextTire => "next_tire",
        }
    }

    pub fn allowed(self) -> Vec<&'static str> {
        match self {
            Field::Weather => Weather::labels(),
            Field::CurrentTire | Field::NextTire => TireCompound::labels(),
        }
    }
}

/// Immutable encoder over the fixed category sets
///
/// Built once and passed by reference; it carries no data-derived state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Registry;

impl Registry {
    pub fn new() -> Self {
        Self
    }

    /// Map a label to its integer code
    pub fn encode(&self, field: Field, value: &str) -> Result<u32, DataError> {
        let code = match field {
            Field::Weather => Weather::from_label(value).map(Category::code),
            Field::CurrentTire | Field::NextTire => {
                TireCompound::from_label(value).map(Category::code)
            }
        };

        code.ok_or_else(|| DataError::InvalidCategory {
            field: field.name(),
            value: value.to_string(),
            allowed: field.allowed(),
        })
    }

    /// Map an integer code back to its label
    pub fn decode(&self, field: Field, code: u32) -> Result<&'static str, DataError> {
        let label = match field {
            Field::Weather => Weather::from_code(code).map(Category::label),
            Field::CurrentTire | Field::NextTire => {
                TireCompound::from_code(code).map(Category::label)
            }
        };

        label.ok_or_else(|| DataError::InvalidCategory {
            field: field.name(),
            value: code.to_string(),
            allowed: field.allowed(),
        })
    }

    /// Decode a predicted target code
    pub fn decode_tire(&self, code: u32) -> Result<TireCompound, DataError> {
        let label = self.decode(Field::NextTire, code)?;
        self.tire(Field::NextTire, label)
    }

    pub fn weather(&self, value: &str) -> Result<Weather, DataError> {
        self.parse(Field::Weather, value)
    }

    pub fn tire(&self, field: Field, value: &str) -> Result<TireCompound, DataError> {
        self.parse(field, value)
    }

    fn parse<C: Category>(&self, field: Field, value: &str) -> Result<C, DataError> {
        C::from_label(value).ok_or_else(|| DataError::InvalidCategory {
            field: field.name(),
            value: value.to_string(),
            allowed: field.allowed(),
        })
    }
}
