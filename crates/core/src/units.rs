//! Weight unit standardization.
//!
//! Every packaging weight is converted to kilograms before any fee
//! arithmetic runs. Conversion factors are exact `Decimal` constants --
//! no `f64` anywhere in the path -- so standardized weights reproduce
//! bit-for-bit across runs.

use rust_decimal::Decimal;

use crate::error::EngineError;

/// Recognized weight units for packaging components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightUnit {
    Kg,
    G,
    Lb,
    Oz,
    Ton,
    Tonne,
}

impl WeightUnit {
    /// Parse a unit string, case-insensitively. Unknown units fail with
    /// `UnsupportedWeightUnit`.
    pub fn parse(unit: &str) -> Result<WeightUnit, EngineError> {
        match unit.trim().to_ascii_lowercase().as_str() {
            "kg" => Ok(WeightUnit::Kg),
            "g" => Ok(WeightUnit::G),
            "lb" => Ok(WeightUnit::Lb),
            "oz" => Ok(WeightUnit::Oz),
            "ton" => Ok(WeightUnit::Ton),
            "tonne" => Ok(WeightUnit::Tonne),
            _ => Err(EngineError::UnsupportedWeightUnit {
                unit: unit.to_string(),
            }),
        }
    }

    /// Multiplicative factor converting this unit to kilograms.
    pub fn factor_to_kg(self) -> Decimal {
        match self {
            WeightUnit::Kg => Decimal::ONE,
            // 0.001
            WeightUnit::G => Decimal::new(1, 3),
            // 0.453592
            WeightUnit::Lb => Decimal::new(453_592, 6),
            // 0.0283495
            WeightUnit::Oz => Decimal::new(283_495, 7),
            // Metric convention: both spellings are 1000 kg.
            WeightUnit::Ton | WeightUnit::Tonne => Decimal::new(1000, 0),
        }
    }
}

/// Convert a weight in the given unit to kilograms.
pub fn standardize_weight_to_kg(weight: Decimal, unit: &str) -> Result<Decimal, EngineError> {
    let unit = WeightUnit::parse(unit)?;
    Ok(weight * unit.factor_to_kg())
}
