//! Engine error taxonomy.
//!
//! Every failure surfaced by the calculation core is one of these
//! variants; nothing is swallowed. Validation problems are itemized as
//! structured [`ValidationError`] values so callers can branch on the
//! failing field rather than parsing text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single failed field check from producer or packaging validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `packaging_data[2].units_sold`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All errors that can be returned by a fee calculation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Producer or packaging data failed one or more field checks.
    /// Raised before any monetary arithmetic runs.
    #[error("validation failed: {}", format_errors(errors))]
    ValidationFailed { errors: Vec<ValidationError> },

    /// Jurisdiction code is not one of the 7 supported programs.
    #[error("unsupported jurisdiction '{code}', supported: {}", supported.join(", "))]
    UnsupportedJurisdiction {
        code: String,
        supported: Vec<&'static str>,
    },

    /// Weight unit not present in the conversion table.
    #[error("unsupported weight unit '{unit}'")]
    UnsupportedWeightUnit { unit: String },

    /// A calculation_date string that is not an ISO-8601 calendar date.
    #[error("invalid calculation date '{value}': {message}")]
    InvalidDate { value: String, message: String },

    /// Any other internal failure (e.g. malformed system data). Carries
    /// the pipeline stage it was raised from.
    #[error("calculation failed at {stage}: {message}")]
    CalculationFailed {
        stage: &'static str,
        message: String,
    },
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failed_lists_every_error() {
        let err = EngineError::ValidationFailed {
            errors: vec![
                ValidationError::new("producer_data.annual_revenue", "must be >= 0"),
                ValidationError::new("packaging_data", "at least one component is required"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("annual_revenue"));
        assert!(msg.contains("at least one component"));
    }

    #[test]
    fn unsupported_jurisdiction_names_supported_codes() {
        let err = EngineError::UnsupportedJurisdiction {
            code: "ZZ".to_string(),
            supported: vec!["OR", "CA"],
        };
        assert_eq!(
            err.to_string(),
            "unsupported jurisdiction 'ZZ', supported: OR, CA"
        );
    }
}
