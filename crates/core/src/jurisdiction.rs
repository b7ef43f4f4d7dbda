//! Jurisdiction codes and the closed strategy-family enum.
//!
//! Five fee-model families cover the seven supported programs. The
//! shared-responsibility family (Maryland, Minnesota, Washington)
//! carries a state field rather than being three separate variants, so
//! state-specific branches stay exhaustive without type proliferation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;

/// The 7 supported 2-letter jurisdiction codes, in canonical order.
pub const SUPPORTED_CODES: [&str; 7] = ["OR", "CA", "CO", "ME", "MD", "MN", "WA"];

/// State within the shared-responsibility (phased funding) family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SharedState {
    Maryland,
    Minnesota,
    Washington,
}

impl SharedState {
    pub fn code(self) -> &'static str {
        match self {
            SharedState::Maryland => "MD",
            SharedState::Minnesota => "MN",
            SharedState::Washington => "WA",
        }
    }
}

/// A supported EPR program, one variant per fee-model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Jurisdiction {
    Oregon,
    California,
    Colorado,
    Maine,
    SharedResponsibility(SharedState),
}

impl Jurisdiction {
    /// Resolve a 2-letter code (case-insensitive). Unrecognized codes
    /// fail with `UnsupportedJurisdiction` listing all supported codes.
    pub fn from_code(code: &str) -> Result<Jurisdiction, EngineError> {
        match code.trim().to_ascii_uppercase().as_str() {
            "OR" => Ok(Jurisdiction::Oregon),
            "CA" => Ok(Jurisdiction::California),
            "CO" => Ok(Jurisdiction::Colorado),
            "ME" => Ok(Jurisdiction::Maine),
            "MD" => Ok(Jurisdiction::SharedResponsibility(SharedState::Maryland)),
            "MN" => Ok(Jurisdiction::SharedResponsibility(SharedState::Minnesota)),
            "WA" => Ok(Jurisdiction::SharedResponsibility(SharedState::Washington)),
            _ => Err(EngineError::UnsupportedJurisdiction {
                code: code.to_string(),
                supported: SUPPORTED_CODES.to_vec(),
            }),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Jurisdiction::Oregon => "OR",
            Jurisdiction::California => "CA",
            Jurisdiction::Colorado => "CO",
            Jurisdiction::Maine => "ME",
            Jurisdiction::SharedResponsibility(state) => state.code(),
        }
    }

    /// Human-readable program name for CLI listings and breakdowns.
    pub fn program_name(self) -> &'static str {
        match self {
            Jurisdiction::Oregon => "Oregon Recycling Modernization Act (PRO-led)",
            Jurisdiction::California => "California SB 54 (PRO-led)",
            Jurisdiction::Colorado => "Colorado Producer Responsibility Program (municipal reimbursement)",
            Jurisdiction::Maine => "Maine Stewardship Program for Packaging (state-run reimbursement)",
            Jurisdiction::SharedResponsibility(SharedState::Maryland) => {
                "Maryland Packaging EPR (shared responsibility)"
            }
            Jurisdiction::SharedResponsibility(SharedState::Minnesota) => {
                "Minnesota Packaging Waste and Cost Reduction Act (shared responsibility)"
            }
            Jurisdiction::SharedResponsibility(SharedState::Washington) => {
                "Washington Recycling Reform Act (shared responsibility)"
            }
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_all_supported_codes() {
        for code in SUPPORTED_CODES {
            let j = Jurisdiction::from_code(code).unwrap();
            assert_eq!(j.code(), code);
        }
    }

    #[test]
    fn resolution_is_case_insensitive() {
        assert_eq!(Jurisdiction::from_code("or").unwrap(), Jurisdiction::Oregon);
        assert_eq!(
            Jurisdiction::from_code(" wa ").unwrap(),
            Jurisdiction::SharedResponsibility(SharedState::Washington)
        );
    }

    #[test]
    fn unknown_code_lists_all_seven() {
        let err = Jurisdiction::from_code("ZZ").unwrap_err();
        match err {
            EngineError::UnsupportedJurisdiction { code, supported } => {
                assert_eq!(code, "ZZ");
                assert_eq!(supported, SUPPORTED_CODES.to_vec());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
