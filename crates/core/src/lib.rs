//! steward-core: data model and numeric primitives for the Steward
//! EPR packaging fee engine.
//!
//! Provides the input contract types (producer, packaging, system data),
//! the closed jurisdiction enum, exact weight/currency arithmetic, and
//! the engine error taxonomy.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`ReportData`] -- the full calculation input
//! - [`Jurisdiction`] -- closed enum of the 7 supported programs
//! - [`EngineError`] / [`ValidationError`] -- error taxonomy
//! - [`standardize_weight_to_kg`] / [`round_to_currency_precision`] --
//!   the two numeric primitives every strategy builds on
//!
//! All money and weight values are `rust_decimal::Decimal` -- never
//! `f64` -- so results are reproducible bit-for-bit.

pub mod error;
pub mod jurisdiction;
pub mod money;
pub mod report;
pub mod units;

pub use error::{EngineError, ValidationError};
pub use jurisdiction::{Jurisdiction, SharedState, SUPPORTED_CODES};
pub use money::round_to_currency_precision;
pub use report::{
    MaterialFlow, Municipality, PackagingComponent, ProducerData, ReportData, RevenueScope,
    SystemData,
};
pub use units::{standardize_weight_to_kg, WeightUnit};
