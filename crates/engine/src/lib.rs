//! steward-engine: jurisdiction-specific EPR packaging fee calculation.
//!
//! The engine runs an 8-stage pipeline -- validation, unit
//! standardization, material classification, base fee, eco-modulation,
//! exemptions, rounding, audit close -- selecting a jurisdiction
//! strategy by 2-letter code and appending one immutable audit step per
//! stage. Every number in the result traces to a rule and a legal
//! citation.
//!
//! # Public API
//!
//! - [`calculate_epr_fee()`] -- run one calculation with defaults
//! - [`Engine`] / [`EngineOptions`] -- reproducible runs (fixed id/date)
//! - [`Calculation`], [`CalculationResult`], [`CalculationStep`] --
//!   outputs
//! - [`strategy::JurisdictionStrategy`] -- per-jurisdiction contract

pub mod audit;
pub mod classify;
pub mod engine;
pub mod pipeline;
pub mod strategy;

pub use audit::{AuditTrail, CalculationStep, CitationLog};
pub use classify::{classify_material, MaterialCategory};
pub use engine::{
    calculate_epr_fee, Calculation, CalculationResult, Engine, EngineOptions,
    COMPLIANCE_CALCULATED,
};
pub use pipeline::{PipelineState, StandardizedComponent};
pub use strategy::{
    strategy_for, EcoModulation, ExemptionOutcome, FeeComputation, JurisdictionStrategy,
    SmallProducerThresholds, ThresholdOperator,
};
