//! Calculation engine: strategy selection, pipeline fold, result
//! assembly.
//!
//! One engine instance runs one calculation at a time and owns its own
//! audit-trail accumulator; instances share no mutable state, so
//! concurrent calculations are simply independent instances. A
//! calculation either fully succeeds with 8 audit steps or fails
//! atomically with a synthetic "Calculation Error" step recording what
//! was attempted.

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use steward_core::{EngineError, Jurisdiction, ReportData};

use crate::audit::{now_rfc3339, AuditTrail, CalculationStep, CitationLog};
use crate::pipeline::{PipelineState, STAGES};
use crate::strategy::strategy_for;

/// Compliance status of a completed calculation.
pub const COMPLIANCE_CALCULATED: &str = "CALCULATED";

/// Structured result of a successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Unique per invocation: jurisdiction + date + random suffix.
    pub calculation_id: String,
    pub jurisdiction: String,
    /// Rounded to 2 decimal places, banker's rounding.
    pub total_fee: Decimal,
    pub currency: String,
    pub calculation_timestamp: String,
    /// Jurisdiction-specific structured detail.
    pub calculation_breakdown: serde_json::Value,
    /// Deduplicated, in order of first appearance.
    pub legal_citations: Vec<String>,
    pub compliance_status: String,
}

/// A finished calculation: the result plus its full audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub result: CalculationResult,
    pub audit_trail: Vec<CalculationStep>,
}

/// Engine configuration. Overriding `calculation_id` and
/// `calculation_date` makes a run reproducible end to end.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub calculation_id: Option<String>,
    pub calculation_date: Option<Date>,
}

/// Fee calculation engine. Owns the audit-step accumulator for its
/// current calculation.
#[derive(Debug, Default)]
pub struct Engine {
    options: EngineOptions,
    trail: AuditTrail,
}

impl Engine {
    pub fn new() -> Self {
        Engine::default()
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Engine {
            options,
            trail: AuditTrail::new(),
        }
    }

    /// The audit trail of the most recent calculation, including the
    /// synthetic error step after a failure.
    pub fn audit_trail(&self) -> &[CalculationStep] {
        self.trail.steps()
    }

    /// Run the full 8-stage pipeline for one report.
    ///
    /// On failure the trail keeps every step completed so far plus one
    /// synthetic "Calculation Error" step, and the error propagates to
    /// the caller; no partial fee is ever returned as success.
    pub fn calculate(&mut self, report: &ReportData) -> Result<Calculation, EngineError> {
        self.trail = AuditTrail::new();
        match self.run_pipeline(report) {
            Ok(calculation) => Ok(calculation),
            Err(err) => {
                self.append_error_step(report, &err);
                Err(err)
            }
        }
    }

    fn run_pipeline(&mut self, report: &ReportData) -> Result<Calculation, EngineError> {
        let jurisdiction = Jurisdiction::from_code(&report.jurisdiction_code)?;
        let calculation_date = self.resolve_date(report)?;
        let strategy = strategy_for(jurisdiction);

        let mut state = PipelineState::new(report.clone(), jurisdiction, calculation_date);
        for (_, stage) in STAGES {
            let (next, step) = stage(strategy.as_ref(), state)?;
            self.trail.push(step);
            state = next;
        }

        let mut citations = CitationLog::new();
        for step in self.trail.steps() {
            citations.record(&step.legal_citation);
        }

        let calculation_id = self
            .options
            .calculation_id
            .clone()
            .unwrap_or_else(|| generate_calculation_id(jurisdiction, calculation_date));

        let breakdown = json!({
            "fee_type": state.fee_type,
            "jurisdiction_model": state.fee.as_ref().map(|f| f.breakdown.clone()),
            "base_fee": state.base_fee.to_string(),
            "eco_modulated_fee": state.eco_modulated_fee.to_string(),
            "eco_adjustment": state.eco.as_ref()
                .map(|e| e.adjustment.to_string())
                .unwrap_or_else(|| "0".to_string()),
            "pre_rounding_fee": state.pre_rounding_fee.to_string(),
            "rounding_delta": state.rounding_delta.to_string(),
            "total_weight_kg": state.total_weight_kg.to_string(),
            "calculation_date": state.calculation_date.to_string(),
        });

        let result = CalculationResult {
            calculation_id,
            jurisdiction: jurisdiction.code().to_string(),
            total_fee: state.total_fee,
            currency: "USD".to_string(),
            calculation_timestamp: now_rfc3339(),
            calculation_breakdown: breakdown,
            legal_citations: citations.into_citations(),
            compliance_status: COMPLIANCE_CALCULATED.to_string(),
        };

        Ok(Calculation {
            result,
            audit_trail: self.trail.steps().to_vec(),
        })
    }

    fn resolve_date(&self, report: &ReportData) -> Result<Date, EngineError> {
        if let Some(date) = self.options.calculation_date {
            return Ok(date);
        }
        match &report.calculation_date {
            Some(value) => {
                let format = format_description!("[year]-[month]-[day]");
                Date::parse(value, &format).map_err(|e| EngineError::InvalidDate {
                    value: value.clone(),
                    message: e.to_string(),
                })
            }
            None => Ok(OffsetDateTime::now_utc().date()),
        }
    }

    fn append_error_step(&mut self, report: &ReportData, err: &EngineError) {
        let step = CalculationStep {
            step_number: 0,
            step_name: "Calculation Error".to_string(),
            input_data: json!({
                "jurisdiction_code": report.jurisdiction_code,
                "organization_id": report.producer_data.organization_id,
            }),
            output_data: json!({
                "error": err.to_string(),
                "completed_steps": self.trail.len(),
            }),
            rule_applied: "failed calculations abort atomically; the attempt itself is recorded"
                .to_string(),
            legal_citation: "n/a - internal failure record".to_string(),
            calculation_method: "synthetic error step appended after pipeline abort".to_string(),
            timestamp: now_rfc3339(),
            jurisdiction: report.jurisdiction_code.clone(),
        };
        self.trail.push(step);
    }
}

/// Convenience entry point: run one calculation with default options.
pub fn calculate_epr_fee(report: &ReportData) -> Result<Calculation, EngineError> {
    Engine::new().calculate(report)
}

fn generate_calculation_id(jurisdiction: Jurisdiction, date: Date) -> String {
    let compact = format_description!("[year][month][day]");
    let date_part = date.format(&compact).unwrap_or_default();
    let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    format!("EPR-{}-{}-{:06X}", jurisdiction.code(), date_part, suffix)
}
