//! The 8-stage calculation pipeline.
//!
//! Stages are pure functions over an accumulating [`PipelineState`]:
//! each consumes the state, produces the next state plus exactly one
//! [`CalculationStep`], and never reads external mutable state. The
//! engine folds them in order; failure at any stage aborts the whole
//! calculation.
//!
//! Stage order is fixed and non-skippable:
//! 1. Data Ingestion & Validation
//! 2. Unit Standardization
//! 3. Material Classification
//! 4. Base Fee Calculation
//! 5. Eco-Modulation
//! 6. Discounts & Exemptions
//! 7. Aggregation & Rounding
//! 8. Audit Trail Generation

use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;
use time::Date;

use steward_core::{
    round_to_currency_precision, standardize_weight_to_kg, EngineError, Jurisdiction, ReportData,
};

use crate::audit::{now_rfc3339, CalculationStep};
use crate::classify::{classify_material, MaterialCategory};
use crate::strategy::{EcoModulation, ExemptionOutcome, FeeComputation, JurisdictionStrategy};

/// A component with its weight standardized to kg. The original weight
/// and unit are preserved beside the standardized values for audit
/// transparency.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedComponent {
    pub component_name: String,
    pub material_type: String,
    pub original_weight_per_unit: Decimal,
    pub original_unit: String,
    pub units_sold: u64,
    pub weight_per_unit_kg: Decimal,
    pub total_weight_kg: Decimal,
}

/// Per-category totals accumulated during classification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategorySummary {
    pub component_count: usize,
    pub weight_kg: Decimal,
}

/// State threaded through the 8 stages, populated stage by stage.
#[derive(Debug)]
pub struct PipelineState {
    pub report: ReportData,
    pub jurisdiction: Jurisdiction,
    pub calculation_date: Date,
    // Stage 2
    pub standardized: Vec<StandardizedComponent>,
    pub total_weight_kg: Decimal,
    // Stage 3
    pub classification: BTreeMap<MaterialCategory, CategorySummary>,
    // Stage 4
    pub fee: Option<FeeComputation>,
    pub base_fee: Decimal,
    // Stage 5
    pub eco: Option<EcoModulation>,
    pub eco_modulated_fee: Decimal,
    // Stage 6
    pub exemption: Option<ExemptionOutcome>,
    pub pre_rounding_fee: Decimal,
    pub fee_type: String,
    // Stage 7
    pub total_fee: Decimal,
    pub rounding_delta: Decimal,
}

impl PipelineState {
    pub fn new(report: ReportData, jurisdiction: Jurisdiction, calculation_date: Date) -> Self {
        PipelineState {
            report,
            jurisdiction,
            calculation_date,
            standardized: Vec::new(),
            total_weight_kg: Decimal::ZERO,
            classification: BTreeMap::new(),
            fee: None,
            base_fee: Decimal::ZERO,
            eco: None,
            eco_modulated_fee: Decimal::ZERO,
            exemption: None,
            pre_rounding_fee: Decimal::ZERO,
            fee_type: String::new(),
            total_fee: Decimal::ZERO,
            rounding_delta: Decimal::ZERO,
        }
    }
}

/// A pipeline stage: pure transformation of the state plus one step.
pub type StageFn = fn(
    &dyn JurisdictionStrategy,
    PipelineState,
) -> Result<(PipelineState, CalculationStep), EngineError>;

/// The 8 stages in execution order.
pub const STAGES: [(&str, StageFn); 8] = [
    ("Data Ingestion & Validation", stage_ingestion),
    ("Unit Standardization", stage_unit_standardization),
    ("Material Classification", stage_classification),
    ("Base Fee Calculation", stage_base_fee),
    ("Eco-Modulation", stage_eco_modulation),
    ("Discounts & Exemptions", stage_exemptions),
    ("Aggregation & Rounding", stage_rounding),
    ("Audit Trail Generation", stage_audit_close),
];

fn make_step(
    step_name: &str,
    state: &PipelineState,
    input_data: serde_json::Value,
    output_data: serde_json::Value,
    rule_applied: &str,
    legal_citation: &str,
    calculation_method: &str,
) -> CalculationStep {
    CalculationStep {
        // Renumbered by the trail on append.
        step_number: 0,
        step_name: step_name.to_string(),
        input_data,
        output_data,
        rule_applied: rule_applied.to_string(),
        legal_citation: legal_citation.to_string(),
        calculation_method: calculation_method.to_string(),
        timestamp: now_rfc3339(),
        jurisdiction: state.jurisdiction.code().to_string(),
    }
}

// ── Stage 1 ──────────────────────────────────────────────

fn stage_ingestion(
    strategy: &dyn JurisdictionStrategy,
    state: PipelineState,
) -> Result<(PipelineState, CalculationStep), EngineError> {
    let mut errors = strategy.validate_producer_data(&state.report.producer_data);
    errors.extend(strategy.validate_packaging_data(&state.report.packaging_data));
    if !errors.is_empty() {
        return Err(EngineError::ValidationFailed { errors });
    }

    let input = json!({
        "organization_id": state.report.producer_data.organization_id,
        "component_count": state.report.packaging_data.len(),
        "has_system_data": state.report.system_data.is_some(),
        "data_source": state.report.data_source,
    });
    let output = json!({
        "validation_errors": 0,
        "annual_revenue": state.report.producer_data.annual_revenue.to_string(),
        "annual_tonnage": state.report.producer_data.annual_tonnage.to_string(),
    });
    let step = make_step(
        "Data Ingestion & Validation",
        &state,
        input,
        output,
        "producer and packaging data must pass itemized field validation before any fee arithmetic",
        strategy.program_citation(),
        "required-field, non-negativity, and range checks over producer and packaging data",
    );
    Ok((state, step))
}

// ── Stage 2 ──────────────────────────────────────────────

fn stage_unit_standardization(
    strategy: &dyn JurisdictionStrategy,
    mut state: PipelineState,
) -> Result<(PipelineState, CalculationStep), EngineError> {
    let mut standardized = Vec::with_capacity(state.report.packaging_data.len());
    let mut total_kg = Decimal::ZERO;
    for c in &state.report.packaging_data {
        let per_unit_kg = standardize_weight_to_kg(c.weight_per_unit, &c.weight_unit)?;
        let total = per_unit_kg * Decimal::from(c.units_sold);
        total_kg += total;
        standardized.push(StandardizedComponent {
            component_name: c.component_name.clone(),
            material_type: c.material_type.clone(),
            original_weight_per_unit: c.weight_per_unit,
            original_unit: c.weight_unit.clone(),
            units_sold: c.units_sold,
            weight_per_unit_kg: per_unit_kg,
            total_weight_kg: total,
        });
    }

    let input = json!({
        "components": state.report.packaging_data.iter().map(|c| json!({
            "component_name": c.component_name,
            "weight_per_unit": c.weight_per_unit.to_string(),
            "weight_unit": c.weight_unit,
            "units_sold": c.units_sold,
        })).collect::<Vec<_>>(),
    });
    let output = json!({
        "components": standardized.iter().map(|s| json!({
            "component_name": s.component_name,
            "original_weight_per_unit": s.original_weight_per_unit.to_string(),
            "original_unit": s.original_unit,
            "weight_per_unit_kg": s.weight_per_unit_kg.to_string(),
            "total_weight_kg": s.total_weight_kg.to_string(),
        })).collect::<Vec<_>>(),
        "total_weight_kg": total_kg.to_string(),
    });

    state.standardized = standardized;
    state.total_weight_kg = total_kg;
    let step = make_step(
        "Unit Standardization",
        &state,
        input,
        output,
        "all packaging weights convert to kilograms via the fixed conversion table",
        strategy.program_citation(),
        "weight_per_unit * conversion_factor * units_sold, exact decimal arithmetic",
    );
    Ok((state, step))
}

// ── Stage 3 ──────────────────────────────────────────────

fn stage_classification(
    strategy: &dyn JurisdictionStrategy,
    mut state: PipelineState,
) -> Result<(PipelineState, CalculationStep), EngineError> {
    let mut summary: BTreeMap<MaterialCategory, CategorySummary> = BTreeMap::new();
    let mut per_component = Vec::new();
    for s in &state.standardized {
        let category = classify_material(&s.material_type);
        let entry = summary.entry(category).or_default();
        entry.component_count += 1;
        entry.weight_kg += s.total_weight_kg;
        per_component.push(json!({
            "component_name": s.component_name,
            "material_type": s.material_type,
            "category": category.name(),
            "code": category.code(),
            "recyclable": category.recyclable(),
            "fee_applicable": category.fee_applicable(),
        }));
    }

    let input = json!({
        "material_types": state.standardized.iter()
            .map(|s| s.material_type.clone())
            .collect::<Vec<_>>(),
    });
    let output = json!({
        "components": per_component,
        "category_summary": summary.iter().map(|(cat, s)| json!({
            "category": cat.name(),
            "component_count": s.component_count,
            "weight_kg": s.weight_kg.to_string(),
        })).collect::<Vec<_>>(),
    });

    state.classification = summary;
    let step = make_step(
        "Material Classification",
        &state,
        input,
        output,
        "material types map to jurisdiction categories by keyword matching",
        strategy.program_citation(),
        "keyword lookup: plastic/pet, glass, metal/aluminum, cardboard, paper, else composite",
    );
    Ok((state, step))
}

// ── Stage 4 ──────────────────────────────────────────────

fn stage_base_fee(
    strategy: &dyn JurisdictionStrategy,
    mut state: PipelineState,
) -> Result<(PipelineState, CalculationStep), EngineError> {
    let fee = strategy.calculate_fee(&state.report, state.calculation_date)?;
    let base_fee = fee.primary_fee();

    let input = json!({
        "total_weight_kg": state.total_weight_kg.to_string(),
        "annual_tonnage": state.report.producer_data.annual_tonnage.to_string(),
        "calculation_date": state.calculation_date.to_string(),
    });
    let output = json!({
        "base_fee": base_fee.to_string(),
        "fee_type": fee.fee_type,
        "breakdown": fee.breakdown,
    });

    state.fee_type = fee.fee_type.clone();
    state.fee = Some(fee);
    state.base_fee = base_fee;
    let step = make_step(
        "Base Fee Calculation",
        &state,
        input,
        output,
        "jurisdiction base-fee model over standardized weights and declared tonnage",
        strategy.program_citation(),
        "strategy fee model; single figure extracted preferring base_fee, then producer_allocation, then final_fee",
    );
    Ok((state, step))
}

// ── Stage 5 ──────────────────────────────────────────────

fn stage_eco_modulation(
    strategy: &dyn JurisdictionStrategy,
    mut state: PipelineState,
) -> Result<(PipelineState, CalculationStep), EngineError> {
    let eco = strategy.apply_eco_modulation(state.base_fee, &state.report);
    let adjustment_pct = if state.base_fee > Decimal::ZERO {
        eco.adjustment / state.base_fee
    } else {
        Decimal::ZERO
    };
    // Pass-through surcharges join after modulation, unscaled.
    let surcharge = state
        .fee
        .as_ref()
        .map(FeeComputation::surcharge)
        .unwrap_or(Decimal::ZERO);
    let modulated_total = eco.adjusted_fee + surcharge;

    let input = json!({
        "base_fee": state.base_fee.to_string(),
        "post_modulation_surcharge": surcharge.to_string(),
    });
    let output = json!({
        "eco_modulated_fee": modulated_total.to_string(),
        "modulated_base_fee": eco.adjusted_fee.to_string(),
        "adjustment": eco.adjustment.to_string(),
        "adjustment_pct": adjustment_pct.to_string(),
        "detail": eco.detail,
    });

    state.eco_modulated_fee = modulated_total;
    state.eco = Some(eco);
    let step = make_step(
        "Eco-Modulation",
        &state,
        input,
        output,
        "sustainability bonuses and penalties adjust the base fee, never a pass-through surcharge; the result never drops below zero",
        strategy.program_citation(),
        "weight-share-weighted component adjustments applied to the base fee, surcharge added after",
    );
    Ok((state, step))
}

// ── Stage 6 ──────────────────────────────────────────────

fn stage_exemptions(
    strategy: &dyn JurisdictionStrategy,
    mut state: PipelineState,
) -> Result<(PipelineState, CalculationStep), EngineError> {
    let input = json!({
        "eco_modulated_fee": state.eco_modulated_fee.to_string(),
        "annual_revenue": state.report.producer_data.annual_revenue.to_string(),
        "annual_tonnage": state.report.producer_data.annual_tonnage.to_string(),
    });

    // Full small-producer exemption dominates whatever stage 5 produced.
    let outcome = if strategy.is_small_producer(&state.report.producer_data) {
        ExemptionOutcome {
            final_fee: Decimal::ZERO,
            fee_type: Some("small_producer_exemption".to_string()),
            detail: json!({"small_producer": true}),
        }
    } else {
        strategy.apply_exemptions(
            state.eco_modulated_fee,
            &state.report.producer_data,
            state.calculation_date,
        )
    };

    let output = json!({
        "final_fee": outcome.final_fee.to_string(),
        "exemption_applied": outcome.fee_type,
        "detail": outcome.detail,
    });

    state.pre_rounding_fee = outcome.final_fee;
    if let Some(fee_type) = &outcome.fee_type {
        state.fee_type = fee_type.clone();
    }
    state.exemption = Some(outcome);
    let step = make_step(
        "Discounts & Exemptions",
        &state,
        input,
        output,
        "small-producer exemption zeroes the fee; otherwise jurisdiction discounts apply",
        strategy.program_citation(),
        "threshold comparison on producer-declared revenue and tonnage, then strategy exemption rules",
    );
    Ok((state, step))
}

// ── Stage 7 ──────────────────────────────────────────────

fn stage_rounding(
    strategy: &dyn JurisdictionStrategy,
    mut state: PipelineState,
) -> Result<(PipelineState, CalculationStep), EngineError> {
    let rounded = round_to_currency_precision(state.pre_rounding_fee);
    let delta = rounded - state.pre_rounding_fee;

    let input = json!({"pre_rounding_fee": state.pre_rounding_fee.to_string()});
    let output = json!({
        "total_fee": rounded.to_string(),
        "rounding_delta": delta.to_string(),
        "currency": "USD",
    });

    state.total_fee = rounded;
    state.rounding_delta = delta;
    let step = make_step(
        "Aggregation & Rounding",
        &state,
        input,
        output,
        "totals round to 2 decimal places with banker's rounding (round-half-to-even)",
        strategy.program_citation(),
        "round_dp_with_strategy(2, MidpointNearestEven)",
    );
    Ok((state, step))
}

// ── Stage 8 ──────────────────────────────────────────────

fn stage_audit_close(
    strategy: &dyn JurisdictionStrategy,
    state: PipelineState,
) -> Result<(PipelineState, CalculationStep), EngineError> {
    let input = json!({"stages_completed": STAGES.len() - 1});
    let output = json!({
        "total_steps": STAGES.len(),
        "total_fee": state.total_fee.to_string(),
        "fee_type": state.fee_type,
        "trail_status": "immutable",
    });
    let step = make_step(
        "Audit Trail Generation",
        &state,
        input,
        output,
        "the completed trail is sealed; steps are append-only and never mutated after this point",
        strategy.program_citation(),
        "closing summary over the recorded calculation steps",
    );
    Ok((state, step))
}
