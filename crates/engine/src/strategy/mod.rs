//! Jurisdiction strategy contract and shared helpers.
//!
//! Each supported EPR program implements [`JurisdictionStrategy`]: the
//! base-fee model, eco-modulation rules, exemption rules, and
//! small-producer thresholds for that jurisdiction. The engine selects
//! a strategy from the 2-letter code and drives it through the 8-stage
//! pipeline without knowing which program it is running.

use rust_decimal::Decimal;
use time::Date;

use steward_core::{
    standardize_weight_to_kg, EngineError, Jurisdiction, PackagingComponent, ProducerData,
    ReportData, ValidationError,
};

mod california;
mod colorado;
mod maine;
mod oregon;
mod shared;

pub use california::California;
pub use colorado::Colorado;
pub use maine::Maine;
pub use oregon::Oregon;
pub use shared::SharedResponsibility;

// ──────────────────────────────────────────────
// Small-producer thresholds
// ──────────────────────────────────────────────

/// How revenue and tonnage thresholds combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdOperator {
    #[default]
    And,
    Or,
}

/// Revenue/tonnage thresholds below which a producer owes zero fee.
/// A `None` threshold does not apply in that jurisdiction and always
/// qualifies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmallProducerThresholds {
    pub revenue: Option<Decimal>,
    pub tonnage: Option<Decimal>,
    pub operator: ThresholdOperator,
}

impl SmallProducerThresholds {
    /// Evaluate the thresholds against producer-declared figures.
    ///
    /// The producer-declared `annual_tonnage` is authoritative here; the
    /// itemized packaging weight from unit standardization is never
    /// substituted for it.
    pub fn qualifies(&self, producer: &ProducerData) -> bool {
        let revenue_qualifies = match self.revenue {
            Some(threshold) => producer.annual_revenue < threshold,
            None => true,
        };
        let tonnage_qualifies = match self.tonnage {
            Some(threshold) => producer.annual_tonnage < threshold,
            None => true,
        };
        match self.operator {
            ThresholdOperator::And => revenue_qualifies && tonnage_qualifies,
            ThresholdOperator::Or => revenue_qualifies || tonnage_qualifies,
        }
    }
}

// ──────────────────────────────────────────────
// Strategy result types
// ──────────────────────────────────────────────

/// Jurisdiction-specific result of the base-fee model.
///
/// Different fee models report their number under different names:
/// PRO-led models produce a `base_fee`, reimbursement models a
/// `producer_allocation`, flat-fee paths a `final_fee`. The pipeline
/// extracts one figure via [`FeeComputation::primary_fee`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeeComputation {
    pub base_fee: Option<Decimal>,
    pub producer_allocation: Option<Decimal>,
    pub final_fee: Option<Decimal>,
    /// Pass-through amount added to the fee after eco-modulation;
    /// bonuses and penalties never scale it.
    pub post_modulation_surcharge: Option<Decimal>,
    pub fee_type: String,
    /// Jurisdiction-specific structured detail, carried into the
    /// calculation breakdown verbatim.
    pub breakdown: serde_json::Value,
}

impl FeeComputation {
    /// The single fee figure the pipeline carries forward: `base_fee`,
    /// then `producer_allocation`, then `final_fee`, else zero.
    pub fn primary_fee(&self) -> Decimal {
        self.base_fee
            .or(self.producer_allocation)
            .or(self.final_fee)
            .unwrap_or(Decimal::ZERO)
    }

    /// The unscaled pass-through amount, zero when none applies.
    pub fn surcharge(&self) -> Decimal {
        self.post_modulation_surcharge.unwrap_or(Decimal::ZERO)
    }
}

/// Result of applying eco-modulation to a base fee.
#[derive(Debug, Clone, PartialEq)]
pub struct EcoModulation {
    /// Adjusted fee, floored at zero.
    pub adjusted_fee: Decimal,
    /// `adjusted_fee - base_fee`; negative for a net bonus.
    pub adjustment: Decimal,
    pub detail: serde_json::Value,
}

/// Result of the exemption/discount pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ExemptionOutcome {
    pub final_fee: Decimal,
    /// Set when an exemption or discount changed the fee, e.g.
    /// `"small_producer_exemption"`.
    pub fee_type: Option<String>,
    pub detail: serde_json::Value,
}

impl ExemptionOutcome {
    pub fn unchanged(fee: Decimal) -> Self {
        ExemptionOutcome {
            final_fee: fee,
            fee_type: None,
            detail: serde_json::json!({"exemption_applied": false}),
        }
    }
}

// ──────────────────────────────────────────────
// The contract
// ──────────────────────────────────────────────

/// Jurisdiction-specific calculation rules, one implementation per
/// fee-model family.
pub trait JurisdictionStrategy {
    fn jurisdiction(&self) -> Jurisdiction;

    /// Primary statute backing this program's fee authority.
    fn program_citation(&self) -> &'static str;

    /// Itemized producer field checks. Returns errors, never panics.
    fn validate_producer_data(&self, producer: &ProducerData) -> Vec<ValidationError> {
        validate_producer_common(producer)
    }

    /// Itemized packaging field checks.
    fn validate_packaging_data(&self, components: &[PackagingComponent]) -> Vec<ValidationError> {
        validate_packaging_common(components)
    }

    fn small_producer_thresholds(&self) -> SmallProducerThresholds;

    fn is_small_producer(&self, producer: &ProducerData) -> bool {
        self.small_producer_thresholds().qualifies(producer)
    }

    /// Jurisdiction base-fee / allocation model.
    fn calculate_fee(&self, report: &ReportData, date: Date) -> Result<FeeComputation, EngineError>;

    /// Sustainability bonuses and penalties. Never returns a negative fee.
    fn apply_eco_modulation(&self, base_fee: Decimal, report: &ReportData) -> EcoModulation;

    /// Exemptions and discounts beyond the small-producer zeroing the
    /// pipeline itself performs.
    fn apply_exemptions(&self, fee: Decimal, producer: &ProducerData, date: Date)
        -> ExemptionOutcome;
}

/// Select the strategy for a jurisdiction. Total over the closed enum.
pub fn strategy_for(jurisdiction: Jurisdiction) -> Box<dyn JurisdictionStrategy> {
    match jurisdiction {
        Jurisdiction::Oregon => Box::new(Oregon),
        Jurisdiction::California => Box::new(California),
        Jurisdiction::Colorado => Box::new(Colorado),
        Jurisdiction::Maine => Box::new(Maine),
        Jurisdiction::SharedResponsibility(state) => Box::new(SharedResponsibility::new(state)),
    }
}

// ──────────────────────────────────────────────
// Shared validation
// ──────────────────────────────────────────────

pub(crate) fn validate_producer_common(producer: &ProducerData) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if producer.organization_id.trim().is_empty() {
        errors.push(ValidationError::new(
            "producer_data.organization_id",
            "organization identifier is required",
        ));
    }
    if producer.annual_revenue < Decimal::ZERO {
        errors.push(ValidationError::new(
            "producer_data.annual_revenue",
            "annual revenue must be >= 0",
        ));
    }
    if producer.annual_tonnage < Decimal::ZERO {
        errors.push(ValidationError::new(
            "producer_data.annual_tonnage",
            "annual tonnage must be >= 0",
        ));
    }
    for (i, rate) in producer.annual_recycling_rates.iter().enumerate() {
        if *rate < Decimal::ZERO || *rate > Decimal::ONE {
            errors.push(ValidationError::new(
                format!("producer_data.annual_recycling_rates[{i}]"),
                "recycling rate must be a fraction between 0 and 1",
            ));
        }
    }
    errors
}

pub(crate) fn validate_packaging_common(components: &[PackagingComponent]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if components.is_empty() {
        errors.push(ValidationError::new(
            "packaging_data",
            "at least one packaging component is required",
        ));
        return errors;
    }
    let hundred = Decimal::new(100, 0);
    for (i, c) in components.iter().enumerate() {
        if c.material_type.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("packaging_data[{i}].material_type"),
                "material type is required",
            ));
        }
        if c.weight_per_unit <= Decimal::ZERO {
            errors.push(ValidationError::new(
                format!("packaging_data[{i}].weight_per_unit"),
                "weight per unit must be > 0",
            ));
        }
        if let Err(err) = standardize_weight_to_kg(Decimal::ONE, &c.weight_unit) {
            errors.push(ValidationError::new(
                format!("packaging_data[{i}].weight_unit"),
                err.to_string(),
            ));
        }
        if c.units_sold == 0 {
            errors.push(ValidationError::new(
                format!("packaging_data[{i}].units_sold"),
                "units sold must be > 0",
            ));
        }
        if c.recycled_content_percentage < Decimal::ZERO || c.recycled_content_percentage > hundred
        {
            errors.push(ValidationError::new(
                format!("packaging_data[{i}].recycled_content_percentage"),
                "recycled content percentage must be between 0 and 100",
            ));
        }
        if c.recyclability_score < Decimal::ZERO || c.recyclability_score > hundred {
            errors.push(ValidationError::new(
                format!("packaging_data[{i}].recyclability_score"),
                "recyclability score must be between 0 and 100",
            ));
        }
    }
    errors
}

// ──────────────────────────────────────────────
// Shared arithmetic helpers
// ──────────────────────────────────────────────

/// Standardized weight of one component line item in kg. Components
/// with an unparseable unit contribute zero weight (stage 1 validation
/// rejects them before the pipeline reaches fee arithmetic).
pub(crate) fn component_weight_kg(component: &PackagingComponent) -> Decimal {
    standardize_weight_to_kg(component.total_weight(), &component.weight_unit)
        .unwrap_or(Decimal::ZERO)
}

/// Producer tonnage as a share of system tonnage; zero when the system
/// figure is absent or zero.
pub(crate) fn tonnage_share(producer_tonnage: Decimal, system_tonnage: Decimal) -> Decimal {
    if system_tonnage <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        producer_tonnage / system_tonnage
    }
}

/// A single per-component eco-modulation adjustment, for breakdown detail.
#[derive(Debug, Clone)]
pub(crate) struct ComponentAdjustment {
    pub component_name: String,
    pub weight_share: Decimal,
    pub adjustment_pct: Decimal,
    pub factors: Vec<String>,
}

/// Weight-share-weighted eco-modulation over the packaging list.
///
/// `component_rules` returns each component's signed adjustment as a
/// fraction (e.g. 0.25 for +25%) together with the labels of the rules
/// that fired. The net fee adjustment is the weight-weighted sum of the
/// per-component fractions applied to `base_fee`, floored so the
/// adjusted fee never drops below zero.
pub(crate) fn modulate_by_weight_share(
    base_fee: Decimal,
    components: &[PackagingComponent],
    mut component_rules: impl FnMut(&PackagingComponent) -> (Decimal, Vec<String>),
) -> EcoModulation {
    let total_kg: Decimal = components.iter().map(component_weight_kg).sum();
    let mut net_pct = Decimal::ZERO;
    let mut adjustments: Vec<ComponentAdjustment> = Vec::new();

    for c in components {
        let (pct, factors) = component_rules(c);
        let share = if total_kg > Decimal::ZERO {
            component_weight_kg(c) / total_kg
        } else {
            Decimal::ZERO
        };
        net_pct += pct * share;
        if !factors.is_empty() {
            adjustments.push(ComponentAdjustment {
                component_name: c.component_name.clone(),
                weight_share: share,
                adjustment_pct: pct,
                factors,
            });
        }
    }

    let raw_adjusted = base_fee * (Decimal::ONE + net_pct);
    let adjusted_fee = raw_adjusted.max(Decimal::ZERO);
    let detail = serde_json::json!({
        "net_adjustment_pct": net_pct.to_string(),
        "floored_at_zero": raw_adjusted < Decimal::ZERO,
        "component_adjustments": adjustments.iter().map(|a| serde_json::json!({
            "component_name": a.component_name,
            "weight_share": a.weight_share.to_string(),
            "adjustment_pct": a.adjustment_pct.to_string(),
            "factors": a.factors,
        })).collect::<Vec<_>>(),
    });
    EcoModulation {
        adjusted_fee,
        adjustment: adjusted_fee - base_fee,
        detail,
    }
}

/// Post-consumer recycled content bonus: a reduction of
/// `max_reduction * pcr/100` once content exceeds 25%.
pub(crate) fn pcr_bonus_pct(component: &PackagingComponent, max_reduction: Decimal) -> Decimal {
    let twenty_five = Decimal::new(25, 0);
    if component.recycled_content_percentage > twenty_five {
        -(max_reduction * component.recycled_content_percentage / Decimal::new(100, 0))
    } else {
        Decimal::ZERO
    }
}
