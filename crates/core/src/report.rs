//! Calculation input contract.
//!
//! These types are the full in-memory input to a fee calculation. They
//! are deserialized from report JSON and never mutated afterwards; the
//! engine treats them as an immutable snapshot per invocation.
//!
//! Decimal fields are string-encoded in JSON (`"annual_revenue":
//! "6000000"`) so values carry no binary-float representation error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Scope of the reported annual revenue figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueScope {
    #[default]
    Global,
    CaliforniaOnly,
}

/// Producer-level attributes, authoritative for exemption thresholds.
///
/// `annual_tonnage` is the producer-declared figure; threshold checks
/// read it directly rather than re-deriving tonnage from the itemized
/// packaging list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerData {
    pub organization_id: String,
    pub annual_revenue: Decimal,
    #[serde(default)]
    pub revenue_scope: RevenueScope,
    pub annual_tonnage: Decimal,
    #[serde(default)]
    pub produces_perishable_food: bool,
    #[serde(default)]
    pub has_lca_disclosure: bool,
    #[serde(default)]
    pub has_environmental_impact_reduction: bool,
    #[serde(default)]
    pub uses_reusable_packaging: bool,
    /// Historical annual recycling rates as fractions (0..=1),
    /// most-recent-last.
    #[serde(default)]
    pub annual_recycling_rates: Vec<Decimal>,
}

/// A single packaging component line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagingComponent {
    pub material_type: String,
    pub component_name: String,
    pub weight_per_unit: Decimal,
    pub weight_unit: String,
    pub units_sold: u64,
    /// Post-consumer recycled content, 0-100.
    #[serde(default)]
    pub recycled_content_percentage: Decimal,
    #[serde(default)]
    pub recyclable: bool,
    #[serde(default)]
    pub reusable: bool,
    #[serde(default)]
    pub disrupts_recycling: bool,
    #[serde(default)]
    pub contains_pfas: bool,
    #[serde(default)]
    pub contains_phthalates: bool,
    #[serde(default)]
    pub marine_degradable: bool,
    #[serde(default)]
    pub harmful_to_marine_life: bool,
    #[serde(default)]
    pub bay_friendly: bool,
    #[serde(default)]
    pub cold_weather_stable: bool,
    #[serde(default)]
    pub is_beverage_container: bool,
    #[serde(default)]
    pub ca_plastic_component_flag: bool,
    #[serde(default)]
    pub me_toxicity_flag: bool,
    /// Design-for-recyclability score, 0-100.
    #[serde(default)]
    pub recyclability_score: Decimal,
}

impl PackagingComponent {
    /// Total reported weight for this line item, in the original unit.
    pub fn total_weight(&self) -> Decimal {
        self.weight_per_unit * Decimal::from(self.units_sold)
    }
}

/// Material disposition tonnages reported by a municipality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialFlow {
    pub material_type: String,
    #[serde(default)]
    pub recycled_tons: Decimal,
    #[serde(default)]
    pub wte_tons: Decimal,
    #[serde(default)]
    pub landfill_tons: Decimal,
}

/// A municipality participating in a state-run reimbursement program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Municipality {
    pub name: String,
    pub population: u64,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub material_flows: Vec<MaterialFlow>,
}

/// Jurisdiction-dependent aggregate system costs. Required by the
/// municipal-reimbursement and shared-responsibility models; PRO-led
/// models read only the commodity fields when present.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemData {
    #[serde(default)]
    pub municipal_support_costs: Decimal,
    #[serde(default)]
    pub collection_costs: Decimal,
    #[serde(default)]
    pub processing_costs: Decimal,
    #[serde(default)]
    pub transportation_costs: Decimal,
    #[serde(default)]
    pub administrative_costs: Decimal,
    #[serde(default)]
    pub infrastructure_costs: Decimal,
    #[serde(default)]
    pub material_revenue: Decimal,
    #[serde(default)]
    pub system_total_tonnage: Decimal,
    #[serde(default)]
    pub municipalities: Vec<Municipality>,
}

/// Full input to one fee calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    /// 2-letter code, one of OR, CA, CO, ME, MD, MN, WA.
    pub jurisdiction_code: String,
    pub producer_data: ProducerData,
    pub packaging_data: Vec<PackagingComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_data: Option<SystemData>,
    /// ISO-8601 calendar date the calculation is performed "as of".
    /// Defaults to today (UTC) when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
}
