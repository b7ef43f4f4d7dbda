//! Oregon Recycling Modernization Act (PRO-led fee model).
//!
//! Base fee is a per-material per-kg rate over standardized weights,
//! plus processor pass-through costs (commodity risk + contamination
//! management) when system commodity data is reported. Producers under
//! the low-volume thresholds pay a flat tier fee instead of the
//! weight-based fee.

use rust_decimal::Decimal;
use serde_json::json;
use time::Date;

use steward_core::{
    EngineError, Jurisdiction, PackagingComponent, ProducerData, ReportData, SystemData,
};

use crate::classify::classify_material;
use crate::strategy::{
    component_weight_kg, EcoModulation, ExemptionOutcome, FeeComputation, JurisdictionStrategy,
    SmallProducerThresholds, ThresholdOperator,
};

pub struct Oregon;

const CITATION: &str = "ORS 459A.860-459A.975 (Recycling Modernization Act)";

/// Per-kg base rates by material category, USD.
fn rate_per_kg(component: &PackagingComponent) -> Decimal {
    use crate::classify::MaterialCategory::*;
    match classify_material(&component.material_type) {
        Plastic => Decimal::new(2646, 4),   // 0.2646
        Glass => Decimal::new(493, 4),      // 0.0493
        Metal => Decimal::new(968, 4),      // 0.0968
        Paper => Decimal::new(1126, 4),     // 0.1126
        Cardboard => Decimal::new(774, 4),  // 0.0774
        Composite => Decimal::new(3312, 4), // 0.3312
    }
}

/// Year-indexed commodity reference rate, USD per ton.
fn commodity_reference_rate(year: i32) -> Decimal {
    match year {
        ..=2025 => Decimal::new(8200, 2),
        2026 => Decimal::new(8450, 2),
        _ => Decimal::new(8710, 2),
    }
}

/// Year-indexed contamination management rate, USD per ton.
fn contamination_rate(year: i32) -> Decimal {
    match year {
        ..=2025 => Decimal::new(1200, 2),
        2026 => Decimal::new(1240, 2),
        _ => Decimal::new(1280, 2),
    }
}

/// Low-volume flat tiers: tonnage -> flat annual fee. Tier boundaries
/// are inclusive (exactly 2 t pays the 2 t tier).
fn low_volume_tier(tonnage: Decimal) -> Option<Decimal> {
    let t = |n: i64| Decimal::new(n, 0);
    if tonnage <= t(1) {
        Some(t(700))
    } else if tonnage <= t(2) {
        Some(t(1400))
    } else if tonnage <= t(3) {
        Some(t(2200))
    } else if tonnage <= t(4) {
        Some(t(3200))
    } else if tonnage < t(5) {
        Some(t(4400))
    } else {
        None
    }
}

/// Commodity risk fee: max(0, reference rate - average commodity value)
/// per eligible ton. Average commodity value comes from system-reported
/// material revenue per system ton.
fn commodity_risk_fee(year: i32, eligible_tons: Decimal, system: &SystemData) -> Decimal {
    let avg_commodity_value = if system.system_total_tonnage > Decimal::ZERO {
        system.material_revenue / system.system_total_tonnage
    } else {
        Decimal::ZERO
    };
    let risk = (commodity_reference_rate(year) - avg_commodity_value).max(Decimal::ZERO);
    risk * eligible_tons
}

/// Contamination management fee: year-indexed rate per eligible ton,
/// scaled by the statewide contamination factor 0.467.
fn contamination_management_fee(year: i32, eligible_tons: Decimal) -> Decimal {
    contamination_rate(year) * eligible_tons * Decimal::new(467, 3)
}

impl JurisdictionStrategy for Oregon {
    fn jurisdiction(&self) -> Jurisdiction {
        Jurisdiction::Oregon
    }

    fn program_citation(&self) -> &'static str {
        CITATION
    }

    fn small_producer_thresholds(&self) -> SmallProducerThresholds {
        SmallProducerThresholds {
            revenue: Some(Decimal::new(5_000_000, 0)),
            tonnage: Some(Decimal::ONE),
            operator: ThresholdOperator::And,
        }
    }

    fn calculate_fee(
        &self,
        report: &ReportData,
        date: Date,
    ) -> Result<FeeComputation, EngineError> {
        let producer = &report.producer_data;

        if self.is_small_producer(producer) {
            return Ok(FeeComputation {
                base_fee: None,
                producer_allocation: None,
                final_fee: Some(Decimal::ZERO),
                post_modulation_surcharge: None,
                fee_type: "small_producer_exemption".to_string(),
                breakdown: json!({
                    "exemption": "revenue < $5M and tonnage < 1t",
                }),
            });
        }

        let weight_based_fee: Decimal = report
            .packaging_data
            .iter()
            .map(|c| rate_per_kg(c) * component_weight_kg(c))
            .sum();

        // Low-volume producers pay a flat tier instead of the
        // weight-based fee.
        let low_volume_eligible = producer.annual_revenue < Decimal::new(10_000_000, 0)
            || producer.annual_tonnage < Decimal::new(5, 0);
        if low_volume_eligible {
            if let Some(flat_fee) = low_volume_tier(producer.annual_tonnage) {
                return Ok(FeeComputation {
                    base_fee: None,
                    producer_allocation: None,
                    final_fee: Some(flat_fee),
                    post_modulation_surcharge: None,
                    fee_type: "low_volume_flat_fee".to_string(),
                    breakdown: json!({
                        "flat_fee": flat_fee.to_string(),
                        "weight_based_fee_superseded": weight_based_fee.to_string(),
                        "annual_tonnage": producer.annual_tonnage.to_string(),
                    }),
                });
            }
        }

        let year = date.year();
        let eligible_tons = producer.annual_tonnage;
        // Pass-through costs require system commodity reporting.
        let (crf, cmf) = match &report.system_data {
            Some(system) => (
                commodity_risk_fee(year, eligible_tons, system),
                contamination_management_fee(year, eligible_tons),
            ),
            None => (Decimal::ZERO, Decimal::ZERO),
        };

        let base_fee = weight_based_fee + crf + cmf;
        Ok(FeeComputation {
            base_fee: Some(base_fee),
            producer_allocation: None,
            final_fee: None,
            post_modulation_surcharge: None,
            fee_type: "standard_weight_based".to_string(),
            breakdown: json!({
                "weight_based_fee": weight_based_fee.to_string(),
                "commodity_risk_fee": crf.to_string(),
                "contamination_management_fee": cmf.to_string(),
                "rate_year": year,
            }),
        })
    }

    fn apply_eco_modulation(&self, base_fee: Decimal, report: &ReportData) -> EcoModulation {
        let producer = &report.producer_data;
        let mut bonus_pct = Decimal::ZERO;
        let mut bonuses: Vec<&str> = Vec::new();
        if producer.has_lca_disclosure {
            bonus_pct += Decimal::new(5, 2);
            bonuses.push("lca_disclosure_bonus_5pct");
        }
        if producer.has_environmental_impact_reduction {
            bonus_pct += Decimal::new(10, 2);
            bonuses.push("impact_reduction_bonus_10pct");
        }
        if producer.uses_reusable_packaging {
            bonus_pct += Decimal::new(15, 2);
            bonuses.push("reusable_packaging_bonus_15pct");
        }
        // Stackable bonuses cap at 25%.
        let cap = Decimal::new(25, 2);
        let capped = bonus_pct.min(cap);
        let adjusted_fee = (base_fee * (Decimal::ONE - capped)).max(Decimal::ZERO);
        EcoModulation {
            adjusted_fee,
            adjustment: adjusted_fee - base_fee,
            detail: json!({
                "bonuses_applied": bonuses,
                "total_bonus_pct": capped.to_string(),
                "capped": bonus_pct > cap,
            }),
        }
    }

    fn apply_exemptions(
        &self,
        fee: Decimal,
        _producer: &ProducerData,
        _date: Date,
    ) -> ExemptionOutcome {
        // Oregon's exemptions (small producer, low-volume tiers) are
        // resolved in the base-fee model; nothing further applies here.
        ExemptionOutcome::unchanged(fee)
    }
}
