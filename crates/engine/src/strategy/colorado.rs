//! Colorado Producer Responsibility Program (100% municipal
//! reimbursement model).
//!
//! Producers fund the full net system cost. Each producer's allocation
//! is its tonnage share of the net cost, scaled by a material-weighted
//! cost factor reflecting how expensive its packaging mix is to collect
//! and process.

use rust_decimal::Decimal;
use serde_json::json;
use time::Date;

use steward_core::{
    EngineError, Jurisdiction, PackagingComponent, ProducerData, ReportData,
};

use crate::classify::{classify_material, is_foam, MaterialCategory};
use crate::strategy::{
    component_weight_kg, modulate_by_weight_share, pcr_bonus_pct, tonnage_share, EcoModulation,
    ExemptionOutcome, FeeComputation, JurisdictionStrategy, SmallProducerThresholds,
    ThresholdOperator,
};

pub struct Colorado;

const CITATION: &str = "HB22-1355, C.R.S. 25-17-701 et seq.";

/// Material-specific cost multiplier. Foam is the most expensive stream
/// to handle (2.0), cardboard the cheapest (0.6).
fn material_cost_factor(component: &PackagingComponent) -> Decimal {
    if is_foam(&component.material_type) {
        return Decimal::new(20, 1);
    }
    match classify_material(&component.material_type) {
        MaterialCategory::Cardboard => Decimal::new(6, 1),
        MaterialCategory::Paper => Decimal::new(8, 1),
        MaterialCategory::Metal => Decimal::new(9, 1),
        MaterialCategory::Glass => Decimal::new(11, 1),
        MaterialCategory::Plastic => Decimal::new(14, 1),
        MaterialCategory::Composite => Decimal::new(17, 1),
    }
}

impl JurisdictionStrategy for Colorado {
    fn jurisdiction(&self) -> Jurisdiction {
        Jurisdiction::Colorado
    }

    fn program_citation(&self) -> &'static str {
        CITATION
    }

    fn small_producer_thresholds(&self) -> SmallProducerThresholds {
        SmallProducerThresholds {
            revenue: Some(Decimal::new(5_000_000, 0)),
            tonnage: Some(Decimal::ONE),
            operator: ThresholdOperator::Or,
        }
    }

    fn calculate_fee(
        &self,
        report: &ReportData,
        _date: Date,
    ) -> Result<FeeComputation, EngineError> {
        let system = report.system_data.as_ref().ok_or_else(|| {
            EngineError::CalculationFailed {
                stage: "Base Fee Calculation",
                message: "Colorado municipal reimbursement requires system_data".to_string(),
            }
        })?;

        // Net system cost: five cost categories less material revenue,
        // floored at zero.
        let gross_cost = system.municipal_support_costs
            + system.collection_costs
            + system.processing_costs
            + system.transportation_costs
            + system.administrative_costs;
        let total_cost = (gross_cost - system.material_revenue).max(Decimal::ZERO);

        let share = tonnage_share(report.producer_data.annual_tonnage, system.system_total_tonnage);

        // Weight-averaged material cost factor over the packaging mix.
        let total_kg: Decimal = report.packaging_data.iter().map(component_weight_kg).sum();
        let cost_factor = if total_kg > Decimal::ZERO {
            report
                .packaging_data
                .iter()
                .map(|c| material_cost_factor(c) * component_weight_kg(c))
                .sum::<Decimal>()
                / total_kg
        } else {
            Decimal::ONE
        };

        let producer_allocation = total_cost * share * cost_factor;
        Ok(FeeComputation {
            base_fee: None,
            producer_allocation: Some(producer_allocation),
            final_fee: None,
            post_modulation_surcharge: None,
            fee_type: "municipal_reimbursement".to_string(),
            breakdown: json!({
                "gross_system_cost": gross_cost.to_string(),
                "material_revenue_offset": system.material_revenue.to_string(),
                "net_system_cost": total_cost.to_string(),
                "tonnage_share": share.to_string(),
                "material_cost_factor": cost_factor.to_string(),
            }),
        })
    }

    fn apply_eco_modulation(&self, base_fee: Decimal, report: &ReportData) -> EcoModulation {
        modulate_by_weight_share(base_fee, &report.packaging_data, |c| {
            let mut pct = Decimal::ZERO;
            let mut factors: Vec<String> = Vec::new();

            let pcr = pcr_bonus_pct(c, Decimal::new(20, 2));
            if pcr != Decimal::ZERO {
                pct += pcr;
                factors.push("pcr_bonus_up_to_20pct".into());
            }
            if c.reusable {
                pct -= Decimal::new(30, 2);
                factors.push("reusability_bonus_30pct".into());
            }
            if c.disrupts_recycling {
                pct += Decimal::new(50, 2);
                factors.push("recycling_disruption_penalty_50pct".into());
            }
            if c.recyclable {
                pct -= Decimal::new(15, 2);
                factors.push("design_for_recyclability_bonus_15pct".into());
            } else {
                pct += Decimal::new(40, 2);
                factors.push("non_recyclable_design_penalty_40pct".into());
            }
            if is_foam(&c.material_type) {
                pct += Decimal::new(25, 2);
                factors.push("foam_polystyrene_penalty_25pct".into());
            }
            (pct, factors)
        })
    }

    fn apply_exemptions(
        &self,
        fee: Decimal,
        _producer: &ProducerData,
        _date: Date,
    ) -> ExemptionOutcome {
        // Colorado's only exemption is the small-producer zeroing, which
        // the pipeline applies before this hook.
        ExemptionOutcome::unchanged(fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    fn report(material: &str, system: Option<serde_json::Value>) -> ReportData {
        let mut v = json!({
            "jurisdiction_code": "CO",
            "producer_data": {
                "organization_id": "acme",
                "annual_revenue": "30000000",
                "annual_tonnage": "100",
            },
            "packaging_data": [{
                "material_type": material,
                "component_name": "part",
                "weight_per_unit": "1",
                "weight_unit": "kg",
                "units_sold": 1000,
            }],
        });
        if let Some(s) = system {
            v["system_data"] = s;
        }
        serde_json::from_value(v).unwrap()
    }

    fn system() -> serde_json::Value {
        json!({
            "municipal_support_costs": "1000000",
            "collection_costs": "2000000",
            "processing_costs": "1500000",
            "transportation_costs": "500000",
            "administrative_costs": "250000",
            "material_revenue": "750000",
            "system_total_tonnage": "10000",
        })
    }

    #[test]
    fn allocation_scales_cost_by_share_and_material_factor() {
        let r = report("corrugated cardboard", Some(system()));
        let fee = Colorado.calculate_fee(&r, date!(2026 - 01 - 01)).unwrap();
        // net cost 4,500,000 * share 0.01 * cardboard factor 0.6 = 27,000
        assert_eq!(fee.primary_fee(), Decimal::new(27_000, 0));
        assert_eq!(fee.fee_type, "municipal_reimbursement");
    }

    #[test]
    fn foam_carries_the_highest_cost_factor() {
        let r = report("EPS foam", Some(system()));
        let fee = Colorado.calculate_fee(&r, date!(2026 - 01 - 01)).unwrap();
        // net cost 4,500,000 * 0.01 * 2.0 = 90,000
        assert_eq!(fee.primary_fee(), Decimal::new(90_000, 0));
    }

    #[test]
    fn net_cost_floors_at_zero_when_revenue_exceeds_costs() {
        let mut s = system();
        s["material_revenue"] = json!("99000000");
        let r = report("glass", Some(s));
        let fee = Colorado.calculate_fee(&r, date!(2026 - 01 - 01)).unwrap();
        assert_eq!(fee.primary_fee(), Decimal::ZERO);
    }

    #[test]
    fn missing_system_data_fails() {
        let r = report("glass", None);
        let err = Colorado.calculate_fee(&r, date!(2026 - 01 - 01)).unwrap_err();
        assert!(matches!(err, EngineError::CalculationFailed { .. }));
    }

    #[test]
    fn small_producer_is_revenue_or_tonnage() {
        let small_revenue: ProducerData = serde_json::from_value(json!({
            "organization_id": "a",
            "annual_revenue": "4000000",
            "annual_tonnage": "500",
        }))
        .unwrap();
        let small_tonnage: ProducerData = serde_json::from_value(json!({
            "organization_id": "b",
            "annual_revenue": "50000000",
            "annual_tonnage": "0.5",
        }))
        .unwrap();
        assert!(Colorado.is_small_producer(&small_revenue));
        assert!(Colorado.is_small_producer(&small_tonnage));
    }

    #[test]
    fn disruption_and_design_penalties_stack() {
        let mut r = report("multi-layer laminate", Some(system()));
        r.packaging_data[0].disrupts_recycling = true;
        let result = Colorado.apply_eco_modulation(Decimal::new(100, 0), &r);
        // +50% disruption, +40% non-recyclable design
        assert_eq!(result.adjusted_fee, Decimal::new(190, 0));
    }

    #[test]
    fn reusable_recyclable_pcr_component_earns_stacked_bonuses() {
        let mut r = report("glass", Some(system()));
        r.packaging_data[0].reusable = true;
        r.packaging_data[0].recyclable = true;
        r.packaging_data[0].recycled_content_percentage = Decimal::new(50, 0);
        let result = Colorado.apply_eco_modulation(Decimal::new(1000, 0), &r);
        // -30% reusable, -15% design, -10% pcr (20% * 50/100) = -55%
        assert_eq!(result.adjusted_fee, Decimal::new(450, 0));
    }
}
