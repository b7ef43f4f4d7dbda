//! California SB 54 (PRO-led fee model).
//!
//! Rates come from the hierarchical Covered Material Category table:
//! Class > Type > Form, most specific entry wins. From 2027 the Plastic
//! Pollution Mitigation Fund adds a tonnage-share allocation of the
//! $500M annual fund on top of the eco-modulated weight-based fee.

use rust_decimal::Decimal;
use serde_json::json;
use time::Date;

use steward_core::{
    EngineError, Jurisdiction, PackagingComponent, ProducerData, ReportData,
};

use crate::classify::{classify_material, MaterialCategory};
use crate::strategy::{
    component_weight_kg, modulate_by_weight_share, pcr_bonus_pct, tonnage_share, EcoModulation,
    ExemptionOutcome, FeeComputation, JurisdictionStrategy, SmallProducerThresholds,
    ThresholdOperator,
};

pub struct California;

const CITATION: &str =
    "SB 54 (Plastic Pollution Prevention and Packaging Producer Responsibility Act), PRC 42040 et seq.";

/// Plastic Pollution Mitigation Fund annual total, USD.
const POLLUTION_FUND_TOTAL: i64 = 500_000_000;

/// CMC position of a component: (class, type, form). Type and form are
/// recognized from the material string; absent levels fall back to the
/// class rate.
fn cmc_position(component: &PackagingComponent) -> (MaterialCategory, Option<&'static str>, Option<&'static str>) {
    let class = classify_material(&component.material_type);
    let m = component.material_type.to_ascii_lowercase();
    let cmc_type = match class {
        MaterialCategory::Plastic if m.contains("pet") => Some("pet"),
        MaterialCategory::Plastic if m.contains("hdpe") => Some("hdpe"),
        MaterialCategory::Plastic if m.contains("film") => Some("film"),
        MaterialCategory::Paper if m.contains("coated") => Some("coated"),
        _ => None,
    };
    let cmc_form = match cmc_type {
        Some("pet") if m.contains("thermoform") => Some("thermoform"),
        Some("film") if m.contains("pouch") => Some("flexible_pouch"),
        _ => None,
    };
    (class, cmc_type, cmc_form)
}

/// Resolve the per-kg rate for a CMC position, most specific level first.
fn cmc_rate(class: MaterialCategory, cmc_type: Option<&str>, cmc_form: Option<&str>) -> Decimal {
    if let (Some(t), Some(f)) = (cmc_type, cmc_form) {
        match (t, f) {
            ("pet", "thermoform") => return Decimal::new(2110, 4),
            ("film", "flexible_pouch") => return Decimal::new(3720, 4),
            _ => {}
        }
    }
    if let Some(t) = cmc_type {
        match t {
            "pet" => return Decimal::new(1840, 4),
            "hdpe" => return Decimal::new(1980, 4),
            "film" => return Decimal::new(3410, 4),
            "coated" => return Decimal::new(1350, 4),
            _ => {}
        }
    }
    match class {
        MaterialCategory::Plastic => Decimal::new(2200, 4),
        MaterialCategory::Glass => Decimal::new(510, 4),
        MaterialCategory::Metal => Decimal::new(890, 4),
        MaterialCategory::Paper => Decimal::new(980, 4),
        MaterialCategory::Cardboard => Decimal::new(720, 4),
        MaterialCategory::Composite => Decimal::new(2950, 4),
    }
}

impl JurisdictionStrategy for California {
    fn jurisdiction(&self) -> Jurisdiction {
        Jurisdiction::California
    }

    fn program_citation(&self) -> &'static str {
        CITATION
    }

    fn small_producer_thresholds(&self) -> SmallProducerThresholds {
        // $1M in-state revenue, no tonnage threshold.
        SmallProducerThresholds {
            revenue: Some(Decimal::new(1_000_000, 0)),
            tonnage: None,
            operator: ThresholdOperator::And,
        }
    }

    fn calculate_fee(
        &self,
        report: &ReportData,
        date: Date,
    ) -> Result<FeeComputation, EngineError> {
        let mut component_fees = Vec::new();
        let mut weight_based_fee = Decimal::ZERO;
        for c in &report.packaging_data {
            let (class, cmc_type, cmc_form) = cmc_position(c);
            let rate = cmc_rate(class, cmc_type, cmc_form);
            let kg = component_weight_kg(c);
            let fee = rate * kg;
            weight_based_fee += fee;
            component_fees.push(json!({
                "component_name": c.component_name,
                "cmc_class": class.name(),
                "cmc_type": cmc_type,
                "cmc_form": cmc_form,
                "rate_per_kg": rate.to_string(),
                "weight_kg": kg.to_string(),
                "fee": fee.to_string(),
            }));
        }

        // Plastic Pollution Mitigation Fund allocation from 2027.
        let pollution_fund_fee = if date.year() >= 2027 {
            let system_tonnage = report
                .system_data
                .as_ref()
                .map(|s| s.system_total_tonnage)
                .unwrap_or(Decimal::ZERO);
            Decimal::from(POLLUTION_FUND_TOTAL)
                * tonnage_share(report.producer_data.annual_tonnage, system_tonnage)
        } else {
            Decimal::ZERO
        };

        // The fund allocation is a pass-through share of a fixed-size
        // fund; eco-modulation applies to the weight-based fee only.
        Ok(FeeComputation {
            base_fee: Some(weight_based_fee),
            producer_allocation: None,
            final_fee: None,
            post_modulation_surcharge: Some(pollution_fund_fee),
            fee_type: "cmc_weight_based".to_string(),
            breakdown: json!({
                "weight_based_fee": weight_based_fee.to_string(),
                "pollution_fund_fee": pollution_fund_fee.to_string(),
                "pollution_fund_active": date.year() >= 2027,
                "component_fees": component_fees,
            }),
        })
    }

    fn apply_eco_modulation(&self, base_fee: Decimal, report: &ReportData) -> EcoModulation {
        modulate_by_weight_share(base_fee, &report.packaging_data, |c| {
            let mut pct = Decimal::ZERO;
            let mut factors: Vec<String> = Vec::new();
            let is_plastic = classify_material(&c.material_type) == MaterialCategory::Plastic;

            if c.ca_plastic_component_flag {
                pct += Decimal::new(10, 2);
                factors.push("ca_plastic_component_penalty_10pct".into());
            }
            if c.recyclable {
                pct -= Decimal::new(10, 2);
                factors.push("recyclable_bonus_10pct".into());
            } else {
                pct += Decimal::new(50, 2);
                factors.push("non_recyclable_penalty_50pct".into());
                if is_plastic {
                    pct += Decimal::new(25, 2);
                    factors.push("non_recyclable_plastic_penalty_25pct".into());
                }
            }
            let pcr = pcr_bonus_pct(c, Decimal::new(15, 2));
            if pcr != Decimal::ZERO {
                pct += pcr;
                factors.push("recycled_content_bonus_up_to_15pct".into());
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
        // Small-producer zeroing happens in the pipeline's exemption
        // stage; California has no further discounts.
        ExemptionOutcome::unchanged(fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    fn component(material: &str, recyclable: bool) -> serde_json::Value {
        json!({
            "material_type": material,
            "component_name": "part",
            "weight_per_unit": "1",
            "weight_unit": "kg",
            "units_sold": 1000,
            "recyclable": recyclable,
        })
    }

    fn report(components: Vec<serde_json::Value>) -> ReportData {
        serde_json::from_value(json!({
            "jurisdiction_code": "CA",
            "producer_data": {
                "organization_id": "acme",
                "annual_revenue": "20000000",
                "annual_tonnage": "1000",
            },
            "packaging_data": components,
        }))
        .unwrap()
    }

    #[test]
    fn cmc_resolution_prefers_most_specific_level() {
        // Form beats type beats class.
        assert_eq!(
            cmc_rate(MaterialCategory::Plastic, Some("pet"), Some("thermoform")),
            Decimal::new(2110, 4)
        );
        assert_eq!(
            cmc_rate(MaterialCategory::Plastic, Some("pet"), None),
            Decimal::new(1840, 4)
        );
        assert_eq!(
            cmc_rate(MaterialCategory::Plastic, None, None),
            Decimal::new(2200, 4)
        );
    }

    #[test]
    fn material_string_drives_cmc_position() {
        let c: PackagingComponent =
            serde_json::from_value(component("PET thermoform plastic", true)).unwrap();
        let (class, t, f) = cmc_position(&c);
        assert_eq!(class, MaterialCategory::Plastic);
        assert_eq!(t, Some("pet"));
        assert_eq!(f, Some("thermoform"));
    }

    #[test]
    fn pollution_fund_activates_in_2027() {
        let mut r = report(vec![component("glass", true)]);
        r.system_data = Some(
            serde_json::from_value(json!({"system_total_tonnage": "100000"})).unwrap(),
        );
        let before = California.calculate_fee(&r, date!(2026 - 12 - 31)).unwrap();
        assert_eq!(before.breakdown["pollution_fund_fee"], "0");

        let after = California.calculate_fee(&r, date!(2027 - 01 - 01)).unwrap();
        // 500,000,000 * (1000 / 100000) = 5,000,000
        let fund: Decimal = after.breakdown["pollution_fund_fee"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(fund, Decimal::new(5_000_000, 0));
    }

    #[test]
    fn pollution_fund_rides_outside_the_modulated_base() {
        let mut r = report(vec![component("glass", true)]);
        r.system_data = Some(
            serde_json::from_value(json!({"system_total_tonnage": "100000"})).unwrap(),
        );
        let fee = California.calculate_fee(&r, date!(2027 - 01 - 01)).unwrap();
        // Base carries only the weight-based fee (0.0510 * 1000 kg);
        // the fund share is a surcharge eco-modulation never scales.
        assert_eq!(fee.primary_fee(), Decimal::new(51, 0));
        assert_eq!(fee.surcharge(), Decimal::new(5_000_000, 0));
    }

    #[test]
    fn pollution_fund_needs_system_tonnage() {
        let r = report(vec![component("glass", true)]);
        let fee = California.calculate_fee(&r, date!(2027 - 06 - 01)).unwrap();
        assert_eq!(fee.breakdown["pollution_fund_fee"], "0");
    }

    #[test]
    fn recyclable_component_earns_bonus() {
        let r = report(vec![component("glass", true)]);
        let result = California.apply_eco_modulation(Decimal::new(100, 0), &r);
        assert_eq!(result.adjusted_fee, Decimal::new(90, 0));
    }

    #[test]
    fn non_recyclable_plastic_stacks_both_penalties() {
        let r = report(vec![component("plastic", false)]);
        let result = California.apply_eco_modulation(Decimal::new(100, 0), &r);
        // +50% non-recyclable, +25% non-recyclable plastic
        assert_eq!(result.adjusted_fee, Decimal::new(175, 0));
    }

    #[test]
    fn recycled_content_bonus_scales() {
        let mut v = component("glass", true);
        v["recycled_content_percentage"] = json!("50");
        let r = report(vec![v]);
        let result = California.apply_eco_modulation(Decimal::new(1000, 0), &r);
        // -10% recyclable, -7.5% pcr (15% * 50/100)
        assert_eq!(result.adjusted_fee, Decimal::new(825, 0));
    }

    #[test]
    fn small_producer_threshold_is_revenue_only() {
        let thresholds = California.small_producer_thresholds();
        assert_eq!(thresholds.revenue, Some(Decimal::new(1_000_000, 0)));
        assert_eq!(thresholds.tonnage, None);
        let p: ProducerData = serde_json::from_value(json!({
            "organization_id": "tiny",
            "annual_revenue": "900000",
            "revenue_scope": "california_only",
            "annual_tonnage": "50000",
        }))
        .unwrap();
        assert!(California.is_small_producer(&p));
    }
}
