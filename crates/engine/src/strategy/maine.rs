//! Maine Stewardship Program for Packaging (full municipal
//! reimbursement, state-run).
//!
//! Municipalities are reimbursed per material from a median-cost
//! schedule, weighted by disposition (recycling reimburses at 100%,
//! waste-to-energy at 66.7%, landfill at 33.3%) and by a
//! geography/population band multiplier. Producers fund the reimbursed
//! total plus administrative and infrastructure overhead in proportion
//! to their tonnage share.

use rust_decimal::Decimal;
use serde_json::json;
use time::Date;

use steward_core::{
    EngineError, Jurisdiction, Municipality, ProducerData, ReportData,
};

use crate::classify::{classify_material, MaterialCategory};
use crate::strategy::{
    modulate_by_weight_share, tonnage_share, EcoModulation, ExemptionOutcome, FeeComputation,
    JurisdictionStrategy, SmallProducerThresholds, ThresholdOperator,
};

pub struct Maine;

const CITATION: &str = "38 M.R.S. 2146 (LD 1541, Stewardship Program for Packaging)";

/// Geography/population band for a municipality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MunicipalityBand {
    UrbanLarge,
    UrbanMedium,
    Suburban,
    RuralAccessible,
    RuralRemote,
}

impl MunicipalityBand {
    fn for_municipality(m: &Municipality) -> MunicipalityBand {
        if m.population > 50_000 {
            MunicipalityBand::UrbanLarge
        } else if m.population > 20_000 {
            MunicipalityBand::UrbanMedium
        } else if m.population > 5_000 {
            MunicipalityBand::Suburban
        } else if m.population > 1_000 && !m.remote {
            MunicipalityBand::RuralAccessible
        } else {
            MunicipalityBand::RuralRemote
        }
    }

    /// Cost multiplier: dense areas are cheapest to serve, remote rural
    /// the most expensive.
    fn cost_multiplier(self) -> Decimal {
        match self {
            MunicipalityBand::UrbanLarge => Decimal::new(85, 2),
            MunicipalityBand::UrbanMedium => Decimal::new(95, 2),
            MunicipalityBand::Suburban => Decimal::new(105, 2),
            MunicipalityBand::RuralAccessible => Decimal::new(115, 2),
            MunicipalityBand::RuralRemote => Decimal::new(135, 2),
        }
    }

    fn name(self) -> &'static str {
        match self {
            MunicipalityBand::UrbanLarge => "urban_large",
            MunicipalityBand::UrbanMedium => "urban_medium",
            MunicipalityBand::Suburban => "suburban",
            MunicipalityBand::RuralAccessible => "rural_accessible",
            MunicipalityBand::RuralRemote => "rural_remote",
        }
    }
}

/// Median reimbursement cost per ton by material category, USD.
fn median_material_cost(material_type: &str) -> Decimal {
    match classify_material(material_type) {
        MaterialCategory::Plastic => Decimal::new(185, 0),
        MaterialCategory::Glass => Decimal::new(48, 0),
        MaterialCategory::Metal => Decimal::new(92, 0),
        MaterialCategory::Paper => Decimal::new(104, 0),
        MaterialCategory::Cardboard => Decimal::new(76, 0),
        MaterialCategory::Composite => Decimal::new(240, 0),
    }
}

/// Statewide average of the median cost table, for the aggregate-only
/// fallback when no municipality detail was reported.
fn statewide_average_cost() -> Decimal {
    // (185 + 48 + 92 + 104 + 76 + 240) / 6
    Decimal::new(745, 0) / Decimal::new(6, 0)
}

/// Disposition weights: recycling 100%, WTE 66.7%, landfill 33.3%.
fn reimbursement_for(m: &Municipality) -> Decimal {
    let wte_weight = Decimal::new(667, 3);
    let landfill_weight = Decimal::new(333, 3);
    let multiplier = MunicipalityBand::for_municipality(m).cost_multiplier();
    m.material_flows
        .iter()
        .map(|flow| {
            let weighted_tons = flow.recycled_tons
                + flow.wte_tons * wte_weight
                + flow.landfill_tons * landfill_weight;
            weighted_tons * median_material_cost(&flow.material_type) * multiplier
        })
        .sum()
}

/// Administrative (15%) + infrastructure (10%) overhead on reimbursed
/// costs.
const OVERHEAD_MULTIPLIER: Decimal = Decimal::from_parts(125, 0, 0, false, 2); // 1.25

/// Non-recyclable fee multiplier scaled by recyclability score band.
fn non_recyclable_multiplier(score: Decimal) -> Decimal {
    let band = |n: i64| Decimal::new(n, 0);
    if score < band(20) {
        band(5)
    } else if score < band(40) {
        band(4)
    } else if score < band(60) {
        band(3)
    } else {
        band(2)
    }
}

impl JurisdictionStrategy for Maine {
    fn jurisdiction(&self) -> Jurisdiction {
        Jurisdiction::Maine
    }

    fn program_citation(&self) -> &'static str {
        CITATION
    }

    fn small_producer_thresholds(&self) -> SmallProducerThresholds {
        SmallProducerThresholds {
            revenue: Some(Decimal::new(1_000_000, 0)),
            tonnage: Some(Decimal::new(10, 0)),
            operator: ThresholdOperator::Or,
        }
    }

    fn calculate_fee(
        &self,
        report: &ReportData,
        _date: Date,
    ) -> Result<FeeComputation, EngineError> {
        let producer = &report.producer_data;
        let system = report.system_data.as_ref();
        let municipalities = system.map(|s| s.municipalities.as_slice()).unwrap_or(&[]);

        if municipalities.is_empty() {
            // Aggregate-only fallback: statewide average cost per ton
            // with the same overhead.
            let allocation =
                producer.annual_tonnage * statewide_average_cost() * OVERHEAD_MULTIPLIER;
            return Ok(FeeComputation {
                base_fee: None,
                producer_allocation: Some(allocation),
                final_fee: None,
                post_modulation_surcharge: None,
                fee_type: "statewide_average_allocation".to_string(),
                breakdown: json!({
                    "statewide_average_cost_per_ton": statewide_average_cost().to_string(),
                    "overhead_multiplier": OVERHEAD_MULTIPLIER.to_string(),
                    "municipalities_reported": 0,
                }),
            });
        }

        let mut municipal_detail = Vec::new();
        let mut reimbursement_total = Decimal::ZERO;
        for m in municipalities {
            let band = MunicipalityBand::for_municipality(m);
            let reimbursement = reimbursement_for(m);
            reimbursement_total += reimbursement;
            municipal_detail.push(json!({
                "name": m.name,
                "band": band.name(),
                "cost_multiplier": band.cost_multiplier().to_string(),
                "reimbursement": reimbursement.to_string(),
            }));
        }

        let total_program_cost = reimbursement_total * OVERHEAD_MULTIPLIER;
        let system_tonnage = system
            .map(|s| s.system_total_tonnage)
            .unwrap_or(Decimal::ZERO);
        let share = tonnage_share(producer.annual_tonnage, system_tonnage);
        let producer_allocation = total_program_cost * share;

        Ok(FeeComputation {
            base_fee: None,
            producer_allocation: Some(producer_allocation),
            final_fee: None,
            post_modulation_surcharge: None,
            fee_type: "municipal_reimbursement_state_run".to_string(),
            breakdown: json!({
                "municipal_reimbursements": reimbursement_total.to_string(),
                "total_program_cost": total_program_cost.to_string(),
                "overhead_multiplier": OVERHEAD_MULTIPLIER.to_string(),
                "tonnage_share": share.to_string(),
                "municipalities": municipal_detail,
            }),
        })
    }

    fn apply_eco_modulation(&self, base_fee: Decimal, report: &ReportData) -> EcoModulation {
        modulate_by_weight_share(base_fee, &report.packaging_data, |c| {
            let mut pct = Decimal::ZERO;
            let mut factors: Vec<String> = Vec::new();

            if c.me_toxicity_flag {
                pct += Decimal::new(25, 2);
                factors.push("toxicity_penalty_25pct".into());
            }
            if !c.recyclable {
                // Score-banded multiplier adds (m - 1) x the component's
                // fee share.
                let m = non_recyclable_multiplier(c.recyclability_score);
                pct += m - Decimal::ONE;
                factors.push(format!("non_recyclable_multiplier_{m}x"));
            } else {
                pct -= Decimal::new(20, 2);
                factors.push("design_for_recyclability_bonus_20pct".into());
            }
            if c.contains_pfas {
                pct += Decimal::ONE;
                factors.push("pfas_penalty_100pct".into());
            }
            if c.contains_phthalates {
                pct += Decimal::new(75, 2);
                factors.push("phthalates_penalty_75pct".into());
            }
            if c.disrupts_recycling {
                pct += Decimal::new(50, 2);
                factors.push("design_penalty_50pct".into());
            }
            if c.recycled_content_percentage > Decimal::ZERO {
                let bonus = Decimal::new(25, 2) * c.recycled_content_percentage
                    / Decimal::new(100, 0);
                pct -= bonus;
                factors.push("pcr_bonus_up_to_25pct".into());
            }
            (pct, factors)
        })
    }

    fn apply_exemptions(
        &self,
        fee: Decimal,
        producer: &ProducerData,
        _date: Date,
    ) -> ExemptionOutcome {
        let fifteen = Decimal::new(15, 0);
        // Three mutually exclusive paths, checked in order. The
        // small-producer path is also enforced by the pipeline's
        // exemption stage; it is repeated here so direct strategy calls
        // observe the same ordering.
        if self.is_small_producer(producer) {
            return ExemptionOutcome {
                final_fee: Decimal::ZERO,
                fee_type: Some("small_producer_exemption".to_string()),
                detail: json!({"exemption": "revenue < $1M or tonnage < 10t"}),
            };
        }
        if producer.produces_perishable_food && producer.annual_tonnage < fifteen {
            return ExemptionOutcome {
                final_fee: Decimal::ZERO,
                fee_type: Some("perishable_food_exemption".to_string()),
                detail: json!({"exemption": "perishable food producer under 15t"}),
            };
        }
        if producer.annual_tonnage < fifteen {
            let flat = Decimal::new(500, 0) * producer.annual_tonnage;
            return ExemptionOutcome {
                final_fee: flat,
                fee_type: Some("low_volume_flat_fee".to_string()),
                detail: json!({
                    "rate_per_ton": "500",
                    "annual_tonnage": producer.annual_tonnage.to_string(),
                }),
            };
        }
        ExemptionOutcome::unchanged(fee)
    }
}
