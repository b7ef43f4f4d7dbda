//! Shared-responsibility programs (Maryland, Minnesota, Washington).
//!
//! Producers fund a phased percentage of net program cost: the funding
//! percentage steps 50% / 75% / 90% at state-specific milestone dates
//! and is 0% before the first milestone. One strategy covers all three
//! states; state-specific branches stay exhaustive over
//! [`SharedState`].

use rust_decimal::Decimal;
use serde_json::json;
use time::macros::date;
use time::Date;

use steward_core::{
    EngineError, Jurisdiction, ProducerData, ReportData, SharedState,
};

use crate::classify::{classify_material, is_foam, MaterialCategory};
use crate::strategy::{
    modulate_by_weight_share, pcr_bonus_pct, tonnage_share, EcoModulation, ExemptionOutcome,
    FeeComputation, JurisdictionStrategy, SmallProducerThresholds, ThresholdOperator,
};

pub struct SharedResponsibility {
    state: SharedState,
}

impl SharedResponsibility {
    pub fn new(state: SharedState) -> Self {
        SharedResponsibility { state }
    }

    /// Program cost multiplier relative to the model baseline.
    fn state_cost_multiplier(&self) -> Decimal {
        match self.state {
            SharedState::Maryland => Decimal::new(85, 2),
            SharedState::Minnesota => Decimal::ONE,
            SharedState::Washington => Decimal::new(120, 2),
        }
    }

    /// Funding milestones: (date, percentage) in ascending order.
    fn funding_milestones(&self) -> [(Date, Decimal); 3] {
        let pct = |n: i64| Decimal::new(n, 2);
        match self.state {
            SharedState::Maryland => [
                (date!(2026 - 07 - 01), pct(50)),
                (date!(2028 - 07 - 01), pct(75)),
                (date!(2030 - 07 - 01), pct(90)),
            ],
            SharedState::Minnesota => [
                (date!(2027 - 01 - 01), pct(50)),
                (date!(2029 - 01 - 01), pct(75)),
                (date!(2031 - 01 - 01), pct(90)),
            ],
            SharedState::Washington => [
                (date!(2026 - 10 - 01), pct(50)),
                (date!(2028 - 10 - 01), pct(75)),
                (date!(2030 - 10 - 01), pct(90)),
            ],
        }
    }

    /// Current producer funding percentage as a step function of the
    /// calculation date. 0% before the first milestone.
    fn funding_percentage(&self, on: Date) -> Decimal {
        let mut current = Decimal::ZERO;
        for (milestone, pct) in self.funding_milestones() {
            if on >= milestone {
                current = pct;
            }
        }
        current
    }

    /// Washington's high-performance exemption: 3 consecutive trailing
    /// years of recycling rate at or above the threshold earn an 80%
    /// discount. The threshold tightens from 65% to 70% in 2030.
    fn washington_recycling_discount(&self, producer: &ProducerData, on: Date) -> bool {
        if self.state != SharedState::Washington {
            return false;
        }
        let rates = &producer.annual_recycling_rates;
        if rates.len() < 3 {
            return false;
        }
        let threshold = if on.year() >= 2030 {
            Decimal::new(70, 2)
        } else {
            Decimal::new(65, 2)
        };
        rates[rates.len() - 3..].iter().all(|r| *r >= threshold)
    }
}

impl JurisdictionStrategy for SharedResponsibility {
    fn jurisdiction(&self) -> Jurisdiction {
        Jurisdiction::SharedResponsibility(self.state)
    }

    fn program_citation(&self) -> &'static str {
        match self.state {
            SharedState::Maryland => "Maryland SB 222 (2025), Producer Responsibility for Packaging",
            SharedState::Minnesota => {
                "Packaging Waste and Cost Reduction Act, Minn. Stat. 115A.144-115A.1463"
            }
            SharedState::Washington => "Washington Recycling Reform Act (SB 5284)",
        }
    }

    fn small_producer_thresholds(&self) -> SmallProducerThresholds {
        let revenue = match self.state {
            SharedState::Maryland => Decimal::new(1_000_000, 0),
            SharedState::Minnesota => Decimal::new(2_000_000, 0),
            SharedState::Washington => Decimal::new(5_000_000, 0),
        };
        SmallProducerThresholds {
            revenue: Some(revenue),
            tonnage: None,
            operator: ThresholdOperator::And,
        }
    }

    fn calculate_fee(
        &self,
        report: &ReportData,
        date: Date,
    ) -> Result<FeeComputation, EngineError> {
        let system = report.system_data.as_ref().ok_or_else(|| {
            EngineError::CalculationFailed {
                stage: "Base Fee Calculation",
                message: format!(
                    "{} shared-responsibility model requires system_data",
                    self.state.code()
                ),
            }
        })?;

        let base_cost = system.collection_costs
            + system.processing_costs
            + system.transportation_costs
            + system.administrative_costs;
        let total_program_cost = base_cost * self.state_cost_multiplier();
        let funding_pct = self.funding_percentage(date);
        let producer_responsibility = total_program_cost * funding_pct;
        let share = tonnage_share(report.producer_data.annual_tonnage, system.system_total_tonnage);
        let producer_allocation = producer_responsibility * share;

        Ok(FeeComputation {
            base_fee: None,
            producer_allocation: Some(producer_allocation),
            final_fee: None,
            post_modulation_surcharge: None,
            fee_type: "shared_responsibility_phased".to_string(),
            breakdown: json!({
                "state": self.state.code(),
                "total_program_cost": total_program_cost.to_string(),
                "state_cost_multiplier": self.state_cost_multiplier().to_string(),
                "funding_percentage": funding_pct.to_string(),
                "tonnage_share": share.to_string(),
            }),
        })
    }

    fn apply_eco_modulation(&self, base_fee: Decimal, report: &ReportData) -> EcoModulation {
        let state = self.state;
        modulate_by_weight_share(base_fee, &report.packaging_data, |c| {
            let mut pct = Decimal::ZERO;
            let mut factors: Vec<String> = Vec::new();
            let category = classify_material(&c.material_type);

            let pcr = pcr_bonus_pct(c, Decimal::new(20, 2));
            if pcr != Decimal::ZERO {
                pct += pcr;
                factors.push("pcr_bonus_up_to_20pct".into());
            }
            if c.recyclable {
                pct -= Decimal::new(10, 2);
                factors.push("design_bonus_10pct".into());
            } else {
                pct += Decimal::new(30, 2);
                factors.push("design_penalty_30pct".into());
            }
            if c.reusable {
                pct -= Decimal::new(25, 2);
                factors.push("reusability_bonus_25pct".into());
            }
            if is_foam(&c.material_type) {
                pct += Decimal::new(20, 2);
                factors.push("foam_penalty_20pct".into());
            }
            if matches!(category, MaterialCategory::Paper | MaterialCategory::Cardboard) {
                pct -= Decimal::new(5, 2);
                factors.push("paper_bonus_5pct".into());
            }
            match state {
                SharedState::Washington => {
                    if c.marine_degradable {
                        pct -= Decimal::new(15, 2);
                        factors.push("marine_degradable_bonus_15pct".into());
                    }
                    if c.harmful_to_marine_life {
                        pct += Decimal::new(40, 2);
                        factors.push("harmful_to_marine_life_penalty_40pct".into());
                    }
                }
                SharedState::Maryland => {
                    if c.bay_friendly {
                        pct -= Decimal::new(12, 2);
                        factors.push("bay_friendly_bonus_12pct".into());
                    }
                }
                SharedState::Minnesota => {
                    if c.cold_weather_stable {
                        pct -= Decimal::new(8, 2);
                        factors.push("cold_weather_stable_bonus_8pct".into());
                    }
                }
            }
            (pct, factors)
        })
    }

    fn apply_exemptions(
        &self,
        fee: Decimal,
        producer: &ProducerData,
        date: Date,
    ) -> ExemptionOutcome {
        if self.washington_recycling_discount(producer, date) {
            let discounted = fee * Decimal::new(20, 2);
            return ExemptionOutcome {
                final_fee: discounted,
                fee_type: Some("wa_high_recycling_discount".to_string()),
                detail: json!({
                    "discount_pct": "0.80",
                    "trailing_rates": producer
                        .annual_recycling_rates
                        .iter()
                        .rev()
                        .take(3)
                        .map(|r| r.to_string())
                        .collect::<Vec<_>>(),
                }),
            };
        }
        ExemptionOutcome::unchanged(fee)
    }
}
