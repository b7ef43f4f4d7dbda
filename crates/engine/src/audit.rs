//! Audit trail types for fee calculations.
//!
//! Each pipeline stage appends exactly one [`CalculationStep`] recording
//! its inputs, outputs, the rule applied, and the legal citation backing
//! it. Steps are append-only and ordered; once emitted a step is never
//! mutated. The trail is what makes a computed fee legally defensible.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// One stage record in the calculation audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationStep {
    /// 1-based position in the trail; monotonically increasing, never
    /// reused within one calculation.
    pub step_number: u8,
    pub step_name: String,
    /// Snapshot of what the stage consumed.
    pub input_data: serde_json::Value,
    /// Snapshot of what the stage produced.
    pub output_data: serde_json::Value,
    /// The regulatory rule applied, free text.
    pub rule_applied: String,
    /// Statute or regulation backing the rule. Non-empty for every
    /// regulatory stage.
    pub legal_citation: String,
    /// Human-readable explanation of the arithmetic performed.
    pub calculation_method: String,
    /// RFC 3339 timestamp of when the step was recorded.
    pub timestamp: String,
    pub jurisdiction: String,
}

/// Append-only collector of calculation steps.
///
/// [`AuditTrail::push`] is the only insertion path; it renumbers each
/// step into the next slot so numbering stays sequential regardless of
/// what the stage put there.
#[derive(Debug, Default)]
pub struct AuditTrail {
    steps: Vec<CalculationStep>,
}

impl AuditTrail {
    pub fn new() -> Self {
        AuditTrail { steps: Vec::new() }
    }

    /// Append a built step, renumbering it to the next slot.
    pub fn push(&mut self, mut step: CalculationStep) {
        step.step_number = (self.steps.len() + 1) as u8;
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[CalculationStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Legal citations deduplicated in order of first appearance.
#[derive(Debug, Default)]
pub struct CitationLog {
    citations: Vec<String>,
}

impl CitationLog {
    pub fn new() -> Self {
        CitationLog {
            citations: Vec::new(),
        }
    }

    pub fn record(&mut self, citation: &str) {
        if citation.is_empty() {
            return;
        }
        if !self.citations.iter().any(|c| c == citation) {
            self.citations.push(citation.to_string());
        }
    }

    pub fn into_citations(self) -> Vec<String> {
        self.citations
    }
}

pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
