//! Calculation result models for the fare engine.
//!
//! This module contains the [`BookingCalculation`] type and its associated
//! structures that capture every output of a booking recompute, the
//! advisories raised along the way, and the audit trace.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BookingType, DerivedFields, TaxLine};

/// The category of a non-fatal calculation problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    /// A required input was absent; the dependent value degraded to zero.
    MissingInput,
    /// A referenced record could not be resolved; the dependent value was
    /// left unchanged.
    UnresolvedReference,
    /// A pair of inputs was reversed (end before start); the dependent
    /// value was clamped to zero.
    InvalidRange,
}

impl std::fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdvisoryKind::MissingInput => write!(f, "missing_input"),
            AdvisoryKind::UnresolvedReference => write!(f, "unresolved_reference"),
            AdvisoryKind::InvalidRange => write!(f, "invalid_range"),
        }
    }
}

/// A non-fatal condition reported alongside a calculation.
///
/// Advisories never abort a recompute chain. They are returned to the
/// caller so a host can surface them next to the affected field.
///
/// # Example
///
/// ```
/// use fare_engine::models::{Advisory, AdvisoryKind};
///
/// let advisory = Advisory::new(AdvisoryKind::MissingInput, "end_km", "End odometer reading is missing");
/// assert_eq!(advisory.field, "end_km");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// The category of the problem.
    pub kind: AdvisoryKind,
    /// The field the problem concerns.
    pub field: String,
    /// A human-readable description.
    pub message: String,
}

impl Advisory {
    /// Creates an advisory.
    pub fn new(kind: AdvisoryKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A single step in the audit trace.
///
/// Each step records one rule application with its inputs, outputs and a
/// human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The complete audit trace for a calculation.
///
/// # Example
///
/// ```
/// use fare_engine::models::AuditTrace;
///
/// let trace = AuditTrace {
///     steps: vec![],
///     advisories: vec![],
///     duration_us: 1234,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Advisories raised during the calculation.
    pub advisories: Vec<Advisory>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}

/// The complete result of a booking recompute.
///
/// Carries every derived field, the tax lines with their running totals
/// filled in, and the audit trace. Applying it onto the booking is a
/// separate step so the recompute itself stays pure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCalculation {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// The booking the calculation is for.
    pub booking_id: String,
    /// The variant the booking was computed as.
    pub booking_type: BookingType,
    /// Every derived value.
    pub derived: DerivedFields,
    /// Tax lines with `total` filled in.
    pub tax_lines: Vec<TaxLine>,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}

impl BookingCalculation {
    /// Advisories raised while computing the booking.
    pub fn advisories(&self) -> &[Advisory] {
        &self.audit_trace.advisories
    }
}

/// The roll-up of a customer invoice's lines and adjustments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Sum of line amounts.
    pub gross_total: Decimal,
    /// Gross total less discount.
    pub grand_total: Decimal,
    /// Grand total less the amount already paid.
    pub payable_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_kind_serialization() {
        let json = serde_json::to_string(&AdvisoryKind::UnresolvedReference).unwrap();
        assert_eq!(json, "\"unresolved_reference\"");

        let kind: AdvisoryKind = serde_json::from_str("\"invalid_range\"").unwrap();
        assert_eq!(kind, AdvisoryKind::InvalidRange);
    }

    #[test]
    fn test_advisory_kind_display_matches_wire_name() {
        assert_eq!(AdvisoryKind::MissingInput.to_string(), "missing_input");
    }

    #[test]
    fn test_booking_calculation_serialization() {
        let calculation = BookingCalculation {
            calculation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_version: "0.1.0".to_string(),
            booking_id: "BK-0001".to_string(),
            booking_type: BookingType::Local,
            derived: DerivedFields {
                grand_total: Decimal::new(1300, 0),
                ..Default::default()
            },
            tax_lines: vec![],
            audit_trace: AuditTrace {
                steps: vec![],
                advisories: vec![Advisory::new(
                    AdvisoryKind::MissingInput,
                    "vehicle_model",
                    "No vehicle model selected",
                )],
                duration_us: 10,
            },
        };

        let json = serde_json::to_string(&calculation).unwrap();
        assert!(json.contains("\"booking_type\":\"local\""));
        assert!(json.contains("\"grand_total\":\"1300\""));
        assert!(json.contains("\"kind\":\"missing_input\""));

        let parsed: BookingCalculation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.advisories().len(), 1);
    }
}
