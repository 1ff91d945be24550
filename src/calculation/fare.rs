//! Fare breakdown shared by the local and outstation calculators.

use rust_decimal::Decimal;

use crate::models::{AuditStep, BookingType, DerivedField, Overrides, RateSnapshot};

use super::{NormalizedTrip, calculate_local_fare, calculate_outstation_fare};

/// The fare components of a booking before taxes and expenses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FareBreakdown {
    /// Scaled minimum distance (outstation).
    pub min_km_total: Decimal,
    /// Kilometres billed after the distance floor.
    pub chargeable_km: Decimal,
    /// Hours beyond the minimum (local).
    pub extra_hours: Decimal,
    /// Kilometres beyond the minimum (local).
    pub extra_km: Decimal,
    /// Minimum package (local) or kilometre charge (outstation).
    pub base_charge: Decimal,
    /// Charge for extra hours (local).
    pub extra_hour_charge: Decimal,
    /// Charge for extra kilometres (local).
    pub extra_km_charge: Decimal,
    /// Night stay charge.
    pub night_charge: Decimal,
    /// Sum of the charges above.
    pub subtotal: Decimal,
}

/// The result of a fare calculation, including the breakdown and audit step.
#[derive(Debug, Clone)]
pub struct FareResult {
    /// The computed fare components.
    pub breakdown: FareBreakdown,
    /// Derived fields whose manual override was used instead of the
    /// computed value.
    pub overridden: Vec<DerivedField>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Computes the fare with the calculator matching `booking_type`.
pub fn calculate_fare(
    booking_type: BookingType,
    trip: &NormalizedTrip,
    rates: &RateSnapshot,
    overrides: &Overrides,
    step_number: u32,
) -> FareResult {
    match booking_type {
        BookingType::Local => calculate_local_fare(trip, rates, overrides, step_number),
        BookingType::Outstation => calculate_outstation_fare(trip, rates, overrides, step_number),
    }
}

/// Picks the manual override for `field` if one is set, otherwise the
/// computed value. Records the field in `overridden` when the override wins.
pub(crate) fn with_override(
    overrides: &Overrides,
    field: DerivedField,
    computed: Decimal,
    overridden: &mut Vec<DerivedField>,
) -> Decimal {
    match overrides.get(&field) {
        Some(value) => {
            overridden.push(field);
            *value
        }
        None => computed,
    }
}

/// Formats the overridden fields for audit reasoning.
pub(crate) fn override_note(overridden: &[DerivedField]) -> String {
    if overridden.is_empty() {
        String::new()
    } else {
        let names: Vec<String> = overridden.iter().map(|f| f.to_string()).collect();
        format!(" [manual override: {}]", names.join(", "))
    }
}
