//! Local (hourly) fare calculation.
//!
//! A local booking is billed as a minimum package of hours, plus surcharges
//! for hours and kilometres beyond the package, plus any night stays.

use rust_decimal::Decimal;

use crate::models::{AuditStep, DerivedField, Overrides, RateSnapshot};

use super::fare::{override_note, with_override};
use super::{FareBreakdown, FareResult, NormalizedTrip};

/// Calculates the fare of a local booking.
///
/// ```text
/// base_charge       = min_hours * per_hour_rate
/// extra_hour_charge = max(0, total_hours - min_hours) * per_hour_rate
/// extra_km_charge   = max(0, total_km - min_km) * per_km_rate
/// night_charge      = nights * night_rate
/// ```
///
/// Manual overrides replace the matching charge. Chargeable distance is the
/// distance travelled; local bookings have no per-day distance floor.
///
/// # Arguments
///
/// * `trip` - Normalized hours, distance and nights
/// * `rates` - The booking's rate snapshot
/// * `overrides` - Manual overrides on derived fields
/// * `step_number` - The step number for audit trail sequencing
pub fn calculate_local_fare(
    trip: &NormalizedTrip,
    rates: &RateSnapshot,
    overrides: &Overrides,
    step_number: u32,
) -> FareResult {
    let mut overridden = Vec::new();

    let base_charge = with_override(
        overrides,
        DerivedField::BaseCharge,
        rates.min_hours * rates.per_hour_rate,
        &mut overridden,
    );

    let extra_hours = (trip.total_hours - rates.min_hours).max(Decimal::ZERO);
    let extra_hour_charge = with_override(
        overrides,
        DerivedField::ExtraHourCharge,
        extra_hours * rates.per_hour_rate,
        &mut overridden,
    );

    let extra_km = (trip.total_km - rates.min_km).max(Decimal::ZERO);
    let extra_km_charge = with_override(
        overrides,
        DerivedField::ExtraKmCharge,
        extra_km * rates.per_km_rate,
        &mut overridden,
    );

    let night_charge = with_override(
        overrides,
        DerivedField::NightCharge,
        Decimal::from(trip.nights) * rates.night_rate,
        &mut overridden,
    );

    let subtotal = base_charge + extra_hour_charge + extra_km_charge + night_charge;

    let breakdown = FareBreakdown {
        min_km_total: Decimal::ZERO,
        chargeable_km: trip.total_km,
        extra_hours,
        extra_km,
        base_charge,
        extra_hour_charge,
        extra_km_charge,
        night_charge,
        subtotal,
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "local_fare".to_string(),
        rule_name: "Local Fare".to_string(),
        input: serde_json::json!({
            "total_hours": trip.total_hours.normalize().to_string(),
            "total_km": trip.total_km.normalize().to_string(),
            "nights": trip.nights,
            "min_hours": rates.min_hours.normalize().to_string(),
            "min_km": rates.min_km.normalize().to_string(),
            "per_hour_rate": rates.per_hour_rate.normalize().to_string(),
            "per_km_rate": rates.per_km_rate.normalize().to_string(),
            "night_rate": rates.night_rate.normalize().to_string()
        }),
        output: serde_json::json!({
            "extra_hours": extra_hours.normalize().to_string(),
            "extra_km": extra_km.normalize().to_string(),
            "base_charge": base_charge.normalize().to_string(),
            "extra_hour_charge": extra_hour_charge.normalize().to_string(),
            "extra_km_charge": extra_km_charge.normalize().to_string(),
            "night_charge": night_charge.normalize().to_string(),
            "subtotal": subtotal.normalize().to_string()
        }),
        reasoning: format!(
            "Local fare: base ${} + extra hours ${} + extra km ${} + nights ${} = ${}{}",
            base_charge.normalize(),
            extra_hour_charge.normalize(),
            extra_km_charge.normalize(),
            night_charge.normalize(),
            subtotal.normalize(),
            override_note(&overridden)
        ),
    };

    FareResult {
        breakdown,
        overridden,
        audit_step,
    }
}
