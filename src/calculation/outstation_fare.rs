//! Outstation (multi-day) fare calculation.
//!
//! An outstation booking is billed per kilometre against a distance floor
//! of `min_km_per_day` for every elapsed day, plus night stays.

use rust_decimal::Decimal;

use crate::models::{AuditStep, DerivedField, Overrides, RateSnapshot};

use super::fare::{override_note, with_override};
use super::{FareBreakdown, FareResult, NormalizedTrip};

/// Calculates the fare of an outstation booking.
///
/// ```text
/// min_km_total  = min_km_per_day * days
/// chargeable_km = max(total_km, min_km_total)
/// base_charge   = chargeable_km * per_km_rate
/// night_charge  = nights * night_rate
/// ```
///
/// The local-only charges (extra hours and kilometres) are always zero,
/// and any manual override on them is ignored.
///
/// # Arguments
///
/// * `trip` - Normalized distance, days and nights
/// * `rates` - The booking's rate snapshot
/// * `overrides` - Manual overrides on derived fields
/// * `step_number` - The step number for audit trail sequencing
pub fn calculate_outstation_fare(
    trip: &NormalizedTrip,
    rates: &RateSnapshot,
    overrides: &Overrides,
    step_number: u32,
) -> FareResult {
    let mut overridden = Vec::new();

    let min_km_total = with_override(
        overrides,
        DerivedField::MinKmTotal,
        rates.min_km_per_day * Decimal::from(trip.days),
        &mut overridden,
    );
    let chargeable_km = trip.total_km.max(min_km_total);

    let base_charge = with_override(
        overrides,
        DerivedField::BaseCharge,
        chargeable_km * rates.per_km_rate,
        &mut overridden,
    );
    let night_charge = with_override(
        overrides,
        DerivedField::NightCharge,
        Decimal::from(trip.nights) * rates.night_rate,
        &mut overridden,
    );

    let subtotal = base_charge + night_charge;

    let breakdown = FareBreakdown {
        min_km_total,
        chargeable_km,
        extra_hours: Decimal::ZERO,
        extra_km: Decimal::ZERO,
        base_charge,
        extra_hour_charge: Decimal::ZERO,
        extra_km_charge: Decimal::ZERO,
        night_charge,
        subtotal,
    };

    let floor_applied = min_km_total > trip.total_km;

    let audit_step = AuditStep {
        step_number,
        rule_id: "outstation_fare".to_string(),
        rule_name: "Outstation Fare".to_string(),
        input: serde_json::json!({
            "total_km": trip.total_km.normalize().to_string(),
            "days": trip.days,
            "nights": trip.nights,
            "min_km_per_day": rates.min_km_per_day.normalize().to_string(),
            "per_km_rate": rates.per_km_rate.normalize().to_string(),
            "night_rate": rates.night_rate.normalize().to_string()
        }),
        output: serde_json::json!({
            "min_km_total": min_km_total.normalize().to_string(),
            "chargeable_km": chargeable_km.normalize().to_string(),
            "floor_applied": floor_applied,
            "base_charge": base_charge.normalize().to_string(),
            "night_charge": night_charge.normalize().to_string(),
            "subtotal": subtotal.normalize().to_string()
        }),
        reasoning: format!(
            "Outstation fare: {} km × ${} + {} nights × ${} = ${}{}",
            chargeable_km.normalize(),
            rates.per_km_rate.normalize(),
            trip.nights,
            rates.night_rate.normalize(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::normalize_trip;
    use crate::models::{BookingType, TripInputs};
    use chrono::NaiveDateTime;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn two_day_trip(end_km: &str) -> NormalizedTrip {
        let inputs = TripInputs {
            pickup_at: Some(make_datetime("2026-03-02", "06:00:00")),
            return_at: Some(make_datetime("2026-03-04", "06:00:00")),
            start_km: Some(dec("1000")),
            end_km: Some(dec(end_km)),
            nights: None,
        };
        normalize_trip(BookingType::Outstation, &inputs, 1)
    }

    fn scenario_rates() -> RateSnapshot {
        RateSnapshot {
            per_km_rate: dec("12"),
            night_rate: dec("1500"),
            min_km_per_day: dec("250"),
            ..Default::default()
        }
    }

    /// 48h trip, 400 km travelled against a 250 km/day floor.
    #[test]
    fn test_outstation_scenario() {
        let result = calculate_outstation_fare(&two_day_trip("1400"), &scenario_rates(), &Overrides::new(), 2);
        let fare = result.breakdown;

        assert_eq!(fare.min_km_total, dec("500"));
        assert_eq!(fare.chargeable_km, dec("500"));
        assert_eq!(fare.base_charge, dec("6000"));
        assert_eq!(fare.night_charge, dec("1500"));
        assert_eq!(fare.subtotal, dec("7500"));
        assert_eq!(result.audit_step.output["floor_applied"], true);
    }

    #[test]
    fn test_distance_above_floor_is_billed_as_travelled() {
        let result = calculate_outstation_fare(&two_day_trip("1620"), &scenario_rates(), &Overrides::new(), 2);
        assert_eq!(result.breakdown.chargeable_km, dec("620"));
        assert_eq!(result.breakdown.base_charge, dec("7440"));
    }

    #[test]
    fn test_local_extras_forced_to_zero() {
        let mut overrides = Overrides::new();
        overrides.insert(DerivedField::ExtraHourCharge, dec("999"));

        let result = calculate_outstation_fare(&two_day_trip("1400"), &scenario_rates(), &overrides, 2);
        assert_eq!(result.breakdown.extra_hour_charge, Decimal::ZERO);
        assert_eq!(result.breakdown.extra_km_charge, Decimal::ZERO);
        assert!(result.overridden.is_empty());
    }

    #[test]
    fn test_min_km_override_feeds_chargeable_km() {
        let mut overrides = Overrides::new();
        overrides.insert(DerivedField::MinKmTotal, dec("300"));

        let result = calculate_outstation_fare(&two_day_trip("1200"), &scenario_rates(), &overrides, 2);
        assert_eq!(result.breakdown.min_km_total, dec("300"));
        assert_eq!(result.breakdown.chargeable_km, dec("300"));
        assert_eq!(result.breakdown.base_charge, dec("3600"));
    }
}
