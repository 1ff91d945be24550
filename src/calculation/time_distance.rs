//! Elapsed time and distance normalization.
//!
//! Turns a booking's raw timestamps and odometer readings into total hours,
//! net kilometres, and (for outstation bookings) elapsed days and nights.
//! Missing inputs and reversed pairs degrade to zero and raise advisories.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::models::{Advisory, AdvisoryKind, AuditStep, BookingType, TripInputs};

/// Seconds in an hour.
pub const SECONDS_PER_HOUR: i64 = 3_600;

/// Seconds in a day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// The normalized time and distance figures for a trip.
#[derive(Debug, Clone)]
pub struct NormalizedTrip {
    /// Elapsed hours between pickup and return.
    pub total_hours: Decimal,
    /// Net kilometres travelled.
    pub total_km: Decimal,
    /// Elapsed calendar days (zero for local bookings).
    pub days: u32,
    /// Night stays to bill.
    pub nights: u32,
    /// Advisories raised while normalizing.
    pub advisories: Vec<Advisory>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Elapsed hours between two timestamps, clamped at zero.
///
/// The quotient is kept exact; fractional hours are billed as they are.
///
/// # Examples
///
/// ```
/// use fare_engine::calculation::calculate_total_hours;
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
///
/// let pickup = NaiveDateTime::parse_from_str("2026-03-02 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let back = NaiveDateTime::parse_from_str("2026-03-02 13:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
///
/// assert_eq!(calculate_total_hours(pickup, back), Decimal::new(45, 1));
/// assert_eq!(calculate_total_hours(back, pickup), Decimal::ZERO);
/// ```
pub fn calculate_total_hours(start: NaiveDateTime, end: NaiveDateTime) -> Decimal {
    let seconds = (end - start).num_seconds().max(0);
    Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR)
}

/// Net distance between two odometer readings, clamped at zero.
///
/// # Examples
///
/// ```
/// use fare_engine::calculation::calculate_total_km;
/// use rust_decimal::Decimal;
///
/// assert_eq!(calculate_total_km(Decimal::new(100, 0), Decimal::new(180, 0)), Decimal::new(80, 0));
/// assert_eq!(calculate_total_km(Decimal::new(180, 0), Decimal::new(100, 0)), Decimal::ZERO);
/// ```
pub fn calculate_total_km(start_km: Decimal, end_km: Decimal) -> Decimal {
    (end_km - start_km).max(Decimal::ZERO)
}

/// Elapsed calendar days of an outstation trip: any part of a day counts
/// as a whole day, and every trip is at least one day.
///
/// # Examples
///
/// ```
/// use fare_engine::calculation::calculate_trip_days;
/// use chrono::NaiveDateTime;
///
/// let depart = NaiveDateTime::parse_from_str("2026-03-02 06:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let back = NaiveDateTime::parse_from_str("2026-03-04 06:00:01", "%Y-%m-%d %H:%M:%S").unwrap();
///
/// assert_eq!(calculate_trip_days(depart, back), 3);
/// assert_eq!(calculate_trip_days(depart, depart), 1);
/// ```
pub fn calculate_trip_days(departure: NaiveDateTime, return_at: NaiveDateTime) -> u32 {
    let seconds = (return_at - departure).num_seconds().max(0);
    let days = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    u32::try_from(days).unwrap_or(u32::MAX).max(1)
}

/// Normalizes a booking's raw trip inputs.
///
/// Local bookings bill the manually entered night count and report zero
/// days. Outstation bookings derive days and nights from elapsed time
/// (`nights = days - 1`); with a timestamp missing the trip counts as a
/// single day with no nights.
///
/// # Arguments
///
/// * `booking_type` - The variant being computed
/// * `inputs` - The booking's raw trip inputs
/// * `step_number` - The step number for audit trail sequencing
pub fn normalize_trip(
    booking_type: BookingType,
    inputs: &TripInputs,
    step_number: u32,
) -> NormalizedTrip {
    let mut advisories = Vec::new();

    let total_hours = match (inputs.pickup_at, inputs.return_at) {
        (Some(pickup), Some(return_at)) => {
            if return_at < pickup {
                advisories.push(Advisory::new(
                    AdvisoryKind::InvalidRange,
                    "return_at",
                    format!("Return time {} is before pickup time {}", return_at, pickup),
                ));
            }
            calculate_total_hours(pickup, return_at)
        }
        (pickup, return_at) => {
            if pickup.is_none() {
                advisories.push(missing("pickup_at", "Pickup time is missing"));
            }
            if return_at.is_none() {
                advisories.push(missing("return_at", "Return time is missing"));
            }
            Decimal::ZERO
        }
    };

    let total_km = match (inputs.start_km, inputs.end_km) {
        (Some(start), Some(end)) => {
            if end < start {
                advisories.push(Advisory::new(
                    AdvisoryKind::InvalidRange,
                    "end_km",
                    format!(
                        "End odometer {} is below start odometer {}",
                        end.normalize(),
                        start.normalize()
                    ),
                ));
            }
            calculate_total_km(start, end)
        }
        (start, end) => {
            if start.is_none() {
                advisories.push(missing("start_km", "Start odometer reading is missing"));
            }
            if end.is_none() {
                advisories.push(missing("end_km", "End odometer reading is missing"));
            }
            Decimal::ZERO
        }
    };

    let (days, nights, night_source) = match booking_type {
        BookingType::Local => (0, inputs.nights.unwrap_or(0), "entered"),
        BookingType::Outstation => {
            let days = match (inputs.pickup_at, inputs.return_at) {
                (Some(departure), Some(return_at)) => calculate_trip_days(departure, return_at),
                _ => 1,
            };
            (days, days - 1, "elapsed days - 1")
        }
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "time_distance".to_string(),
        rule_name: "Time & Distance Normalization".to_string(),
        input: serde_json::json!({
            "booking_type": booking_type.to_string(),
            "pickup_at": inputs.pickup_at.map(|t| t.to_string()),
            "return_at": inputs.return_at.map(|t| t.to_string()),
            "start_km": inputs.start_km.map(|k| k.normalize().to_string()),
            "end_km": inputs.end_km.map(|k| k.normalize().to_string()),
            "nights_entered": inputs.nights
        }),
        output: serde_json::json!({
            "total_hours": total_hours.normalize().to_string(),
            "total_km": total_km.normalize().to_string(),
            "days": days,
            "nights": nights
        }),
        reasoning: format!(
            "{} hours, {} km, {} days, {} nights ({})",
            total_hours.round_dp(2).normalize(),
            total_km.normalize(),
            days,
            nights,
            night_source
        ),
    };

    NormalizedTrip {
        total_hours,
        total_km,
        days,
        nights,
        advisories,
        audit_step,
    }
}

fn missing(field: &str, message: &str) -> Advisory {
    Advisory::new(AdvisoryKind::MissingInput, field, message)
}
