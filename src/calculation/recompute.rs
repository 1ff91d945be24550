//! Booking recompute pipeline.
//!
//! Chains normalization, the variant's fare calculator, tax and expense
//! aggregation and grand-total assembly into one pure function of the
//! booking.

use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use crate::models::{AuditStep, AuditTrace, Booking, BookingCalculation, DerivedFields};

use super::{aggregate_expenses, aggregate_tax_lines, calculate_fare, calculate_grand_total, normalize_trip};

/// Version reported on every calculation.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Recomputes every derived field of a booking.
///
/// The result depends only on the booking's raw inputs, rate snapshot,
/// child collections and manual overrides. The booking's current derived
/// fields and tax line totals are never read.
///
/// # Examples
///
/// ```
/// use fare_engine::calculation::recompute_booking;
/// use fare_engine::models::{Booking, BookingType};
/// use rust_decimal::Decimal;
///
/// let mut booking = Booking::new("BK-0001", BookingType::Outstation);
/// booking.rates.per_km_rate = Decimal::new(12, 0);
/// booking.rates.min_km_per_day = Decimal::new(250, 0);
///
/// // No timestamps: a single day, billed at the 250 km floor.
/// let calculation = recompute_booking(&booking);
/// assert_eq!(calculation.derived.days, 1);
/// assert_eq!(calculation.derived.grand_total, Decimal::new(3000, 0));
/// assert!(!calculation.advisories().is_empty());
/// ```
pub fn recompute_booking(booking: &Booking) -> BookingCalculation {
    let start_time = Instant::now();
    let mut audit_steps: Vec<AuditStep> = Vec::new();
    let mut step_number: u32 = 1;

    let trip = normalize_trip(booking.booking_type, &booking.inputs, step_number);
    let advisories = trip.advisories.clone();
    audit_steps.push(trip.audit_step.clone());
    step_number += 1;

    let fare = calculate_fare(
        booking.booking_type,
        &trip,
        &booking.rates,
        &booking.overrides,
        step_number,
    );
    audit_steps.push(fare.audit_step);
    step_number += 1;

    let fare = fare.breakdown;

    let taxes = aggregate_tax_lines(fare.subtotal, &booking.tax_lines, step_number);
    audit_steps.push(taxes.audit_step);
    step_number += 1;

    let expenses = aggregate_expenses(&booking.expense_lines, step_number);
    audit_steps.push(expenses.audit_step);
    step_number += 1;

    let totals = calculate_grand_total(
        fare.subtotal,
        taxes.tax_total,
        expenses.totals.billable,
        step_number,
    );
    audit_steps.push(totals.audit_step);

    let derived = DerivedFields {
        total_hours: trip.total_hours,
        total_km: trip.total_km,
        days: trip.days,
        nights: trip.nights,
        min_km_total: fare.min_km_total,
        chargeable_km: fare.chargeable_km,
        extra_hours: fare.extra_hours,
        extra_km: fare.extra_km,
        base_charge: fare.base_charge,
        extra_hour_charge: fare.extra_hour_charge,
        extra_km_charge: fare.extra_km_charge,
        night_charge: fare.night_charge,
        subtotal: fare.subtotal,
        total_charges: totals.total_charges,
        tax_total: taxes.tax_total,
        billable_expense_total: expenses.totals.billable,
        driver_expense_total: expenses.totals.driver,
        customer_paid_expense_total: expenses.totals.customer_paid,
        grand_total: totals.grand_total,
    };

    let duration_us = start_time.elapsed().as_micros() as u64;

    BookingCalculation {
        calculation_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        engine_version: ENGINE_VERSION.to_string(),
        booking_id: booking.id.clone(),
        booking_type: booking.booking_type,
        derived,
        tax_lines: taxes.lines,
        audit_trace: AuditTrace {
            steps: audit_steps,
            advisories,
            duration_us,
        },
    }
}

/// Writes a calculation's derived fields and tax line totals onto the
/// booking it was computed from.
pub fn apply_calculation(booking: &mut Booking, calculation: &BookingCalculation) {
    booking.derived = calculation.derived.clone();
    booking.tax_lines = calculation.tax_lines.clone();
}
