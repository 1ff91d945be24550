//! Calculation logic for the fare engine.
//!
//! This module contains the pure rules that turn a booking's raw inputs
//! into derived fares: time and distance normalization, rate resolution,
//! the local and outstation fare calculators, tax and expense aggregation,
//! grand-total assembly, invoice totals, customer payment amounts, driver
//! settlement, duty slip merging and the driver ledger. Nothing here
//! performs I/O.

mod driver_settlement;
mod duty_slip_merge;
mod expenses;
mod fare;
mod grand_total;
mod invoice_totals;
mod ledger;
mod local_fare;
mod outstation_fare;
mod payment_amount;
mod rate_resolver;
mod recompute;
mod tax_charges;
mod time_distance;

pub use driver_settlement::{
    SettlementBreakdown, SettlementResult, driver_payment_from_booking,
    driver_payment_from_duty_slip, refresh_payment, settle_booking, settle_duty_slip,
};
pub use duty_slip_merge::{duty_slip_from_booking, merge_duty_slip};
pub use expenses::{ExpenseAggregationResult, ExpenseTotals, aggregate_expenses, sum_expenses};
pub use fare::{FareBreakdown, FareResult, calculate_fare};
pub use grand_total::{GrandTotalResult, calculate_grand_total};
pub use invoice_totals::{
    InvoiceTotalsResult, LineFill, apply_invoice_totals, calculate_invoice_totals,
    fill_invoice_line, invoice_from_booking,
};
pub use ledger::{LedgerEntry, driver_ledger};
pub use local_fare::calculate_local_fare;
pub use outstation_fare::calculate_outstation_fare;
pub use payment_amount::{PaymentAmountResult, payment_amount_from_invoice};
pub use rate_resolver::{RateResolution, resolve_rates, snapshot_from_card};
pub use recompute::{ENGINE_VERSION, apply_calculation, recompute_booking};
pub use tax_charges::{TaxAggregationResult, aggregate_tax_lines};
pub use time_distance::{
    NormalizedTrip, SECONDS_PER_DAY, SECONDS_PER_HOUR,
    calculate_total_hours, calculate_total_km, calculate_trip_days, normalize_trip,
};
