//! Core data models for the fare engine.
//!
//! This module contains all the domain models used throughout the engine.

mod booking;
mod calculation_result;
mod customer_payment;
mod driver_payment;
mod duty_slip;
mod expense;
mod invoice;
mod mutation;
mod rate_card;
mod record;
mod tax_line;

pub use booking::{
    Booking, BookingRef, BookingType, DerivedField, DerivedFields, Overrides, RateSnapshot,
    TripInputs,
};
pub use calculation_result::{
    Advisory, AdvisoryKind, AuditStep, AuditTrace, BookingCalculation, InvoiceTotals,
};
pub use customer_payment::CustomerPayment;
pub use driver_payment::DriverPayment;
pub use duty_slip::DutySlip;
pub use expense::{ExpenseLine, PaidBy};
pub use invoice::{CustomerInvoice, InvoiceLine};
pub use mutation::{BookingMutation, InputField, RateField};
pub use rate_card::{RateCard, VehicleModel};
pub use record::{ChangeSet, ChildCollection, ChildRows, DocType, FieldChange, Record, RecordRef};
pub use tax_line::{ApplyOn, TaxLine};
