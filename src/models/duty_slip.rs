//! Duty slip model.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BookingRef, ExpenseLine};

/// The record of one duty actually performed by a driver.
///
/// A duty slip carries the actual odometer readings and times of a trip.
/// Merging it into a booking overwrites the booking's estimates with these
/// actuals; its expenses can also be settled as a driver payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutySlip {
    /// Unique identifier for the slip.
    pub id: String,
    /// The booking this duty was performed for, if any.
    #[serde(default)]
    pub booking: Option<BookingRef>,
    /// Origin of the duty.
    #[serde(default)]
    pub from_location: Option<String>,
    /// Destination of the duty.
    #[serde(default)]
    pub to_location: Option<String>,
    /// Actual departure time.
    #[serde(default)]
    pub departure_at: Option<NaiveDateTime>,
    /// Actual return time.
    #[serde(default)]
    pub return_at: Option<NaiveDateTime>,
    /// Actual starting odometer reading.
    #[serde(default)]
    pub start_km: Option<Decimal>,
    /// Actual ending odometer reading.
    #[serde(default)]
    pub end_km: Option<Decimal>,
    /// The driver who performed the duty.
    #[serde(default)]
    pub driver: Option<String>,
    /// The vehicle used.
    #[serde(default)]
    pub vehicle: Option<String>,
    /// Expenses incurred during the duty.
    #[serde(default)]
    pub expenses: Vec<ExpenseLine>,
}

impl DutySlip {
    /// Creates an empty duty slip.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            booking: None,
            from_location: None,
            to_location: None,
            departure_at: None,
            return_at: None,
            start_km: None,
            end_km: None,
            driver: None,
            vehicle: None,
            expenses: Vec::new(),
        }
    }

    /// Sum of every expense on the slip, regardless of who paid it.
    pub fn expense_total(&self) -> Decimal {
        self.expenses.iter().map(ExpenseLine::amount_or_zero).sum()
    }
}
