//! Driver payment model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::BookingRef;

/// A payment settling what is owed to a driver for a booking or duty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverPayment {
    /// Unique identifier for the payment.
    pub id: String,
    /// The booking being settled, if any.
    #[serde(default)]
    pub booking: Option<BookingRef>,
    /// The duty slip being settled, if any.
    #[serde(default)]
    pub duty_slip_id: Option<String>,
    /// The driver being paid.
    #[serde(default)]
    pub driver: Option<String>,
    /// The settlement amount.
    #[serde(default)]
    pub amount: Decimal,
    /// Set when `amount` was entered by hand and must not be refreshed.
    #[serde(default)]
    pub amount_overridden: bool,
    /// Free-text breakdown of the amount.
    #[serde(default)]
    pub details: String,
    /// Date the payment was raised.
    pub payment_date: NaiveDate,
}

impl DriverPayment {
    /// Creates a zero-amount payment dated `payment_date`.
    pub fn new(id: impl Into<String>, payment_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            booking: None,
            duty_slip_id: None,
            driver: None,
            amount: Decimal::ZERO,
            amount_overridden: false,
            details: String::new(),
            payment_date,
        }
    }
}
