//! Driver ledger.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{DriverPayment, DutySlip, RecordRef};

/// One row of a driver's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Date of the duty or payment. Undated duties sort first.
    pub date: Option<NaiveDate>,
    /// The duty slip or payment this row comes from.
    pub reference: RecordRef,
    /// Short description of the row.
    pub description: String,
    /// Expenses the driver incurred on the duty.
    pub earned: Decimal,
    /// Amount paid to the driver.
    pub paid: Decimal,
    /// Earned minus paid, accumulated up to and including this row.
    pub balance: Decimal,
}

/// Builds the ledger of what a driver has incurred against what they have
/// been paid.
///
/// Each duty slip whose expenses add up to more than zero contributes an
/// earned row dated by its return date; each payment contributes a paid
/// row. Rows are sorted by date, duties before payments on the same day,
/// and carry a running balance.
pub fn driver_ledger(driver: &str, duty_slips: &[DutySlip], payments: &[DriverPayment]) -> Vec<LedgerEntry> {
    let mut entries: Vec<LedgerEntry> = Vec::new();

    for slip in duty_slips
        .iter()
        .filter(|s| s.driver.as_deref() == Some(driver))
    {
        let earned = slip.expense_total();
        if earned <= Decimal::ZERO {
            continue;
        }
        let date = slip.return_at.map(|t| t.date());
        let route = match (&slip.from_location, &slip.to_location) {
            (Some(from), Some(to)) => format!(" ({} to {})", from, to),
            _ => String::new(),
        };
        entries.push(LedgerEntry {
            date,
            reference: RecordRef::duty_slip(slip.id.clone()),
            description: format!("Duty slip {}{}", slip.id, route),
            earned,
            paid: Decimal::ZERO,
            balance: Decimal::ZERO,
        });
    }

    for payment in payments
        .iter()
        .filter(|p| p.driver.as_deref() == Some(driver))
    {
        entries.push(LedgerEntry {
            date: Some(payment.payment_date),
            reference: RecordRef::driver_payment(payment.id.clone()),
            description: format!("Payment {}", payment.id),
            earned: Decimal::ZERO,
            paid: payment.amount,
            balance: Decimal::ZERO,
        });
    }

    // Stable sort keeps duties ahead of payments within a day.
    entries.sort_by_key(|entry| entry.date);

    let mut balance = Decimal::ZERO;
    for entry in &mut entries {
        balance += entry.earned - entry.paid;
        entry.balance = balance;
    }

    entries
}
