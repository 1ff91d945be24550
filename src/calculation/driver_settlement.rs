//! Driver settlement.
//!
//! Works out what a driver is owed for a booking or a duty slip and
//! prefills the matching [`DriverPayment`].

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Advisory, AdvisoryKind, AuditStep, Booking, DriverPayment, DutySlip};

/// What a driver is owed, split by source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettlementBreakdown {
    /// Out-of-pocket expenses to reimburse.
    pub reimbursement: Decimal,
    /// Night allowance passed on to the driver.
    pub allowance: Decimal,
    /// Total owed.
    pub amount: Decimal,
}

/// The result of a settlement calculation.
#[derive(Debug, Clone)]
pub struct SettlementResult {
    /// The amounts owed.
    pub breakdown: SettlementBreakdown,
    /// Text describing the breakdown, stored on the payment.
    pub details: String,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Settles a booking: the expenses the driver paid, plus the night charge
/// when `include_night_allowance` is set.
///
/// Reads the booking's derived fields, so the booking should have been
/// recomputed first.
pub fn settle_booking(booking: &Booking, include_night_allowance: bool, step_number: u32) -> SettlementResult {
    let reimbursement = booking.derived.driver_expense_total;
    let allowance = if include_night_allowance {
        booking.derived.night_charge
    } else {
        Decimal::ZERO
    };
    let amount = reimbursement + allowance;

    let details = if include_night_allowance {
        format!(
            "Booking {}: driver expenses {} + night allowance {} ({} nights)",
            booking.id,
            reimbursement.normalize(),
            allowance.normalize(),
            booking.derived.nights
        )
    } else {
        format!("Booking {}: driver expenses {}", booking.id, reimbursement.normalize())
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "driver_settlement_booking".to_string(),
        rule_name: "Driver Settlement (Booking)".to_string(),
        input: serde_json::json!({
            "booking_id": booking.id,
            "driver_expense_total": reimbursement.normalize().to_string(),
            "night_charge": booking.derived.night_charge.normalize().to_string(),
            "include_night_allowance": include_night_allowance
        }),
        output: serde_json::json!({
            "reimbursement": reimbursement.normalize().to_string(),
            "allowance": allowance.normalize().to_string(),
            "amount": amount.normalize().to_string()
        }),
        reasoning: details.clone(),
    };

    SettlementResult {
        breakdown: SettlementBreakdown {
            reimbursement,
            allowance,
            amount,
        },
        details,
        audit_step,
    }
}

/// Settles a duty slip: every expense recorded on the slip.
pub fn settle_duty_slip(slip: &DutySlip, step_number: u32) -> SettlementResult {
    let reimbursement = slip.expense_total();
    let labels: Vec<String> = slip
        .expenses
        .iter()
        .map(|e| format!("{} {}", e.label, e.amount_or_zero().normalize()))
        .collect();

    let details = if labels.is_empty() {
        format!("Duty slip {}: no expenses", slip.id)
    } else {
        format!("Duty slip {}: {}", slip.id, labels.join(", "))
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "driver_settlement_duty_slip".to_string(),
        rule_name: "Driver Settlement (Duty Slip)".to_string(),
        input: serde_json::json!({
            "duty_slip_id": slip.id,
            "expense_count": slip.expenses.len()
        }),
        output: serde_json::json!({
            "amount": reimbursement.normalize().to_string()
        }),
        reasoning: details.clone(),
    };

    SettlementResult {
        breakdown: SettlementBreakdown {
            reimbursement,
            allowance: Decimal::ZERO,
            amount: reimbursement,
        },
        details,
        audit_step,
    }
}

/// Prefills a driver payment for a booking.
///
/// Returns an advisory instead when there is nothing to pay.
pub fn driver_payment_from_booking(
    booking: &Booking,
    include_night_allowance: bool,
    payment_date: NaiveDate,
) -> Result<DriverPayment, Advisory> {
    let settlement = settle_booking(booking, include_night_allowance, 1);
    ensure_positive(&settlement, &format!("booking '{}'", booking.id))?;

    let mut payment = DriverPayment::new(String::new(), payment_date);
    payment.booking = Some(booking.reference());
    payment.driver = booking.driver.clone();
    payment.amount = settlement.breakdown.amount;
    payment.details = settlement.details;
    Ok(payment)
}

/// Prefills a driver payment for a duty slip.
///
/// Returns an advisory instead when there is nothing to pay.
pub fn driver_payment_from_duty_slip(
    slip: &DutySlip,
    payment_date: NaiveDate,
) -> Result<DriverPayment, Advisory> {
    let settlement = settle_duty_slip(slip, 1);
    ensure_positive(&settlement, &format!("duty slip '{}'", slip.id))?;

    let mut payment = DriverPayment::new(String::new(), payment_date);
    payment.booking = slip.booking.clone();
    payment.duty_slip_id = Some(slip.id.clone());
    payment.driver = slip.driver.clone();
    payment.amount = settlement.breakdown.amount;
    payment.details = settlement.details;
    Ok(payment)
}

/// Refreshes a payment from a new settlement.
///
/// A manually overridden amount is kept as entered; only the details text
/// is refreshed.
pub fn refresh_payment(payment: &DriverPayment, settlement: &SettlementResult) -> DriverPayment {
    let mut refreshed = payment.clone();
    if !payment.amount_overridden {
        refreshed.amount = settlement.breakdown.amount;
    }
    refreshed.details = settlement.details.clone();
    refreshed
}

fn ensure_positive(settlement: &SettlementResult, source: &str) -> Result<(), Advisory> {
    if settlement.breakdown.amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(Advisory::new(
            AdvisoryKind::MissingInput,
            "amount",
            format!(
                "Nothing owed to the driver for {} (amount {}); no payment created",
                source,
                settlement.breakdown.amount.normalize()
            ),
        ))
    }
}
