//! Customer invoice totals and line propagation.

use rust_decimal::Decimal;

use crate::models::{
    Advisory, AdvisoryKind, AuditStep, Booking, CustomerInvoice, InvoiceLine, InvoiceTotals,
};

/// The result of an invoice totals calculation.
#[derive(Debug, Clone)]
pub struct InvoiceTotalsResult {
    /// The computed totals.
    pub totals: InvoiceTotals,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// The result of filling an invoice line from its booking.
#[derive(Debug, Clone)]
pub struct LineFill {
    /// The line with its amount refreshed, or unchanged if the booking
    /// could not be resolved.
    pub line: InvoiceLine,
    /// Raised when the booking could not be resolved.
    pub advisory: Option<Advisory>,
}

/// Rolls invoice lines and adjustments up into invoice totals.
///
/// ```text
/// gross_total    = sum(line.amount)
/// grand_total    = gross_total - discount
/// payable_amount = grand_total - paid_amount
/// ```
///
/// An invoice with no lines totals zero throughout, whatever its
/// adjustments.
///
/// # Examples
///
/// ```
/// use fare_engine::calculation::calculate_invoice_totals;
/// use fare_engine::models::{BookingType, InvoiceLine};
/// use rust_decimal::Decimal;
///
/// let mut first = InvoiceLine::new(BookingType::Local, "BK-0001");
/// first.amount = Decimal::new(500, 0);
/// let mut second = InvoiceLine::new(BookingType::Outstation, "BK-0002");
/// second.amount = Decimal::new(700, 0);
///
/// let result = calculate_invoice_totals(&[first, second], Decimal::new(100, 0), Decimal::new(200, 0), 1);
/// assert_eq!(result.totals.gross_total, Decimal::new(1200, 0));
/// assert_eq!(result.totals.grand_total, Decimal::new(1100, 0));
/// assert_eq!(result.totals.payable_amount, Decimal::new(900, 0));
/// ```
pub fn calculate_invoice_totals(
    lines: &[InvoiceLine],
    discount: Decimal,
    paid_amount: Decimal,
    step_number: u32,
) -> InvoiceTotalsResult {
    let totals = if lines.is_empty() {
        InvoiceTotals::default()
    } else {
        let gross_total: Decimal = lines.iter().map(|line| line.amount).sum();
        let grand_total = gross_total - discount;
        InvoiceTotals {
            gross_total,
            grand_total,
            payable_amount: grand_total - paid_amount,
        }
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "invoice_totals".to_string(),
        rule_name: "Invoice Totals".to_string(),
        input: serde_json::json!({
            "line_count": lines.len(),
            "discount": discount.normalize().to_string(),
            "paid_amount": paid_amount.normalize().to_string()
        }),
        output: serde_json::json!({
            "gross_total": totals.gross_total.normalize().to_string(),
            "grand_total": totals.grand_total.normalize().to_string(),
            "payable_amount": totals.payable_amount.normalize().to_string()
        }),
        reasoning: if lines.is_empty() {
            "No invoice lines, all totals zero".to_string()
        } else {
            format!(
                "${} gross - ${} discount - ${} paid = ${} payable",
                totals.gross_total.normalize(),
                discount.normalize(),
                paid_amount.normalize(),
                totals.payable_amount.normalize()
            )
        },
    };

    InvoiceTotalsResult { totals, audit_step }
}

/// Writes `totals` onto an invoice.
pub fn apply_invoice_totals(invoice: &mut CustomerInvoice, totals: &InvoiceTotals) {
    invoice.gross_total = totals.gross_total;
    invoice.grand_total = totals.grand_total;
    invoice.payable_amount = totals.payable_amount;
}

/// Copies the referenced booking's grand total into an invoice line.
///
/// The booking must exist and match the line's booking type; otherwise the
/// line keeps its prior amount and an advisory is returned.
pub fn fill_invoice_line(line: &InvoiceLine, booking: Option<&Booking>) -> LineFill {
    match booking {
        Some(booking) if booking.id == line.booking_id && booking.booking_type == line.booking_type => {
            LineFill {
                line: InvoiceLine {
                    amount: booking.derived.grand_total,
                    ..line.clone()
                },
                advisory: None,
            }
        }
        Some(booking) => LineFill {
            line: line.clone(),
            advisory: Some(Advisory::new(
                AdvisoryKind::UnresolvedReference,
                "booking_id",
                format!(
                    "Booking '{}' is {} but the invoice line references a {} booking; amount left unchanged",
                    booking.id, booking.booking_type, line.booking_type
                ),
            )),
        },
        None => LineFill {
            line: line.clone(),
            advisory: Some(Advisory::new(
                AdvisoryKind::UnresolvedReference,
                "booking_id",
                format!(
                    "{} booking '{}' not found; amount left unchanged",
                    line.booking_type, line.booking_id
                ),
            )),
        },
    }
}

/// Prefills a customer invoice for a single booking.
///
/// The invoice carries one line billing the booking's grand total. The
/// expenses the customer already paid directly count as paid.
pub fn invoice_from_booking(booking: &Booking, invoice_id: impl Into<String>) -> CustomerInvoice {
    let mut line = InvoiceLine::new(booking.booking_type, booking.id.clone());
    line.amount = booking.derived.grand_total;
    line.description = Some(describe_booking(booking));

    let mut invoice = CustomerInvoice::new(invoice_id);
    invoice.customer = booking.customer.clone();
    invoice.source_booking = Some(booking.id.clone());
    invoice.paid_amount = booking.derived.customer_paid_expense_total;
    invoice.lines.push(line);

    let result = calculate_invoice_totals(&invoice.lines, invoice.discount, invoice.paid_amount, 1);
    apply_invoice_totals(&mut invoice, &result.totals);
    invoice
}

fn describe_booking(booking: &Booking) -> String {
    match (&booking.from_location, &booking.to_location) {
        (Some(from), Some(to)) => format!("{} booking {}: {} to {}", booking.booking_type, booking.id, from, to),
        _ => format!("{} booking {}", booking.booking_type, booking.id),
    }
}
