//! Customer payment amount fetch.
//!
//! A customer payment takes its amount from the grand total of the invoice
//! it references.

use rust_decimal::Decimal;

use crate::models::{Advisory, AdvisoryKind, AuditStep, CustomerInvoice, CustomerPayment};

/// The result of fetching a payment's amount from its invoice.
#[derive(Debug, Clone)]
pub struct PaymentAmountResult {
    /// The amount the payment should carry.
    pub amount: Decimal,
    /// Raised when the referenced invoice could not be resolved.
    pub advisory: Option<Advisory>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Fetches a customer payment's amount from the invoice it references.
///
/// - No invoice referenced: the amount is reset to zero.
/// - Invoice resolved: the amount becomes the invoice's grand total.
/// - Invoice referenced but not found: the amount is left as it is and an
///   advisory is raised.
///
/// # Arguments
///
/// * `payment` - The payment being filled
/// * `invoice` - The referenced invoice, if it could be fetched
/// * `step_number` - The step number for audit trail sequencing
pub fn payment_amount_from_invoice(
    payment: &CustomerPayment,
    invoice: Option<&CustomerInvoice>,
    step_number: u32,
) -> PaymentAmountResult {
    let (amount, advisory, reasoning) = match (&payment.invoice_id, invoice) {
        (None, _) => (
            Decimal::ZERO,
            None,
            "No invoice referenced; amount reset to 0".to_string(),
        ),
        (Some(invoice_id), Some(invoice)) => (
            invoice.grand_total,
            None,
            format!(
                "Amount taken from invoice {} grand total ${}",
                invoice_id,
                invoice.grand_total.normalize()
            ),
        ),
        (Some(invoice_id), None) => (
            payment.amount,
            Some(Advisory::new(
                AdvisoryKind::UnresolvedReference,
                "invoice_id",
                format!("Invoice '{}' not found; amount left unchanged", invoice_id),
            )),
            format!("Invoice {} unresolved; amount kept at ${}", invoice_id, payment.amount.normalize()),
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "payment_amount".to_string(),
        rule_name: "Payment Amount".to_string(),
        input: serde_json::json!({
            "invoice_id": payment.invoice_id,
            "invoice_found": invoice.is_some(),
            "previous_amount": payment.amount.normalize().to_string()
        }),
        output: serde_json::json!({
            "amount": amount.normalize().to_string()
        }),
        reasoning,
    };

    PaymentAmountResult {
        amount,
        advisory,
        audit_step,
    }
}
