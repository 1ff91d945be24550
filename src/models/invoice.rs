//! Customer invoice model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::BookingType;

/// One invoice row billing a single booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// The referenced booking's variant.
    pub booking_type: BookingType,
    /// The referenced booking's identifier.
    pub booking_id: String,
    /// Free-text description shown on the invoice.
    #[serde(default)]
    pub description: Option<String>,
    /// The booking grand total copied at line add/edit time.
    #[serde(default)]
    pub amount: Decimal,
}

impl InvoiceLine {
    /// Creates a line pointing at a booking with a zero amount.
    pub fn new(booking_type: BookingType, booking_id: impl Into<String>) -> Self {
        Self {
            booking_type,
            booking_id: booking_id.into(),
            description: None,
            amount: Decimal::ZERO,
        }
    }
}

/// A customer invoice aggregating one or more bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInvoice {
    /// Unique identifier for the invoice.
    pub id: String,
    /// The customer billed.
    #[serde(default)]
    pub customer: Option<String>,
    /// The booking this invoice was raised from, if any.
    #[serde(default)]
    pub source_booking: Option<String>,
    /// Ordered invoice lines.
    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
    /// Discount subtracted from the gross total.
    #[serde(default)]
    pub discount: Decimal,
    /// Amount the customer has already paid.
    #[serde(default)]
    pub paid_amount: Decimal,
    /// Sum of line amounts.
    #[serde(default)]
    pub gross_total: Decimal,
    /// Gross total less discount.
    #[serde(default)]
    pub grand_total: Decimal,
    /// Grand total less paid amount.
    #[serde(default)]
    pub payable_amount: Decimal,
}

impl CustomerInvoice {
    /// Creates an empty invoice.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            customer: None,
            source_booking: None,
            lines: Vec::new(),
            discount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            gross_total: Decimal::ZERO,
            grand_total: Decimal::ZERO,
            payable_amount: Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_invoice_is_empty_and_zeroed() {
        let invoice = CustomerInvoice::new("INV-00001");
        assert!(invoice.lines.is_empty());
        assert_eq!(invoice.grand_total, Decimal::ZERO);
        assert_eq!(invoice.payable_amount, Decimal::ZERO);
    }

    #[test]
    fn test_deserialize_line_defaults_amount() {
        let json = r#"{"booking_type": "local", "booking_id": "BK-0001"}"#;
        let line: InvoiceLine = serde_json::from_str(json).unwrap();
        assert_eq!(line.amount, Decimal::ZERO);
        assert_eq!(line.description, None);
    }
}
