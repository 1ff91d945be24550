//! Customer payment model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A payment received from a customer against an invoice.
///
/// The amount follows the referenced invoice's grand total. Clearing the
/// reference resets it to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPayment {
    /// Unique identifier for the payment.
    pub id: String,
    /// The paying customer.
    #[serde(default)]
    pub customer: Option<String>,
    /// The invoice being paid.
    #[serde(default)]
    pub invoice_id: Option<String>,
    /// Amount received.
    #[serde(default)]
    pub amount: Decimal,
    /// How the money was received (cash, UPI, bank transfer).
    #[serde(default)]
    pub mode: Option<String>,
    /// External reference such as a transaction number.
    #[serde(default)]
    pub reference: Option<String>,
    /// Date the payment was received.
    pub payment_date: NaiveDate,
}

impl CustomerPayment {
    /// Creates a zero-amount payment not yet tied to an invoice.
    pub fn new(id: impl Into<String>, payment_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            customer: None,
            invoice_id: None,
            amount: Decimal::ZERO,
            mode: None,
            reference: None,
            payment_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_payment_defaults() {
        let json = r#"{"id": "PAY-00001", "payment_date": "2026-03-06"}"#;
        let payment: CustomerPayment = serde_json::from_str(json).unwrap();

        assert_eq!(payment.invoice_id, None);
        assert_eq!(payment.amount, Decimal::ZERO);
        assert_eq!(payment.payment_date, NaiveDate::from_ymd_opt(2026, 3, 6).unwrap());
    }
}
