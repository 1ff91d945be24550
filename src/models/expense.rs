//! Trip expense line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Who paid an expense out of pocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaidBy {
    /// Paid by the driver; owed back to the driver on settlement.
    Driver,
    /// Paid by the customer directly; reduces what the invoice still asks for.
    Customer,
    /// Paid by the company.
    #[default]
    Company,
}

/// A single expense incurred on a trip (toll, parking, fuel, permit...).
///
/// An expense can be billable to the customer, reimbursable to the driver,
/// both, or neither. The two totals are always aggregated separately.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpenseLine {
    /// Short description of the expense.
    pub label: String,
    /// The expense amount. Missing amounts count as zero.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Whether the expense is passed through to the customer's bill.
    #[serde(default)]
    pub billable: bool,
    /// Who paid the expense.
    #[serde(default)]
    pub paid_by: PaidBy,
}

impl ExpenseLine {
    /// Creates an expense line.
    pub fn new(label: impl Into<String>, amount: Decimal, billable: bool, paid_by: PaidBy) -> Self {
        Self {
            label: label.into(),
            amount: Some(amount),
            billable,
            paid_by,
        }
    }

    /// The expense amount, treating a missing amount as zero.
    pub fn amount_or_zero(&self) -> Decimal {
        self.amount.unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_expense_defaults() {
        let line: ExpenseLine = serde_json::from_str(r#"{"label": "Toll"}"#).unwrap();
        assert_eq!(line.label, "Toll");
        assert!(!line.billable);
        assert_eq!(line.paid_by, PaidBy::Company);
        assert_eq!(line.amount_or_zero(), Decimal::ZERO);
    }

    #[test]
    fn test_paid_by_is_snake_case() {
        let line: ExpenseLine =
            serde_json::from_str(r#"{"label": "Parking", "amount": "40", "paid_by": "driver"}"#)
                .unwrap();
        assert_eq!(line.paid_by, PaidBy::Driver);
        assert_eq!(line.amount_or_zero(), Decimal::new(40, 0));
    }
}
