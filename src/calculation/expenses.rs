//! Expense aggregation.

use rust_decimal::Decimal;

use crate::models::{AuditStep, ExpenseLine, PaidBy};

/// Expense totals split by who they are owed to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpenseTotals {
    /// Sum of every expense.
    pub total: Decimal,
    /// Expenses passed through to the customer's bill.
    pub billable: Decimal,
    /// Expenses the driver paid and is owed back.
    pub driver: Decimal,
    /// Expenses the customer already paid directly.
    pub customer_paid: Decimal,
}

/// The result of aggregating expenses, including the audit step.
#[derive(Debug, Clone)]
pub struct ExpenseAggregationResult {
    /// The aggregated totals.
    pub totals: ExpenseTotals,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Sums expense amounts, treating missing amounts as zero.
pub fn sum_expenses<'a>(lines: impl IntoIterator<Item = &'a ExpenseLine>) -> Decimal {
    lines.into_iter().map(ExpenseLine::amount_or_zero).sum()
}

/// Aggregates a booking's expenses.
///
/// The billable total feeds the grand total; the driver total feeds driver
/// settlement. An expense can count toward both, and the two totals are
/// never folded into each other.
pub fn aggregate_expenses(lines: &[ExpenseLine], step_number: u32) -> ExpenseAggregationResult {
    let totals = ExpenseTotals {
        total: sum_expenses(lines),
        billable: sum_expenses(lines.iter().filter(|l| l.billable)),
        driver: sum_expenses(lines.iter().filter(|l| l.paid_by == PaidBy::Driver)),
        customer_paid: sum_expenses(lines.iter().filter(|l| l.paid_by == PaidBy::Customer)),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "expenses".to_string(),
        rule_name: "Expense Aggregation".to_string(),
        input: serde_json::json!({
            "line_count": lines.len()
        }),
        output: serde_json::json!({
            "total": totals.total.normalize().to_string(),
            "billable": totals.billable.normalize().to_string(),
            "driver": totals.driver.normalize().to_string(),
            "customer_paid": totals.customer_paid.normalize().to_string()
        }),
        reasoning: format!(
            "{} expenses: ${} billable, ${} owed to driver",
            lines.len(),
            totals.billable.normalize(),
            totals.driver.normalize()
        ),
    };

    ExpenseAggregationResult { totals, audit_step }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_totals_are_kept_separate() {
        let lines = vec![
            ExpenseLine::new("Toll", dec("200"), true, PaidBy::Driver),
            ExpenseLine::new("Parking", dec("50"), false, PaidBy::Driver),
            ExpenseLine::new("Permit", dec("300"), true, PaidBy::Company),
            ExpenseLine::new("Fuel", dec("1000"), false, PaidBy::Customer),
        ];

        let result = aggregate_expenses(&lines, 1);

        assert_eq!(result.totals.total, dec("1550"));
        assert_eq!(result.totals.billable, dec("500"));
        assert_eq!(result.totals.driver, dec("250"));
        assert_eq!(result.totals.customer_paid, dec("1000"));
    }

    #[test]
    fn test_missing_amounts_count_as_zero() {
        let lines = vec![ExpenseLine {
            label: "Toll".to_string(),
            amount: None,
            billable: true,
            paid_by: PaidBy::Driver,
        }];

        let result = aggregate_expenses(&lines, 1);
        assert_eq!(result.totals, ExpenseTotals::default());
    }
}
