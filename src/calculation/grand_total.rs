//! Grand total assembly.

use rust_decimal::Decimal;

use crate::models::AuditStep;

/// The result of assembling the grand total.
#[derive(Debug, Clone)]
pub struct GrandTotalResult {
    /// Charges carried into the grand total (the fare subtotal).
    pub total_charges: Decimal,
    /// What the customer is billed.
    pub grand_total: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Assembles the grand total of a booking.
///
/// The night charge is already part of `subtotal` and is not added again.
pub fn calculate_grand_total(
    subtotal: Decimal,
    tax_total: Decimal,
    billable_expense_total: Decimal,
    step_number: u32,
) -> GrandTotalResult {
    let total_charges = subtotal;
    let grand_total = total_charges + tax_total + billable_expense_total;

    let audit_step = AuditStep {
        step_number,
        rule_id: "grand_total".to_string(),
        rule_name: "Grand Total".to_string(),
        input: serde_json::json!({
            "subtotal": subtotal.normalize().to_string(),
            "tax_total": tax_total.normalize().to_string(),
            "billable_expense_total": billable_expense_total.normalize().to_string()
        }),
        output: serde_json::json!({
            "total_charges": total_charges.normalize().to_string(),
            "grand_total": grand_total.normalize().to_string()
        }),
        reasoning: format!(
            "${} charges + ${} tax + ${} billable expenses = ${}",
            total_charges.normalize(),
            tax_total.normalize(),
            billable_expense_total.normalize(),
            grand_total.normalize()
        ),
    };

    GrandTotalResult {
        total_charges,
        grand_total,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grand_total_sums_all_three_parts() {
        let result = calculate_grand_total(
            Decimal::new(7500, 0),
            Decimal::new(375, 0),
            Decimal::new(200, 0),
            5,
        );
        assert_eq!(result.total_charges, Decimal::new(7500, 0));
        assert_eq!(result.grand_total, Decimal::new(8075, 0));
        assert_eq!(result.audit_step.step_number, 5);
    }
}
