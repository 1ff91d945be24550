//! Tax and charges aggregation.
//!
//! Walks a booking's ordered tax lines, filling in each line's running
//! total and summing the amounts into the tax total.

use rust_decimal::Decimal;

use crate::models::{ApplyOn, AuditStep, TaxLine};

/// The result of aggregating tax lines, including the audit step.
#[derive(Debug, Clone)]
pub struct TaxAggregationResult {
    /// The lines with `total` filled in, in their original order.
    pub lines: Vec<TaxLine>,
    /// Sum of every line's amount.
    pub tax_total: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Aggregates tax and charge lines against a subtotal.
///
/// A `Prev Row` line's total is the running total so far plus its amount;
/// an `Actual` line's total is the subtotal plus its amount. Either way the
/// amount is added to the running total and to the tax total. Missing
/// amounts count as zero. The result depends only on `subtotal` and the
/// lines' `apply_on` and `amount`, so re-running on its own output yields
/// the same lines.
///
/// # Examples
///
/// ```
/// use fare_engine::calculation::aggregate_tax_lines;
/// use fare_engine::models::{ApplyOn, TaxLine};
/// use rust_decimal::Decimal;
///
/// let lines = vec![
///     TaxLine::new(ApplyOn::Actual, Decimal::new(100, 0)),
///     TaxLine::new(ApplyOn::PrevRow, Decimal::new(50, 0)),
/// ];
///
/// let result = aggregate_tax_lines(Decimal::new(1000, 0), &lines, 1);
/// assert_eq!(result.lines[0].total, Decimal::new(1100, 0));
/// assert_eq!(result.lines[1].total, Decimal::new(1150, 0));
/// assert_eq!(result.tax_total, Decimal::new(150, 0));
/// ```
pub fn aggregate_tax_lines(subtotal: Decimal, lines: &[TaxLine], step_number: u32) -> TaxAggregationResult {
    let mut running = subtotal;
    let mut tax_total = Decimal::ZERO;
    let mut aggregated = Vec::with_capacity(lines.len());

    for line in lines {
        let amount = line.amount_or_zero();
        let total = match line.apply_on {
            ApplyOn::PrevRow => running + amount,
            ApplyOn::Actual => subtotal + amount,
        };
        running += amount;
        tax_total += amount;

        aggregated.push(TaxLine {
            total,
            ..line.clone()
        });
    }

    let line_summaries: Vec<serde_json::Value> = aggregated
        .iter()
        .map(|line| {
            serde_json::json!({
                "apply_on": line.apply_on.to_string(),
                "amount": line.amount_or_zero().normalize().to_string(),
                "total": line.total.normalize().to_string()
            })
        })
        .collect();

    let audit_step = AuditStep {
        step_number,
        rule_id: "tax_charges".to_string(),
        rule_name: "Tax & Charges Aggregation".to_string(),
        input: serde_json::json!({
            "subtotal": subtotal.normalize().to_string(),
            "line_count": lines.len()
        }),
        output: serde_json::json!({
            "lines": line_summaries,
            "tax_total": tax_total.normalize().to_string()
        }),
        reasoning: format!(
            "{} tax/charge lines on subtotal ${} total ${}",
            lines.len(),
            subtotal.normalize(),
            tax_total.normalize()
        ),
    };

    TaxAggregationResult {
        lines: aggregated,
        tax_total,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_no_lines_means_no_tax() {
        let result = aggregate_tax_lines(dec("1000"), &[], 1);
        assert!(result.lines.is_empty());
        assert_eq!(result.tax_total, Decimal::ZERO);
    }

    #[test]
    fn test_prev_row_lines_cascade() {
        let lines = vec![
            TaxLine::new(ApplyOn::PrevRow, dec("50")),
            TaxLine::new(ApplyOn::PrevRow, dec("25")),
            TaxLine::new(ApplyOn::Actual, dec("10")),
        ];
        let result = aggregate_tax_lines(dec("1000"), &lines, 1);

        assert_eq!(result.lines[0].total, dec("1050"));
        assert_eq!(result.lines[1].total, dec("1075"));
        assert_eq!(result.lines[2].total, dec("1010"));
        assert_eq!(result.tax_total, dec("85"));
    }

    #[test]
    fn test_missing_amount_counts_as_zero() {
        let lines = vec![TaxLine {
            apply_on: ApplyOn::Actual,
            ..Default::default()
        }];
        let result = aggregate_tax_lines(dec("700"), &lines, 1);
        assert_eq!(result.lines[0].total, dec("700"));
        assert_eq!(result.tax_total, Decimal::ZERO);
    }

    #[test]
    fn test_stale_totals_are_ignored_and_rerun_is_stable() {
        let mut stale = TaxLine::new(ApplyOn::PrevRow, dec("50"));
        stale.total = dec("12345");
        stale.description = Some("GST".to_string());

        let first = aggregate_tax_lines(dec("1000"), &[stale], 1);
        let second = aggregate_tax_lines(dec("1000"), &first.lines, 1);

        assert_eq!(first.lines[0].total, dec("1050"));
        assert_eq!(first.lines[0].description.as_deref(), Some("GST"));
        assert_eq!(first.lines, second.lines);
        assert_eq!(first.tax_total, second.tax_total);
    }
}
