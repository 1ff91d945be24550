//! Tax and charge line items attached to a booking.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a tax or charge line is applied against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApplyOn {
    /// Compounds on the running total accumulated by the lines before it.
    #[default]
    #[serde(rename = "Prev Row")]
    PrevRow,
    /// Applies against the booking's pre-tax subtotal directly.
    #[serde(rename = "Actual")]
    Actual,
}

impl std::fmt::Display for ApplyOn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyOn::PrevRow => write!(f, "Prev Row"),
            ApplyOn::Actual => write!(f, "Actual"),
        }
    }
}

/// A single tax or surcharge row in a booking's ordered tax collection.
///
/// `total` is written back by the tax aggregator for display and audit; it
/// is never read as an input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxLine {
    /// Label shown on the booking (e.g., "GST 5%", "Toll").
    #[serde(default)]
    pub description: Option<String>,
    /// What this line is applied against.
    #[serde(default)]
    pub apply_on: ApplyOn,
    /// Informational rate carried with the line.
    #[serde(default)]
    pub rate: Option<Decimal>,
    /// The amount this line contributes. Missing amounts count as zero.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Running total after this line, as computed by the aggregator.
    #[serde(default)]
    pub total: Decimal,
}

impl TaxLine {
    /// Creates a line with the given application mode and amount.
    pub fn new(apply_on: ApplyOn, amount: Decimal) -> Self {
        Self {
            description: None,
            apply_on,
            rate: None,
            amount: Some(amount),
            total: Decimal::ZERO,
        }
    }

    /// The amount this line contributes, treating a missing amount as zero.
    pub fn amount_or_zero(&self) -> Decimal {
        self.amount.unwrap_or(Decimal::ZERO)
    }
}
