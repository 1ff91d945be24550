//! Request types for the fare engine API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    Booking, BookingType, ExpenseLine, InvoiceLine, Overrides, RateSnapshot, TaxLine, TripInputs,
};

fn default_quote_id() -> String {
    "quote".to_string()
}

/// Request body for the `/bookings/quote` endpoint.
///
/// Describes a booking to price without storing it. When `rates` is absent
/// the snapshot is taken from the vehicle model's rate card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// Identifier echoed back on the calculation.
    #[serde(default = "default_quote_id")]
    pub booking_id: String,
    /// The booking variant.
    pub booking_type: BookingType,
    /// The vehicle model to take rates from.
    #[serde(default)]
    pub vehicle_model: Option<String>,
    /// Explicit rates, bypassing the rate card.
    #[serde(default)]
    pub rates: Option<RateSnapshot>,
    /// Raw trip inputs.
    #[serde(default)]
    pub inputs: TripInputs,
    /// Ordered tax and charge lines.
    #[serde(default)]
    pub tax_lines: Vec<TaxLine>,
    /// Trip expenses.
    #[serde(default)]
    pub expense_lines: Vec<ExpenseLine>,
    /// Manual overrides on derived fields.
    #[serde(default)]
    pub overrides: Overrides,
}

impl QuoteRequest {
    /// Builds the booking to price. Rates stay empty unless given
    /// explicitly; the handler resolves them from the rate card otherwise.
    pub fn to_booking(&self) -> Booking {
        let mut booking = Booking::new(self.booking_id.clone(), self.booking_type);
        booking.vehicle_model = self.vehicle_model.clone();
        booking.rates = self.rates.clone().unwrap_or_default();
        booking.inputs = self.inputs.clone();
        booking.tax_lines = self.tax_lines.clone();
        booking.expense_lines = self.expense_lines.clone();
        booking.overrides = self.overrides.clone();
        booking
    }
}

/// Request body for the `/invoices/totals` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceTotalsRequest {
    /// Invoice lines with their amounts.
    pub lines: Vec<InvoiceLine>,
    /// Discount subtracted from the gross total.
    #[serde(default)]
    pub discount: Decimal,
    /// Amount already paid.
    #[serde(default)]
    pub paid_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_quote_request() {
        let json = r#"{"booking_type": "local"}"#;
        let request: QuoteRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.booking_id, "quote");
        assert!(request.rates.is_none());
        assert!(request.tax_lines.is_empty());
    }

    #[test]
    fn test_to_booking_carries_explicit_rates() {
        let json = r#"{
            "booking_id": "Q-1",
            "booking_type": "outstation",
            "rates": {"per_km_rate": "12", "min_km_per_day": "250"},
            "overrides": {"night_charge": "900"}
        }"#;
        let request: QuoteRequest = serde_json::from_str(json).unwrap();
        let booking = request.to_booking();

        assert_eq!(booking.id, "Q-1");
        assert_eq!(booking.rates.per_km_rate, Decimal::new(12, 0));
        assert_eq!(booking.overrides.len(), 1);
    }

    #[test]
    fn test_invoice_request_defaults_adjustments() {
        let json = r#"{"lines": []}"#;
        let request: InvoiceTotalsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.discount, Decimal::ZERO);
        assert_eq!(request.paid_amount, Decimal::ZERO);
    }
}
