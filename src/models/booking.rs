//! Booking model and related types.
//!
//! A [`Booking`] holds raw trip inputs, a rate-card snapshot, its tax and
//! expense child collections, any manual overrides, and the derived fields
//! written back by the last recompute cycle.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ExpenseLine, TaxLine};

/// The billing variant of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    /// Hourly city usage billed as a minimum package plus excess hours/km.
    Local,
    /// Multi-day trip billed per kilometre with a per-day distance floor.
    Outstation,
}

impl std::fmt::Display for BookingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingType::Local => write!(f, "Local"),
            BookingType::Outstation => write!(f, "Outstation"),
        }
    }
}

/// Identifies a booking from another record (invoice line, duty slip, payment).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingRef {
    /// The booking's variant at the time the reference was made.
    pub booking_type: BookingType,
    /// The booking identifier.
    pub booking_id: String,
}

/// Raw trip inputs as entered by the user or merged from duty slips.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TripInputs {
    /// Pickup (local) or departure (outstation) time.
    #[serde(default)]
    pub pickup_at: Option<NaiveDateTime>,
    /// Return time.
    #[serde(default)]
    pub return_at: Option<NaiveDateTime>,
    /// Odometer reading at the start of the trip.
    #[serde(default)]
    pub start_km: Option<Decimal>,
    /// Odometer reading at the end of the trip.
    #[serde(default)]
    pub end_km: Option<Decimal>,
    /// Night stays entered manually on local bookings. Outstation bookings
    /// ignore this and derive nights from elapsed time.
    #[serde(default)]
    pub nights: Option<u32>,
}

/// The booking's copy of the rates it is billed at.
///
/// Populated from a vehicle model's rate card at selection time and
/// editable by hand afterwards. Later rate-card edits do not reach it until
/// the copy is re-triggered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// Minimum billable hours (local).
    #[serde(default)]
    pub min_hours: Decimal,
    /// Kilometres included in the minimum package (local).
    #[serde(default)]
    pub min_km: Decimal,
    /// Hourly rate (local).
    #[serde(default)]
    pub per_hour_rate: Decimal,
    /// Per-kilometre rate.
    #[serde(default)]
    pub per_km_rate: Decimal,
    /// Charge per night stay.
    #[serde(default)]
    pub night_rate: Decimal,
    /// Minimum kilometres per elapsed day (outstation). Scaled by the day
    /// count on every cycle, never stored pre-multiplied.
    #[serde(default)]
    pub min_km_per_day: Decimal,
}

/// Derived fields a user may override by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedField {
    /// The minimum package (local) or kilometre charge (outstation).
    BaseCharge,
    /// Charge for hours beyond the minimum (local).
    ExtraHourCharge,
    /// Charge for kilometres beyond the minimum (local).
    ExtraKmCharge,
    /// Night stay charge.
    NightCharge,
    /// The scaled minimum distance (outstation).
    MinKmTotal,
}

impl std::fmt::Display for DerivedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DerivedField::BaseCharge => "base_charge",
            DerivedField::ExtraHourCharge => "extra_hour_charge",
            DerivedField::ExtraKmCharge => "extra_km_charge",
            DerivedField::NightCharge => "night_charge",
            DerivedField::MinKmTotal => "min_km_total",
        };
        write!(f, "{}", name)
    }
}

/// Manual overrides keyed by the derived field they replace.
pub type Overrides = BTreeMap<DerivedField, Decimal>;

/// Every value the recompute pipeline writes back onto a booking.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DerivedFields {
    /// Elapsed hours between pickup and return.
    pub total_hours: Decimal,
    /// Net kilometres travelled.
    pub total_km: Decimal,
    /// Elapsed calendar days (outstation; zero for local).
    pub days: u32,
    /// Night stays billed.
    pub nights: u32,
    /// Scaled minimum distance (outstation).
    pub min_km_total: Decimal,
    /// Kilometres billed after the distance floor (outstation).
    pub chargeable_km: Decimal,
    /// Hours beyond the minimum (local).
    pub extra_hours: Decimal,
    /// Kilometres beyond the minimum (local).
    pub extra_km: Decimal,
    /// Minimum package (local) or kilometre charge (outstation).
    pub base_charge: Decimal,
    /// Charge for extra hours (local).
    pub extra_hour_charge: Decimal,
    /// Charge for extra kilometres (local).
    pub extra_km_charge: Decimal,
    /// Night stay charge.
    pub night_charge: Decimal,
    /// Fare subtotal before taxes and expenses.
    pub subtotal: Decimal,
    /// Charges carried into the grand total.
    pub total_charges: Decimal,
    /// Sum of tax and charge line amounts.
    pub tax_total: Decimal,
    /// Expenses passed through to the customer.
    pub billable_expense_total: Decimal,
    /// Expenses owed back to the driver.
    pub driver_expense_total: Decimal,
    /// Expenses the customer already paid directly.
    pub customer_paid_expense_total: Decimal,
    /// What the customer is billed for this booking.
    pub grand_total: Decimal,
}

/// A local or outstation booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier for the booking.
    pub id: String,
    /// The billing variant.
    pub booking_type: BookingType,
    /// The selected vehicle model, whose rate card feeds the snapshot.
    #[serde(default)]
    pub vehicle_model: Option<String>,
    /// Customer being billed.
    #[serde(default)]
    pub customer: Option<String>,
    /// Assigned driver.
    #[serde(default)]
    pub driver: Option<String>,
    /// Assigned vehicle.
    #[serde(default)]
    pub vehicle: Option<String>,
    /// Pickup location or origin city.
    #[serde(default)]
    pub from_location: Option<String>,
    /// Drop location or destination city.
    #[serde(default)]
    pub to_location: Option<String>,
    /// Raw trip inputs.
    #[serde(default)]
    pub inputs: TripInputs,
    /// Rates the booking is billed at.
    #[serde(default)]
    pub rates: RateSnapshot,
    /// Ordered tax and charge lines.
    #[serde(default)]
    pub tax_lines: Vec<TaxLine>,
    /// Trip expenses.
    #[serde(default)]
    pub expense_lines: Vec<ExpenseLine>,
    /// Derived fields the user has overridden by hand.
    #[serde(default)]
    pub overrides: Overrides,
    /// Values written back by the last recompute cycle.
    #[serde(default)]
    pub derived: DerivedFields,
    /// Invoice created from this booking, if any.
    #[serde(default)]
    pub invoice_id: Option<String>,
    /// Driver payment settling this booking, if any.
    #[serde(default)]
    pub driver_payment_id: Option<String>,
}

impl Booking {
    /// Creates an empty booking of the given type.
    ///
    /// # Examples
    ///
    /// ```
    /// use fare_engine::models::{Booking, BookingType};
    ///
    /// let booking = Booking::new("BK-0001", BookingType::Local);
    /// assert_eq!(booking.id, "BK-0001");
    /// assert!(booking.tax_lines.is_empty());
    /// ```
    pub fn new(id: impl Into<String>, booking_type: BookingType) -> Self {
        Self {
            id: id.into(),
            booking_type,
            vehicle_model: None,
            customer: None,
            driver: None,
            vehicle: None,
            from_location: None,
            to_location: None,
            inputs: TripInputs::default(),
            rates: RateSnapshot::default(),
            tax_lines: Vec::new(),
            expense_lines: Vec::new(),
            overrides: Overrides::new(),
            derived: DerivedFields::default(),
            invoice_id: None,
            driver_payment_id: None,
        }
    }

    /// Returns a reference other records can use to point at this booking.
    pub fn reference(&self) -> BookingRef {
        BookingRef {
            booking_type: self.booking_type,
            booking_id: self.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_booking() {
        let json = r#"{"id": "BK-0001", "booking_type": "outstation"}"#;
        let booking: Booking = serde_json::from_str(json).unwrap();

        assert_eq!(booking.booking_type, BookingType::Outstation);
        assert_eq!(booking.inputs, TripInputs::default());
        assert_eq!(booking.rates, RateSnapshot::default());
        assert!(booking.overrides.is_empty());
    }

    #[test]
    fn test_deserialize_trip_inputs() {
        let json = r#"{
            "pickup_at": "2026-03-02T09:00:00",
            "return_at": "2026-03-02T13:30:00",
            "start_km": "100",
            "end_km": "180"
        }"#;
        let inputs: TripInputs = serde_json::from_str(json).unwrap();

        assert!(inputs.pickup_at.is_some());
        assert_eq!(inputs.end_km, Some(Decimal::new(180, 0)));
        assert_eq!(inputs.nights, None);
    }

    #[test]
    fn test_reference_carries_type_and_id() {
        let booking = Booking::new("BK-0042", BookingType::Local);
        let reference = booking.reference();
        assert_eq!(reference.booking_type, BookingType::Local);
        assert_eq!(reference.booking_id, "BK-0042");
    }

    #[test]
    fn test_derived_field_display_matches_field_names() {
        assert_eq!(DerivedField::NightCharge.to_string(), "night_charge");
        assert_eq!(DerivedField::MinKmTotal.to_string(), "min_km_total");
    }
}
