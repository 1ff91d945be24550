//! Rate card and vehicle model types.
//!
//! A [`RateCard`] belongs to a [`VehicleModel`] and is never read directly
//! by the fare calculators: the relevant subset is copied into a booking's
//! [`RateSnapshot`](super::RateSnapshot) when the vehicle model is selected.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rates published for a vehicle model.
///
/// Local bookings use the `*_local_*` fields; outstation bookings use
/// `per_km_rate` and `min_km_per_day`. `night_rate` applies to both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateCard {
    /// Minimum billable hours for a local booking.
    #[serde(default)]
    pub min_local_hour: Decimal,
    /// Kilometres included in the local minimum package.
    #[serde(default)]
    pub min_local_km: Decimal,
    /// Hourly rate for local bookings.
    #[serde(default)]
    pub local_hour_rate: Decimal,
    /// Per-kilometre rate for local bookings beyond the included kilometres.
    #[serde(default)]
    pub local_km_rate: Decimal,
    /// Charge per night stay.
    #[serde(default)]
    pub night_rate: Decimal,
    /// Per-kilometre rate for outstation bookings.
    #[serde(default)]
    pub per_km_rate: Decimal,
    /// Minimum kilometres billed per elapsed day on outstation bookings.
    #[serde(default)]
    pub min_km_per_day: Decimal,
}

/// A vehicle model offered by the fleet, with its rate card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleModel {
    /// Unique identifier (e.g., "sedan").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Published rates for this model.
    pub rate_card: RateCard,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_deserialize_vehicle_model_from_yaml() {
        let yaml = r#"
id: sedan
name: Sedan (Dzire / Etios)
rate_card:
  min_local_hour: "8"
  min_local_km: "80"
  local_hour_rate: "250"
  local_km_rate: "14"
  night_rate: "300"
  per_km_rate: "12"
  min_km_per_day: "250"
"#;
        let model: VehicleModel = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(model.id, "sedan");
        assert_eq!(model.rate_card.local_hour_rate, dec("250"));
        assert_eq!(model.rate_card.min_km_per_day, dec("250"));
    }

    #[test]
    fn test_missing_rate_fields_default_to_zero() {
        let yaml = r#"
id: bike
name: Bike
rate_card:
  per_km_rate: "5"
"#;
        let model: VehicleModel = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(model.rate_card.per_km_rate, dec("5"));
        assert_eq!(model.rate_card.night_rate, Decimal::ZERO);
        assert_eq!(model.rate_card.min_local_hour, Decimal::ZERO);
    }
}
