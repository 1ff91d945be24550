//! Rate card resolution.
//!
//! Copies the part of a vehicle model's rate card that applies to the
//! booking's variant into the booking's rate snapshot.

use rust_decimal::Decimal;

use crate::models::{Advisory, AdvisoryKind, AuditStep, BookingType, RateCard, RateSnapshot};

/// The result of resolving a rate card into a snapshot.
#[derive(Debug, Clone)]
pub struct RateResolution {
    /// The snapshot to store on the booking.
    pub rates: RateSnapshot,
    /// Whether the snapshot was taken from a rate card.
    pub resolved: bool,
    /// Advisories raised while resolving.
    pub advisories: Vec<Advisory>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Builds the snapshot a booking of `booking_type` takes from `card`.
///
/// Fields the variant does not use are zeroed so that switching variants
/// and back yields the same snapshot as a fresh selection.
///
/// # Examples
///
/// ```
/// use fare_engine::calculation::snapshot_from_card;
/// use fare_engine::models::{BookingType, RateCard};
/// use rust_decimal::Decimal;
///
/// let card = RateCard {
///     local_km_rate: Decimal::new(14, 0),
///     per_km_rate: Decimal::new(12, 0),
///     ..Default::default()
/// };
///
/// assert_eq!(snapshot_from_card(BookingType::Local, &card).per_km_rate, Decimal::new(14, 0));
/// assert_eq!(snapshot_from_card(BookingType::Outstation, &card).per_km_rate, Decimal::new(12, 0));
/// ```
pub fn snapshot_from_card(booking_type: BookingType, card: &RateCard) -> RateSnapshot {
    match booking_type {
        BookingType::Local => RateSnapshot {
            min_hours: card.min_local_hour,
            min_km: card.min_local_km,
            per_hour_rate: card.local_hour_rate,
            per_km_rate: card.local_km_rate,
            night_rate: card.night_rate,
            min_km_per_day: Decimal::ZERO,
        },
        BookingType::Outstation => RateSnapshot {
            min_hours: Decimal::ZERO,
            min_km: Decimal::ZERO,
            per_hour_rate: Decimal::ZERO,
            per_km_rate: card.per_km_rate,
            night_rate: card.night_rate,
            min_km_per_day: card.min_km_per_day,
        },
    }
}

/// Resolves the rate snapshot for a booking.
///
/// When no vehicle model is selected, or the selected model has no rate
/// card, `current` is returned unchanged with an advisory.
///
/// # Arguments
///
/// * `booking_type` - The variant the snapshot is for
/// * `vehicle_model` - The selected vehicle model, if any
/// * `card` - The model's rate card as fetched from the host, if found
/// * `current` - The booking's existing snapshot
/// * `step_number` - The step number for audit trail sequencing
pub fn resolve_rates(
    booking_type: BookingType,
    vehicle_model: Option<&str>,
    card: Option<&RateCard>,
    current: &RateSnapshot,
    step_number: u32,
) -> RateResolution {
    let (rates, resolved, advisories, reasoning) = match (vehicle_model, card) {
        (None, _) => (
            current.clone(),
            false,
            vec![Advisory::new(
                AdvisoryKind::MissingInput,
                "vehicle_model",
                "No vehicle model selected; rates left unchanged",
            )],
            "No vehicle model selected, keeping existing rates".to_string(),
        ),
        (Some(model), None) => (
            current.clone(),
            false,
            vec![Advisory::new(
                AdvisoryKind::UnresolvedReference,
                "vehicle_model",
                format!("Rate card for vehicle model '{}' not found; rates left unchanged", model),
            )],
            format!("Vehicle model '{}' unresolved, keeping existing rates", model),
        ),
        (Some(model), Some(card)) => (
            snapshot_from_card(booking_type, card),
            true,
            vec![],
            format!("Copied {} rates from vehicle model '{}'", booking_type, model),
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "rate_resolution".to_string(),
        rule_name: "Rate Card Resolution".to_string(),
        input: serde_json::json!({
            "booking_type": booking_type.to_string(),
            "vehicle_model": vehicle_model,
            "rate_card_found": card.is_some()
        }),
        output: serde_json::json!({
            "min_hours": rates.min_hours.normalize().to_string(),
            "min_km": rates.min_km.normalize().to_string(),
            "per_hour_rate": rates.per_hour_rate.normalize().to_string(),
            "per_km_rate": rates.per_km_rate.normalize().to_string(),
            "night_rate": rates.night_rate.normalize().to_string(),
            "min_km_per_day": rates.min_km_per_day.normalize().to_string()
        }),
        reasoning,
    };

    RateResolution {
        rates,
        resolved,
        advisories,
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

    fn sedan_card() -> RateCard {
        RateCard {
            min_local_hour: dec("8"),
            min_local_km: dec("80"),
            local_hour_rate: dec("250"),
            local_km_rate: dec("14"),
            night_rate: dec("300"),
            per_km_rate: dec("12"),
            min_km_per_day: dec("250"),
        }
    }

    #[test]
    fn test_local_copies_local_subset() {
        let card = sedan_card();
        let result = resolve_rates(
            BookingType::Local,
            Some("sedan"),
            Some(&card),
            &RateSnapshot::default(),
            1,
        );

        assert!(result.resolved);
        assert_eq!(result.rates.min_hours, dec("8"));
        assert_eq!(result.rates.min_km, dec("80"));
        assert_eq!(result.rates.per_hour_rate, dec("250"));
        assert_eq!(result.rates.per_km_rate, dec("14"));
        assert_eq!(result.rates.night_rate, dec("300"));
        assert_eq!(result.rates.min_km_per_day, Decimal::ZERO);
        assert!(result.advisories.is_empty());
    }

    #[test]
    fn test_outstation_keeps_per_day_minimum_unscaled() {
        let card = sedan_card();
        let result = resolve_rates(
            BookingType::Outstation,
            Some("sedan"),
            Some(&card),
            &RateSnapshot::default(),
            1,
        );

        assert_eq!(result.rates.per_km_rate, dec("12"));
        assert_eq!(result.rates.min_km_per_day, dec("250"));
        assert_eq!(result.rates.night_rate, dec("300"));
        assert_eq!(result.rates.min_hours, Decimal::ZERO);
    }

    #[test]
    fn test_unresolved_model_leaves_rates_untouched() {
        let current = RateSnapshot {
            per_km_rate: dec("11"),
            ..Default::default()
        };
        let result = resolve_rates(BookingType::Outstation, Some("limo"), None, &current, 1);

        assert!(!result.resolved);
        assert_eq!(result.rates, current);
        assert_eq!(result.advisories[0].kind, AdvisoryKind::UnresolvedReference);
    }

    #[test]
    fn test_absent_model_is_missing_input() {
        let result = resolve_rates(
            BookingType::Local,
            None,
            None,
            &RateSnapshot::default(),
            1,
        );
        assert_eq!(result.advisories[0].kind, AdvisoryKind::MissingInput);
        assert_eq!(result.audit_step.rule_id, "rate_resolution");
    }
}
