//! Moving actuals between duty slips and bookings.

use crate::models::{Booking, BookingMutation, DutySlip};

/// Turns a duty slip's actuals into booking mutations.
///
/// Only readings present on the slip are carried; a slip without an end
/// odometer leaves the booking's estimate alone. Applying the mutations of
/// several slips in order lets later slips overwrite earlier ones.
///
/// # Examples
///
/// ```
/// use fare_engine::calculation::merge_duty_slip;
/// use fare_engine::models::{BookingMutation, DutySlip};
/// use rust_decimal::Decimal;
///
/// let mut slip = DutySlip::new("DS-0001");
/// slip.end_km = Some(Decimal::new(1420, 0));
///
/// assert_eq!(
///     merge_duty_slip(&slip),
///     vec![BookingMutation::SetEndKm { value: Some(Decimal::new(1420, 0)) }]
/// );
/// ```
pub fn merge_duty_slip(slip: &DutySlip) -> Vec<BookingMutation> {
    let mut mutations = Vec::new();

    if let Some(start_km) = slip.start_km {
        mutations.push(BookingMutation::SetStartKm {
            value: Some(start_km),
        });
    }
    if let Some(end_km) = slip.end_km {
        mutations.push(BookingMutation::SetEndKm {
            value: Some(end_km),
        });
    }
    if let Some(departure) = slip.departure_at {
        mutations.push(BookingMutation::SetPickupAt {
            value: Some(departure),
        });
    }
    if let Some(return_at) = slip.return_at {
        mutations.push(BookingMutation::SetReturnAt {
            value: Some(return_at),
        });
    }

    mutations
}

/// Prefills a duty slip for a booking.
pub fn duty_slip_from_booking(booking: &Booking) -> DutySlip {
    let mut slip = DutySlip::new(String::new());
    slip.booking = Some(booking.reference());
    slip.from_location = booking.from_location.clone();
    slip.to_location = booking.to_location.clone();
    slip.departure_at = booking.inputs.pickup_at;
    slip.return_at = booking.inputs.return_at;
    slip.start_km = booking.inputs.start_km;
    slip.driver = booking.driver.clone();
    slip.vehicle = booking.vehicle.clone();
    slip
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingType;
    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_full_slip_yields_four_mutations() {
        let mut slip = DutySlip::new("DS-0001");
        slip.start_km = Some(Decimal::new(1000, 0));
        slip.end_km = Some(Decimal::new(1420, 0));
        slip.departure_at = Some(make_datetime("2026-03-02 06:30:00"));
        slip.return_at = Some(make_datetime("2026-03-04 05:00:00"));

        assert_eq!(merge_duty_slip(&slip).len(), 4);
    }

    #[test]
    fn test_empty_slip_yields_nothing() {
        assert!(merge_duty_slip(&DutySlip::new("DS-0002")).is_empty());
    }

    #[test]
    fn test_merged_slips_apply_in_order() {
        let mut booking = Booking::new("BK-0001", BookingType::Outstation);
        let mut first = DutySlip::new("DS-0001");
        first.start_km = Some(Decimal::new(1000, 0));
        first.end_km = Some(Decimal::new(1200, 0));
        let mut second = DutySlip::new("DS-0002");
        second.end_km = Some(Decimal::new(1450, 0));

        for mutation in merge_duty_slip(&first).into_iter().chain(merge_duty_slip(&second)) {
            booking.apply_mutation(mutation);
        }

        assert_eq!(booking.inputs.start_km, Some(Decimal::new(1000, 0)));
        assert_eq!(booking.inputs.end_km, Some(Decimal::new(1450, 0)));
    }

    #[test]
    fn test_slip_from_booking_copies_assignment() {
        let mut booking = Booking::new("BK-0001", BookingType::Outstation);
        booking.driver = Some("Ravi".to_string());
        booking.vehicle = Some("MH12AB1234".to_string());
        booking.from_location = Some("Pune".to_string());
        booking.inputs.start_km = Some(Decimal::new(1000, 0));
        booking.inputs.end_km = Some(Decimal::new(1400, 0));

        let slip = duty_slip_from_booking(&booking);

        assert_eq!(slip.booking, Some(booking.reference()));
        assert_eq!(slip.driver.as_deref(), Some("Ravi"));
        assert_eq!(slip.vehicle.as_deref(), Some("MH12AB1234"));
        assert_eq!(slip.from_location.as_deref(), Some("Pune"));
        assert_eq!(slip.start_km, Some(Decimal::new(1000, 0)));
        assert_eq!(slip.end_km, None);
    }
}
