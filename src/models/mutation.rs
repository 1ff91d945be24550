//! Typed mutations on a booking's raw inputs.
//!
//! Every change a host makes to a booking goes through [`BookingMutation`].
//! Applying a mutation reports which [`InputField`]s actually changed value;
//! manual overrides whose triggering inputs are among them are dropped so
//! the next recompute can take the field over again.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Booking, BookingType, DerivedField, ExpenseLine, TaxLine};

/// A raw input of a booking that the recompute pipeline depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    /// Pickup or departure time.
    PickupAt,
    /// Return time.
    ReturnAt,
    /// Starting odometer reading.
    StartKm,
    /// Ending odometer reading.
    EndKm,
    /// Manually entered night count (local).
    Nights,
    /// The booking variant.
    BookingType,
    /// The selected vehicle model.
    VehicleModel,
    /// Snapshot: minimum hours.
    MinHours,
    /// Snapshot: minimum kilometres.
    MinKm,
    /// Snapshot: hourly rate.
    PerHourRate,
    /// Snapshot: per-kilometre rate.
    PerKmRate,
    /// Snapshot: night rate.
    NightRate,
    /// Snapshot: minimum kilometres per day.
    MinKmPerDay,
    /// The tax and charges collection.
    TaxLines,
    /// The expense collection.
    ExpenseLines,
}

/// A rate snapshot field that may be edited by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateField {
    /// Minimum hours.
    MinHours,
    /// Minimum kilometres.
    MinKm,
    /// Hourly rate.
    PerHourRate,
    /// Per-kilometre rate.
    PerKmRate,
    /// Night rate.
    NightRate,
    /// Minimum kilometres per day.
    MinKmPerDay,
}

impl RateField {
    /// The input field this rate corresponds to.
    pub fn input_field(self) -> InputField {
        match self {
            RateField::MinHours => InputField::MinHours,
            RateField::MinKm => InputField::MinKm,
            RateField::PerHourRate => InputField::PerHourRate,
            RateField::PerKmRate => InputField::PerKmRate,
            RateField::NightRate => InputField::NightRate,
            RateField::MinKmPerDay => InputField::MinKmPerDay,
        }
    }
}

/// A single change to a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BookingMutation {
    /// Sets or clears the pickup time.
    SetPickupAt {
        /// New value.
        value: Option<NaiveDateTime>,
    },
    /// Sets or clears the return time.
    SetReturnAt {
        /// New value.
        value: Option<NaiveDateTime>,
    },
    /// Sets or clears the starting odometer reading.
    SetStartKm {
        /// New value.
        value: Option<Decimal>,
    },
    /// Sets or clears the ending odometer reading.
    SetEndKm {
        /// New value.
        value: Option<Decimal>,
    },
    /// Sets or clears the manual night count.
    SetNights {
        /// New value.
        value: Option<u32>,
    },
    /// Switches the booking variant. Re-resolves the rate card.
    SetBookingType {
        /// New value.
        value: BookingType,
    },
    /// Selects a vehicle model. Re-resolves the rate card.
    SetVehicleModel {
        /// New value.
        value: Option<String>,
    },
    /// Edits a rate snapshot field by hand.
    SetRate {
        /// Which rate.
        field: RateField,
        /// New value.
        value: Decimal,
    },
    /// Replaces the tax line at `index`, or appends when `index` equals the
    /// collection length.
    UpsertTaxLine {
        /// Position in the ordered collection.
        index: usize,
        /// The line.
        line: TaxLine,
    },
    /// Removes the tax line at `index`.
    RemoveTaxLine {
        /// Position in the ordered collection.
        index: usize,
    },
    /// Replaces the expense line at `index`, or appends when `index` equals
    /// the collection length.
    UpsertExpenseLine {
        /// Position in the collection.
        index: usize,
        /// The line.
        line: ExpenseLine,
    },
    /// Removes the expense line at `index`.
    RemoveExpenseLine {
        /// Position in the collection.
        index: usize,
    },
    /// Pins a derived field to a manual value.
    OverrideDerived {
        /// Which derived field.
        field: DerivedField,
        /// The manual value.
        value: Decimal,
    },
    /// Drops a manual override so the field is computed again.
    ClearOverride {
        /// Which derived field.
        field: DerivedField,
    },
}

impl BookingMutation {
    /// Whether applying this mutation requires fetching the rate card again.
    pub fn requires_rate_resolution(&self) -> bool {
        matches!(
            self,
            BookingMutation::SetBookingType { .. } | BookingMutation::SetVehicleModel { .. }
        )
    }
}

impl DerivedField {
    /// Inputs whose change invalidates a manual override of this field.
    pub fn triggers(self) -> &'static [InputField] {
        use InputField::*;
        match self {
            DerivedField::BaseCharge => &[
                BookingType,
                VehicleModel,
                MinHours,
                PerHourRate,
                PerKmRate,
                MinKmPerDay,
                StartKm,
                EndKm,
                PickupAt,
                ReturnAt,
            ],
            DerivedField::ExtraHourCharge => &[
                BookingType,
                VehicleModel,
                MinHours,
                PerHourRate,
                PickupAt,
                ReturnAt,
            ],
            DerivedField::ExtraKmCharge => &[
                BookingType,
                VehicleModel,
                MinKm,
                PerKmRate,
                StartKm,
                EndKm,
            ],
            DerivedField::NightCharge => &[
                BookingType,
                VehicleModel,
                NightRate,
                Nights,
                PickupAt,
                ReturnAt,
            ],
            DerivedField::MinKmTotal => &[
                BookingType,
                VehicleModel,
                MinKmPerDay,
                PickupAt,
                ReturnAt,
            ],
        }
    }
}

fn set_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

fn upsert<T: PartialEq>(lines: &mut Vec<T>, index: usize, line: T) -> bool {
    match index.cmp(&lines.len()) {
        std::cmp::Ordering::Less => set_if_changed(&mut lines[index], line),
        std::cmp::Ordering::Equal => {
            lines.push(line);
            true
        }
        std::cmp::Ordering::Greater => false,
    }
}

fn remove<T>(lines: &mut Vec<T>, index: usize) -> bool {
    if index < lines.len() {
        lines.remove(index);
        true
    } else {
        false
    }
}

impl Booking {
    /// Applies a mutation and returns the input fields whose value changed.
    ///
    /// Setting a field to its current value changes nothing and keeps any
    /// manual overrides in place. Out-of-range line indices are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use fare_engine::models::{Booking, BookingMutation, BookingType, DerivedField, InputField};
    /// use rust_decimal::Decimal;
    ///
    /// let mut booking = Booking::new("BK-0001", BookingType::Local);
    /// booking.apply_mutation(BookingMutation::OverrideDerived {
    ///     field: DerivedField::NightCharge,
    ///     value: Decimal::new(500, 0),
    /// });
    ///
    /// // An unrelated input leaves the override alone.
    /// booking.apply_mutation(BookingMutation::SetStartKm { value: Some(Decimal::new(100, 0)) });
    /// assert!(booking.overrides.contains_key(&DerivedField::NightCharge));
    ///
    /// // A triggering input clears it.
    /// let changed = booking.apply_mutation(BookingMutation::SetNights { value: Some(2) });
    /// assert_eq!(changed, vec![InputField::Nights]);
    /// assert!(!booking.overrides.contains_key(&DerivedField::NightCharge));
    /// ```
    pub fn apply_mutation(&mut self, mutation: BookingMutation) -> Vec<InputField> {
        let changed = match mutation {
            BookingMutation::SetPickupAt { value } => {
                set_if_changed(&mut self.inputs.pickup_at, value).then_some(InputField::PickupAt)
            }
            BookingMutation::SetReturnAt { value } => {
                set_if_changed(&mut self.inputs.return_at, value).then_some(InputField::ReturnAt)
            }
            BookingMutation::SetStartKm { value } => {
                set_if_changed(&mut self.inputs.start_km, value).then_some(InputField::StartKm)
            }
            BookingMutation::SetEndKm { value } => {
                set_if_changed(&mut self.inputs.end_km, value).then_some(InputField::EndKm)
            }
            BookingMutation::SetNights { value } => {
                set_if_changed(&mut self.inputs.nights, value).then_some(InputField::Nights)
            }
            BookingMutation::SetBookingType { value } => {
                set_if_changed(&mut self.booking_type, value).then_some(InputField::BookingType)
            }
            BookingMutation::SetVehicleModel { value } => {
                set_if_changed(&mut self.vehicle_model, value).then_some(InputField::VehicleModel)
            }
            BookingMutation::SetRate { field, value } => {
                let slot = match field {
                    RateField::MinHours => &mut self.rates.min_hours,
                    RateField::MinKm => &mut self.rates.min_km,
                    RateField::PerHourRate => &mut self.rates.per_hour_rate,
                    RateField::PerKmRate => &mut self.rates.per_km_rate,
                    RateField::NightRate => &mut self.rates.night_rate,
                    RateField::MinKmPerDay => &mut self.rates.min_km_per_day,
                };
                set_if_changed(slot, value).then_some(field.input_field())
            }
            BookingMutation::UpsertTaxLine { index, line } => {
                upsert(&mut self.tax_lines, index, line).then_some(InputField::TaxLines)
            }
            BookingMutation::RemoveTaxLine { index } => {
                remove(&mut self.tax_lines, index).then_some(InputField::TaxLines)
            }
            BookingMutation::UpsertExpenseLine { index, line } => {
                upsert(&mut self.expense_lines, index, line).then_some(InputField::ExpenseLines)
            }
            BookingMutation::RemoveExpenseLine { index } => {
                remove(&mut self.expense_lines, index).then_some(InputField::ExpenseLines)
            }
            BookingMutation::OverrideDerived { field, value } => {
                self.overrides.insert(field, value);
                None
            }
            BookingMutation::ClearOverride { field } => {
                self.overrides.remove(&field);
                None
            }
        };

        let changed: Vec<InputField> = changed.into_iter().collect();
        self.clear_overrides_triggered_by(&changed);
        changed
    }

    /// Drops manual overrides invalidated by the given changed inputs.
    pub fn clear_overrides_triggered_by(&mut self, changed: &[InputField]) {
        if changed.is_empty() {
            return;
        }
        self.overrides
            .retain(|field, _| !field.triggers().iter().any(|t| changed.contains(t)));
    }
}
