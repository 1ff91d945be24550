//! The recompute engine.
//!
//! Drives the pure calculation pipeline against a [`RecordStore`]. Each
//! public operation is one cycle on one primary record: the cycle takes the
//! record's lock, reads what it needs, recomputes, and persists a single
//! change set. A second operation on the same record waits until the first
//! cycle, including its fetches and its persist, has finished.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::calculation::{
    apply_calculation, apply_invoice_totals, calculate_invoice_totals, driver_payment_from_booking,
    driver_payment_from_duty_slip, duty_slip_from_booking, fill_invoice_line, invoice_from_booking,
    merge_duty_slip, payment_amount_from_invoice, recompute_booking, refresh_payment,
    resolve_rates, settle_booking, settle_duty_slip,
};
use crate::config::SettlementConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Advisory, AdvisoryKind, Booking, BookingCalculation, BookingMutation, ChangeSet,
    ChildCollection, ChildRows, CustomerInvoice, CustomerPayment, DocType, DriverPayment,
    DutySlip, FieldChange, InputField, InvoiceLine, Record, RecordRef,
};

use super::RecordStore;

/// Engine behaviour switches.
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    /// Pass a booking's night charge on to the driver as an allowance.
    pub include_night_allowance: bool,
}

impl From<&SettlementConfig> for EngineSettings {
    fn from(config: &SettlementConfig) -> Self {
        Self {
            include_night_allowance: config.include_night_allowance,
        }
    }
}

/// The result of one cycle on a record.
#[derive(Debug, Clone)]
pub struct RecomputeOutcome {
    /// The record the cycle ran on.
    pub reference: RecordRef,
    /// The booking calculation, for booking cycles.
    pub calculation: Option<BookingCalculation>,
    /// The record as it stands after the cycle. `None` if it was not found.
    pub record: Option<Record>,
    /// Fields the cycle changed.
    pub changes: Vec<FieldChange>,
    /// Advisories raised during the cycle.
    pub advisories: Vec<Advisory>,
    /// Whether a change set was written.
    pub persisted: bool,
}

impl RecomputeOutcome {
    fn not_found(reference: RecordRef, mut advisories: Vec<Advisory>) -> Self {
        advisories.push(Advisory::new(
            AdvisoryKind::UnresolvedReference,
            "id",
            format!("{} not found; nothing written", reference),
        ));
        Self {
            reference,
            calculation: None,
            record: None,
            changes: Vec::new(),
            advisories,
            persisted: false,
        }
    }
}

/// The result of creating (or declining to create) a linked record.
#[derive(Debug, Clone)]
pub struct LinkOutcome {
    /// The record the link was made from.
    pub source: RecordRef,
    /// The linked record: newly created, or an existing one.
    pub linked: Option<RecordRef>,
    /// Whether `linked` was created by this call.
    pub created: bool,
    /// Advisories raised.
    pub advisories: Vec<Advisory>,
}

impl LinkOutcome {
    fn declined(source: RecordRef, advisory: Advisory) -> Self {
        Self {
            source,
            linked: None,
            created: false,
            advisories: vec![advisory],
        }
    }
}

/// Which invoice lines a cycle refills from their bookings.
#[derive(Debug, Clone, Copy)]
enum Refill {
    All,
    Line(usize),
    Nothing,
}

/// Serializes recompute cycles per record against a host store.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use fare_engine::host::{EngineSettings, MemoryStore, RecomputeEngine};
/// use fare_engine::models::{Booking, BookingMutation, BookingType, Record};
/// use rust_decimal::Decimal;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), fare_engine::error::EngineError> {
/// let store = Arc::new(MemoryStore::new());
/// store.insert(Record::Booking(Booking::new("BK-0001", BookingType::Local))).await;
///
/// let engine = RecomputeEngine::new(store, EngineSettings::default());
/// let outcome = engine
///     .apply(
///         "BK-0001",
///         vec![
///             BookingMutation::SetStartKm { value: Some(Decimal::new(100, 0)) },
///             BookingMutation::SetEndKm { value: Some(Decimal::new(180, 0)) },
///         ],
///     )
///     .await?;
///
/// assert!(outcome.persisted);
/// assert_eq!(outcome.calculation.unwrap().derived.total_km, Decimal::new(80, 0));
/// # Ok(())
/// # }
/// ```
pub struct RecomputeEngine<S: RecordStore> {
    store: Arc<S>,
    settings: EngineSettings,
    locks: Mutex<HashMap<RecordRef, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: RecordStore> RecomputeEngine<S> {
    /// Creates an engine over `store`.
    pub fn new(store: Arc<S>, settings: EngineSettings) -> Self {
        Self {
            store,
            settings,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn lock_for(&self, reference: &RecordRef) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(reference.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Applies one user action's mutations to a booking and recomputes it.
    ///
    /// Changing the booking type or vehicle model re-copies the rate card
    /// before recomputing. A booking that does not exist yields an outcome
    /// with an advisory and nothing written.
    pub async fn apply(
        &self,
        booking_id: &str,
        mutations: Vec<BookingMutation>,
    ) -> EngineResult<RecomputeOutcome> {
        let reference = RecordRef::booking(booking_id);
        let lock = self.lock_for(&reference);
        let _guard = lock.lock().await;
        debug!(record = %reference, mutations = mutations.len(), "Acquired record lock");

        self.run_booking_cycle(reference, mutations, false, Vec::new())
            .await
    }

    /// Recomputes a booking without changing any input.
    pub async fn recompute(&self, booking_id: &str) -> EngineResult<RecomputeOutcome> {
        self.apply(booking_id, Vec::new()).await
    }

    /// Copies the current rate card of the booking's vehicle model into its
    /// snapshot again, then recomputes.
    pub async fn refresh_rates(&self, booking_id: &str) -> EngineResult<RecomputeOutcome> {
        let reference = RecordRef::booking(booking_id);
        let lock = self.lock_for(&reference);
        let _guard = lock.lock().await;

        self.run_booking_cycle(reference, Vec::new(), true, Vec::new())
            .await
    }

    /// Merges the actuals of several duty slips into a booking, in the
    /// given order, as one cycle. Slips that cannot be found are skipped
    /// with an advisory.
    pub async fn merge_duty_slips(
        &self,
        booking_id: &str,
        duty_slip_ids: &[String],
    ) -> EngineResult<RecomputeOutcome> {
        let reference = RecordRef::booking(booking_id);
        let lock = self.lock_for(&reference);
        let _guard = lock.lock().await;

        let mut mutations = Vec::new();
        let mut advisories = Vec::new();
        for slip_id in duty_slip_ids {
            match self.fetch_duty_slip(slip_id).await? {
                Some(slip) => mutations.extend(merge_duty_slip(&slip)),
                None => {
                    warn!(booking = %booking_id, duty_slip = %slip_id, "Duty slip not found for merge");
                    advisories.push(Advisory::new(
                        AdvisoryKind::UnresolvedReference,
                        "duty_slip",
                        format!("Duty slip '{}' not found; skipped", slip_id),
                    ));
                }
            }
        }

        self.run_booking_cycle(reference, mutations, false, advisories)
            .await
    }

    async fn run_booking_cycle(
        &self,
        reference: RecordRef,
        mutations: Vec<BookingMutation>,
        force_rate_resolution: bool,
        mut advisories: Vec<Advisory>,
    ) -> EngineResult<RecomputeOutcome> {
        let start_time = Instant::now();

        let Some(original) = self.load_booking(&reference).await? else {
            warn!(record = %reference, "Booking not found; cycle skipped");
            return Ok(RecomputeOutcome::not_found(reference, advisories));
        };

        let mut booking = original.clone();
        let mut changed: Vec<InputField> = Vec::new();
        for mutation in mutations {
            changed.extend(booking.apply_mutation(mutation));
        }

        let rates_stale = changed
            .iter()
            .any(|f| matches!(f, InputField::BookingType | InputField::VehicleModel));

        let mut resolution_step = None;
        if force_rate_resolution || rates_stale {
            let card = match booking.vehicle_model.as_deref() {
                Some(model) => self.store.resolve_rate_card(model).await?,
                None => None,
            };
            let resolution = resolve_rates(
                booking.booking_type,
                booking.vehicle_model.as_deref(),
                card.as_ref(),
                &booking.rates,
                0,
            );
            advisories.extend(resolution.advisories);
            booking.rates = resolution.rates;
            resolution_step = Some(resolution.audit_step);

            // The booking may have gone away while the rate card was fetched.
            if !self.still_exists(&reference).await? {
                warn!(record = %reference, "Booking removed during rate fetch; cycle abandoned");
                return Ok(RecomputeOutcome::not_found(reference, advisories));
            }
        }

        let mut calculation = recompute_booking(&booking);
        apply_calculation(&mut booking, &calculation);
        advisories.extend(calculation.advisories().iter().cloned());
        if let Some(step) = resolution_step {
            calculation.audit_trace.steps.insert(0, step);
        }

        let (changes, persisted) = self
            .persist_diff(&Record::Booking(original), Record::Booking(booking.clone()))
            .await?;

        self.log_advisories(&reference, &advisories);
        info!(
            record = %reference,
            booking_type = %booking.booking_type,
            grand_total = %calculation.derived.grand_total,
            changes = changes.len(),
            persisted,
            duration_us = start_time.elapsed().as_micros() as u64,
            "Booking recompute completed"
        );

        Ok(RecomputeOutcome {
            reference,
            calculation: Some(calculation),
            record: Some(Record::Booking(booking)),
            changes,
            advisories,
            persisted,
        })
    }

    /// Copies the referenced booking's grand total into the invoice line at
    /// `index` and recomputes the invoice totals.
    pub async fn fill_invoice_line(&self, invoice_id: &str, index: usize) -> EngineResult<RecomputeOutcome> {
        self.invoice_cycle(invoice_id, |_| Vec::new(), Refill::Line(index)).await
    }

    /// Appends a line for a booking to an invoice and fills it.
    pub async fn add_invoice_line(&self, invoice_id: &str, line: InvoiceLine) -> EngineResult<RecomputeOutcome> {
        self.invoice_cycle(
            invoice_id,
            move |invoice| {
                invoice.lines.push(line);
                Vec::new()
            },
            Refill::All,
        )
        .await
    }

    /// Refills every line of an invoice and recomputes its totals.
    pub async fn refresh_invoice(&self, invoice_id: &str) -> EngineResult<RecomputeOutcome> {
        self.invoice_cycle(invoice_id, |_| Vec::new(), Refill::All).await
    }

    /// Sets an invoice's discount and/or paid amount and recomputes its
    /// totals. Lines are not refilled.
    pub async fn set_invoice_adjustments(
        &self,
        invoice_id: &str,
        discount: Option<Decimal>,
        paid_amount: Option<Decimal>,
    ) -> EngineResult<RecomputeOutcome> {
        self.invoice_cycle(
            invoice_id,
            move |invoice| {
                if let Some(discount) = discount {
                    invoice.discount = discount;
                }
                if let Some(paid_amount) = paid_amount {
                    invoice.paid_amount = paid_amount;
                }
                Vec::new()
            },
            Refill::Nothing,
        )
        .await
    }

    /// One invoice cycle: edit, refill lines, total, persist.
    async fn invoice_cycle<F>(
        &self,
        invoice_id: &str,
        edit: F,
        refill: Refill,
    ) -> EngineResult<RecomputeOutcome>
    where
        F: FnOnce(&mut CustomerInvoice) -> Vec<Advisory> + Send,
    {
        let reference = RecordRef::invoice(invoice_id);
        let lock = self.lock_for(&reference);
        let _guard = lock.lock().await;
        debug!(record = %reference, "Acquired record lock");

        let Some(original) = self.fetch_invoice(&reference).await? else {
            warn!(record = %reference, "Invoice not found; cycle skipped");
            return Ok(RecomputeOutcome::not_found(reference, Vec::new()));
        };

        let mut invoice = original.clone();
        let mut advisories = edit(&mut invoice);

        let indices: Vec<usize> = match refill {
            Refill::All => (0..invoice.lines.len()).collect(),
            Refill::Line(i) if i < invoice.lines.len() => vec![i],
            Refill::Line(i) => {
                advisories.push(Advisory::new(
                    AdvisoryKind::InvalidRange,
                    "lines",
                    format!("Invoice has no line {}", i),
                ));
                Vec::new()
            }
            Refill::Nothing => Vec::new(),
        };

        let fetched_lines = !indices.is_empty();
        for i in indices {
            let line = &invoice.lines[i];
            let booking = self
                .fetch_booking(&RecordRef::booking(line.booking_id.clone()))
                .await?;
            let fill = fill_invoice_line(line, booking.as_ref());
            if let Some(advisory) = fill.advisory {
                advisories.push(advisory);
            }
            invoice.lines[i] = fill.line;
        }

        if fetched_lines && !self.still_exists(&reference).await? {
            warn!(record = %reference, "Invoice removed while its bookings were fetched; cycle abandoned");
            return Ok(RecomputeOutcome::not_found(reference, advisories));
        }

        let totals = calculate_invoice_totals(&invoice.lines, invoice.discount, invoice.paid_amount, 1);
        apply_invoice_totals(&mut invoice, &totals.totals);

        let (changes, persisted) = self
            .persist_diff(
                &Record::CustomerInvoice(original),
                Record::CustomerInvoice(invoice.clone()),
            )
            .await?;

        self.log_advisories(&reference, &advisories);
        info!(
            record = %reference,
            lines = invoice.lines.len(),
            grand_total = %invoice.grand_total,
            payable_amount = %invoice.payable_amount,
            persisted,
            "Invoice totals recomputed"
        );

        Ok(RecomputeOutcome {
            reference,
            calculation: None,
            record: Some(Record::CustomerInvoice(invoice)),
            changes,
            advisories,
            persisted,
        })
    }

    /// Creates a customer invoice for a booking and links it back.
    ///
    /// A booking already linked to an invoice is not invoiced again; the
    /// existing link is returned instead.
    pub async fn make_invoice(&self, booking_id: &str) -> EngineResult<LinkOutcome> {
        let reference = RecordRef::booking(booking_id);
        let lock = self.lock_for(&reference);
        let _guard = lock.lock().await;

        let Some(original) = self.load_booking(&reference).await? else {
            return Ok(LinkOutcome::declined(reference.clone(), not_found_advisory(&reference)));
        };

        if let Some(existing) = &original.invoice_id {
            info!(booking = %booking_id, invoice = %existing, "Booking already invoiced");
            return Ok(LinkOutcome {
                source: reference,
                linked: Some(RecordRef::invoice(existing.clone())),
                created: false,
                advisories: Vec::new(),
            });
        }

        let mut booking = original.clone();
        let calculation = recompute_booking(&booking);
        apply_calculation(&mut booking, &calculation);

        let prefill = invoice_from_booking(&booking, String::new());
        let linked = self
            .store
            .create_linked_record(DocType::CustomerInvoice, Record::CustomerInvoice(prefill))
            .await?;

        booking.invoice_id = Some(linked.id.clone());
        let mut advisories = calculation.advisories().to_vec();
        advisories.extend(self.persist_link(&reference, original, booking).await?);

        info!(booking = %booking_id, invoice = %linked, "Invoice created from booking");
        Ok(LinkOutcome {
            source: reference,
            linked: Some(linked),
            created: true,
            advisories,
        })
    }

    /// Creates a duty slip prefilled from a booking.
    pub async fn make_duty_slip(&self, booking_id: &str) -> EngineResult<LinkOutcome> {
        let reference = RecordRef::booking(booking_id);
        let Some(booking) = self.load_booking(&reference).await? else {
            return Ok(LinkOutcome::declined(reference.clone(), not_found_advisory(&reference)));
        };

        let linked = self
            .store
            .create_linked_record(DocType::DutySlip, Record::DutySlip(duty_slip_from_booking(&booking)))
            .await?;

        info!(booking = %booking_id, duty_slip = %linked, "Duty slip created from booking");
        Ok(LinkOutcome {
            source: reference,
            linked: Some(linked),
            created: true,
            advisories: Vec::new(),
        })
    }

    /// Creates a driver payment settling a booking and links it back.
    ///
    /// Nothing is created when the settlement is not positive. A booking
    /// already settled by a payment is not settled again; the existing link
    /// is returned instead.
    pub async fn make_driver_payment_for_booking(
        &self,
        booking_id: &str,
        payment_date: NaiveDate,
    ) -> EngineResult<LinkOutcome> {
        let reference = RecordRef::booking(booking_id);
        let lock = self.lock_for(&reference);
        let _guard = lock.lock().await;

        let Some(original) = self.load_booking(&reference).await? else {
            return Ok(LinkOutcome::declined(reference.clone(), not_found_advisory(&reference)));
        };

        if let Some(existing) = &original.driver_payment_id {
            info!(booking = %booking_id, payment = %existing, "Booking already has a driver payment");
            return Ok(LinkOutcome {
                source: reference,
                linked: Some(RecordRef::driver_payment(existing.clone())),
                created: false,
                advisories: Vec::new(),
            });
        }

        let mut booking = original.clone();
        let calculation = recompute_booking(&booking);
        apply_calculation(&mut booking, &calculation);

        match driver_payment_from_booking(&booking, self.settings.include_night_allowance, payment_date) {
            Ok(payment) => {
                let mut outcome = self.create_payment(reference.clone(), payment).await?;
                if let Some(linked) = &outcome.linked {
                    booking.driver_payment_id = Some(linked.id.clone());
                    outcome
                        .advisories
                        .extend(self.persist_link(&reference, original, booking).await?);
                }
                Ok(outcome)
            }
            Err(advisory) => {
                warn!(booking = %booking_id, reason = %advisory.message, "Driver payment not created");
                Ok(LinkOutcome::declined(reference, advisory))
            }
        }
    }

    /// Creates a driver payment settling a duty slip's expenses.
    ///
    /// Nothing is created when the slip has no positive expense total.
    pub async fn make_driver_payment_for_duty_slip(
        &self,
        duty_slip_id: &str,
        payment_date: NaiveDate,
    ) -> EngineResult<LinkOutcome> {
        let reference = RecordRef::duty_slip(duty_slip_id);
        let lock = self.lock_for(&reference);
        let _guard = lock.lock().await;

        let Some(slip) = self.load_duty_slip(duty_slip_id).await? else {
            return Ok(LinkOutcome::declined(reference.clone(), not_found_advisory(&reference)));
        };

        match driver_payment_from_duty_slip(&slip, payment_date) {
            Ok(payment) => self.create_payment(reference, payment).await,
            Err(advisory) => {
                warn!(duty_slip = %duty_slip_id, reason = %advisory.message, "Driver payment not created");
                Ok(LinkOutcome::declined(reference, advisory))
            }
        }
    }

    async fn create_payment(&self, source: RecordRef, payment: DriverPayment) -> EngineResult<LinkOutcome> {
        let amount = payment.amount;
        let linked = self
            .store
            .create_linked_record(DocType::DriverPayment, Record::DriverPayment(payment))
            .await?;

        info!(source = %source, payment = %linked, amount = %amount, "Driver payment created");
        Ok(LinkOutcome {
            source,
            linked: Some(linked),
            created: true,
            advisories: Vec::new(),
        })
    }

    /// Recomputes a driver payment's amount from its booking or duty slip.
    ///
    /// An amount that was entered by hand is kept. If the source record
    /// cannot be found the payment is left unchanged.
    pub async fn refresh_driver_payment(&self, payment_id: &str) -> EngineResult<RecomputeOutcome> {
        let reference = RecordRef::driver_payment(payment_id);
        let lock = self.lock_for(&reference);
        let _guard = lock.lock().await;

        let Some(original) = self.fetch_driver_payment(&reference).await? else {
            return Ok(RecomputeOutcome::not_found(reference, Vec::new()));
        };

        let payment = original.clone();
        self.settle_driver_payment(reference, original, payment).await
    }

    /// Enters a driver payment amount by hand, or with `None` hands the
    /// amount back to the settlement calculation.
    pub async fn set_driver_payment_amount(
        &self,
        payment_id: &str,
        amount: Option<Decimal>,
    ) -> EngineResult<RecomputeOutcome> {
        let reference = RecordRef::driver_payment(payment_id);
        let lock = self.lock_for(&reference);
        let _guard = lock.lock().await;

        let Some(original) = self.fetch_driver_payment(&reference).await? else {
            return Ok(RecomputeOutcome::not_found(reference, Vec::new()));
        };

        let mut payment = original.clone();
        match amount {
            Some(amount) => {
                payment.amount = amount;
                payment.amount_overridden = true;
            }
            None => {
                payment.amount_overridden = false;
                return self.settle_driver_payment(reference, original, payment).await;
            }
        }

        let (changes, persisted) = self
            .persist_diff(
                &Record::DriverPayment(original),
                Record::DriverPayment(payment.clone()),
            )
            .await?;

        info!(record = %reference, amount = %payment.amount, persisted, "Driver payment amount entered");
        Ok(RecomputeOutcome {
            reference,
            calculation: None,
            record: Some(Record::DriverPayment(payment)),
            changes,
            advisories: Vec::new(),
            persisted,
        })
    }

    /// Settles `payment` (an edited copy of `original`) against its source
    /// record and persists the difference. Callers hold the payment's lock.
    async fn settle_driver_payment(
        &self,
        reference: RecordRef,
        original: DriverPayment,
        payment: DriverPayment,
    ) -> EngineResult<RecomputeOutcome> {
        let settlement = if let Some(slip_id) = &payment.duty_slip_id {
            self.load_duty_slip(slip_id)
                .await?
                .map(|slip| settle_duty_slip(&slip, 1))
        } else if let Some(booking_ref) = &payment.booking {
            self.load_booking(&RecordRef::booking(booking_ref.booking_id.clone()))
                .await?
                .map(|mut booking| {
                    let calculation = recompute_booking(&booking);
                    apply_calculation(&mut booking, &calculation);
                    settle_booking(&booking, self.settings.include_night_allowance, 1)
                })
        } else {
            None
        };

        let mut advisories = Vec::new();
        let refreshed = match settlement {
            Some(settlement) => refresh_payment(&payment, &settlement),
            None => {
                warn!(record = %reference, "Driver payment source not found");
                advisories.push(Advisory::new(
                    AdvisoryKind::UnresolvedReference,
                    "booking",
                    format!("Source of payment '{}' not found; amount left unchanged", reference.id),
                ));
                payment
            }
        };

        if !self.still_exists(&reference).await? {
            warn!(record = %reference, "Driver payment removed during source fetch; cycle abandoned");
            return Ok(RecomputeOutcome::not_found(reference, advisories));
        }

        let (changes, persisted) = self
            .persist_diff(
                &Record::DriverPayment(original),
                Record::DriverPayment(refreshed.clone()),
            )
            .await?;

        info!(record = %reference, amount = %refreshed.amount, persisted, "Driver payment refreshed");
        Ok(RecomputeOutcome {
            reference,
            calculation: None,
            record: Some(Record::DriverPayment(refreshed)),
            changes,
            advisories,
            persisted,
        })
    }

    /// Points a customer payment at an invoice (or at none) and fetches
    /// its amount.
    pub async fn set_payment_invoice(
        &self,
        payment_id: &str,
        invoice_id: Option<String>,
    ) -> EngineResult<RecomputeOutcome> {
        self.customer_payment_cycle(payment_id, move |payment| payment.invoice_id = invoice_id)
            .await
    }

    /// Fetches a customer payment's amount from its invoice again.
    pub async fn refresh_payment_amount(&self, payment_id: &str) -> EngineResult<RecomputeOutcome> {
        self.customer_payment_cycle(payment_id, |_| {}).await
    }

    /// One customer payment cycle: edit, fetch the invoice, fill, persist.
    async fn customer_payment_cycle<F>(&self, payment_id: &str, edit: F) -> EngineResult<RecomputeOutcome>
    where
        F: FnOnce(&mut CustomerPayment) + Send,
    {
        let reference = RecordRef::customer_payment(payment_id);
        let lock = self.lock_for(&reference);
        let _guard = lock.lock().await;

        let Some(original) = self.fetch_customer_payment(&reference).await? else {
            warn!(record = %reference, "Customer payment not found; cycle skipped");
            return Ok(RecomputeOutcome::not_found(reference, Vec::new()));
        };

        let mut payment = original.clone();
        edit(&mut payment);

        let invoice = match &payment.invoice_id {
            Some(invoice_id) => {
                let invoice = self.fetch_invoice(&RecordRef::invoice(invoice_id.clone())).await?;
                if !self.still_exists(&reference).await? {
                    warn!(record = %reference, "Customer payment removed during invoice fetch; cycle abandoned");
                    return Ok(RecomputeOutcome::not_found(reference, Vec::new()));
                }
                invoice
            }
            None => None,
        };

        let fill = payment_amount_from_invoice(&payment, invoice.as_ref(), 1);
        payment.amount = fill.amount;
        let advisories: Vec<Advisory> = fill.advisory.into_iter().collect();

        let (changes, persisted) = self
            .persist_diff(
                &Record::CustomerPayment(original),
                Record::CustomerPayment(payment.clone()),
            )
            .await?;

        self.log_advisories(&reference, &advisories);
        info!(record = %reference, amount = %payment.amount, persisted, "Customer payment amount fetched");
        Ok(RecomputeOutcome {
            reference,
            calculation: None,
            record: Some(Record::CustomerPayment(payment)),
            changes,
            advisories,
            persisted,
        })
    }

    /// Persists a booking that gained a link to a newly created record,
    /// unless the booking disappeared while that record was created.
    async fn persist_link(
        &self,
        reference: &RecordRef,
        original: Booking,
        booking: Booking,
    ) -> EngineResult<Option<Advisory>> {
        if !self.still_exists(reference).await? {
            warn!(record = %reference, "Booking removed while creating a linked record; link not written");
            return Ok(Some(Advisory::new(
                AdvisoryKind::UnresolvedReference,
                "id",
                format!("{} removed before the link could be written", reference),
            )));
        }
        self.persist_diff(&Record::Booking(original), Record::Booking(booking))
            .await?;
        Ok(None)
    }

    async fn persist_diff(&self, before: &Record, after: Record) -> EngineResult<(Vec<FieldChange>, bool)> {
        match ChangeSet::diff(before, after) {
            Some(change_set) => {
                let changes = change_set.changes.clone();
                self.store.persist(change_set).await?;
                Ok((changes, true))
            }
            None => {
                debug!(record = %before.reference(), "No changes; persist skipped");
                Ok((Vec::new(), false))
            }
        }
    }

    fn log_advisories(&self, reference: &RecordRef, advisories: &[Advisory]) {
        for advisory in advisories {
            warn!(
                record = %reference,
                kind = %advisory.kind,
                field = %advisory.field,
                "{}",
                advisory.message
            );
        }
    }

    async fn still_exists(&self, reference: &RecordRef) -> EngineResult<bool> {
        Ok(self.store.get_record(reference).await?.is_some())
    }

    /// Fetches a booking with its tax and expense rows read through the
    /// store's child-row lookup.
    async fn load_booking(&self, reference: &RecordRef) -> EngineResult<Option<Booking>> {
        let Some(mut booking) = self.fetch_booking(reference).await? else {
            return Ok(None);
        };
        if let Some(ChildRows::Tax(rows)) = self
            .store
            .list_child_rows(reference, ChildCollection::TaxAndCharges)
            .await?
        {
            booking.tax_lines = rows;
        }
        if let Some(ChildRows::Expenses(rows)) = self
            .store
            .list_child_rows(reference, ChildCollection::Expenses)
            .await?
        {
            booking.expense_lines = rows;
        }
        Ok(Some(booking))
    }

    /// Fetches a duty slip with its expense rows.
    async fn load_duty_slip(&self, id: &str) -> EngineResult<Option<DutySlip>> {
        let Some(mut slip) = self.fetch_duty_slip(id).await? else {
            return Ok(None);
        };
        if let Some(ChildRows::Expenses(rows)) = self
            .store
            .list_child_rows(&RecordRef::duty_slip(id), ChildCollection::Expenses)
            .await?
        {
            slip.expenses = rows;
        }
        Ok(Some(slip))
    }

    async fn fetch_booking(&self, reference: &RecordRef) -> EngineResult<Option<Booking>> {
        match self.store.get_record(reference).await? {
            Some(Record::Booking(booking)) => Ok(Some(booking)),
            Some(_) => Err(mismatch(reference, DocType::Booking)),
            None => Ok(None),
        }
    }

    async fn fetch_duty_slip(&self, id: &str) -> EngineResult<Option<DutySlip>> {
        let reference = RecordRef::duty_slip(id);
        match self.store.get_record(&reference).await? {
            Some(Record::DutySlip(slip)) => Ok(Some(slip)),
            Some(_) => Err(mismatch(&reference, DocType::DutySlip)),
            None => Ok(None),
        }
    }

    async fn fetch_invoice(&self, reference: &RecordRef) -> EngineResult<Option<CustomerInvoice>> {
        match self.store.get_record(reference).await? {
            Some(Record::CustomerInvoice(invoice)) => Ok(Some(invoice)),
            Some(_) => Err(mismatch(reference, DocType::CustomerInvoice)),
            None => Ok(None),
        }
    }

    async fn fetch_driver_payment(&self, reference: &RecordRef) -> EngineResult<Option<DriverPayment>> {
        match self.store.get_record(reference).await? {
            Some(Record::DriverPayment(payment)) => Ok(Some(payment)),
            Some(_) => Err(mismatch(reference, DocType::DriverPayment)),
            None => Ok(None),
        }
    }

    async fn fetch_customer_payment(&self, reference: &RecordRef) -> EngineResult<Option<CustomerPayment>> {
        match self.store.get_record(reference).await? {
            Some(Record::CustomerPayment(payment)) => Ok(Some(payment)),
            Some(_) => Err(mismatch(reference, DocType::CustomerPayment)),
            None => Ok(None),
        }
    }
}

fn mismatch(reference: &RecordRef, expected: DocType) -> EngineError {
    EngineError::RecordTypeMismatch {
        reference: reference.to_string(),
        expected: expected.to_string(),
    }
}

fn not_found_advisory(reference: &RecordRef) -> Advisory {
    Advisory::new(
        AdvisoryKind::UnresolvedReference,
        "id",
        format!("{} not found", reference),
    )
}
