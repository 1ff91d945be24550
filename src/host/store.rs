//! The host boundary.

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::models::{ChangeSet, ChildCollection, ChildRows, DocType, RateCard, Record, RecordRef};

/// Storage the engine reads from and writes back to.
///
/// The engine owns no records. Everything it knows about bookings, slips,
/// invoices and payments comes through this trait, and every recompute
/// cycle ends in at most one [`persist`](RecordStore::persist) call.
///
/// Lookups return `Ok(None)` for records that do not exist; `Err` is
/// reserved for the store itself failing.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetches the rate card of a vehicle model.
    async fn resolve_rate_card(&self, vehicle_model: &str) -> EngineResult<Option<RateCard>>;

    /// Fetches a record.
    async fn get_record(&self, reference: &RecordRef) -> EngineResult<Option<Record>>;

    /// Fetches the rows of one of a record's child collections.
    ///
    /// Cycles take tax and expense rows from here rather than from the
    /// record body. `Ok(None)` leaves the rows embedded in the record as
    /// they are.
    async fn list_child_rows(
        &self,
        reference: &RecordRef,
        collection: ChildCollection,
    ) -> EngineResult<Option<ChildRows>>;

    /// Writes back one cycle's changes atomically.
    async fn persist(&self, change_set: ChangeSet) -> EngineResult<()>;

    /// Creates a record from a prefill and returns its reference. The
    /// store assigns the id; any id on the prefill is ignored.
    async fn create_linked_record(&self, doctype: DocType, prefill: Record) -> EngineResult<RecordRef>;
}
