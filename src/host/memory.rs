//! In-memory record store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    ChangeSet, ChildCollection, ChildRows, DocType, RateCard, Record, RecordRef,
};

use super::RecordStore;

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<RecordRef, Record>,
    counters: HashMap<DocType, u32>,
    persist_count: usize,
}

/// A [`RecordStore`] holding everything in memory.
///
/// Rate cards come from a fleet configuration or are inserted directly.
/// Ids for created records follow a per-doctype series (`BK-00001`,
/// `DS-00001`, `INV-00001`, `DP-00001`, `PAY-00001`).
///
/// # Example
///
/// ```
/// use fare_engine::host::MemoryStore;
/// use fare_engine::models::{Booking, BookingType, Record, RecordRef};
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new();
/// store.insert(Record::Booking(Booking::new("BK-0001", BookingType::Local))).await;
/// assert!(store.get(&RecordRef::booking("BK-0001")).await.is_some());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    rate_cards: RwLock<HashMap<String, RateCard>>,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store serving the rate cards of a fleet configuration.
    pub fn with_config(config: &ConfigLoader) -> Self {
        let rate_cards = config
            .config()
            .vehicle_models()
            .values()
            .map(|model| (model.id.clone(), model.rate_card.clone()))
            .collect();
        Self {
            rate_cards: RwLock::new(rate_cards),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Adds or replaces a vehicle model's rate card.
    pub async fn insert_rate_card(&self, vehicle_model: impl Into<String>, card: RateCard) {
        self.rate_cards.write().await.insert(vehicle_model.into(), card);
    }

    /// Adds or replaces a record under its own id.
    pub async fn insert(&self, record: Record) {
        self.inner
            .write()
            .await
            .records
            .insert(record.reference(), record);
    }

    /// Removes a record, returning it if it existed.
    pub async fn remove(&self, reference: &RecordRef) -> Option<Record> {
        self.inner.write().await.records.remove(reference)
    }

    /// Returns a copy of a record.
    pub async fn get(&self, reference: &RecordRef) -> Option<Record> {
        self.inner.read().await.records.get(reference).cloned()
    }

    /// Number of change sets persisted so far.
    pub async fn persist_count(&self) -> usize {
        self.inner.read().await.persist_count
    }

    fn prefix(doctype: DocType) -> &'static str {
        match doctype {
            DocType::Booking => "BK",
            DocType::DutySlip => "DS",
            DocType::CustomerInvoice => "INV",
            DocType::DriverPayment => "DP",
            DocType::CustomerPayment => "PAY",
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn resolve_rate_card(&self, vehicle_model: &str) -> EngineResult<Option<RateCard>> {
        Ok(self.rate_cards.read().await.get(vehicle_model).cloned())
    }

    async fn get_record(&self, reference: &RecordRef) -> EngineResult<Option<Record>> {
        Ok(self.get(reference).await)
    }

    async fn list_child_rows(
        &self,
        reference: &RecordRef,
        collection: ChildCollection,
    ) -> EngineResult<Option<ChildRows>> {
        let inner = self.inner.read().await;
        let rows = match (inner.records.get(reference), collection) {
            (Some(Record::Booking(b)), ChildCollection::TaxAndCharges) => {
                Some(ChildRows::Tax(b.tax_lines.clone()))
            }
            (Some(Record::Booking(b)), ChildCollection::Expenses) => {
                Some(ChildRows::Expenses(b.expense_lines.clone()))
            }
            (Some(Record::DutySlip(d)), ChildCollection::Expenses) => {
                Some(ChildRows::Expenses(d.expenses.clone()))
            }
            _ => None,
        };
        Ok(rows)
    }

    async fn persist(&self, change_set: ChangeSet) -> EngineResult<()> {
        if change_set.record.reference() != change_set.reference {
            return Err(EngineError::StoreError {
                message: format!(
                    "change set for {} carries record {}",
                    change_set.reference,
                    change_set.record.reference()
                ),
            });
        }

        let mut inner = self.inner.write().await;
        inner.records.insert(change_set.reference, change_set.record);
        inner.persist_count += 1;
        Ok(())
    }

    async fn create_linked_record(&self, doctype: DocType, prefill: Record) -> EngineResult<RecordRef> {
        if prefill.doctype() != doctype {
            return Err(EngineError::RecordTypeMismatch {
                reference: prefill.reference().to_string(),
                expected: doctype.to_string(),
            });
        }

        let mut inner = self.inner.write().await;
        let counter = inner.counters.entry(doctype).or_insert(0);
        *counter += 1;
        let id = format!("{}-{:05}", Self::prefix(doctype), counter);

        let mut record = prefill;
        record.set_id(id);
        let reference = record.reference();
        inner.records.insert(reference.clone(), record);
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Booking, BookingType, CustomerInvoice, DutySlip};

    #[tokio::test]
    async fn test_created_records_get_series_ids() {
        let store = MemoryStore::new();

        let first = store
            .create_linked_record(
                DocType::CustomerInvoice,
                Record::CustomerInvoice(CustomerInvoice::new("")),
            )
            .await
            .unwrap();
        let second = store
            .create_linked_record(
                DocType::CustomerInvoice,
                Record::CustomerInvoice(CustomerInvoice::new("")),
            )
            .await
            .unwrap();
        let slip = store
            .create_linked_record(DocType::DutySlip, Record::DutySlip(DutySlip::new("")))
            .await
            .unwrap();

        assert_eq!(first, RecordRef::invoice("INV-00001"));
        assert_eq!(second, RecordRef::invoice("INV-00002"));
        assert_eq!(slip, RecordRef::duty_slip("DS-00001"));
        assert!(store.get(&second).await.is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_mismatched_prefill() {
        let store = MemoryStore::new();
        let result = store
            .create_linked_record(DocType::DriverPayment, Record::DutySlip(DutySlip::new("")))
            .await;
        assert!(matches!(result, Err(EngineError::RecordTypeMismatch { .. })));
    }

    #[tokio::test]
    async fn test_child_rows_by_collection() {
        let store = MemoryStore::new();
        store
            .insert(Record::Booking(Booking::new("BK-0001", BookingType::Local)))
            .await;
        let reference = RecordRef::booking("BK-0001");

        let tax = store
            .list_child_rows(&reference, ChildCollection::TaxAndCharges)
            .await
            .unwrap();
        assert_eq!(tax, Some(ChildRows::Tax(vec![])));

        let missing = store
            .list_child_rows(&RecordRef::booking("BK-0404"), ChildCollection::Expenses)
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_rate_cards_from_config() {
        let loader = ConfigLoader::load("./config/fleet").unwrap();
        let store = MemoryStore::with_config(&loader);

        assert!(store.resolve_rate_card("suv").await.unwrap().is_some());
        assert!(store.resolve_rate_card("limousine").await.unwrap().is_none());
    }
}
