//! Record envelopes exchanged with the host store.
//!
//! The engine never owns storage. It reads [`Record`]s through the host,
//! works on copies, and hands back a [`ChangeSet`] describing one cycle's
//! write-back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    Booking, CustomerInvoice, CustomerPayment, DriverPayment, DutySlip, ExpenseLine, TaxLine,
};

/// The kinds of record the engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    /// A local or outstation booking.
    Booking,
    /// A duty slip.
    DutySlip,
    /// A customer invoice.
    CustomerInvoice,
    /// A driver payment.
    DriverPayment,
    /// A payment received from a customer.
    CustomerPayment,
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DocType::Booking => "booking",
            DocType::DutySlip => "duty_slip",
            DocType::CustomerInvoice => "customer_invoice",
            DocType::DriverPayment => "driver_payment",
            DocType::CustomerPayment => "customer_payment",
        };
        write!(f, "{}", name)
    }
}

/// Identifies a record by kind and id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordRef {
    /// The kind of record.
    pub doctype: DocType,
    /// The record identifier.
    pub id: String,
}

impl RecordRef {
    /// Creates a reference.
    pub fn new(doctype: DocType, id: impl Into<String>) -> Self {
        Self {
            doctype,
            id: id.into(),
        }
    }

    /// Reference to a booking.
    pub fn booking(id: impl Into<String>) -> Self {
        Self::new(DocType::Booking, id)
    }

    /// Reference to a duty slip.
    pub fn duty_slip(id: impl Into<String>) -> Self {
        Self::new(DocType::DutySlip, id)
    }

    /// Reference to a customer invoice.
    pub fn invoice(id: impl Into<String>) -> Self {
        Self::new(DocType::CustomerInvoice, id)
    }

    /// Reference to a driver payment.
    pub fn driver_payment(id: impl Into<String>) -> Self {
        Self::new(DocType::DriverPayment, id)
    }

    /// Reference to a customer payment.
    pub fn customer_payment(id: impl Into<String>) -> Self {
        Self::new(DocType::CustomerPayment, id)
    }
}

impl std::fmt::Display for RecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.doctype, self.id)
    }
}

/// Any record the engine can read or write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "doctype", rename_all = "snake_case")]
pub enum Record {
    /// A booking.
    Booking(Booking),
    /// A duty slip.
    DutySlip(DutySlip),
    /// A customer invoice.
    CustomerInvoice(CustomerInvoice),
    /// A driver payment.
    DriverPayment(DriverPayment),
    /// A customer payment.
    CustomerPayment(CustomerPayment),
}

impl Record {
    /// The kind of this record.
    pub fn doctype(&self) -> DocType {
        match self {
            Record::Booking(_) => DocType::Booking,
            Record::DutySlip(_) => DocType::DutySlip,
            Record::CustomerInvoice(_) => DocType::CustomerInvoice,
            Record::DriverPayment(_) => DocType::DriverPayment,
            Record::CustomerPayment(_) => DocType::CustomerPayment,
        }
    }

    /// The record identifier.
    pub fn id(&self) -> &str {
        match self {
            Record::Booking(b) => &b.id,
            Record::DutySlip(d) => &d.id,
            Record::CustomerInvoice(i) => &i.id,
            Record::DriverPayment(p) => &p.id,
            Record::CustomerPayment(p) => &p.id,
        }
    }

    /// Replaces the record identifier. Used by stores when assigning ids.
    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        match self {
            Record::Booking(b) => b.id = id,
            Record::DutySlip(d) => d.id = id,
            Record::CustomerInvoice(i) => i.id = id,
            Record::DriverPayment(p) => p.id = id,
            Record::CustomerPayment(p) => p.id = id,
        }
    }

    /// A reference to this record.
    pub fn reference(&self) -> RecordRef {
        RecordRef::new(self.doctype(), self.id())
    }
}

/// A child collection of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildCollection {
    /// A booking's ordered tax and charge lines.
    TaxAndCharges,
    /// A booking's or duty slip's expense lines.
    Expenses,
}

/// The rows of a child collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "collection", content = "rows", rename_all = "snake_case")]
pub enum ChildRows {
    /// Tax and charge lines.
    Tax(Vec<TaxLine>),
    /// Expense lines.
    Expenses(Vec<ExpenseLine>),
}

impl ChildRows {
    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            ChildRows::Tax(rows) => rows.len(),
            ChildRows::Expenses(rows) => rows.len(),
        }
    }

    /// Whether the collection has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One field whose value a recompute cycle changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Dotted path of the field (e.g. `derived.grand_total`).
    pub field: String,
    /// Value before the cycle.
    pub old: Value,
    /// Value after the cycle.
    pub new: Value,
}

/// The write-back of one recompute cycle.
///
/// A change set is persisted atomically: either the whole `record` is
/// written or nothing is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// The record being written.
    pub reference: RecordRef,
    /// The full record after the cycle.
    pub record: Record,
    /// Fields that differ from the stored version.
    pub changes: Vec<FieldChange>,
}

impl ChangeSet {
    /// Builds a change set from the stored and updated versions of a
    /// record, or `None` if nothing changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use fare_engine::models::{Booking, BookingType, ChangeSet, Record};
    ///
    /// let before = Booking::new("BK-0001", BookingType::Local);
    /// let mut after = before.clone();
    /// after.driver = Some("Ravi".to_string());
    ///
    /// let set = ChangeSet::diff(&Record::Booking(before.clone()), Record::Booking(after)).unwrap();
    /// assert_eq!(set.changes.len(), 1);
    /// assert_eq!(set.changes[0].field, "driver");
    ///
    /// assert!(ChangeSet::diff(&Record::Booking(before.clone()), Record::Booking(before)).is_none());
    /// ```
    pub fn diff(before: &Record, after: Record) -> Option<ChangeSet> {
        let old = serde_json::to_value(before).unwrap_or(Value::Null);
        let new = serde_json::to_value(&after).unwrap_or(Value::Null);

        let mut changes = Vec::new();
        collect_changes("", &old, &new, &mut changes);

        if changes.is_empty() {
            None
        } else {
            Some(ChangeSet {
                reference: after.reference(),
                record: after,
                changes,
            })
        }
    }
}

fn collect_changes(prefix: &str, old: &Value, new: &Value, out: &mut Vec<FieldChange>) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let mut keys: Vec<&String> = old_map.keys().chain(new_map.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                let o = old_map.get(key).unwrap_or(&Value::Null);
                let n = new_map.get(key).unwrap_or(&Value::Null);
                collect_changes(&path, o, n, out);
            }
        }
        _ if old != new => out.push(FieldChange {
            field: prefix.to_string(),
            old: old.clone(),
            new: new.clone(),
        }),
        _ => {}
    }
}
