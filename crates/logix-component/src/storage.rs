//! Typed slot handles owned by units.
//!
//! A unit keeps one handle per declared slot as an ordinary struct field and
//! reads or writes it from its behavior hooks. The connector built from the
//! handle at wrap time shares the same storage, so a value written through a
//! pin is what the unit reads next, and a value the unit writes is what the
//! pin reports.
//!
//! ```
//! use logix_component::{Slot, SlotList};
//!
//! let setpoint: Slot<f64> = Slot::new();
//! assert_eq!(setpoint.get(), None);
//! setpoint.set(21.5);
//! assert_eq!(setpoint.get(), Some(21.5));
//!
//! let sensors: SlotList<f64> = SlotList::new();
//! assert!(sensors.is_empty());
//! ```

use crate::pin::DynamicPin;
use logix_types::{SlotType, Value};
use parking_lot::RwLock;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Storage behind a static slot.
pub(crate) type ValueCell = Arc<RwLock<Option<Value>>>;

/// Storage behind a dynamic slot: the backing values and the pins bound to
/// them, guarded together by one lock.
pub(crate) type SharedSequence = Arc<RwLock<Sequence>>;

/// Backing sequence of a dynamic slot.
///
/// `values[i]` is the value of `pins[i]`. Only the owning connector changes
/// the length of either vector.
#[derive(Debug, Default)]
pub(crate) struct Sequence {
    pub(crate) values: Vec<Option<Value>>,
    pub(crate) pins: Vec<Arc<DynamicPin>>,
}

/// Handle to a static slot holding one value of type `T`.
pub struct Slot<T> {
    cell: ValueCell,
    _type: PhantomData<fn() -> T>,
}

impl<T: SlotType> Slot<T> {
    /// Creates an empty slot. The connector fills in the type default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: Arc::new(RwLock::new(None)),
            _type: PhantomData,
        }
    }

    /// Returns the current value, `None` when absent.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.cell.read().as_ref().and_then(T::from_value)
    }

    /// Returns the current value or `T::default()`.
    #[must_use]
    pub fn get_or_default(&self) -> T
    where
        T: Default,
    {
        self.get().unwrap_or_default()
    }

    /// Overwrites the value without touching refresh state.
    pub fn set(&self, value: T) {
        *self.cell.write() = Some(value.into_value());
    }

    /// Resets the value to the type default, the same value a fresh
    /// connector fills in. Only `Object` slots become absent.
    pub fn clear(&self) {
        *self.cell.write() = T::VALUE_TYPE.default_value();
    }

    pub(crate) fn cell(&self) -> ValueCell {
        Arc::clone(&self.cell)
    }
}

impl<T: SlotType> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SlotType> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("type", &T::VALUE_TYPE)
            .field("value", &*self.cell.read())
            .finish()
    }
}

/// Handle to a dynamic slot: an ordered, resizable list of `T`.
///
/// The unit can read every element and overwrite existing ones; only the
/// connector inserts or removes elements.
pub struct SlotList<T> {
    sequence: SharedSequence,
    _type: PhantomData<fn() -> T>,
}

impl<T: SlotType> SlotList<T> {
    /// Creates an empty list. The connector grows it to its minimum size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sequence: Arc::new(RwLock::new(Sequence::default())),
            _type: PhantomData,
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.read().values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element at `index`, `None` when out of range or absent.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.sequence
            .read()
            .values
            .get(index)
            .and_then(|v| v.as_ref())
            .and_then(T::from_value)
    }

    /// Snapshot of all elements in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Option<T>> {
        self.sequence
            .read()
            .values
            .iter()
            .map(|v| v.as_ref().and_then(T::from_value))
            .collect()
    }

    /// Overwrites the element at `index`. Returns `false` when out of range.
    pub fn set(&self, index: usize, value: T) -> bool {
        match self.sequence.write().values.get_mut(index) {
            Some(slot) => {
                *slot = Some(value.into_value());
                true
            }
            None => false,
        }
    }

    pub(crate) fn sequence(&self) -> SharedSequence {
        Arc::clone(&self.sequence)
    }
}

impl<T: SlotType> Default for SlotList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SlotType> fmt::Debug for SlotList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotList")
            .field("type", &T::VALUE_TYPE)
            .field("values", &self.sequence.read().values)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_shares_storage_with_cell() {
        let slot: Slot<i64> = Slot::new();
        let cell = slot.cell();
        *cell.write() = Some(Value::Int(4));
        assert_eq!(slot.get(), Some(4));

        slot.set(9);
        assert_eq!(*cell.read(), Some(Value::Int(9)));

        slot.clear();
        assert_eq!(*cell.read(), Some(Value::Int(0)));
        assert_eq!(slot.get(), Some(0));
    }

    #[test]
    fn clear_keeps_pin_value_well_typed() {
        let flag: Slot<bool> = Slot::new();
        flag.set(true);
        flag.clear();
        assert_eq!(*flag.cell().read(), Some(Value::Bool(false)));

        let doc: Slot<serde_json::Value> = Slot::new();
        doc.set(serde_json::json!({"a": 1}));
        doc.clear();
        assert_eq!(*doc.cell().read(), None);
    }

    #[test]
    fn slot_type_mismatch_reads_none() {
        let slot: Slot<bool> = Slot::new();
        *slot.cell().write() = Some(Value::Int(1));
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn list_reads_backing_values() {
        let list: SlotList<String> = SlotList::new();
        {
            let seq = list.sequence();
            let mut seq = seq.write();
            seq.values.push(Some(Value::from("a")));
            seq.values.push(None);
        }
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0), Some("a".to_string()));
        assert_eq!(list.get(1), None);
        assert_eq!(list.to_vec(), vec![Some("a".to_string()), None]);

        assert!(list.set(1, "b".into()));
        assert!(!list.set(2, "c".into()));
        assert_eq!(list.get(1), Some("b".to_string()));
    }
}
