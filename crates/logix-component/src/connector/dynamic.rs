//! Connector of a dynamic slot.
//!
//! # Invariant
//!
//! After every operation, under the connector's lock:
//!
//! ```text
//! len(values) == len(pins)
//! ∀ i: pins[i].index == i  ∧  pins[i].value == values[i]
//! ```
//!
//! # Locking
//!
//! | Operation | Lock |
//! |-----------|------|
//! | `size`, `pins`, `pin` | shared |
//! | `add_pin`, `insert_pin`, `remove_pin`, `try_increase`, `reset` | exclusive |
//!
//! Bound and index checks run before any mutation, so a rejected operation
//! leaves the sequence untouched.

use crate::error::ConnectorError;
use crate::pin::{DynamicPin, Pin};
use crate::slot::{Cardinality, SlotDescriptor};
use crate::storage::{Sequence, SharedSequence};
use logix_types::{same_value, Uid, UidCell, UidError, Value};
use std::sync::Arc;
use tracing::{debug, error};

/// Owns the resizable pin sequence of one dynamic slot.
#[derive(Debug)]
pub struct DynamicConnector {
    uid: UidCell,
    descriptor: Arc<SlotDescriptor>,
    bounds: Cardinality,
    default: Option<Value>,
    sequence: SharedSequence,
}

impl DynamicConnector {
    /// Takes over `sequence` and fills it to the minimum occurrences.
    pub(crate) fn new(descriptor: SlotDescriptor, sequence: SharedSequence) -> Self {
        let bounds = descriptor.cardinality().unwrap_or_default();
        let default = descriptor.value_type().default_value();
        let connector = Self {
            uid: UidCell::new(),
            descriptor: Arc::new(descriptor),
            bounds,
            default,
            sequence,
        };
        {
            let mut sequence = connector.sequence.write();
            for pin in sequence.pins.drain(..) {
                pin.detach();
            }
            sequence.values.clear();
            connector.fill_to_min(&mut sequence);
            connector.check(&sequence);
        }
        connector
    }

    #[must_use]
    pub fn uid(&self) -> Uid {
        self.uid.get()
    }

    /// Overrides the generated identity once.
    ///
    /// # Errors
    ///
    /// [`UidError::AlreadyAssigned`] on the second call.
    pub fn set_uid(&self, uid: Uid) -> Result<(), UidError> {
        self.uid.assign(uid)
    }

    #[must_use]
    pub fn descriptor(&self) -> &SlotDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn bounds(&self) -> Cardinality {
        self.bounds
    }

    /// Current pin count.
    #[must_use]
    pub fn size(&self) -> usize {
        self.sequence.read().pins.len()
    }

    /// Snapshot of the pin sequence.
    #[must_use]
    pub fn pins(&self) -> Vec<Pin> {
        self.sequence
            .read()
            .pins
            .iter()
            .map(|p| Pin::Dynamic(Arc::clone(p)))
            .collect()
    }

    /// Returns the pin at `index`.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::IndexOutOfRange`] if there is no such pin.
    pub fn pin(&self, index: usize) -> Result<Pin, ConnectorError> {
        let sequence = self.sequence.read();
        sequence
            .pins
            .get(index)
            .map(|p| Pin::Dynamic(Arc::clone(p)))
            .ok_or_else(|| self.out_of_range(index, sequence.pins.len()))
    }

    /// Appends a pin.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::MaximumBoundExceeded`] if the slot is full.
    pub fn add_pin(&self) -> Result<Pin, ConnectorError> {
        let mut sequence = self.sequence.write();
        let index = sequence.pins.len();
        let pin = self.insert_locked(&mut sequence, index)?;
        self.check(&sequence);
        debug!(slot = self.descriptor.name(), index, size = sequence.pins.len(), "pin added");
        Ok(Pin::Dynamic(pin))
    }

    /// Inserts a pin at `index`, shifting later pins right.
    ///
    /// # Errors
    ///
    /// - [`ConnectorError::MaximumBoundExceeded`] if the slot is full
    /// - [`ConnectorError::IndexOutOfRange`] if `index > size()`
    pub fn insert_pin(&self, index: usize) -> Result<Pin, ConnectorError> {
        let mut sequence = self.sequence.write();
        let pin = self.insert_locked(&mut sequence, index)?;
        self.check(&sequence);
        debug!(slot = self.descriptor.name(), index, size = sequence.pins.len(), "pin inserted");
        Ok(Pin::Dynamic(pin))
    }

    /// Removes and returns the pin at `index`, shifting later pins left.
    ///
    /// The returned pin is detached: its index is `None` and writes to it
    /// are ignored.
    ///
    /// # Errors
    ///
    /// - [`ConnectorError::MinimumBoundExceeded`] if the slot is at its minimum
    /// - [`ConnectorError::IndexOutOfRange`] if `index >= size()`
    pub fn remove_pin(&self, index: usize) -> Result<Pin, ConnectorError> {
        let mut sequence = self.sequence.write();
        let pin = self.remove_locked(&mut sequence, index)?;
        self.check(&sequence);
        debug!(slot = self.descriptor.name(), index, size = sequence.pins.len(), "pin removed");
        Ok(Pin::Dynamic(pin))
    }

    /// Appends pins until `size() == min(desired, max)`.
    ///
    /// Returns only the pins actually added; empty if the connector already
    /// holds `desired` pins or more.
    pub fn try_increase(&self, desired: usize) -> Vec<Pin> {
        let mut sequence = self.sequence.write();
        let target = self.bounds.clamp_max(desired);
        let mut added = Vec::new();
        while sequence.pins.len() < target {
            let index = sequence.pins.len();
            let Ok(pin) = self.insert_locked(&mut sequence, index) else {
                break;
            };
            added.push(Pin::Dynamic(pin));
        }
        self.check(&sequence);
        if !added.is_empty() {
            debug!(
                slot = self.descriptor.name(),
                added = added.len(),
                size = sequence.pins.len(),
                "pins increased"
            );
        }
        added
    }

    /// Drops every pin and refills to the minimum with fresh pins.
    ///
    /// Returns the fresh pins. Previous pins are detached and keep their
    /// identities, which are not reused.
    pub fn reset(&self) -> Vec<Pin> {
        let mut sequence = self.sequence.write();
        for pin in sequence.pins.drain(..) {
            pin.detach();
        }
        sequence.values.clear();
        let fresh = self.fill_to_min(&mut sequence);
        self.check(&sequence);
        debug!(slot = self.descriptor.name(), size = sequence.pins.len(), "pins reset");
        fresh
    }

    /// Checks the index and length invariant without panicking.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::IntegrityViolation`] describing the first mismatch.
    pub fn verify_integrity(&self) -> Result<(), ConnectorError> {
        self.integrity(&self.sequence.read())
    }

    fn insert_locked(
        &self,
        sequence: &mut Sequence,
        index: usize,
    ) -> Result<Arc<DynamicPin>, ConnectorError> {
        let len = sequence.pins.len();
        if !self.bounds.can_grow(len) {
            return Err(ConnectorError::MaximumBoundExceeded {
                slot: self.descriptor.name().to_string(),
                max: self.bounds.max.unwrap_or(len),
            });
        }
        if index > len {
            return Err(self.out_of_range(index, len));
        }

        let pin = Arc::new(DynamicPin::new(
            Arc::clone(&self.descriptor),
            Arc::downgrade(&self.sequence),
            index,
        ));
        sequence.values.insert(index, self.default.clone());
        sequence.pins.insert(index, Arc::clone(&pin));
        Self::renumber(sequence, index);
        Ok(pin)
    }

    fn remove_locked(
        &self,
        sequence: &mut Sequence,
        index: usize,
    ) -> Result<Arc<DynamicPin>, ConnectorError> {
        let len = sequence.pins.len();
        if !self.bounds.can_shrink(len) {
            return Err(ConnectorError::MinimumBoundExceeded {
                slot: self.descriptor.name().to_string(),
                min: self.bounds.min,
            });
        }
        if index >= len {
            return Err(self.out_of_range(index, len));
        }

        let pin = sequence.pins.remove(index);
        sequence.values.remove(index);
        pin.detach();
        Self::renumber(sequence, index);
        Ok(pin)
    }

    fn fill_to_min(&self, sequence: &mut Sequence) -> Vec<Pin> {
        let mut added = Vec::new();
        while sequence.pins.len() < self.bounds.min {
            let index = sequence.pins.len();
            let Ok(pin) = self.insert_locked(sequence, index) else {
                break;
            };
            added.push(Pin::Dynamic(pin));
        }
        added
    }

    /// Index correction pass: every pin from `from` on gets its position.
    fn renumber(sequence: &Sequence, from: usize) {
        for (index, pin) in sequence.pins.iter().enumerate().skip(from) {
            pin.set_index(index);
        }
    }

    fn integrity(&self, sequence: &Sequence) -> Result<(), ConnectorError> {
        let violation = |detail: String| ConnectorError::IntegrityViolation {
            slot: self.descriptor.name().to_string(),
            detail,
        };

        if sequence.values.len() != sequence.pins.len() {
            return Err(violation(format!(
                "{} values for {} pins",
                sequence.values.len(),
                sequence.pins.len()
            )));
        }
        for (i, pin) in sequence.pins.iter().enumerate() {
            if pin.index() != Some(i) {
                return Err(violation(format!(
                    "pin at position {i} carries index {:?}",
                    pin.index()
                )));
            }
            if !pin.is_bound_to(&self.sequence) {
                return Err(violation(format!(
                    "pin at position {i} is bound to another sequence"
                )));
            }
            let through_pin = pin
                .index()
                .and_then(|j| sequence.values.get(j))
                .and_then(Option::as_ref);
            let stored = sequence.values.get(i).and_then(Option::as_ref);
            if !same_value(through_pin, stored) {
                return Err(violation(format!("value mismatch at position {i}")));
            }
        }
        Ok(())
    }

    /// Runs the integrity check and aborts loudly on a violation.
    fn check(&self, sequence: &Sequence) {
        if let Err(err) = self.integrity(sequence) {
            error!(slot = self.descriptor.name(), error = %err, "dynamic connector corrupted");
            panic!("{err}");
        }
    }

    fn out_of_range(&self, index: usize, size: usize) -> ConnectorError {
        ConnectorError::IndexOutOfRange {
            slot: self.descriptor.name().to_string(),
            index,
            size,
        }
    }
}
