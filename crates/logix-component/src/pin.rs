//! Pins: addressable value cells with refresh state.
//!
//! A [`StaticPin`] is bound 1:1 to a static slot. A [`DynamicPin`] is one
//! element of a dynamic slot and writes through its index into the backing
//! sequence owned by its connector.
//!
//! # Refresh
//!
//! `refreshed` is a "changed since last observed" marker. `refresh_count`
//! increases on every false → true transition and never otherwise:
//!
//! ```text
//! set_refreshed(true)   false → true   count + 1
//! set_refreshed(true)   true  → true   count + 0
//! set_refreshed(false)  *     → false  count + 0
//! ```

use crate::error::ConnectorError;
use crate::slot::{SlotDescriptor, TriggerPolicy};
use crate::storage::{Sequence, ValueCell};
use logix_types::{same_value, Uid, UidCell, UidError, Value};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::warn;

#[derive(Debug, Default)]
struct RefreshState {
    refreshed: AtomicBool,
    count: AtomicU64,
}

impl RefreshState {
    fn get(&self) -> bool {
        self.refreshed.load(Ordering::Acquire)
    }

    fn set(&self, refreshed: bool) {
        if refreshed {
            if !self.refreshed.swap(true, Ordering::AcqRel) {
                self.count.fetch_add(1, Ordering::AcqRel);
            }
        } else {
            self.refreshed.store(false, Ordering::Release);
        }
    }

    fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}

/// Rejects values whose type differs from the slot's declared type.
fn check_type(descriptor: &SlotDescriptor, value: Option<&Value>) -> Result<(), ConnectorError> {
    match value {
        Some(v) if v.value_type() != descriptor.value_type() => {
            Err(ConnectorError::TypeMismatch {
                slot: descriptor.name().to_string(),
                expected: descriptor.value_type(),
                actual: v.value_type(),
            })
        }
        _ => Ok(()),
    }
}

/// Applies the change-detection write policy to `current`.
///
/// `None` is replaced by the type default before comparing. Writes when the
/// value differs (NaN equals NaN) or the slot is Always-trigger. Returns
/// `true` if a write happened.
fn write_changed(
    descriptor: &SlotDescriptor,
    current: &mut Option<Value>,
    value: Option<Value>,
) -> bool {
    let value = value.or_else(|| descriptor.value_type().default_value());
    if same_value(current.as_ref(), value.as_ref()) && !descriptor.trigger().is_always() {
        return false;
    }
    *current = value;
    true
}

/// The single pin of a static slot.
#[derive(Debug)]
pub struct StaticPin {
    uid: UidCell,
    descriptor: Arc<SlotDescriptor>,
    cell: ValueCell,
    refresh: RefreshState,
}

impl StaticPin {
    /// Binds a pin to `cell`, filling an absent value with the type default.
    pub(crate) fn new(descriptor: Arc<SlotDescriptor>, cell: ValueCell) -> Self {
        {
            let mut value = cell.write();
            if value.is_none() {
                *value = descriptor.value_type().default_value();
            }
        }
        Self {
            uid: UidCell::new(),
            descriptor,
            cell,
            refresh: RefreshState::default(),
        }
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
    pub fn value(&self) -> Option<Value> {
        self.cell.read().clone()
    }

    /// Writes `value` if it differs from the current one or the slot is
    /// Always-trigger, and marks the pin refreshed.
    ///
    /// Returns `true` if the pin was written.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::TypeMismatch`] if `value` has the wrong type.
    pub fn set_value(&self, value: Option<Value>) -> Result<bool, ConnectorError> {
        check_type(&self.descriptor, value.as_ref())?;
        let written = write_changed(&self.descriptor, &mut self.cell.write(), value);
        if written {
            self.refresh.set(true);
        }
        Ok(written)
    }

    /// Writes a persisted value without touching refresh state.
    pub(crate) fn load(&self, value: Option<Value>) -> Result<(), ConnectorError> {
        check_type(&self.descriptor, value.as_ref())?;
        *self.cell.write() = value.or_else(|| self.descriptor.value_type().default_value());
        Ok(())
    }

    #[must_use]
    pub fn is_refreshed(&self) -> bool {
        self.refresh.get()
    }

    pub fn set_refreshed(&self, refreshed: bool) {
        self.refresh.set(refreshed);
    }

    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refresh.count()
    }
}

/// Sentinel index of a pin removed from its sequence.
const DETACHED: usize = usize::MAX;

/// One element of a dynamic slot.
///
/// The pin's `index` always equals its position in the connector's pin
/// sequence; the connector renumbers pins under its write lock after every
/// insert or remove. A removed pin is detached and ignores writes.
#[derive(Debug)]
pub struct DynamicPin {
    uid: UidCell,
    descriptor: Arc<SlotDescriptor>,
    index: AtomicUsize,
    sequence: Weak<RwLock<Sequence>>,
    refresh: RefreshState,
}

impl DynamicPin {
    pub(crate) fn new(
        descriptor: Arc<SlotDescriptor>,
        sequence: Weak<RwLock<Sequence>>,
        index: usize,
    ) -> Self {
        Self {
            uid: UidCell::new(),
            descriptor,
            index: AtomicUsize::new(index),
            sequence,
            refresh: RefreshState::default(),
        }
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

    /// Position in the connector's sequence, `None` once removed.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self.index.load(Ordering::Acquire) {
            DETACHED => None,
            index => Some(index),
        }
    }

    pub(crate) fn set_index(&self, index: usize) {
        self.index.store(index, Ordering::Release);
    }

    pub(crate) fn detach(&self) {
        self.index.store(DETACHED, Ordering::Release);
    }

    /// Returns `true` if this pin writes into `sequence`.
    pub(crate) fn is_bound_to(&self, sequence: &Arc<RwLock<Sequence>>) -> bool {
        std::ptr::eq(self.sequence.as_ptr(), Arc::as_ptr(sequence))
    }

    #[must_use]
    pub fn value(&self) -> Option<Value> {
        let sequence = self.sequence.upgrade()?;
        let sequence = sequence.read();
        let index = self.index()?;
        sequence.values.get(index).cloned().flatten()
    }

    /// Same policy as [`StaticPin::set_value`], written through the index
    /// into the backing sequence. Writes to a removed pin are dropped.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::TypeMismatch`] if `value` has the wrong type.
    pub fn set_value(&self, value: Option<Value>) -> Result<bool, ConnectorError> {
        check_type(&self.descriptor, value.as_ref())?;
        let Some(sequence) = self.sequence.upgrade() else {
            warn!(
                pin = %self.uid(),
                slot = self.descriptor.name(),
                "write to pin of dropped connector"
            );
            return Ok(false);
        };
        let written = {
            let mut sequence = sequence.write();
            let Some(current) = self.index().and_then(|i| sequence.values.get_mut(i)) else {
                warn!(
                    pin = %self.uid(),
                    slot = self.descriptor.name(),
                    "write to detached pin ignored"
                );
                return Ok(false);
            };
            write_changed(&self.descriptor, current, value)
        };
        if written {
            self.refresh.set(true);
        }
        Ok(written)
    }

    pub(crate) fn load(&self, value: Option<Value>) -> Result<(), ConnectorError> {
        check_type(&self.descriptor, value.as_ref())?;
        let Some(sequence) = self.sequence.upgrade() else {
            return Ok(());
        };
        let mut sequence = sequence.write();
        if let Some(current) = self.index().and_then(|i| sequence.values.get_mut(i)) {
            *current = value.or_else(|| self.descriptor.value_type().default_value());
        }
        Ok(())
    }

    #[must_use]
    pub fn is_refreshed(&self) -> bool {
        self.refresh.get()
    }

    pub fn set_refreshed(&self, refreshed: bool) {
        self.refresh.set(refreshed);
    }

    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refresh.count()
    }
}

/// Shared handle to either pin variant.
///
/// Cloning is cheap; clones refer to the same pin.
#[derive(Debug, Clone)]
pub enum Pin {
    Static(Arc<StaticPin>),
    Dynamic(Arc<DynamicPin>),
}

impl Pin {
    #[must_use]
    pub fn uid(&self) -> Uid {
        match self {
            Self::Static(p) => p.uid(),
            Self::Dynamic(p) => p.uid(),
        }
    }

    /// Overrides the generated identity once.
    ///
    /// # Errors
    ///
    /// [`UidError::AlreadyAssigned`] on the second call.
    pub fn set_uid(&self, uid: Uid) -> Result<(), UidError> {
        match self {
            Self::Static(p) => p.set_uid(uid),
            Self::Dynamic(p) => p.set_uid(uid),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &SlotDescriptor {
        match self {
            Self::Static(p) => p.descriptor(),
            Self::Dynamic(p) => p.descriptor(),
        }
    }

    /// Position within a dynamic slot; `None` for static or removed pins.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Static(_) => None,
            Self::Dynamic(p) => p.index(),
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<Value> {
        match self {
            Self::Static(p) => p.value(),
            Self::Dynamic(p) => p.value(),
        }
    }

    /// Writes with change detection. See [`StaticPin::set_value`].
    ///
    /// # Errors
    ///
    /// [`ConnectorError::TypeMismatch`] if `value` has the wrong type.
    pub fn set_value(&self, value: Option<Value>) -> Result<bool, ConnectorError> {
        match self {
            Self::Static(p) => p.set_value(value),
            Self::Dynamic(p) => p.set_value(value),
        }
    }

    pub(crate) fn load(&self, value: Option<Value>) -> Result<(), ConnectorError> {
        match self {
            Self::Static(p) => p.load(value),
            Self::Dynamic(p) => p.load(value),
        }
    }

    #[must_use]
    pub fn is_refreshed(&self) -> bool {
        match self {
            Self::Static(p) => p.is_refreshed(),
            Self::Dynamic(p) => p.is_refreshed(),
        }
    }

    pub fn set_refreshed(&self, refreshed: bool) {
        match self {
            Self::Static(p) => p.set_refreshed(refreshed),
            Self::Dynamic(p) => p.set_refreshed(refreshed),
        }
    }

    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        match self {
            Self::Static(p) => p.refresh_count(),
            Self::Dynamic(p) => p.refresh_count(),
        }
    }

    #[must_use]
    pub fn trigger(&self) -> TriggerPolicy {
        self.descriptor().trigger()
    }

    #[must_use]
    pub fn is_always(&self) -> bool {
        self.trigger().is_always()
    }

    /// Returns `true` if both handles refer to the same pin.
    #[must_use]
    pub fn same(&self, other: &Pin) -> bool {
        match (self, other) {
            (Self::Static(a), Self::Static(b)) => Arc::ptr_eq(a, b),
            (Self::Dynamic(a), Self::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
