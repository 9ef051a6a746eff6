//! Slot declaration and descriptors.
//!
//! Units describe their slots once, in [`Unit::declare`](crate::Unit::declare),
//! by registering each handle field on a [`SlotTable`]. The table is turned
//! into one connector per slot when the unit is wrapped; nothing is
//! re-inspected afterwards.
//!
//! | Handle | Binding | Pins |
//! |--------|---------|------|
//! | [`Slot<T>`] | [`Binding::Static`] | exactly one |
//! | [`SlotList<T>`] | [`Binding::Dynamic`] | `min..=max` |
//!
//! # Example
//!
//! ```
//! use logix_component::{Slot, SlotList, SlotTable, TriggerPolicy};
//!
//! let enable: Slot<bool> = Slot::new();
//! let zones: SlotList<f64> = SlotList::new();
//! let alarm: Slot<bool> = Slot::new();
//!
//! let mut table = SlotTable::new("Thermostat");
//! table.input("enable", &enable);
//! table.input_list("zones", &zones).bounds(1, Some(8));
//! table.output("alarm", &alarm).always();
//!
//! assert_eq!(table.len(), 3);
//! let alarm = table.descriptors().find(|d| d.name() == "alarm").unwrap();
//! assert_eq!(alarm.trigger(), TriggerPolicy::Always);
//! ```

use crate::error::ComponentError;
use crate::storage::{SharedSequence, ValueCell};
use crate::{Slot, SlotList};
use logix_types::{SlotType, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::fmt;

/// When a pin counts as refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// Refreshed only when the value changes.
    #[default]
    Normal,
    /// Refreshed on every write and every pass.
    Always,
}

impl TriggerPolicy {
    #[must_use]
    pub fn is_always(&self) -> bool {
        matches!(self, Self::Always)
    }
}

/// Whether a slot feeds the unit or is produced by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Occurrence bounds of a dynamic slot. `max: None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cardinality {
    pub min: usize,
    pub max: Option<usize>,
}

impl Cardinality {
    /// `0..unbounded`, the default for dynamic slots.
    #[must_use]
    pub fn unbounded() -> Self {
        Self { min: 0, max: None }
    }

    /// Returns `true` if a sequence of `len` may grow by one.
    #[must_use]
    pub fn can_grow(&self, len: usize) -> bool {
        self.max.map_or(true, |max| len < max)
    }

    /// Returns `true` if a sequence of `len` may shrink by one.
    #[must_use]
    pub fn can_shrink(&self, len: usize) -> bool {
        len > self.min
    }

    /// Clamps a desired length to the upper bound.
    #[must_use]
    pub fn clamp_max(&self, desired: usize) -> usize {
        self.max.map_or(desired, |max| desired.min(max))
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Static (one pin) or dynamic (resizable pin sequence) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Binding {
    Static,
    Dynamic(Cardinality),
}

/// Immutable metadata of one declared slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    name: String,
    owner: String,
    direction: Direction,
    value_type: ValueType,
    trigger: TriggerPolicy,
    binding: Binding,
}

impl SlotDescriptor {
    /// Declared slot name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of the unit that declared the slot.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[must_use]
    pub fn trigger(&self) -> TriggerPolicy {
        self.trigger
    }

    #[must_use]
    pub fn binding(&self) -> Binding {
        self.binding
    }

    /// Bounds of a dynamic slot, `None` for static slots.
    #[must_use]
    pub fn cardinality(&self) -> Option<Cardinality> {
        match self.binding {
            Binding::Static => None,
            Binding::Dynamic(bounds) => Some(bounds),
        }
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self.binding, Binding::Dynamic(_))
    }
}

/// Read/write access to the storage a slot handle points at.
#[derive(Debug, Clone)]
pub(crate) enum SlotAccessor {
    Single(ValueCell),
    Sequence(SharedSequence),
}

impl SlotAccessor {
    /// Address of the backing storage; equal for handles sharing it.
    fn storage(&self) -> *const () {
        match self {
            Self::Single(cell) => Arc::as_ptr(cell).cast(),
            Self::Sequence(sequence) => Arc::as_ptr(sequence).cast(),
        }
    }
}

/// A descriptor paired with its storage accessor.
#[derive(Debug)]
pub(crate) struct DeclaredSlot {
    pub(crate) descriptor: SlotDescriptor,
    pub(crate) accessor: SlotAccessor,
}

/// Registration table filled in by [`Unit::declare`](crate::Unit::declare).
#[derive(Debug)]
pub struct SlotTable {
    owner: String,
    slots: Vec<DeclaredSlot>,
}

impl SlotTable {
    /// Creates an empty table for the unit type `owner`.
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            slots: Vec::new(),
        }
    }

    /// Declares a static input slot.
    pub fn input<T: SlotType>(
        &mut self,
        name: impl Into<String>,
        slot: &Slot<T>,
    ) -> SlotOptions<'_> {
        self.push_single(name.into(), Direction::Input, T::VALUE_TYPE, slot.cell())
    }

    /// Declares a static output slot.
    pub fn output<T: SlotType>(
        &mut self,
        name: impl Into<String>,
        slot: &Slot<T>,
    ) -> SlotOptions<'_> {
        self.push_single(name.into(), Direction::Output, T::VALUE_TYPE, slot.cell())
    }

    /// Declares a dynamic input slot, `0..unbounded` unless narrowed.
    pub fn input_list<T: SlotType>(
        &mut self,
        name: impl Into<String>,
        list: &SlotList<T>,
    ) -> ListOptions<'_> {
        self.push_sequence(name.into(), Direction::Input, T::VALUE_TYPE, list.sequence())
    }

    /// Declares a dynamic output slot, `0..unbounded` unless narrowed.
    pub fn output_list<T: SlotType>(
        &mut self,
        name: impl Into<String>,
        list: &SlotList<T>,
    ) -> ListOptions<'_> {
        self.push_sequence(name.into(), Direction::Output, T::VALUE_TYPE, list.sequence())
    }

    /// Number of declared slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Unit type name the table was created for.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Iterates declared descriptors in declaration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &SlotDescriptor> {
        self.slots.iter().map(|s| &s.descriptor)
    }

    /// Checks names and bounds.
    ///
    /// # Errors
    ///
    /// [`ComponentError::InvalidDeclaration`] on empty or bracketed names,
    /// duplicate names, one handle declared under two names, or `min > max`.
    pub(crate) fn validate(&self) -> Result<(), ComponentError> {
        let mut seen = HashSet::new();
        let mut storage = HashMap::new();
        for slot in &self.slots {
            let name = slot.descriptor.name();
            if name.is_empty() || name.contains(['[', ']']) {
                return Err(ComponentError::InvalidDeclaration(format!(
                    "{}: invalid slot name '{}'",
                    self.owner, name
                )));
            }
            if !seen.insert(name) {
                return Err(ComponentError::InvalidDeclaration(format!(
                    "{}: duplicate slot name '{}'",
                    self.owner, name
                )));
            }
            if let Some(first) = storage.insert(slot.accessor.storage(), name) {
                return Err(ComponentError::InvalidDeclaration(format!(
                    "{}: slot '{}' shares its handle with '{}'",
                    self.owner, name, first
                )));
            }
            if let Some(Cardinality { min, max: Some(max) }) = slot.descriptor.cardinality() {
                if min > max {
                    return Err(ComponentError::InvalidDeclaration(format!(
                        "{}: slot '{}' has min {} > max {}",
                        self.owner, name, min, max
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn into_slots(self) -> Vec<DeclaredSlot> {
        self.slots
    }

    fn push_single(
        &mut self,
        name: String,
        direction: Direction,
        value_type: ValueType,
        cell: ValueCell,
    ) -> SlotOptions<'_> {
        let slot = self.push(
            name,
            direction,
            value_type,
            Binding::Static,
            SlotAccessor::Single(cell),
        );
        SlotOptions { slot }
    }

    fn push_sequence(
        &mut self,
        name: String,
        direction: Direction,
        value_type: ValueType,
        sequence: SharedSequence,
    ) -> ListOptions<'_> {
        let slot = self.push(
            name,
            direction,
            value_type,
            Binding::Dynamic(Cardinality::unbounded()),
            SlotAccessor::Sequence(sequence),
        );
        ListOptions { slot }
    }

    fn push(
        &mut self,
        name: String,
        direction: Direction,
        value_type: ValueType,
        binding: Binding,
        accessor: SlotAccessor,
    ) -> &mut DeclaredSlot {
        self.slots.push(DeclaredSlot {
            descriptor: SlotDescriptor {
                name,
                owner: self.owner.clone(),
                direction,
                value_type,
                trigger: TriggerPolicy::Normal,
                binding,
            },
            accessor,
        });
        let last = self.slots.len() - 1;
        &mut self.slots[last]
    }
}

/// Options for a static slot being declared.
pub struct SlotOptions<'a> {
    slot: &'a mut DeclaredSlot,
}

impl SlotOptions<'_> {
    /// Marks the slot Always-trigger.
    pub fn always(self) -> Self {
        self.slot.descriptor.trigger = TriggerPolicy::Always;
        self
    }
}

/// Options for a dynamic slot being declared.
pub struct ListOptions<'a> {
    slot: &'a mut DeclaredSlot,
}

impl ListOptions<'_> {
    /// Marks the slot Always-trigger.
    pub fn always(self) -> Self {
        self.slot.descriptor.trigger = TriggerPolicy::Always;
        self
    }

    /// Sets occurrence bounds. `max: None` keeps the slot unbounded.
    pub fn bounds(self, min: usize, max: Option<usize>) -> Self {
        self.slot.descriptor.binding = Binding::Dynamic(Cardinality { min, max });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinality_limits() {
        let bounds = Cardinality {
            min: 2,
            max: Some(5),
        };
        assert!(bounds.can_grow(4));
        assert!(!bounds.can_grow(5));
        assert!(bounds.can_shrink(3));
        assert!(!bounds.can_shrink(2));
        assert_eq!(bounds.clamp_max(9), 5);
        assert_eq!(Cardinality::unbounded().clamp_max(9), 9);
        assert!(Cardinality::unbounded().can_grow(usize::MAX - 1));
    }

    #[test]
    fn declare_defaults() {
        let a: Slot<bool> = Slot::new();
        let list: SlotList<i64> = SlotList::new();
        let mut table = SlotTable::new("Unit");
        table.input("a", &a);
        table.output_list("out", &list);

        let descriptors: Vec<_> = table.descriptors().collect();
        assert_eq!(descriptors[0].binding(), Binding::Static);
        assert_eq!(descriptors[0].trigger(), TriggerPolicy::Normal);
        assert_eq!(descriptors[0].value_type(), ValueType::Bool);
        assert_eq!(descriptors[0].owner(), "Unit");
        assert_eq!(descriptors[1].direction(), Direction::Output);
        assert_eq!(descriptors[1].cardinality(), Some(Cardinality::unbounded()));
        assert!(table.validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicates() {
        let a: Slot<bool> = Slot::new();
        let b: Slot<bool> = Slot::new();
        let mut table = SlotTable::new("Unit");
        table.input("x", &a);
        table.output("x", &b);
        let err = table.validate().expect_err("duplicate name");
        assert!(err.to_string().contains("duplicate slot name 'x'"));
    }

    #[test]
    fn validate_rejects_shared_handles() {
        let list: SlotList<i64> = SlotList::new();
        let mut table = SlotTable::new("Unit");
        table.input_list("a", &list);
        table.output_list("b", &list);
        let err = table.validate().expect_err("aliased list");
        assert!(err.to_string().contains("slot 'b' shares its handle with 'a'"));

        let x: Slot<f64> = Slot::new();
        let mut table = SlotTable::new("Unit");
        table.input("in", &x);
        table.output("out", &x);
        assert!(matches!(
            table.validate(),
            Err(ComponentError::InvalidDeclaration(_))
        ));
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let list: SlotList<i64> = SlotList::new();
        let mut table = SlotTable::new("Unit");
        table.input_list("l", &list).bounds(4, Some(2));
        assert!(matches!(
            table.validate(),
            Err(ComponentError::InvalidDeclaration(_))
        ));
    }

    #[test]
    fn validate_rejects_bracketed_names() {
        let a: Slot<i64> = Slot::new();
        let mut table = SlotTable::new("Unit");
        table.input("a[0]", &a);
        assert!(table.validate().is_err());

        let mut table = SlotTable::new("Unit");
        table.input("", &a);
        assert!(table.validate().is_err());
    }

    #[test]
    fn binding_serde() {
        let json = serde_json::to_value(Binding::Dynamic(Cardinality {
            min: 1,
            max: None,
        }))
        .expect("serialize");
        assert_eq!(json, serde_json::json!({"kind": "dynamic", "min": 1, "max": null}));
    }
}
