//! Connectors: the runtime objects managing the pins of one slot.
//!
//! ```text
//! Connector
//!   ├── Static(StaticConnector)    exactly one pin, forever
//!   └── Dynamic(DynamicConnector)  min..=max pins, resizable
//! ```
//!
//! Kind-specific behavior (resizing, persistence mapping) matches on the
//! variant; everything else goes through the shared accessors on
//! [`Connector`].

mod dynamic;
mod fixed;

pub use dynamic::DynamicConnector;
pub use fixed::StaticConnector;

use crate::error::ComponentError;
use crate::pin::Pin;
use crate::slot::{DeclaredSlot, Direction, SlotAccessor, SlotDescriptor, SlotTable};
use logix_types::{Uid, UidError};
use std::sync::Arc;

/// Shared handle to a connector of either binding kind.
#[derive(Debug, Clone)]
pub enum Connector {
    Static(Arc<StaticConnector>),
    Dynamic(Arc<DynamicConnector>),
}

impl Connector {
    pub(crate) fn from_slot(slot: DeclaredSlot) -> Self {
        match slot.accessor {
            SlotAccessor::Single(cell) => {
                Self::Static(Arc::new(StaticConnector::new(slot.descriptor, cell)))
            }
            SlotAccessor::Sequence(sequence) => {
                Self::Dynamic(Arc::new(DynamicConnector::new(slot.descriptor, sequence)))
            }
        }
    }

    #[must_use]
    pub fn uid(&self) -> Uid {
        match self {
            Self::Static(c) => c.uid(),
            Self::Dynamic(c) => c.uid(),
        }
    }

    /// Overrides the generated identity once.
    ///
    /// # Errors
    ///
    /// [`UidError::AlreadyAssigned`] on the second call.
    pub fn set_uid(&self, uid: Uid) -> Result<(), UidError> {
        match self {
            Self::Static(c) => c.set_uid(uid),
            Self::Dynamic(c) => c.set_uid(uid),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &SlotDescriptor {
        match self {
            Self::Static(c) => c.descriptor(),
            Self::Dynamic(c) => c.descriptor(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor().name()
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.descriptor().direction()
    }

    /// Snapshot of the current pins.
    #[must_use]
    pub fn pins(&self) -> Vec<Pin> {
        match self {
            Self::Static(c) => vec![c.pin()],
            Self::Dynamic(c) => c.pins(),
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Static(_) => 1,
            Self::Dynamic(c) => c.size(),
        }
    }

    #[must_use]
    pub fn as_dynamic(&self) -> Option<&Arc<DynamicConnector>> {
        match self {
            Self::Static(_) => None,
            Self::Dynamic(c) => Some(c),
        }
    }

    /// Returns `true` if both handles refer to the same connector.
    #[must_use]
    pub fn same(&self, other: &Connector) -> bool {
        match (self, other) {
            (Self::Static(a), Self::Static(b)) => Arc::ptr_eq(a, b),
            (Self::Dynamic(a), Self::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The input and output connectors of one component, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ConnectorSet {
    inputs: Vec<Connector>,
    outputs: Vec<Connector>,
}

impl ConnectorSet {
    /// Validates a filled table and builds one connector per slot.
    ///
    /// # Errors
    ///
    /// [`ComponentError::InvalidDeclaration`] if the table is malformed.
    pub(crate) fn from_table(table: SlotTable) -> Result<Self, ComponentError> {
        table.validate()?;
        let mut set = Self::default();
        for slot in table.into_slots() {
            let connector = Connector::from_slot(slot);
            match connector.direction() {
                Direction::Input => set.inputs.push(connector),
                Direction::Output => set.outputs.push(connector),
            }
        }
        Ok(set)
    }

    #[must_use]
    pub fn inputs(&self) -> &[Connector] {
        &self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> &[Connector] {
        &self.outputs
    }

    /// Inputs first, then outputs.
    pub fn iter(&self) -> impl Iterator<Item = &Connector> {
        self.inputs.iter().chain(&self.outputs)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<Pin> {
        self.inputs.iter().flat_map(Connector::pins).collect()
    }

    #[must_use]
    pub fn output_pins(&self) -> Vec<Pin> {
        self.outputs.iter().flat_map(Connector::pins).collect()
    }

    #[must_use]
    pub fn all_pins(&self) -> Vec<Pin> {
        self.iter().flat_map(Connector::pins).collect()
    }
}
