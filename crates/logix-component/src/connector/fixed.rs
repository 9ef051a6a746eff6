//! Connector of a static slot.

use crate::pin::{Pin, StaticPin};
use crate::slot::SlotDescriptor;
use crate::storage::ValueCell;
use logix_types::{Uid, UidCell, UidError};
use std::sync::Arc;

/// Owns exactly one [`StaticPin`] for the lifetime of its component.
#[derive(Debug)]
pub struct StaticConnector {
    uid: UidCell,
    descriptor: Arc<SlotDescriptor>,
    pin: Arc<StaticPin>,
}

impl StaticConnector {
    pub(crate) fn new(descriptor: SlotDescriptor, cell: ValueCell) -> Self {
        let descriptor = Arc::new(descriptor);
        let pin = Arc::new(StaticPin::new(Arc::clone(&descriptor), cell));
        Self {
            uid: UidCell::new(),
            descriptor,
            pin,
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
    pub fn pin(&self) -> Pin {
        Pin::Static(Arc::clone(&self.pin))
    }
}
