//! UID-indexed lookup across components, connectors and pins.
//!
//! A [`Registry`] is a plain value. Construct one per engine (or per test);
//! there is no process-wide instance.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`RegistryError::DuplicateUid`] | `REGISTRY_DUPLICATE_UID` | No |
//! | [`RegistryError::NotRegistered`] | `REGISTRY_NOT_REGISTERED` | Yes |

use logix_component::{Component, Connector, LookupError, Pin};
use logix_types::{ErrorCode, Uid};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The UID is already indexed, or appears twice within one component.
    #[error("uid {0} is already registered")]
    DuplicateUid(Uid),

    #[error("component {0} is not registered")]
    NotRegistered(Uid),
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::DuplicateUid(_) => "REGISTRY_DUPLICATE_UID",
            Self::NotRegistered(_) => "REGISTRY_NOT_REGISTERED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotRegistered(_))
    }
}

/// Pins that entered and left the index during a [`Registry::resync`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resync {
    pub added: Vec<Uid>,
    pub removed: Vec<Uid>,
}

impl Resync {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// An indexed entity and the component it belongs to.
#[derive(Debug, Clone)]
struct Owned<T> {
    owner: Uid,
    item: T,
}

/// UID → entity index.
///
/// Registering a component indexes every connector and every pin reachable
/// from it; deregistering removes all of those entries again.
#[derive(Debug, Default)]
pub struct Registry {
    components: HashMap<Uid, Arc<Component>>,
    connectors: HashMap<Uid, Owned<Connector>>,
    pins: HashMap<Uid, Owned<Pin>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes `component` with all of its connectors and pins.
    ///
    /// Nothing is written unless every UID is free.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateUid`] if any UID is already indexed or
    /// occurs twice inside `component`.
    pub fn register(&mut self, component: Arc<Component>) -> Result<(), RegistryError> {
        let uid = component.uid();
        let connectors: Vec<Connector> = component.connectors().iter().cloned().collect();
        let pins = component.connectors().all_pins();

        let mut seen = HashSet::new();
        let candidates = std::iter::once(uid)
            .chain(connectors.iter().map(Connector::uid))
            .chain(pins.iter().map(Pin::uid));
        for candidate in candidates {
            if !seen.insert(candidate) || self.contains(candidate) {
                return Err(RegistryError::DuplicateUid(candidate));
            }
        }

        for connector in connectors {
            self.connectors.insert(
                connector.uid(),
                Owned {
                    owner: uid,
                    item: connector,
                },
            );
        }
        let pin_count = pins.len();
        for pin in pins {
            self.pins.insert(pin.uid(), Owned { owner: uid, item: pin });
        }
        debug!(
            component = %uid,
            type_name = component.type_name(),
            pins = pin_count,
            "component registered"
        );
        self.components.insert(uid, component);
        Ok(())
    }

    /// Removes the component and every entry it owns.
    ///
    /// # Errors
    ///
    /// [`LookupError::ComponentNotFound`] if `uid` is not a registered component.
    pub fn deregister(&mut self, uid: Uid) -> Result<Arc<Component>, LookupError> {
        let component = self
            .components
            .remove(&uid)
            .ok_or(LookupError::ComponentNotFound(uid))?;
        self.connectors.retain(|_, entry| entry.owner != uid);
        self.pins.retain(|_, entry| entry.owner != uid);
        debug!(component = %uid, "component deregistered");
        Ok(component)
    }

    /// Reindexes the pins of a registered component after its dynamic
    /// connectors were resized.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotRegistered`] if `uid` is unknown.
    /// - [`RegistryError::DuplicateUid`] if a new pin collides with an
    ///   entry of another component; the index is left unchanged.
    pub fn resync(&mut self, uid: Uid) -> Result<Resync, RegistryError> {
        let component = self
            .components
            .get(&uid)
            .ok_or(RegistryError::NotRegistered(uid))?;
        let current = component.connectors().all_pins();
        let live: HashSet<Uid> = current.iter().map(Pin::uid).collect();

        let added: Vec<Pin> = current
            .into_iter()
            .filter(|p| !self.pins.contains_key(&p.uid()))
            .collect();
        if let Some(clash) = added.iter().map(Pin::uid).find(|p| self.contains(*p)) {
            return Err(RegistryError::DuplicateUid(clash));
        }

        let removed: Vec<Uid> = self
            .pins
            .iter()
            .filter(|(pin, entry)| entry.owner == uid && !live.contains(pin))
            .map(|(pin, _)| *pin)
            .collect();
        for pin in &removed {
            self.pins.remove(pin);
        }

        let report = Resync {
            added: added.iter().map(Pin::uid).collect(),
            removed,
        };
        for pin in added {
            self.pins.insert(pin.uid(), Owned { owner: uid, item: pin });
        }
        if !report.is_empty() {
            debug!(
                component = %uid,
                added = report.added.len(),
                removed = report.removed.len(),
                "registry resynced"
            );
        }
        Ok(report)
    }

    /// # Errors
    ///
    /// [`LookupError::ComponentNotFound`] on a miss.
    pub fn component(&self, uid: Uid) -> Result<Arc<Component>, LookupError> {
        self.components
            .get(&uid)
            .cloned()
            .ok_or(LookupError::ComponentNotFound(uid))
    }

    /// # Errors
    ///
    /// [`LookupError::ConnectorNotFound`] on a miss.
    pub fn connector(&self, uid: Uid) -> Result<Connector, LookupError> {
        self.connectors
            .get(&uid)
            .map(|entry| entry.item.clone())
            .ok_or(LookupError::ConnectorNotFound(uid))
    }

    /// # Errors
    ///
    /// [`LookupError::PinNotFound`] on a miss.
    pub fn pin(&self, uid: Uid) -> Result<Pin, LookupError> {
        self.pins
            .get(&uid)
            .map(|entry| entry.item.clone())
            .ok_or(LookupError::PinNotFound(uid))
    }

    /// The component that owns a connector.
    ///
    /// # Errors
    ///
    /// [`LookupError::ConnectorNotFound`] on a miss.
    pub fn connector_owner(&self, uid: Uid) -> Result<Uid, LookupError> {
        self.connectors
            .get(&uid)
            .map(|entry| entry.owner)
            .ok_or(LookupError::ConnectorNotFound(uid))
    }

    /// The component that owns a pin.
    ///
    /// # Errors
    ///
    /// [`LookupError::PinNotFound`] on a miss.
    pub fn pin_owner(&self, uid: Uid) -> Result<Uid, LookupError> {
        self.pins
            .get(&uid)
            .map(|entry| entry.owner)
            .ok_or(LookupError::PinNotFound(uid))
    }

    /// Returns `true` if `uid` names any indexed entity.
    #[must_use]
    pub fn contains(&self, uid: Uid) -> bool {
        self.components.contains_key(&uid)
            || self.connectors.contains_key(&uid)
            || self.pins.contains_key(&uid)
    }

    pub fn components(&self) -> impl Iterator<Item = &Arc<Component>> {
        self.components.values()
    }

    /// Number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[must_use]
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }
}
