//! Component snapshots for persistence and reload.
//!
//! A snapshot records what a storage layer needs to rebuild a component
//! with the same identities: the component's kind and unit type, and for
//! every connector its binding and pins with their last values.
//!
//! # Restore
//!
//! Restoring applies a snapshot to a **freshly wrapped** component, before it
//! is registered anywhere:
//!
//! 1. Version, kind and unit type must match.
//! 2. Every stored connector must exist with the same binding, and every
//!    dynamic pin count must fit the slot's bounds. Nothing is modified
//!    until all checks pass.
//! 3. Dynamic connectors are resized to the stored pin count.
//! 4. Stored UIDs are assigned to the component, connectors and pins.
//! 5. Stored values are written without touching refresh state.
//!
//! # Example
//!
//! ```
//! use logix_component::{
//!     Component, ComponentError, Logic, LogicComponent, SlotList, SlotTable, Snapshottable, Unit,
//! };
//!
//! #[derive(Default)]
//! struct Mux {
//!     inputs: SlotList<i64>,
//! }
//!
//! impl Unit for Mux {
//!     fn declare(&self, slots: &mut SlotTable) {
//!         slots.input_list("in", &self.inputs);
//!     }
//! }
//!
//! impl Logic for Mux {
//!     fn logic(&mut self) -> Result<(), ComponentError> {
//!         Ok(())
//!     }
//! }
//!
//! let original = Component::from(LogicComponent::new(Mux::default())?);
//! original.connector("in")?.as_dynamic().expect("dynamic").try_increase(3);
//! let snapshot = original.snapshot();
//!
//! let reloaded = Component::from(LogicComponent::new(Mux::default())?);
//! reloaded.restore(&snapshot)?;
//! assert_eq!(reloaded.uid(), original.uid());
//! assert_eq!(reloaded.pin("in[2]")?.uid(), original.pin("in[2]")?.uid());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::component::{Component, ComponentKind};
use crate::connector::Connector;
use crate::error::ConnectorError;
use crate::slot::Binding;
use logix_types::{ErrorCode, Uid, UidError, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors raised while restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot version mismatch.
    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },

    /// Kind or unit type differs from the target component.
    #[error("component mismatch: expected {expected}, got {actual}")]
    ComponentMismatch { expected: String, actual: String },

    /// A stored connector has no counterpart, or a different shape.
    #[error("connector '{name}' cannot be restored: {reason}")]
    ConnectorMismatch { name: String, reason: String },

    /// Writing a stored value failed.
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// The target already carries an overridden identity.
    #[error(transparent)]
    Uid(#[from] UidError),
}

impl ErrorCode for SnapshotError {
    fn code(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "SNAPSHOT_SERIALIZATION",
            Self::VersionMismatch { .. } => "SNAPSHOT_VERSION_MISMATCH",
            Self::ComponentMismatch { .. } => "SNAPSHOT_COMPONENT_MISMATCH",
            Self::ConnectorMismatch { .. } => "SNAPSHOT_CONNECTOR_MISMATCH",
            Self::Connector(_) => "SNAPSHOT_CONNECTOR_ERROR",
            Self::Uid(_) => "SNAPSHOT_UID_ALREADY_ASSIGNED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Persisted state of one pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinSnapshot {
    pub uid: Uid,
    /// Position in a dynamic slot, `None` for a static pin.
    pub index: Option<usize>,
    pub value: Option<Value>,
}

/// Persisted state of one connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSnapshot {
    pub uid: Uid,
    pub name: String,
    pub binding: Binding,
    pub pins: Vec<PinSnapshot>,
}

/// Persisted state of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    /// Snapshot format version.
    pub version: u32,
    pub uid: Uid,
    pub kind: ComponentKind,
    /// Unit type name, checked on restore.
    pub type_name: String,
    pub connectors: Vec<ConnectorSnapshot>,
}

impl ComponentSnapshot {
    /// # Errors
    ///
    /// [`SnapshotError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    ///
    /// [`SnapshotError::Serialization`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Save and reload of component state.
pub trait Snapshottable {
    fn snapshot(&self) -> ComponentSnapshot;

    /// Applies `snapshot` to this component.
    ///
    /// # Errors
    ///
    /// See [`SnapshotError`].
    fn restore(&self, snapshot: &ComponentSnapshot) -> Result<(), SnapshotError>;
}

impl Snapshottable for Component {
    fn snapshot(&self) -> ComponentSnapshot {
        ComponentSnapshot {
            version: SNAPSHOT_VERSION,
            uid: self.uid(),
            kind: self.kind(),
            type_name: self.type_name().to_string(),
            connectors: self.connectors().iter().map(connector_snapshot).collect(),
        }
    }

    fn restore(&self, snapshot: &ComponentSnapshot) -> Result<(), SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                actual: snapshot.version,
            });
        }
        if snapshot.kind != self.kind() || snapshot.type_name != self.type_name() {
            return Err(SnapshotError::ComponentMismatch {
                expected: format!("{} {}", self.kind(), self.type_name()),
                actual: format!("{} {}", snapshot.kind, snapshot.type_name),
            });
        }

        let mut plan = Vec::with_capacity(snapshot.connectors.len());
        for stored in &snapshot.connectors {
            let connector = self.connector(&stored.name).map_err(|e| mismatch(stored, e))?;
            check_shape(connector, stored)?;
            plan.push((connector, stored));
        }

        self.set_uid(snapshot.uid)?;
        for (connector, stored) in plan {
            resize(connector, stored.pins.len())?;
            connector.set_uid(stored.uid)?;
            for (pin, state) in connector.pins().iter().zip(&stored.pins) {
                pin.set_uid(state.uid)?;
                pin.load(state.value.clone())?;
            }
        }

        debug!(
            component = %snapshot.uid,
            unit = %snapshot.type_name,
            connectors = snapshot.connectors.len(),
            "snapshot restored"
        );
        Ok(())
    }
}

fn connector_snapshot(connector: &Connector) -> ConnectorSnapshot {
    ConnectorSnapshot {
        uid: connector.uid(),
        name: connector.name().to_string(),
        binding: connector.descriptor().binding(),
        pins: connector
            .pins()
            .iter()
            .map(|pin| PinSnapshot {
                uid: pin.uid(),
                index: pin.index(),
                value: pin.value(),
            })
            .collect(),
    }
}

fn mismatch(stored: &ConnectorSnapshot, reason: impl ToString) -> SnapshotError {
    SnapshotError::ConnectorMismatch {
        name: stored.name.clone(),
        reason: reason.to_string(),
    }
}

fn check_shape(connector: &Connector, stored: &ConnectorSnapshot) -> Result<(), SnapshotError> {
    let expected = connector.descriptor().value_type();
    if let Some(found) = stored
        .pins
        .iter()
        .filter_map(|p| p.value.as_ref())
        .map(Value::value_type)
        .find(|t| *t != expected)
    {
        return Err(mismatch(
            stored,
            format!("expected {expected} values, found {found}"),
        ));
    }

    let count = stored.pins.len();
    match (connector, stored.binding) {
        (Connector::Static(_), Binding::Static) if count == 1 => Ok(()),
        (Connector::Static(_), Binding::Static) => {
            Err(mismatch(stored, format!("static slot with {count} pins")))
        }
        (Connector::Dynamic(c), Binding::Dynamic(_)) => {
            let bounds = c.bounds();
            let fits = count >= bounds.min && bounds.max.map_or(true, |max| count <= max);
            if fits {
                Ok(())
            } else {
                Err(mismatch(
                    stored,
                    format!("{count} pins outside bounds {}..{:?}", bounds.min, bounds.max),
                ))
            }
        }
        _ => Err(mismatch(stored, "binding kind differs")),
    }
}

fn resize(connector: &Connector, target: usize) -> Result<(), ConnectorError> {
    let Connector::Dynamic(c) = connector else {
        return Ok(());
    };
    c.try_increase(target);
    while c.size() > target {
        c.remove_pin(c.size() - 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Logic, Unit};
    use crate::error::ComponentError;
    use crate::slot::SlotTable;
    use crate::{LogicComponent, Slot, SlotList};
    use logix_types::assert_error_codes;

    #[derive(Default)]
    struct Scale {
        factor: Slot<f64>,
        samples: SlotList<f64>,
        scaled: SlotList<f64>,
    }

    impl Unit for Scale {
        fn type_name(&self) -> &'static str {
            "Scale"
        }

        fn declare(&self, slots: &mut SlotTable) {
            slots.input("factor", &self.factor);
            slots.input_list("samples", &self.samples).bounds(1, Some(4));
            slots.output_list("scaled", &self.scaled);
        }
    }

    impl Logic for Scale {
        fn logic(&mut self) -> Result<(), ComponentError> {
            Ok(())
        }
    }

    fn scale() -> Component {
        Component::from(LogicComponent::new(Scale::default()).expect("valid unit"))
    }

    fn grow(component: &Component, name: &str, size: usize) {
        component
            .connector(name)
            .expect("declared")
            .as_dynamic()
            .expect("dynamic")
            .try_increase(size);
    }

    #[test]
    fn snapshot_records_structure() {
        let component = scale();
        grow(&component, "samples", 3);
        component
            .pin("samples[1]")
            .expect("declared")
            .set_value(Some(Value::Float(2.5)))
            .expect("typed write");

        let snapshot = component.snapshot();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.kind, ComponentKind::Logic);
        assert_eq!(snapshot.type_name, "Scale");
        assert_eq!(
            snapshot
                .connectors
                .iter()
                .map(|c| (c.name.as_str(), c.pins.len()))
                .collect::<Vec<_>>(),
            vec![("factor", 1), ("samples", 3), ("scaled", 0)]
        );
        let samples = &snapshot.connectors[1];
        assert_eq!(samples.pins[1].index, Some(1));
        assert_eq!(samples.pins[1].value, Some(Value::Float(2.5)));
        assert_eq!(snapshot.connectors[0].pins[0].index, None);
    }

    #[test]
    fn restore_reproduces_identity_and_values() {
        let original = scale();
        grow(&original, "samples", 4);
        grow(&original, "scaled", 2);
        original
            .pin("factor")
            .expect("declared")
            .set_value(Some(Value::Float(1.5)))
            .expect("typed write");
        let json = original.snapshot().to_json().expect("serialize");

        let reloaded = scale();
        let snapshot = ComponentSnapshot::from_json(&json).expect("deserialize");
        reloaded.restore(&snapshot).expect("restore");

        assert_eq!(reloaded.uid(), original.uid());
        assert_eq!(reloaded.snapshot(), original.snapshot());
        let factor = reloaded.pin("factor").expect("declared");
        assert_eq!(factor.value(), Some(Value::Float(1.5)));
        assert!(!factor.is_refreshed());
        assert_eq!(factor.refresh_count(), 0);
    }

    #[test]
    fn restore_shrinks_dynamic_slots() {
        let original = scale();
        let reloaded = scale();
        grow(&reloaded, "samples", 4);
        reloaded.restore(&original.snapshot()).expect("restore");
        assert_eq!(reloaded.connector("samples").expect("declared").size(), 1);
    }

    #[test]
    fn restore_rejects_foreign_snapshot() {
        let component = scale();
        let mut snapshot = component.snapshot();
        snapshot.type_name = "Other".into();
        assert!(matches!(
            scale().restore(&snapshot),
            Err(SnapshotError::ComponentMismatch { .. })
        ));

        let mut snapshot = component.snapshot();
        snapshot.version = 99;
        assert!(matches!(
            scale().restore(&snapshot),
            Err(SnapshotError::VersionMismatch { actual: 99, .. })
        ));
    }

    #[test]
    fn restore_validates_before_writing() {
        let source = scale();
        let mut snapshot = source.snapshot();
        snapshot.connectors[1].pins.clear();

        let target = scale();
        let before = target.uid();
        let err = target.restore(&snapshot).expect_err("below min");
        assert!(matches!(err, SnapshotError::ConnectorMismatch { .. }));
        // Identity untouched: a later valid restore still succeeds.
        assert_eq!(target.uid(), before);
        target.restore(&source.snapshot()).expect("valid restore");
    }

    #[test]
    fn restore_rejects_unknown_connector() {
        let mut snapshot = scale().snapshot();
        snapshot.connectors[0].name = "gain".into();
        let err = scale().restore(&snapshot).expect_err("unknown slot");
        assert!(err.to_string().contains("'gain'"));
    }

    #[test]
    fn restore_twice_fails_on_identity() {
        let snapshot = scale().snapshot();
        let target = scale();
        target.restore(&snapshot).expect("first");
        assert!(matches!(
            target.restore(&snapshot),
            Err(SnapshotError::Uid(_))
        ));
    }

    #[test]
    fn snapshot_error_codes() {
        assert_error_codes(
            &[
                SnapshotError::VersionMismatch {
                    expected: 1,
                    actual: 2,
                },
                SnapshotError::ComponentMismatch {
                    expected: "a".into(),
                    actual: "b".into(),
                },
                SnapshotError::ConnectorMismatch {
                    name: "x".into(),
                    reason: "y".into(),
                },
                SnapshotError::Uid(UidError::AlreadyAssigned { current: Uid::new() }),
            ],
            "SNAPSHOT_",
        );
    }
}
