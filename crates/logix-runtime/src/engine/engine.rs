//! Engine - UID-routed operations over a registry and a link graph.
//!
//! # Lock Order
//!
//! ```text
//! registry ──► links ──► (connector sequence locks)
//! ```
//!
//! Structural changes hold the registry write lock for their whole span,
//! so a reader never sees a pin that the registry and the link graph
//! disagree on. `execute()` only holds the registry long enough to clone
//! the component handle.

use super::error::EngineError;
use crate::config::EngineConfig;
use crate::link::{LinkGraph, LinkTable};
use crate::registry::Registry;
use logix_component::{
    Component, ComponentKind, ComponentSnapshot, Connector, DynamicConnector, ExecutionReport,
    Pin, Snapshottable,
};
use logix_types::{Uid, Value};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Control facade for an API surface.
///
/// # Example
///
/// ```
/// use logix_component::{ComponentError, Logic, LogicComponent, Slot, SlotTable, Unit};
/// use logix_runtime::Engine;
/// use logix_types::Value;
///
/// #[derive(Default)]
/// struct Invert {
///     input: Slot<bool>,
///     output: Slot<bool>,
/// }
///
/// impl Unit for Invert {
///     fn declare(&self, slots: &mut SlotTable) {
///         slots.input("in", &self.input);
///         slots.output("out", &self.output);
///     }
/// }
///
/// impl Logic for Invert {
///     fn logic(&mut self) -> Result<(), ComponentError> {
///         self.output.set(!self.input.get_or_default());
///         Ok(())
///     }
/// }
///
/// let engine = Engine::new();
/// let component = engine.add_component(LogicComponent::new(Invert::default())?)?;
/// let input = component.pin("in")?.uid();
///
/// engine.execute(component.uid())?;
/// engine.set_value(input, Some(Value::Bool(true)))?;
/// let report = engine.execute(component.uid())?;
///
/// assert!(report.logic_ran);
/// assert_eq!(component.pin("out")?.value(), Some(Value::Bool(false)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Engine<G: LinkGraph = LinkTable> {
    registry: RwLock<Registry>,
    links: RwLock<G>,
    slow_threshold: Duration,
}

impl Engine<LinkTable> {
    /// Creates an engine with default configuration and an in-memory link table.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &EngineConfig) -> Self {
        Self::with_links(LinkTable::new(), config)
    }
}

impl Default for Engine<LinkTable> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: LinkGraph> Engine<G> {
    /// Creates an engine over a caller-supplied link graph.
    #[must_use]
    pub fn with_links(links: G, config: &EngineConfig) -> Self {
        Self {
            registry: RwLock::new(Registry::new()),
            links: RwLock::new(links),
            slow_threshold: Duration::from_millis(config.execution.slow_threshold_ms),
        }
    }

    // === Components ===

    /// Registers a component and tracks its pins in the link graph.
    ///
    /// # Errors
    ///
    /// [`EngineError::Registry`] if any of its UIDs is taken.
    pub fn add_component(
        &self,
        component: impl Into<Component>,
    ) -> Result<Arc<Component>, EngineError> {
        let component = Arc::new(component.into());
        let mut registry = self.registry.write();
        registry.register(Arc::clone(&component))?;
        self.links.write().register(&component);
        Ok(component)
    }

    /// Restores persisted identity and values into a fresh component, then
    /// registers it.
    ///
    /// # Errors
    ///
    /// [`EngineError::Snapshot`] if the snapshot does not fit the component;
    /// otherwise as [`add_component`](Self::add_component).
    pub fn add_restored(
        &self,
        component: impl Into<Component>,
        snapshot: &ComponentSnapshot,
    ) -> Result<Arc<Component>, EngineError> {
        let component = component.into();
        component.restore(snapshot)?;
        self.add_component(component)
    }

    /// Deregisters a component, dropping every link touching its pins.
    ///
    /// # Errors
    ///
    /// [`EngineError::Lookup`] if `uid` is not a registered component.
    pub fn remove_component(&self, uid: Uid) -> Result<Arc<Component>, EngineError> {
        let mut registry = self.registry.write();
        let component = registry.deregister(uid)?;
        self.links.write().deregister(uid);
        Ok(component)
    }

    /// # Errors
    ///
    /// [`EngineError::Lookup`] on a miss.
    pub fn component(&self, uid: Uid) -> Result<Arc<Component>, EngineError> {
        Ok(self.registry.read().component(uid)?)
    }

    /// # Errors
    ///
    /// [`EngineError::Lookup`] on a miss.
    pub fn connector(&self, uid: Uid) -> Result<Connector, EngineError> {
        Ok(self.registry.read().connector(uid)?)
    }

    /// # Errors
    ///
    /// [`EngineError::Lookup`] on a miss.
    pub fn pin(&self, uid: Uid) -> Result<Pin, EngineError> {
        Ok(self.registry.read().pin(uid)?)
    }

    /// UIDs of all registered components, sorted.
    #[must_use]
    pub fn component_uids(&self) -> Vec<Uid> {
        let mut uids: Vec<Uid> = self.registry.read().components().map(|c| c.uid()).collect();
        uids.sort();
        uids
    }

    /// Snapshots of all registered components, sorted by UID.
    #[must_use]
    pub fn snapshots(&self) -> Vec<ComponentSnapshot> {
        let mut snapshots: Vec<ComponentSnapshot> = self
            .registry
            .read()
            .components()
            .map(|c| c.snapshot())
            .collect();
        snapshots.sort_by_key(|s| s.uid);
        snapshots
    }

    // === Structure ===

    /// Adds a pin to a dynamic connector, at `index` or at the end.
    ///
    /// # Errors
    ///
    /// - [`EngineError::StaticConnector`] for a static connector.
    /// - [`EngineError::Connector`] on a bound or index violation; nothing
    ///   changes.
    pub fn add_pin(&self, connector: Uid, index: Option<usize>) -> Result<Pin, EngineError> {
        let mut registry = self.registry.write();
        let (owner, dynamic) = dynamic_connector(&registry, connector)?;
        let pin = match index {
            Some(index) => dynamic.insert_pin(index)?,
            None => dynamic.add_pin()?,
        };
        self.sync(&mut registry, owner)?;
        Ok(pin)
    }

    /// Removes the pin at `index` from a dynamic connector. The removed pin
    /// is deregistered and unlinked.
    ///
    /// # Errors
    ///
    /// As [`add_pin`](Self::add_pin).
    pub fn remove_pin(&self, connector: Uid, index: usize) -> Result<Pin, EngineError> {
        let mut registry = self.registry.write();
        let (owner, dynamic) = dynamic_connector(&registry, connector)?;
        let pin = dynamic.remove_pin(index)?;
        self.sync(&mut registry, owner)?;
        Ok(pin)
    }

    /// Grows a dynamic connector toward `desired` pins, capped at its maximum.
    ///
    /// # Errors
    ///
    /// As [`add_pin`](Self::add_pin).
    pub fn grow(&self, connector: Uid, desired: usize) -> Result<Vec<Pin>, EngineError> {
        let mut registry = self.registry.write();
        let (owner, dynamic) = dynamic_connector(&registry, connector)?;
        let added = dynamic.try_increase(desired);
        self.sync(&mut registry, owner)?;
        Ok(added)
    }

    /// Reindexes a component whose dynamic connectors were resized without
    /// going through the engine.
    ///
    /// # Errors
    ///
    /// [`EngineError::Registry`] if the component is unknown.
    pub fn resync(&self, component: Uid) -> Result<(), EngineError> {
        let mut registry = self.registry.write();
        self.sync(&mut registry, component)
    }

    fn sync(&self, registry: &mut Registry, owner: Uid) -> Result<(), EngineError> {
        let report = registry.resync(owner)?;
        let component = registry.component(owner)?;
        self.links.write().register(&component);
        debug!(
            component = %owner,
            added = report.added.len(),
            removed = report.removed.len(),
            "component structure synced"
        );
        Ok(())
    }

    // === Values and execution ===

    /// Writes a pin by UID. Returns whether the write changed anything.
    ///
    /// # Errors
    ///
    /// [`EngineError::Lookup`] on a miss, [`EngineError::Connector`] on a
    /// type mismatch.
    pub fn set_value(&self, pin: Uid, value: Option<Value>) -> Result<bool, EngineError> {
        let pin = self.pin(pin)?;
        Ok(pin.set_value(value)?)
    }

    /// Runs one pass of a logic component.
    ///
    /// # Errors
    ///
    /// - [`EngineError::UnsupportedOperation`] for inbox and outbox components.
    /// - [`EngineError::Component`] if a hook fails.
    pub fn execute(&self, uid: Uid) -> Result<ExecutionReport, EngineError> {
        let component = self.component(uid)?;
        let logic = component
            .as_logic()
            .ok_or_else(|| unsupported(&component, "execute"))?;

        match logic.execute() {
            Ok(report) => {
                if report.elapsed > self.slow_threshold {
                    warn!(
                        component = %uid,
                        type_name = logic.type_name(),
                        elapsed = ?report.elapsed,
                        threshold = ?self.slow_threshold,
                        "slow execution"
                    );
                }
                debug!(
                    component = %uid,
                    logic_ran = report.logic_ran,
                    refreshed = report.refreshed_outputs,
                    "executed"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(component = %uid, error = %e, "execution failed");
                Err(e.into())
            }
        }
    }

    /// Feeds a frame to an inbox component. Returns the number of outputs
    /// refreshed.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnsupportedOperation`] for other kinds.
    pub fn accept(&self, uid: Uid, frame: &[u8]) -> Result<usize, EngineError> {
        let component = self.component(uid)?;
        let inbox = component
            .as_inbox()
            .ok_or_else(|| unsupported(&component, "accept"))?;
        Ok(inbox.accept(frame)?)
    }

    /// Polls an outbox component for a frame.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnsupportedOperation`] for other kinds.
    pub fn read(&self, uid: Uid) -> Result<Option<Vec<u8>>, EngineError> {
        let component = self.component(uid)?;
        let outbox = component
            .as_outbox()
            .ok_or_else(|| unsupported(&component, "read"))?;
        Ok(outbox.read()?)
    }

    // === Links ===

    /// Links an output pin to an input pin. Returns `false` if already linked.
    ///
    /// # Errors
    ///
    /// [`EngineError::Link`] on unknown pins or wrong directions.
    pub fn link(&self, source: Uid, target: Uid) -> Result<bool, EngineError> {
        Ok(self.links.write().link(source, target)?)
    }

    /// Removes one link. Returns whether it existed.
    pub fn unlink(&self, source: Uid, target: Uid) -> bool {
        self.links.write().unlink_pair(source, target)
    }

    /// Removes every link touching `pin`.
    pub fn unlink_all(&self, pin: Uid) -> usize {
        self.links.write().unlink(pin)
    }

    #[must_use]
    pub fn linked_pins(&self, pin: Uid) -> Vec<Uid> {
        self.links.read().linked_pins(pin)
    }
}

impl<G: LinkGraph> std::fmt::Debug for Engine<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("components", &self.registry.read().len())
            .field("slow_threshold", &self.slow_threshold)
            .finish_non_exhaustive()
    }
}

fn dynamic_connector(
    registry: &Registry,
    uid: Uid,
) -> Result<(Uid, Arc<DynamicConnector>), EngineError> {
    let connector = registry.connector(uid)?;
    let dynamic = connector
        .as_dynamic()
        .map(Arc::clone)
        .ok_or(EngineError::StaticConnector(uid))?;
    Ok((registry.connector_owner(uid)?, dynamic))
}

fn unsupported(component: &Component, operation: &'static str) -> EngineError {
    EngineError::UnsupportedOperation {
        uid: component.uid(),
        kind: component.kind(),
        operation,
    }
}
