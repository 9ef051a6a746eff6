//! Units and the components wrapping them.
//!
//! A **unit** is caller-supplied behavior: a struct holding slot handles
//! plus whatever private state it needs. Wrapping a unit introspects it once
//! through [`Unit::declare`] and produces a **component** that owns the
//! connectors and carries identity.
//!
//! | Kind | Behavior trait | Connectors | Driven by |
//! |------|----------------|------------|-----------|
//! | Logic | [`Logic`] | inputs + outputs | `execute()` |
//! | Inbox | [`Inbox`] | outputs only | `accept(frame)` |
//! | Outbox | [`Outbox`] | inputs only | `read()` |
//!
//! # Example
//!
//! ```
//! use logix_component::{
//!     Component, ComponentError, Logic, LogicComponent, Slot, SlotTable, Unit,
//! };
//! use logix_types::Value;
//!
//! #[derive(Default)]
//! struct Invert {
//!     input: Slot<bool>,
//!     output: Slot<bool>,
//! }
//!
//! impl Unit for Invert {
//!     fn declare(&self, slots: &mut SlotTable) {
//!         slots.input("in", &self.input);
//!         slots.output("out", &self.output);
//!     }
//! }
//!
//! impl Logic for Invert {
//!     fn logic(&mut self) -> Result<(), ComponentError> {
//!         self.output.set(!self.input.get_or_default());
//!         Ok(())
//!     }
//! }
//!
//! let component = Component::from(LogicComponent::new(Invert::default())?);
//! component.as_logic().expect("logic component").execute()?;
//! assert_eq!(component.pin("out")?.value(), Some(Value::Bool(true)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::capability::{HasInputs, HasOutputs, Identifiable};
use crate::connector::{Connector, ConnectorSet};
use crate::error::{ComponentError, LookupError};
use crate::logic::{
    clear_refresh, mark_changed, output_values, take_input_refresh, ExecutionStats,
    LogicComponent,
};
use crate::pin::Pin;
use crate::slot::SlotTable;
use logix_types::{Uid, UidCell, UidError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Declares a unit's slots.
pub trait Unit: Send + 'static {
    /// Name recorded in slot descriptors and snapshots.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Registers every slot handle the unit owns. Called once, at wrap time.
    fn declare(&self, slots: &mut SlotTable);
}

/// Behavior of an executable unit.
pub trait Logic: Unit {
    /// Runs at the start of every pass.
    fn start(&mut self) {}

    /// Runs once, on the first pass, before `logic`.
    ///
    /// # Errors
    ///
    /// Aborts the first pass; `logic` is not invoked.
    fn init(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Recomputes outputs from inputs.
    ///
    /// # Errors
    ///
    /// Aborts the pass; no output is marked refreshed.
    fn logic(&mut self) -> Result<(), ComponentError>;

    /// Runs at the end of every pass that did not fail.
    fn end(&mut self) {}
}

/// Behavior of a unit fed by external frames.
pub trait Inbox: Unit {
    /// Decodes `frame` into the unit's output slots.
    ///
    /// # Errors
    ///
    /// Rejects a frame the unit cannot decode.
    fn accept(&mut self, frame: &[u8]) -> Result<(), ComponentError>;
}

/// Behavior of a unit read by external consumers.
pub trait Outbox: Unit {
    /// Encodes the unit's input slots into a frame, `None` when there is
    /// nothing to send.
    ///
    /// # Errors
    ///
    /// Reports an encoding failure.
    fn read(&mut self) -> Result<Option<Vec<u8>>, ComponentError>;
}

/// Kind of a wrapped unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Logic,
    Inbox,
    Outbox,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logic => write!(f, "logic"),
            Self::Inbox => write!(f, "inbox"),
            Self::Outbox => write!(f, "outbox"),
        }
    }
}

/// Identity and connectors shared by every component kind.
#[derive(Debug)]
pub(crate) struct ComponentCore {
    uid: UidCell,
    type_name: &'static str,
    connectors: ConnectorSet,
}

impl ComponentCore {
    pub(crate) fn wrap<U: Unit>(unit: &U, kind: ComponentKind) -> Result<Self, ComponentError> {
        let type_name = unit.type_name();
        let mut table = SlotTable::new(type_name);
        unit.declare(&mut table);
        let connectors = ConnectorSet::from_table(table)?;

        let stray = match kind {
            ComponentKind::Logic => None,
            ComponentKind::Inbox => connectors.inputs().first(),
            ComponentKind::Outbox => connectors.outputs().first(),
        };
        if let Some(connector) = stray {
            return Err(ComponentError::InvalidDeclaration(format!(
                "{type_name}: {kind} unit cannot declare {} slot '{}'",
                connector.direction(),
                connector.name()
            )));
        }

        let core = Self {
            uid: UidCell::new(),
            type_name,
            connectors,
        };
        debug!(
            component = %core.uid(),
            unit = type_name,
            %kind,
            inputs = core.connectors.inputs().len(),
            outputs = core.connectors.outputs().len(),
            "unit wrapped"
        );
        Ok(core)
    }

    pub(crate) fn uid(&self) -> Uid {
        self.uid.get()
    }

    pub(crate) fn set_uid(&self, uid: Uid) -> Result<(), UidError> {
        self.uid.assign(uid)
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn connectors(&self) -> &ConnectorSet {
        &self.connectors
    }
}

/// A wrapped [`Inbox`] unit.
pub struct InboxComponent {
    core: ComponentCore,
    unit: Mutex<Box<dyn Inbox>>,
}

impl InboxComponent {
    /// # Errors
    ///
    /// [`ComponentError::InvalidDeclaration`] if the unit declares inputs or
    /// its slot table is malformed.
    pub fn new<U: Inbox>(unit: U) -> Result<Self, ComponentError> {
        let core = ComponentCore::wrap(&unit, ComponentKind::Inbox)?;
        Ok(Self {
            core,
            unit: Mutex::new(Box::new(unit)),
        })
    }

    /// Feeds one frame to the unit.
    ///
    /// Output flags are cleared first; afterwards outputs that changed, or
    /// are Always-trigger, are marked refreshed. Returns how many were
    /// marked.
    ///
    /// # Errors
    ///
    /// The unit's `accept` error. Outputs it changed before failing are still
    /// marked.
    pub fn accept(&self, frame: &[u8]) -> Result<usize, ComponentError> {
        let mut unit = self.unit.lock();
        let outputs = self.core.connectors.output_pins();
        clear_refresh(&outputs);
        let before = output_values(&outputs);
        let result = unit.accept(frame);
        let marked = mark_changed(&outputs, &before);
        result.map(|()| marked)
    }

    #[must_use]
    pub fn uid(&self) -> Uid {
        self.core.uid()
    }

    #[must_use]
    pub fn connectors(&self) -> &ConnectorSet {
        self.core.connectors()
    }
}

impl fmt::Debug for InboxComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboxComponent")
            .field("uid", &self.core.uid())
            .field("type_name", &self.core.type_name())
            .finish_non_exhaustive()
    }
}

impl Identifiable for InboxComponent {
    fn uid(&self) -> Uid {
        self.core.uid()
    }

    fn type_name(&self) -> &str {
        self.core.type_name()
    }
}

impl HasOutputs for InboxComponent {
    fn outputs(&self) -> &[Connector] {
        self.core.connectors().outputs()
    }
}

struct OutboxState {
    unit: Box<dyn Outbox>,
    reads: u64,
    last_input_count: usize,
}

/// A wrapped [`Outbox`] unit.
pub struct OutboxComponent {
    core: ComponentCore,
    state: Mutex<OutboxState>,
}

impl OutboxComponent {
    /// # Errors
    ///
    /// [`ComponentError::InvalidDeclaration`] if the unit declares outputs or
    /// its slot table is malformed.
    pub fn new<U: Outbox>(unit: U) -> Result<Self, ComponentError> {
        let core = ComponentCore::wrap(&unit, ComponentKind::Outbox)?;
        Ok(Self {
            core,
            state: Mutex::new(OutboxState {
                unit: Box::new(unit),
                reads: 0,
                last_input_count: 0,
            }),
        })
    }

    /// Asks the unit for a frame.
    ///
    /// The unit is consulted on the first read and whenever inputs are
    /// refreshed (same rule as a logic pass); otherwise `Ok(None)`. Input
    /// flags are cleared on every read.
    ///
    /// # Errors
    ///
    /// The unit's `read` error.
    pub fn read(&self) -> Result<Option<Vec<u8>>, ComponentError> {
        let mut state = self.state.lock();
        let inputs = self.core.connectors.input_pins();
        let refreshed = take_input_refresh(&inputs, state.last_input_count);
        state.last_input_count = inputs.len();
        let first = state.reads == 0;
        state.reads += 1;

        if first || refreshed {
            state.unit.read()
        } else {
            Ok(None)
        }
    }

    #[must_use]
    pub fn uid(&self) -> Uid {
        self.core.uid()
    }

    #[must_use]
    pub fn connectors(&self) -> &ConnectorSet {
        self.core.connectors()
    }
}

impl fmt::Debug for OutboxComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboxComponent")
            .field("uid", &self.core.uid())
            .field("type_name", &self.core.type_name())
            .finish_non_exhaustive()
    }
}

impl Identifiable for OutboxComponent {
    fn uid(&self) -> Uid {
        self.core.uid()
    }

    fn type_name(&self) -> &str {
        self.core.type_name()
    }
}

impl HasInputs for OutboxComponent {
    fn inputs(&self) -> &[Connector] {
        self.core.connectors().inputs()
    }
}

/// Any wrapped unit.
#[derive(Debug)]
pub enum Component {
    Logic(LogicComponent),
    Inbox(InboxComponent),
    Outbox(OutboxComponent),
}

impl Component {
    pub(crate) fn core(&self) -> &ComponentCore {
        match self {
            Self::Logic(c) => c.core(),
            Self::Inbox(c) => &c.core,
            Self::Outbox(c) => &c.core,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Logic(_) => ComponentKind::Logic,
            Self::Inbox(_) => ComponentKind::Inbox,
            Self::Outbox(_) => ComponentKind::Outbox,
        }
    }

    #[must_use]
    pub fn uid(&self) -> Uid {
        self.core().uid()
    }

    /// Overrides the generated identity once.
    ///
    /// # Errors
    ///
    /// [`UidError::AlreadyAssigned`] on the second call.
    pub fn set_uid(&self, uid: Uid) -> Result<(), UidError> {
        self.core().set_uid(uid)
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.core().type_name()
    }

    #[must_use]
    pub fn connectors(&self) -> &ConnectorSet {
        self.core().connectors()
    }

    /// Execution statistics; `None` for inbox and outbox components.
    #[must_use]
    pub fn stats(&self) -> Option<ExecutionStats> {
        self.as_logic().map(LogicComponent::stats)
    }

    #[must_use]
    pub fn as_logic(&self) -> Option<&LogicComponent> {
        match self {
            Self::Logic(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_inbox(&self) -> Option<&InboxComponent> {
        match self {
            Self::Inbox(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_outbox(&self) -> Option<&OutboxComponent> {
        match self {
            Self::Outbox(c) => Some(c),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// See [`ConnectorSet::connector`].
    pub fn connector(&self, name: &str) -> Result<&Connector, LookupError> {
        self.connectors().connector(name)
    }

    /// # Errors
    ///
    /// See [`ConnectorSet::connector_by_uid`].
    pub fn connector_by_uid(&self, uid: Uid) -> Result<&Connector, LookupError> {
        self.connectors().connector_by_uid(uid)
    }

    /// Resolves `name` or `name[index]`.
    ///
    /// # Errors
    ///
    /// See [`ConnectorSet::pin`].
    pub fn pin(&self, path: &str) -> Result<Pin, LookupError> {
        self.connectors().pin(path)
    }

    /// # Errors
    ///
    /// See [`ConnectorSet::pin_by_uid`].
    pub fn pin_by_uid(&self, uid: Uid) -> Result<Pin, LookupError> {
        self.connectors().pin_by_uid(uid)
    }
}

impl From<LogicComponent> for Component {
    fn from(component: LogicComponent) -> Self {
        Self::Logic(component)
    }
}

impl From<InboxComponent> for Component {
    fn from(component: InboxComponent) -> Self {
        Self::Inbox(component)
    }
}

impl From<OutboxComponent> for Component {
    fn from(component: OutboxComponent) -> Self {
        Self::Outbox(component)
    }
}

impl Identifiable for Component {
    fn uid(&self) -> Uid {
        self.core().uid()
    }

    fn type_name(&self) -> &str {
        self.core().type_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Slot, SlotList};
    use logix_types::Value;

    /// Decodes a frame of big-endian `i64` into a dynamic output.
    #[derive(Default)]
    struct Decoder {
        readings: SlotList<i64>,
        frames: Slot<i64>,
    }

    impl Unit for Decoder {
        fn declare(&self, slots: &mut SlotTable) {
            slots.output_list("readings", &self.readings).bounds(2, Some(2));
            slots.output("frames", &self.frames).always();
        }
    }

    impl Inbox for Decoder {
        fn accept(&mut self, frame: &[u8]) -> Result<(), ComponentError> {
            if frame.len() != 16 {
                return Err(ComponentError::ExecutionFailed(format!(
                    "expected 16 bytes, got {}",
                    frame.len()
                )));
            }
            for (i, chunk) in frame.chunks_exact(8).enumerate() {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                self.readings.set(i, i64::from_be_bytes(bytes));
            }
            self.frames.set(self.frames.get_or_default() + 1);
            Ok(())
        }
    }

    /// Encodes a static input as a UTF-8 frame.
    #[derive(Default)]
    struct Encoder {
        text: Slot<String>,
    }

    impl Unit for Encoder {
        fn type_name(&self) -> &'static str {
            "Encoder"
        }

        fn declare(&self, slots: &mut SlotTable) {
            slots.input("text", &self.text);
        }
    }

    impl Outbox for Encoder {
        fn read(&mut self) -> Result<Option<Vec<u8>>, ComponentError> {
            Ok(Some(self.text.get_or_default().into_bytes()))
        }
    }

    fn frame(a: i64, b: i64) -> Vec<u8> {
        let mut frame = a.to_be_bytes().to_vec();
        frame.extend_from_slice(&b.to_be_bytes());
        frame
    }

    #[test]
    fn inbox_marks_changed_outputs() {
        let inbox = InboxComponent::new(Decoder::default()).expect("valid unit");
        let pins = inbox.output_pins();
        assert_eq!(pins.len(), 3);

        assert_eq!(inbox.accept(&frame(0, 7)).expect("decodes"), 2);
        assert!(!pins[0].is_refreshed());
        assert!(pins[1].is_refreshed());
        assert!(pins[2].is_refreshed());
        assert_eq!(pins[1].value(), Some(Value::Int(7)));

        // Same frame: only the Always-trigger counter refreshes.
        assert_eq!(inbox.accept(&frame(0, 7)).expect("decodes"), 1);
        assert!(!pins[1].is_refreshed());
        assert!(pins[2].is_refreshed());
    }

    #[test]
    fn inbox_nan_reading_refreshes_once() {
        #[derive(Default)]
        struct Gauge {
            level: Slot<f64>,
        }
        impl Unit for Gauge {
            fn declare(&self, slots: &mut SlotTable) {
                slots.output("level", &self.level);
            }
        }
        impl Inbox for Gauge {
            fn accept(&mut self, frame: &[u8]) -> Result<(), ComponentError> {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&frame[..8]);
                self.level.set(f64::from_be_bytes(bytes));
                Ok(())
            }
        }

        let inbox = InboxComponent::new(Gauge::default()).expect("valid unit");
        let nan = f64::NAN.to_be_bytes();
        assert_eq!(inbox.accept(&nan).expect("decodes"), 1);
        assert_eq!(inbox.accept(&nan).expect("decodes"), 0);
        assert_eq!(inbox.output_pins()[0].refresh_count(), 1);
    }

    #[test]
    fn inbox_reports_decode_error() {
        let inbox = InboxComponent::new(Decoder::default()).expect("valid unit");
        let err = inbox.accept(&[1, 2, 3]).expect_err("short frame");
        assert!(matches!(err, ComponentError::ExecutionFailed(_)));
    }

    #[test]
    fn outbox_reads_on_first_and_refresh() {
        let outbox = OutboxComponent::new(Encoder::default()).expect("valid unit");
        assert_eq!(outbox.read().expect("first read"), Some(Vec::new()));
        assert_eq!(outbox.read().expect("idle read"), None);

        let text = outbox.connectors().pin("text").expect("declared pin");
        text.set_value(Some(Value::from("hi"))).expect("typed write");
        assert_eq!(outbox.read().expect("refreshed"), Some(b"hi".to_vec()));
        assert_eq!(outbox.read().expect("idle again"), None);
    }

    #[test]
    fn kind_restrictions() {
        #[derive(Default)]
        struct Both {
            a: Slot<bool>,
            b: Slot<bool>,
        }
        impl Unit for Both {
            fn declare(&self, slots: &mut SlotTable) {
                slots.input("a", &self.a);
                slots.output("b", &self.b);
            }
        }
        impl Inbox for Both {
            fn accept(&mut self, _frame: &[u8]) -> Result<(), ComponentError> {
                Ok(())
            }
        }
        impl Outbox for Both {
            fn read(&mut self) -> Result<Option<Vec<u8>>, ComponentError> {
                Ok(None)
            }
        }

        let err = InboxComponent::new(Both::default()).expect_err("inbox with input");
        assert!(err.to_string().contains("cannot declare input slot 'a'"));
        let err = OutboxComponent::new(Both::default()).expect_err("outbox with output");
        assert!(err.to_string().contains("cannot declare output slot 'b'"));
    }

    #[test]
    fn component_facade() {
        let component = Component::from(OutboxComponent::new(Encoder::default()).expect("valid"));
        assert_eq!(component.kind(), ComponentKind::Outbox);
        assert_eq!(component.type_name(), "Encoder");
        assert!(component.stats().is_none());
        assert!(component.as_outbox().is_some());
        assert!(component.as_logic().is_none());

        let pin = component.pin("text").expect("declared");
        assert!(component.pin_by_uid(pin.uid()).expect("own pin").same(&pin));
        let connector = component.connector("text").expect("declared");
        assert_eq!(
            component
                .connector_by_uid(connector.uid())
                .expect("own connector")
                .name(),
            "text"
        );

        let uid = Uid::new();
        component.set_uid(uid).expect("first override");
        assert_eq!(component.uid(), uid);
        assert!(component.set_uid(Uid::new()).is_err());
    }

    #[test]
    fn default_type_name_is_rust_path() {
        let inbox = InboxComponent::new(Decoder::default()).expect("valid unit");
        assert!(Identifiable::type_name(&inbox).ends_with("Decoder"));
    }
}
