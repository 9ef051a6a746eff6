//! Reactive component model for logix.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  logix-types     : Uid, Value, ErrorCode                     │
//! │  logix-component : slots, pins, connectors, components ◄ HERE│
//! │  logix-runtime   : registry, link graph, engine, config      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Model
//!
//! ```text
//! Component ── owns ──► Connector ── owns ──► Pin
//!    │                     │                   │
//!    │ wraps               │ Static: 1 pin     │ value, refreshed,
//!    ▼                     │ Dynamic: min..max │ refresh_count
//!  Unit (Logic / Inbox / Outbox)
//! ```
//!
//! A unit holds [`Slot`] and [`SlotList`] handles as plain fields and lists
//! them in [`Unit::declare`]. Wrapping the unit builds one connector per
//! slot, sharing storage with the handle.
//!
//! # Refresh
//!
//! A pin's refresh flag means "changed since last observed". Writing a
//! different value (or any value to an Always-trigger slot) sets it; a
//! [`LogicComponent`] clears its input flags on every pass and decides from
//! them whether `logic()` must run. [`LogicComponent`] documents the full
//! state machine.
//!
//! # Concurrency
//!
//! - Dynamic connectors guard pins and values with one read/write lock.
//! - `execute()` is serialized per component.
//! - Nothing here spawns threads or blocks on I/O.

mod capability;
mod component;
mod connector;
mod error;
mod logic;
mod lookup;
mod pin;
mod slot;
mod snapshot;
mod storage;
pub mod testing;

// Re-export capability traits
pub use capability::{HasHistory, HasInputs, HasOutputs, Identifiable};

// Re-export units and components
pub use component::{
    Component, ComponentKind, Inbox, InboxComponent, Logic, Outbox, OutboxComponent, Unit,
};
pub use logic::{ExecutionReport, ExecutionState, ExecutionStats, LogicComponent};

// Re-export slot model
pub use connector::{Connector, ConnectorSet, DynamicConnector, StaticConnector};
pub use lookup::PinPath;
pub use pin::{DynamicPin, Pin, StaticPin};
pub use slot::{
    Binding, Cardinality, Direction, ListOptions, SlotDescriptor, SlotOptions, SlotTable,
    TriggerPolicy,
};
pub use storage::{Slot, SlotList};

// Re-export snapshot types
pub use snapshot::{
    ComponentSnapshot, ConnectorSnapshot, PinSnapshot, SnapshotError, Snapshottable,
    SNAPSHOT_VERSION,
};

// Re-export error types
pub use error::{ComponentError, ConnectorError, LookupError};
