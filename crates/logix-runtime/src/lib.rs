//! logix runtime - identity resolution and the control facade.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  logix-types     : Uid, Value, ErrorCode                     │
//! │  logix-component : slots, pins, connectors, components       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  logix-runtime (THIS CRATE)                                  │
//! │    registry/ : UID → component / connector / pin             │
//! │    link/     : output → input pin links                      │
//! │    engine/   : UID-routed operations for an API surface      │
//! │    config/   : layered TOML configuration                    │
//! │    logging   : tracing subscriber setup                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! ## [`registry`] - Identity Resolution
//!
//! - [`Registry`]: one instance per engine, never process-global
//! - [`RegistryError`]: duplicate or unknown UIDs
//!
//! ## [`link`] - Link Graph
//!
//! - [`LinkGraph`]: bookkeeping contract
//! - [`LinkTable`]: in-memory implementation
//!
//! ## [`engine`] - Control Facade
//!
//! - [`Engine`]: add/remove components, resize dynamic connectors, write
//!   pins, execute, link
//! - [`EngineError`]: wraps every lower-layer error, keeping its code
//!
//! ## [`config`] - Configuration
//!
//! - [`EngineConfig`](config::EngineConfig), loaded by
//!   [`ConfigLoader`](config::ConfigLoader)

pub mod config;
pub mod engine;
pub mod link;
pub mod logging;
pub mod registry;

pub use engine::{Engine, EngineError};
pub use link::{Link, LinkError, LinkGraph, LinkTable};
pub use registry::{Registry, RegistryError, Resync};
