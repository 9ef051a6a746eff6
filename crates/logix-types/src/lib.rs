//! Core types for logix.
//!
//! Foundational leaves of the reactive engine:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  logix-types     : Uid, Value, ErrorCode          ◄── HERE   │
//! │  logix-component : slots, pins, connectors, components       │
//! │  logix-runtime   : registry, link graph, engine, config      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use logix_types::{SlotType, Uid, Value, ValueType};
//!
//! let pin = Uid::new();
//! assert_ne!(pin, Uid::new());
//!
//! assert_eq!(ValueType::Int.default_value(), Some(Value::Int(0)));
//! assert_eq!(42_i64.into_value(), Value::Int(42));
//! ```

mod error;
mod id;
mod value;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{Uid, UidCell, UidError};
pub use value::{same_value, SlotType, Value, ValueType};
