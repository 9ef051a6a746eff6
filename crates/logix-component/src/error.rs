//! Component layer errors.
//!
//! All errors implement [`ErrorCode`] for unified handling.
//!
//! | Error | Prefix | Raised by |
//! |-------|--------|-----------|
//! | [`ComponentError`] | `COMPONENT_` | unit wrapping, behavior hooks |
//! | [`ConnectorError`] | `CONNECTOR_` | pin writes, dynamic resizing |
//! | [`LookupError`] | `LOOKUP_` | name / UID facades |
//!
//! # Recoverability
//!
//! Bound violations are recoverable: the caller can remove or add a pin and
//! retry. An [`IntegrityViolation`](ConnectorError::IntegrityViolation) is a
//! defect in the engine and never recoverable.
//!
//! # Example
//!
//! ```
//! use logix_component::ConnectorError;
//! use logix_types::ErrorCode;
//!
//! let err = ConnectorError::MaximumBoundExceeded { slot: "values".into(), max: 3 };
//! assert_eq!(err.code(), "CONNECTOR_MAXIMUM_BOUND_EXCEEDED");
//! assert!(err.is_recoverable());
//! ```

use logix_types::{ErrorCode, Uid, UidError, ValueType};
use thiserror::Error;

/// Errors raised while wrapping or running a unit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComponentError {
    /// The unit's slot table is malformed.
    ///
    /// **Not recoverable** - fix the unit's `declare`.
    #[error("invalid slot declaration: {0}")]
    InvalidDeclaration(String),

    /// The `init` hook failed on first execution.
    #[error("initialization failed: {0}")]
    InitFailed(String),

    /// A behavior hook (`logic`, `accept`, `read`) failed.
    ///
    /// **Recoverable** - the next tick may succeed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

impl ErrorCode for ComponentError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidDeclaration(_) => "COMPONENT_INVALID_DECLARATION",
            Self::InitFailed(_) => "COMPONENT_INIT_FAILED",
            Self::ExecutionFailed(_) => "COMPONENT_EXECUTION_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::ExecutionFailed(_) | Self::InitFailed(_) => true,
            Self::InvalidDeclaration(_) => false,
        }
    }
}

/// Errors raised by connectors and pins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConnectorError {
    /// Insert would exceed the declared maximum occurrences.
    #[error("slot '{slot}' already holds the maximum of {max} pins")]
    MaximumBoundExceeded { slot: String, max: usize },

    /// Remove would drop below the declared minimum occurrences.
    #[error("slot '{slot}' already holds the minimum of {min} pins")]
    MinimumBoundExceeded { slot: String, min: usize },

    /// Pin index outside the current sequence.
    #[error("pin index {index} out of range for slot '{slot}' (size {size})")]
    IndexOutOfRange {
        slot: String,
        index: usize,
        size: usize,
    },

    /// Written value does not match the slot's declared type.
    #[error("slot '{slot}' expects {expected}, got {actual}")]
    TypeMismatch {
        slot: String,
        expected: ValueType,
        actual: ValueType,
    },

    /// Pin sequence and backing value sequence diverged.
    #[error("integrity violation in slot '{slot}': {detail}")]
    IntegrityViolation { slot: String, detail: String },

    /// Identity override rejected.
    #[error(transparent)]
    Uid(#[from] UidError),
}

impl ErrorCode for ConnectorError {
    fn code(&self) -> &'static str {
        match self {
            Self::MaximumBoundExceeded { .. } => "CONNECTOR_MAXIMUM_BOUND_EXCEEDED",
            Self::MinimumBoundExceeded { .. } => "CONNECTOR_MINIMUM_BOUND_EXCEEDED",
            Self::IndexOutOfRange { .. } => "CONNECTOR_INDEX_OUT_OF_RANGE",
            Self::TypeMismatch { .. } => "CONNECTOR_TYPE_MISMATCH",
            Self::IntegrityViolation { .. } => "CONNECTOR_INTEGRITY_VIOLATION",
            Self::Uid(_) => "CONNECTOR_UID_ALREADY_ASSIGNED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MaximumBoundExceeded { .. } | Self::MinimumBoundExceeded { .. }
        )
    }
}

/// Name or UID lookup miss.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The pin path is not `name` or `name[index]`.
    #[error("invalid pin path '{0}'")]
    InvalidPath(String),

    /// No slot of the requested shape exists.
    ///
    /// `indexed` tells whether a dynamic (`name[i]`) or a static (`name`)
    /// slot was requested.
    #[error("no {} slot named '{name}'", slot_shape(.indexed))]
    SlotNotFound { name: String, indexed: bool },

    /// The dynamic slot exists but has no pin at `index`.
    #[error("slot '{name}' has no pin at index {index} (size {size})")]
    IndexOutOfRange {
        name: String,
        index: usize,
        size: usize,
    },

    /// No slot of any shape carries this name.
    #[error("no slot named '{0}'")]
    UnknownSlot(String),

    #[error("component {0} not found")]
    ComponentNotFound(Uid),

    #[error("connector {0} not found")]
    ConnectorNotFound(Uid),

    #[error("pin {0} not found")]
    PinNotFound(Uid),
}

fn slot_shape(indexed: &bool) -> &'static str {
    if *indexed {
        "dynamic"
    } else {
        "static"
    }
}

impl ErrorCode for LookupError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "LOOKUP_INVALID_PATH",
            Self::SlotNotFound { .. } => "LOOKUP_SLOT_NOT_FOUND",
            Self::IndexOutOfRange { .. } => "LOOKUP_INDEX_OUT_OF_RANGE",
            Self::UnknownSlot(_) => "LOOKUP_UNKNOWN_SLOT",
            Self::ComponentNotFound(_) => "LOOKUP_COMPONENT_NOT_FOUND",
            Self::ConnectorNotFound(_) => "LOOKUP_CONNECTOR_NOT_FOUND",
            Self::PinNotFound(_) => "LOOKUP_PIN_NOT_FOUND",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logix_types::assert_error_codes;

    #[test]
    fn component_error_codes() {
        assert_error_codes(
            &[
                ComponentError::InvalidDeclaration("x".into()),
                ComponentError::InitFailed("x".into()),
                ComponentError::ExecutionFailed("x".into()),
            ],
            "COMPONENT_",
        );
        assert!(ComponentError::ExecutionFailed("x".into()).is_recoverable());
        assert!(!ComponentError::InvalidDeclaration("x".into()).is_recoverable());
    }

    #[test]
    fn connector_error_codes() {
        let all = vec![
            ConnectorError::MaximumBoundExceeded {
                slot: "s".into(),
                max: 1,
            },
            ConnectorError::MinimumBoundExceeded {
                slot: "s".into(),
                min: 1,
            },
            ConnectorError::IndexOutOfRange {
                slot: "s".into(),
                index: 4,
                size: 2,
            },
            ConnectorError::TypeMismatch {
                slot: "s".into(),
                expected: ValueType::Bool,
                actual: ValueType::Int,
            },
            ConnectorError::IntegrityViolation {
                slot: "s".into(),
                detail: "d".into(),
            },
            ConnectorError::Uid(UidError::AlreadyAssigned { current: Uid::new() }),
        ];
        assert_error_codes(&all, "CONNECTOR_");

        let recoverable: Vec<_> = all.iter().filter(|e| e.is_recoverable()).collect();
        assert_eq!(recoverable.len(), 2);
    }

    #[test]
    fn lookup_error_codes() {
        assert_error_codes(
            &[
                LookupError::InvalidPath("a[".into()),
                LookupError::SlotNotFound {
                    name: "a".into(),
                    indexed: false,
                },
                LookupError::IndexOutOfRange {
                    name: "a".into(),
                    index: 1,
                    size: 0,
                },
                LookupError::UnknownSlot("a".into()),
                LookupError::ComponentNotFound(Uid::new()),
                LookupError::ConnectorNotFound(Uid::new()),
                LookupError::PinNotFound(Uid::new()),
            ],
            "LOOKUP_",
        );
    }

    #[test]
    fn slot_not_found_message_names_shape() {
        let static_miss = LookupError::SlotNotFound {
            name: "a".into(),
            indexed: false,
        };
        let dynamic_miss = LookupError::SlotNotFound {
            name: "a".into(),
            indexed: true,
        };
        assert_eq!(static_miss.to_string(), "no static slot named 'a'");
        assert_eq!(dynamic_miss.to_string(), "no dynamic slot named 'a'");
    }
}
