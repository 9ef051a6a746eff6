//! Engine layer errors.
//!
//! Wrapped errors keep the code of the layer that raised them, so a
//! caller sees `CONNECTOR_MAXIMUM_BOUND_EXCEEDED` rather than a generic
//! engine failure. Conditions detected by the engine itself carry the
//! `ENGINE_` prefix.
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`EngineError::StaticConnector`] | `ENGINE_STATIC_CONNECTOR` | Yes |
//! | [`EngineError::UnsupportedOperation`] | `ENGINE_UNSUPPORTED_OPERATION` | Yes |
//! | wrapped | inner code | inner |

use crate::link::LinkError;
use crate::registry::RegistryError;
use logix_component::{
    ComponentError, ComponentKind, ConnectorError, LookupError, SnapshotError,
};
use logix_types::{ErrorCode, Uid};
use thiserror::Error;

/// Engine facade error.
///
/// # Example
///
/// ```
/// use logix_component::LookupError;
/// use logix_runtime::EngineError;
/// use logix_types::{ErrorCode, Uid};
///
/// let err = EngineError::from(LookupError::PinNotFound(Uid::new()));
/// assert_eq!(err.code(), "LOOKUP_PIN_NOT_FOUND");
///
/// let err = EngineError::StaticConnector(Uid::new());
/// assert_eq!(err.code(), "ENGINE_STATIC_CONNECTOR");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Pins can only be added to or removed from dynamic connectors.
    #[error("connector {0} is static and cannot be resized")]
    StaticConnector(Uid),

    /// The component's kind does not offer the requested operation.
    #[error("{kind} component {uid} does not support {operation}")]
    UnsupportedOperation {
        uid: Uid,
        kind: ComponentKind,
        operation: &'static str,
    },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

impl ErrorCode for EngineError {
    fn code(&self) -> &'static str {
        match self {
            Self::StaticConnector(_) => "ENGINE_STATIC_CONNECTOR",
            Self::UnsupportedOperation { .. } => "ENGINE_UNSUPPORTED_OPERATION",
            Self::Lookup(e) => e.code(),
            Self::Connector(e) => e.code(),
            Self::Component(e) => e.code(),
            Self::Snapshot(e) => e.code(),
            Self::Registry(e) => e.code(),
            Self::Link(e) => e.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::StaticConnector(_) | Self::UnsupportedOperation { .. } => true,
            Self::Lookup(e) => e.is_recoverable(),
            Self::Connector(e) => e.is_recoverable(),
            Self::Component(e) => e.is_recoverable(),
            Self::Snapshot(e) => e.is_recoverable(),
            Self::Registry(e) => e.is_recoverable(),
            Self::Link(e) => e.is_recoverable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logix_types::assert_error_codes;

    #[test]
    fn own_codes_carry_prefix() {
        let uid = Uid::new();
        assert_error_codes(
            &[
                EngineError::StaticConnector(uid),
                EngineError::UnsupportedOperation {
                    uid,
                    kind: ComponentKind::Inbox,
                    operation: "execute",
                },
            ],
            "ENGINE_",
        );
    }

    #[test]
    fn wrapped_errors_delegate() {
        let err = EngineError::from(ConnectorError::MaximumBoundExceeded {
            slot: "zones".into(),
            max: 4,
        });
        assert_eq!(err.code(), "CONNECTOR_MAXIMUM_BOUND_EXCEEDED");
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "slot 'zones' already holds the maximum of 4 pins");

        let err = EngineError::from(RegistryError::DuplicateUid(Uid::new()));
        assert_eq!(err.code(), "REGISTRY_DUPLICATE_UID");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn unsupported_operation_display() {
        let uid = Uid::new();
        let err = EngineError::UnsupportedOperation {
            uid,
            kind: ComponentKind::Outbox,
            operation: "accept",
        };
        assert_eq!(
            err.to_string(),
            format!("outbox component {uid} does not support accept")
        );
    }
}
