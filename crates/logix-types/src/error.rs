//! Unified error interface for logix.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so that the
//! control surface sitting on top of the engine can tell a bound violation
//! from a missing pin without matching on concrete types.
//!
//! # Example
//!
//! ```
//! use logix_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum PinError {
//!     Missing,
//!     Busy,
//! }
//!
//! impl ErrorCode for PinError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Missing => "PIN_MISSING",
//!             Self::Busy => "PIN_BUSY",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//! }
//!
//! let err = PinError::Busy;
//! assert_eq!(err.code(), "PIN_BUSY");
//! assert!(err.is_recoverable());
//! ```

/// Machine-readable error classification.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**, e.g. `"CONNECTOR_MAXIMUM_BOUND_EXCEEDED"`
/// - **Layer prefix**: `UID_`, `COMPONENT_`, `CONNECTOR_`, `LOOKUP_`, ...
/// - **Stable**: codes are part of the API contract
///
/// # Recoverability
///
/// Recoverable errors are caller mistakes the caller can correct (a bound
/// hit, a stale index). Defects inside the engine are never recoverable.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether the caller can correct the condition and retry.
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows the workspace conventions.
///
/// # Panics
///
/// Panics if the code is empty, lacks `expected_prefix`, or is not
/// UPPER_SNAKE_CASE.
///
/// # Example
///
/// ```
/// use logix_types::{assert_error_code, ErrorCode};
///
/// struct Timeout;
///
/// impl ErrorCode for Timeout {
///     fn code(&self) -> &'static str { "ENGINE_TIMEOUT" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// assert_error_code(&Timeout, "ENGINE_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates every error in `errors`.
///
/// Use this with a list of all variants of an error enum.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
