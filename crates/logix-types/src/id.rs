//! Identifier types for logix.
//!
//! Components, connectors and pins all carry a [`Uid`]. Identities are
//! random UUID v4 values generated at construction; a loader restoring
//! persisted state may overwrite a fresh identity exactly once through
//! [`UidCell::assign`].

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::ErrorCode;

/// Opaque, comparable identifier for components, connectors and pins.
///
/// # Example
///
/// ```
/// use logix_types::Uid;
///
/// let a = Uid::new();
/// let b = Uid::new();
/// assert_ne!(a, b);
///
/// let parsed: Uid = a.to_string().parse().unwrap();
/// assert_eq!(a, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(Uuid);

impl Uid {
    /// Creates a new random [`Uid`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID, e.g. one read back from storage.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for Uid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Uid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identity errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UidError {
    /// The identity was already overridden once.
    #[error("uid {current} was already assigned")]
    AlreadyAssigned { current: Uid },
}

impl ErrorCode for UidError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyAssigned { .. } => "UID_ALREADY_ASSIGNED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Holder for an entity identity that can be overridden once.
///
/// Entities are built with a random identity. When a persisted entity is
/// reloaded, the loader replaces that identity with the stored one before
/// the entity is registered anywhere.
///
/// # Example
///
/// ```
/// use logix_types::{Uid, UidCell};
///
/// let cell = UidCell::new();
/// let stored = Uid::new();
///
/// cell.assign(stored).unwrap();
/// assert_eq!(cell.get(), stored);
/// assert!(cell.assign(Uid::new()).is_err());
/// ```
#[derive(Debug)]
pub struct UidCell {
    inner: Mutex<(Uid, bool)>,
}

impl UidCell {
    /// Creates a cell holding a fresh random identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new((Uid::new(), false)),
        }
    }

    /// Returns the current identity.
    #[must_use]
    pub fn get(&self) -> Uid {
        self.inner.lock().0
    }

    /// Returns `true` once [`assign`](Self::assign) succeeded.
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        self.inner.lock().1
    }

    /// Overrides the generated identity.
    ///
    /// # Errors
    ///
    /// [`UidError::AlreadyAssigned`] on the second call.
    pub fn assign(&self, uid: Uid) -> Result<(), UidError> {
        let mut inner = self.inner.lock();
        if inner.1 {
            return Err(UidError::AlreadyAssigned { current: inner.0 });
        }
        *inner = (uid, true);
        Ok(())
    }
}

impl Default for UidCell {
    fn default() -> Self {
        Self::new()
    }
}
