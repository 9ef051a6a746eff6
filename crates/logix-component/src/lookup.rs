//! Name and UID lookup over a component's own connectors.
//!
//! Pin paths are either `name` (the pin of a static slot) or `name[index]`
//! (one pin of a dynamic slot). A path of the wrong shape for its slot is a
//! miss, not a coercion: `zones` never resolves to `zones[0]`.
//!
//! UID lookups scan only the component's own pins. Resolving a UID across
//! components is the registry's job.

use crate::connector::{Connector, ConnectorSet};
use crate::error::LookupError;
use crate::pin::Pin;
use logix_types::Uid;
use std::fmt;

/// A parsed pin path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinPath<'a> {
    pub name: &'a str,
    pub index: Option<usize>,
}

impl<'a> PinPath<'a> {
    /// Parses `name` or `name[index]`.
    ///
    /// # Errors
    ///
    /// [`LookupError::InvalidPath`] on an empty name, unbalanced brackets,
    /// a non-numeric index or trailing characters.
    pub fn parse(path: &'a str) -> Result<Self, LookupError> {
        let invalid = || LookupError::InvalidPath(path.to_string());
        let Some(open) = path.find('[') else {
            if path.is_empty() || path.contains(']') {
                return Err(invalid());
            }
            return Ok(Self { name: path, index: None });
        };

        let name = &path[..open];
        let rest = path[open + 1..].strip_suffix(']').ok_or_else(invalid)?;
        if name.is_empty() || rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let index = rest.parse().map_err(|_| invalid())?;
        Ok(Self {
            name,
            index: Some(index),
        })
    }
}

impl fmt::Display for PinPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => write!(f, "{}", self.name),
        }
    }
}

fn resolve(connectors: &[Connector], path: &str) -> Result<Pin, LookupError> {
    let path = PinPath::parse(path)?;
    let not_found = || LookupError::SlotNotFound {
        name: path.name.to_string(),
        indexed: path.index.is_some(),
    };

    let connector = connectors
        .iter()
        .find(|c| c.name() == path.name)
        .ok_or_else(not_found)?;

    match (connector, path.index) {
        (Connector::Static(c), None) => Ok(c.pin()),
        (Connector::Dynamic(c), Some(index)) => c.pin(index).map_err(|_| {
            LookupError::IndexOutOfRange {
                name: path.name.to_string(),
                index,
                size: c.size(),
            }
        }),
        _ => Err(not_found()),
    }
}

impl ConnectorSet {
    /// Finds a connector by slot name, inputs and outputs alike.
    ///
    /// # Errors
    ///
    /// [`LookupError::UnknownSlot`] if no slot has this name.
    pub fn connector(&self, name: &str) -> Result<&Connector, LookupError> {
        self.iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| LookupError::UnknownSlot(name.to_string()))
    }

    /// # Errors
    ///
    /// [`LookupError::ConnectorNotFound`] if no own connector has `uid`.
    pub fn connector_by_uid(&self, uid: Uid) -> Result<&Connector, LookupError> {
        self.iter()
            .find(|c| c.uid() == uid)
            .ok_or(LookupError::ConnectorNotFound(uid))
    }

    /// Resolves a pin path against inputs and outputs.
    ///
    /// # Errors
    ///
    /// - [`LookupError::InvalidPath`] if `path` is malformed
    /// - [`LookupError::SlotNotFound`] if no slot of the requested shape exists
    /// - [`LookupError::IndexOutOfRange`] if the dynamic slot is too short
    pub fn pin(&self, path: &str) -> Result<Pin, LookupError> {
        match resolve(self.inputs(), path) {
            Err(LookupError::SlotNotFound { .. }) => resolve(self.outputs(), path),
            found => found,
        }
    }

    /// Like [`pin`](Self::pin), restricted to inputs.
    ///
    /// # Errors
    ///
    /// Same as [`pin`](Self::pin).
    pub fn input_pin(&self, path: &str) -> Result<Pin, LookupError> {
        resolve(self.inputs(), path)
    }

    /// Like [`pin`](Self::pin), restricted to outputs.
    ///
    /// # Errors
    ///
    /// Same as [`pin`](Self::pin).
    pub fn output_pin(&self, path: &str) -> Result<Pin, LookupError> {
        resolve(self.outputs(), path)
    }

    /// # Errors
    ///
    /// [`LookupError::PinNotFound`] if no own pin has `uid`.
    pub fn pin_by_uid(&self, uid: Uid) -> Result<Pin, LookupError> {
        self.all_pins()
            .into_iter()
            .find(|p| p.uid() == uid)
            .ok_or(LookupError::PinNotFound(uid))
    }
}
