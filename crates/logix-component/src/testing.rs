//! Test harness for logic units.
//!
//! [`LogicHarness`] wraps a unit in a [`LogicComponent`] and drives it by
//! slot path, without a registry or engine. Every pass is appended to an
//! execution log for assertions.
//!
//! # Example
//!
//! ```
//! use logix_component::testing::LogicHarness;
//! use logix_component::{ComponentError, Logic, Slot, SlotTable, Unit};
//!
//! #[derive(Default)]
//! struct Double {
//!     input: Slot<i64>,
//!     output: Slot<i64>,
//! }
//!
//! impl Unit for Double {
//!     fn declare(&self, slots: &mut SlotTable) {
//!         slots.input("in", &self.input);
//!         slots.output("out", &self.output);
//!     }
//! }
//!
//! impl Logic for Double {
//!     fn logic(&mut self) -> Result<(), ComponentError> {
//!         self.output.set(self.input.get_or_default() * 2);
//!         Ok(())
//!     }
//! }
//!
//! let mut harness = LogicHarness::new(Double::default())?;
//! harness.execute()?;
//! harness.set("in", 21_i64)?;
//! harness.execute()?;
//! assert_eq!(harness.output::<i64>("out"), Some(42));
//! assert!(harness.is_refreshed("out"));
//! assert_eq!(harness.log().len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::component::Logic;
use crate::error::{ComponentError, ConnectorError, LookupError};
use crate::logic::{ExecutionReport, LogicComponent};
use crate::pin::Pin;
use logix_types::{SlotType, Value};
use thiserror::Error;

/// Harness operation failure.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Connector(#[from] ConnectorError),
}

/// One recorded `execute()` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRecord {
    /// 1-based pass number.
    pub pass: u64,
    pub logic_ran: bool,
    /// Paths of the output pins refreshed by this pass.
    pub refreshed: Vec<String>,
    /// Error message if the pass failed.
    pub error: Option<String>,
}

/// Drives a [`LogicComponent`] by slot path.
#[derive(Debug)]
pub struct LogicHarness {
    component: LogicComponent,
    log: Vec<ExecutionRecord>,
}

impl LogicHarness {
    /// # Errors
    ///
    /// [`ComponentError::InvalidDeclaration`] if the unit's table is
    /// malformed.
    pub fn new<U: Logic>(unit: U) -> Result<Self, ComponentError> {
        Ok(Self {
            component: LogicComponent::new(unit)?,
            log: Vec::new(),
        })
    }

    #[must_use]
    pub fn component(&self) -> &LogicComponent {
        &self.component
    }

    /// Writes an input pin by path. Returns whether the pin was written.
    ///
    /// # Errors
    ///
    /// Lookup miss or type mismatch.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<bool, HarnessError> {
        let pin = self.component.connectors().input_pin(path)?;
        Ok(pin.set_value(Some(value.into()))?)
    }

    /// Appends pins to a dynamic input until it holds `size`.
    ///
    /// # Errors
    ///
    /// [`LookupError::UnknownSlot`] if `name` is not a dynamic input.
    pub fn grow(&self, name: &str, size: usize) -> Result<Vec<Pin>, HarnessError> {
        let connector = self
            .component
            .connectors()
            .inputs()
            .iter()
            .find(|c| c.name() == name)
            .and_then(|c| c.as_dynamic())
            .ok_or_else(|| LookupError::UnknownSlot(name.to_string()))?;
        Ok(connector.try_increase(size))
    }

    /// Runs one pass and records it.
    ///
    /// # Errors
    ///
    /// The pass's hook error, also recorded in the log.
    pub fn execute(&mut self) -> Result<ExecutionReport, ComponentError> {
        let result = self.component.execute();
        let refreshed = self
            .component
            .connectors()
            .outputs()
            .iter()
            .flat_map(|c| c.pins())
            .filter(Pin::is_refreshed)
            .map(|p| path_of(&p))
            .collect();
        self.log.push(ExecutionRecord {
            pass: self.component.stats().executed_count,
            logic_ran: result.as_ref().is_ok_and(|r| r.logic_ran),
            refreshed,
            error: result.as_ref().err().map(ToString::to_string),
        });
        result
    }

    /// Reads a pin by path as `T`; `None` on a miss or absent value.
    #[must_use]
    pub fn output<T: SlotType>(&self, path: &str) -> Option<T> {
        self.component
            .connectors()
            .pin(path)
            .ok()?
            .value()
            .as_ref()
            .and_then(T::from_value)
    }

    /// Refresh flag of a pin by path; `false` on a miss.
    #[must_use]
    pub fn is_refreshed(&self, path: &str) -> bool {
        self.component
            .connectors()
            .pin(path)
            .is_ok_and(|p| p.is_refreshed())
    }

    #[must_use]
    pub fn logic_count(&self) -> u64 {
        self.component.stats().logic_count
    }

    #[must_use]
    pub fn log(&self) -> &[ExecutionRecord] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

fn path_of(pin: &Pin) -> String {
    let name = pin.descriptor().name();
    match pin.index() {
        Some(index) => format!("{name}[{index}]"),
        None => name.to_string(),
    }
}
