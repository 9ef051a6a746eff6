//! Small capability traits a component type implements as needed.
//!
//! | Trait | Logic | Inbox | Outbox |
//! |-------|:-----:|:-----:|:------:|
//! | [`Identifiable`] | ✓ | ✓ | ✓ |
//! | [`HasInputs`] | ✓ | | ✓ |
//! | [`HasOutputs`] | ✓ | ✓ | |
//! | [`HasHistory`] | ✓ | | |
//!
//! Code that only needs one facet takes `&impl HasOutputs` (or a `dyn`) and
//! works across kinds.

use crate::connector::Connector;
use crate::logic::{ExecutionState, ExecutionStats};
use crate::pin::Pin;
use logix_types::Uid;

/// Anything carrying a component identity.
pub trait Identifiable {
    fn uid(&self) -> Uid;

    /// Type name of the wrapped unit.
    fn type_name(&self) -> &str;
}

/// Components with input connectors.
pub trait HasInputs {
    fn inputs(&self) -> &[Connector];

    /// Current input pins, in declaration then index order.
    fn input_pins(&self) -> Vec<Pin> {
        self.inputs().iter().flat_map(Connector::pins).collect()
    }
}

/// Components with output connectors.
pub trait HasOutputs {
    fn outputs(&self) -> &[Connector];

    /// Current output pins, in declaration then index order.
    fn output_pins(&self) -> Vec<Pin> {
        self.outputs().iter().flat_map(Connector::pins).collect()
    }
}

/// Components that record execution statistics.
pub trait HasHistory {
    fn stats(&self) -> ExecutionStats;

    fn state(&self) -> ExecutionState {
        self.stats().state()
    }
}
