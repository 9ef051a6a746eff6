//! Executable components and the refresh-driven state machine.
//!
//! # State Machine
//!
//! ```text
//! ┌───────────────┐  first execute()   ┌─────────────┐
//! │ Uninitialized │ ─────────────────► │ Initialized │
//! │ executed == 0 │                    │ executed > 0│
//! └───────────────┘                    └─────────────┘
//! ```
//!
//! A failing hook ends the pass early with its error. The pass still counts
//! as executed, so a failed first pass leaves the component Initialized.

use crate::capability::{HasHistory, HasInputs, HasOutputs, Identifiable};
use crate::component::{ComponentCore, ComponentKind, Logic};
use crate::connector::{Connector, ConnectorSet};
use crate::error::ComponentError;
use crate::pin::Pin;
use logix_types::{same_value, Uid, UidError, Value};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Execution lifecycle of a logic component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Uninitialized,
    Initialized,
}

/// Counters readable while an execution is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Completed `execute()` calls, failed ones included.
    pub executed_count: u64,
    /// Times the `logic()` hook returned successfully.
    pub logic_count: u64,
    /// Accumulated wall-clock time spent in `execute()`.
    pub executed_time: Duration,
}

impl ExecutionStats {
    #[must_use]
    pub fn state(&self) -> ExecutionState {
        if self.executed_count == 0 {
            ExecutionState::Uninitialized
        } else {
            ExecutionState::Initialized
        }
    }
}

/// Outcome of one successful `execute()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    /// This pass performed the Uninitialized → Initialized transition.
    pub bootstrap: bool,
    /// `logic()` was invoked.
    pub logic_ran: bool,
    /// Output pins marked refreshed by this pass.
    pub refreshed_outputs: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct StatsCounters {
    executed_count: AtomicU64,
    logic_count: AtomicU64,
    executed_nanos: AtomicU64,
}

impl StatsCounters {
    fn load(&self) -> ExecutionStats {
        ExecutionStats {
            executed_count: self.executed_count.load(Ordering::Acquire),
            logic_count: self.logic_count.load(Ordering::Acquire),
            executed_time: Duration::from_nanos(self.executed_nanos.load(Ordering::Acquire)),
        }
    }
}

/// Records duration and count when dropped, including on unwind.
struct TimingGuard<'a> {
    stats: &'a StatsCounters,
    started: Instant,
}

impl<'a> TimingGuard<'a> {
    fn start(stats: &'a StatsCounters) -> Self {
        Self {
            stats,
            started: Instant::now(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for TimingGuard<'_> {
    fn drop(&mut self) {
        let nanos = u64::try_from(self.started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.stats.executed_nanos.fetch_add(nanos, Ordering::AcqRel);
        self.stats.executed_count.fetch_add(1, Ordering::AcqRel);
    }
}

/// Evaluates step 3 of a pass and clears every input flag.
pub(crate) fn take_input_refresh(inputs: &[Pin], last_count: usize) -> bool {
    let refreshed = inputs.len() != last_count
        || inputs.iter().any(|p| p.is_refreshed() || p.is_always());
    for pin in inputs {
        pin.set_refreshed(false);
    }
    refreshed
}

pub(crate) fn clear_refresh(pins: &[Pin]) {
    for pin in pins {
        pin.set_refreshed(false);
    }
}

pub(crate) fn output_values(outputs: &[Pin]) -> Vec<Option<Value>> {
    outputs.iter().map(Pin::value).collect()
}

/// Marks outputs whose value moved away from `before`, or that are
/// Always-trigger. Returns how many were marked.
pub(crate) fn mark_changed(outputs: &[Pin], before: &[Option<Value>]) -> usize {
    let mut marked = 0;
    for (pin, old) in outputs.iter().zip(before) {
        if pin.is_always() || !same_value(pin.value().as_ref(), old.as_ref()) {
            pin.set_refreshed(true);
            marked += 1;
        }
    }
    marked
}

struct Execution {
    unit: Box<dyn Logic>,
    last_input_count: usize,
}

/// A wrapped [`Logic`] unit with input and output connectors.
///
/// Each `execute()` runs one pass:
///
/// 1. `start()`
/// 2. Read input and output pins.
/// 3. Inputs count as refreshed if the input pin count changed since the
///    last pass, any input is refreshed, or any input is Always-trigger.
///    Every input flag is then cleared.
/// 4. First pass: `init()`, `logic()`, then every output marked refreshed.
/// 5. Later passes: output flags cleared; if inputs refreshed, `logic()`
///    runs and outputs that changed (or are Always-trigger) are marked
///    refreshed.
/// 6. `end()`
///
/// `execute()` is serialized per instance: concurrent callers block on a
/// non-reentrant lock. Statistics are atomics and never wait for it.
pub struct LogicComponent {
    core: ComponentCore,
    execution: Mutex<Execution>,
    stats: StatsCounters,
}

impl LogicComponent {
    /// Introspects `unit` and builds its connectors.
    ///
    /// # Errors
    ///
    /// [`ComponentError::InvalidDeclaration`] if the slot table is malformed.
    pub fn new<U: Logic>(unit: U) -> Result<Self, ComponentError> {
        let core = ComponentCore::wrap(&unit, ComponentKind::Logic)?;
        Ok(Self {
            core,
            execution: Mutex::new(Execution {
                unit: Box::new(unit),
                last_input_count: 0,
            }),
            stats: StatsCounters::default(),
        })
    }

    /// Runs one pass of the state machine.
    ///
    /// # Errors
    ///
    /// The first failing hook's error; the pass is still counted.
    pub fn execute(&self) -> Result<ExecutionReport, ComponentError> {
        let mut execution = self.execution.lock();
        let guard = TimingGuard::start(&self.stats);
        let bootstrap = self.stats.executed_count.load(Ordering::Acquire) == 0;

        let outcome = self.run(&mut execution, bootstrap);
        let elapsed = guard.elapsed();
        drop(guard);

        match outcome {
            Ok((logic_ran, refreshed_outputs)) => {
                debug!(
                    component = %self.core.uid(),
                    unit = self.core.type_name(),
                    bootstrap,
                    logic_ran,
                    refreshed_outputs,
                    "executed"
                );
                Ok(ExecutionReport {
                    bootstrap,
                    logic_ran,
                    refreshed_outputs,
                    elapsed,
                })
            }
            Err(err) => {
                debug!(
                    component = %self.core.uid(),
                    unit = self.core.type_name(),
                    error = %err,
                    "execution failed"
                );
                Err(err)
            }
        }
    }

    fn run(
        &self,
        execution: &mut Execution,
        bootstrap: bool,
    ) -> Result<(bool, usize), ComponentError> {
        execution.unit.start();

        let inputs = self.core.connectors().input_pins();
        let outputs = self.core.connectors().output_pins();

        let inputs_refreshed = take_input_refresh(&inputs, execution.last_input_count);
        execution.last_input_count = inputs.len();

        let (logic_ran, refreshed) = if bootstrap {
            execution.unit.init()?;
            execution.unit.logic()?;
            self.stats.logic_count.fetch_add(1, Ordering::AcqRel);
            for pin in &outputs {
                pin.set_refreshed(true);
            }
            (true, outputs.len())
        } else {
            clear_refresh(&outputs);
            if inputs_refreshed {
                let before = output_values(&outputs);
                execution.unit.logic()?;
                self.stats.logic_count.fetch_add(1, Ordering::AcqRel);
                (true, mark_changed(&outputs, &before))
            } else {
                (false, 0)
            }
        };

        execution.unit.end();
        Ok((logic_ran, refreshed))
    }

    pub(crate) fn core(&self) -> &ComponentCore {
        &self.core
    }

    #[must_use]
    pub fn uid(&self) -> Uid {
        self.core.uid()
    }

    /// Overrides the generated identity once.
    ///
    /// # Errors
    ///
    /// [`UidError::AlreadyAssigned`] on the second call.
    pub fn set_uid(&self, uid: Uid) -> Result<(), UidError> {
        self.core.set_uid(uid)
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.core.type_name()
    }

    #[must_use]
    pub fn connectors(&self) -> &ConnectorSet {
        self.core.connectors()
    }

    #[must_use]
    pub fn stats(&self) -> ExecutionStats {
        self.stats.load()
    }

    #[must_use]
    pub fn state(&self) -> ExecutionState {
        self.stats().state()
    }
}

impl std::fmt::Debug for LogicComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicComponent")
            .field("uid", &self.core.uid())
            .field("type_name", &self.core.type_name())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Identifiable for LogicComponent {
    fn uid(&self) -> Uid {
        self.core.uid()
    }

    fn type_name(&self) -> &str {
        self.core.type_name()
    }
}

impl HasInputs for LogicComponent {
    fn inputs(&self) -> &[Connector] {
        self.core.connectors().inputs()
    }
}

impl HasOutputs for LogicComponent {
    fn outputs(&self) -> &[Connector] {
        self.core.connectors().outputs()
    }
}

impl HasHistory for LogicComponent {
    fn stats(&self) -> ExecutionStats {
        self.stats.load()
    }
}
