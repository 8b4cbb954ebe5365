//! # Workload abstraction: the pluggable unit of work.
//!
//! A [`Workload`] supplies the three phase bodies the machine drives —
//! `setup`, `step`, `teardown` — plus the per-step delay. Each body receives a
//! [`WorkContext`] giving it the run's execution gate (for lock-releasing
//! waits) and cancellation visibility, so long bodies can exit cooperatively.
//!
//! # Example
//! ```
//! use jobvisor::{StepStatus, WorkContext, WorkError, Workload};
//!
//! struct Nop;
//!
//! impl Workload for Nop {
//!     fn step(&mut self, _cx: &WorkContext) -> Result<StepStatus, WorkError> {
//!         Ok(StepStatus::Done)
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::WorkError;
use crate::gate::ExecGate;

/// Outcome of one working step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    /// There is more work; the machine waits [`Workload::step_delay`] and
    /// calls [`Workload::step`] again.
    Continue,
    /// The workload finished its work; the machine moves on to teardown.
    Done,
}

/// Per-run context handed to every phase body.
///
/// Wraps the run's [`ExecGate`] and cancellation flag. Phase bodies that wait
/// should do so through [`WorkContext::sleep`]; bodies that loop should check
/// [`WorkContext::is_cancelled`] and return promptly once it flips.
pub struct WorkContext {
    gate: ExecGate,
    cancelled: Arc<AtomicBool>,
}

impl WorkContext {
    pub(crate) fn new(gate: ExecGate, cancelled: Arc<AtomicBool>) -> Self {
        Self { gate, cancelled }
    }

    /// Blocks for `d` with the lock-releasing wait variant.
    ///
    /// Never holds the shared execution gate, so concurrent runs' waits
    /// overlap instead of serializing.
    pub fn sleep(&self, d: Duration) {
        self.gate.sleep_for(d);
    }

    /// Returns the run's execution gate, for phase bodies that need a short
    /// exclusive section of their own via [`ExecGate::acquire`].
    pub fn gate(&self) -> &ExecGate {
        &self.gate
    }

    /// True once the owning handle has requested cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// # The capability set a unit of work must implement.
///
/// The machine invokes the bodies in a fixed order on the run's dedicated
/// worker thread: `setup` once, `step` repeatedly until it reports
/// [`StepStatus::Done`], `teardown` once. No body is re-entrant and no two
/// bodies of the same run ever execute concurrently.
///
/// Returning an `Err` from any body marks the run failed; teardown still runs
/// after a failed setup or step (resources must be released either way).
pub trait Workload: Send + 'static {
    /// Prepares resources before the first step. Default: nothing to do.
    fn setup(&mut self, _cx: &WorkContext) -> Result<(), WorkError> {
        Ok(())
    }

    /// Performs one unit of work, producing at most one output update.
    fn step(&mut self, cx: &WorkContext) -> Result<StepStatus, WorkError>;

    /// Releases resources after the last step. Default: nothing to do.
    fn teardown(&mut self, _cx: &WorkContext) -> Result<(), WorkError> {
        Ok(())
    }

    /// Wait performed by the machine after every [`StepStatus::Continue`],
    /// always with the lock-releasing variant. Default: no wait.
    fn step_delay(&self) -> Duration {
        Duration::ZERO
    }
}
