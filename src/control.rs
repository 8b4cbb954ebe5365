//! # Minimal run handle with a completion guarantee.
//!
//! [`Control`] wraps a [`PhaseMachine`] and models "fire and must finish"
//! ownership: dropping a launched `Control` blocks the dropping thread until
//! the run reaches [`State::Complete`], then releases the worker thread.
//!
//! A `Control` built with [`Control::new`] is freestanding — no workload, no
//! thread; its state stays [`State::NotStarted`] and waiting on it returns
//! `false` immediately, since there is nothing that could ever succeed.
//!
//! # Example
//! ```
//! use jobvisor::Control;
//!
//! let idle = Control::new();
//! assert!(!idle.finished());
//! assert!(!idle.wait_for_result(None));
//! ```

use std::time::Duration;

use crate::gate::ExecGate;
use crate::machine::PhaseMachine;
use crate::state::{FailurePoint, State};
use crate::work::Workload;

/// Handle to one run; destruction blocks until the run completes.
#[derive(Default)]
pub struct Control {
    machine: Option<PhaseMachine>,
}

impl Control {
    /// Creates an unstarted, freestanding handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `work` and starts its worker thread; returns without blocking.
    ///
    /// The run uses the process-wide default [`ExecGate`].
    pub fn launch<W: Workload>(work: W) -> Self {
        Self::launch_with_gate(work, ExecGate::global())
    }

    /// Like [`Control::launch`], with an injected execution gate.
    pub fn launch_with_gate<W: Workload>(work: W, gate: ExecGate) -> Self {
        Self {
            machine: Some(PhaseMachine::spawn(work, FailurePoint::Incomplete, gate)),
        }
    }

    pub(crate) fn from_machine(machine: PhaseMachine) -> Self {
        Self {
            machine: Some(machine),
        }
    }

    /// Current lifecycle state; [`State::NotStarted`] for a freestanding handle.
    pub fn state(&self) -> State {
        match &self.machine {
            Some(machine) => machine.state(),
            None => State::NotStarted,
        }
    }

    /// True once the run has reached [`State::Complete`].
    pub fn finished(&self) -> bool {
        self.machine.as_ref().is_some_and(PhaseMachine::finished)
    }

    /// Blocks until the run completes or `timeout` elapses; returns the
    /// run's result so far (`false` on timeout, or for a freestanding
    /// handle, immediately).
    ///
    /// `None` waits indefinitely. Never cancels or mutates the run; safe to
    /// call repeatedly and from multiple threads.
    pub fn wait_for_result(&self, timeout: Option<Duration>) -> bool {
        match &self.machine {
            Some(machine) => machine.wait_for_result(timeout),
            None => false,
        }
    }
}

impl Drop for Control {
    /// Blocks until the run reaches [`State::Complete`], then releases the
    /// worker thread. Ownership of a `Control` is a completion guarantee.
    fn drop(&mut self) {
        if let Some(machine) = &mut self.machine {
            machine.join();
        }
    }
}
