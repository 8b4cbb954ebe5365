//! # Lifecycle states and failure-injection points.
//!
//! A run moves through a fixed order of states, each set by the worker thread
//! and observable from any other thread:
//!
//! ```text
//! NotStarted ──► Setup ──► Working ──► Teardown ──► Complete
//!                  │          │           │
//!                  └──────────┴───────────┴── cancel ──► Complete
//! ```
//!
//! - Transitions are monotonic along that order; cancellation is the only way
//!   to jump ahead, and it always lands on [`State::Complete`].
//! - [`FailurePoint`] names the state after which a run should be forced to
//!   fail, for exercising downstream behavior. [`FailurePoint::Incomplete`]
//!   is the "never fail" sentinel and the default.

use std::fmt;

/// Observable lifecycle state of a run.
///
/// Written only by the worker thread; stored atomically so any thread may
/// read it without tearing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    /// No worker thread has been bound yet (freestanding handle).
    NotStarted,
    /// The workload's setup body is running.
    Setup,
    /// The workload is stepping; elapsed time accumulates here.
    Working,
    /// The workload's teardown body is running.
    Teardown,
    /// The run is over; `finished` is true and `result` is final.
    Complete,
}

impl State {
    /// Returns a stable, human-readable label for logs and polling loops.
    ///
    /// # Example
    /// ```
    /// use jobvisor::State;
    ///
    /// assert_eq!(State::NotStarted.as_str(), "not started");
    /// assert_eq!(State::Complete.as_str(), "complete");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            State::NotStarted => "not started",
            State::Setup => "setup",
            State::Working => "working",
            State::Teardown => "teardown",
            State::Complete => "complete",
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            State::NotStarted => 0,
            State::Setup => 1,
            State::Working => 2,
            State::Teardown => 3,
            State::Complete => 4,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> State {
        match raw {
            0 => State::NotStarted,
            1 => State::Setup,
            2 => State::Working,
            3 => State::Teardown,
            _ => State::Complete,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a run should be forced to fail, if anywhere.
///
/// Configured before launch and immutable once a run starts. When set to one
/// of the three phase values, the machine marks the run failed as soon as that
/// phase's body finishes; later required phases still execute (teardown in
/// particular is never skipped by an injected failure).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePoint {
    /// Never fail (sentinel; the default).
    #[default]
    Incomplete,
    /// Fail at the end of the setup phase; WORKING is never entered.
    Setup,
    /// Fail at the end of the working phase.
    Working,
    /// Fail at the end of the teardown phase.
    Teardown,
}

impl FailurePoint {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            FailurePoint::Incomplete => "incomplete",
            FailurePoint::Setup => "setup",
            FailurePoint::Working => "working",
            FailurePoint::Teardown => "teardown",
        }
    }

    /// True if this point forces a failure after `state`'s body completes.
    pub(crate) fn triggers_after(&self, state: State) -> bool {
        matches!(
            (self, state),
            (FailurePoint::Setup, State::Setup)
                | (FailurePoint::Working, State::Working)
                | (FailurePoint::Teardown, State::Teardown)
        )
    }
}
