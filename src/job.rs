//! # Job configuration seam and the fire-and-forget handle.
//!
//! [`JobInput`] is the bundle a caller hands to [`launch`]: a value-type
//! configuration that validates itself, names its failure-injection point,
//! and builds the run's live output plus workload. [`launch`] freezes the
//! input (moves it into the handle), spawns the machine, and returns a
//! [`Job`] immediately.
//!
//! ```text
//! JobInput ── launch() ──► PhaseMachine ──► worker thread
//!                │
//!                ▼
//!          Job { input (frozen), output (read-only live view), elapsed }
//! ```
//!
//! Ownership contract, opposite to [`Control`](crate::Control): dropping a
//! `Job` **never blocks**. It signals cancellation and detaches; the worker
//! unwinds to completion on its own. Callers that need the run to finish
//! call [`Job::wait_for_result`] first.
//!
//! The output view is read-only by construction: the worker thread is its
//! sole writer, and the output type exposes getters only, so there is no way
//! to race it from outside.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;
use crate::gate::ExecGate;
use crate::machine::PhaseMachine;
use crate::state::{FailurePoint, State};
use crate::work::Workload;

/// A launchable job description: configuration, output, and workload.
///
/// Implementors are plain value types, mutable freely before launch; launch
/// consumes the value, so nothing the caller keeps can affect a running job.
pub trait JobInput: Send + 'static {
    /// Live output written by the worker thread, read by everyone else.
    /// Must expose getters only; interior writes stay `pub(crate)`.
    type Output: Send + Sync + 'static;
    /// The workload driven by the machine.
    type Work: Workload;

    /// Rejects invalid configuration before any thread is spawned.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Failure-injection point for this run; the sentinel by default.
    fn fail_after(&self) -> FailurePoint {
        FailurePoint::Incomplete
    }

    /// Builds the shared output and the workload bound to it.
    fn build(&self) -> (Arc<Self::Output>, Self::Work);
}

/// Starts a run immediately on the process-wide default gate.
///
/// Never blocks: validation happens inline, the worker thread starts
/// concurrently, and the handle comes back at once.
///
/// # Errors
/// [`ConfigError`] if the input rejects its own configuration; no thread is
/// spawned in that case.
pub fn launch<I: JobInput>(input: I) -> Result<Job<I>, ConfigError> {
    launch_with_gate(input, ExecGate::global())
}

/// Like [`launch`], with an injected execution gate.
pub fn launch_with_gate<I: JobInput>(input: I, gate: ExecGate) -> Result<Job<I>, ConfigError> {
    input.validate()?;
    let (output, work) = input.build();
    let machine = PhaseMachine::spawn(work, input.fail_after(), gate);
    Ok(Job {
        input,
        output,
        machine,
    })
}

/// Handle to one launched run; destruction cancels and detaches.
pub struct Job<I: JobInput> {
    input: I,
    output: Arc<I::Output>,
    machine: PhaseMachine,
}

impl<I: JobInput> std::fmt::Debug for Job<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").finish_non_exhaustive()
    }
}

impl<I: JobInput> Job<I> {
    /// The configuration this run was launched with, frozen at launch.
    pub fn input(&self) -> &I {
        &self.input
    }

    /// Read-only live view of the run's output.
    ///
    /// Updated in real time by the worker thread; stable once
    /// [`Job::finished`] reports `true`.
    pub fn output(&self) -> &I::Output {
        &self.output
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.machine.state()
    }

    /// True once the run has reached [`State::Complete`].
    pub fn finished(&self) -> bool {
        self.machine.finished()
    }

    /// Wall-clock time spent in WORKING; zero before, frozen after.
    pub fn elapsed(&self) -> Duration {
        self.machine.elapsed()
    }

    /// Blocks until the run completes or `timeout` elapses; returns the
    /// run's result (`false` on timeout). `None` waits indefinitely. A
    /// timeout never cancels the run.
    pub fn wait_for_result(&self, timeout: Option<Duration>) -> bool {
        self.machine.wait_for_result(timeout)
    }

    /// Requests cancellation without waiting; the run completes with
    /// `result == false` at the next phase or step boundary.
    pub fn cancel(&self) {
        debug!("job cancellation requested");
        self.machine.cancel();
    }
}

impl<I: JobInput> Drop for Job<I> {
    /// Signals cancellation and returns immediately; the worker thread
    /// unwinds to [`State::Complete`] on its own. Ownership of a `Job` is
    /// best-effort cleanup, not a completion guarantee.
    fn drop(&mut self) {
        self.machine.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::Count;
    use std::thread;
    use std::time::Instant;

    fn quick_count() -> Count {
        Count {
            start: 1,
            end: 10,
            delay_ms: 50,
            ..Count::default()
        }
    }

    #[test]
    fn test_launch_rejects_invalid_config_before_spawning() {
        let bad = Count {
            start: 10,
            end: 1,
            ..Count::default()
        };
        let err = launch_with_gate(bad, ExecGate::new()).unwrap_err();
        assert_eq!(err, ConfigError::InvalidRange { start: 10, end: 1 });
    }

    #[test]
    fn test_input_is_frozen_into_the_handle() {
        let job = launch_with_gate(quick_count(), ExecGate::new()).unwrap();
        assert_eq!(job.input().end, 10);
        assert_eq!(job.input().delay_ms, 50);
        job.wait_for_result(None);
    }

    #[test]
    fn test_output_rises_to_the_configured_end() {
        let job = launch_with_gate(quick_count(), ExecGate::new()).unwrap();

        let mut previous = 0;
        while !job.finished() {
            let seen = job.output().last();
            assert!(seen >= previous, "output went backwards: {previous} -> {seen}");
            previous = seen;
            thread::sleep(Duration::from_millis(10));
        }
        assert!(job.wait_for_result(None));
        assert_eq!(job.output().last(), 10);
    }

    #[test]
    fn test_elapsed_excludes_setup_and_teardown() {
        let input = Count {
            start: 1,
            end: 2,
            delay_ms: 100,
            ..Count::default()
        };
        let job = launch_with_gate(input, ExecGate::new()).unwrap();
        assert!(job.wait_for_result(None));

        // Two working steps of 100ms; setup/teardown sleeps must not count.
        let elapsed = job.elapsed();
        assert!(elapsed >= Duration::from_millis(200), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(320), "elapsed {elapsed:?}");
    }

    #[test]
    fn test_drop_does_not_wait_for_the_run() {
        let job = launch_with_gate(quick_count(), ExecGate::new()).unwrap();

        let started = Instant::now();
        drop(job);
        // The full run would take ~600ms; dropping must not wait for it.
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_explicit_cancel_completes_with_failure() {
        let input = Count {
            start: 1,
            end: 1_000,
            delay_ms: 20,
            ..Count::default()
        };
        let job = launch_with_gate(input, ExecGate::new()).unwrap();
        while job.state() < State::Working {
            thread::sleep(Duration::from_millis(1));
        }
        job.cancel();
        assert!(!job.wait_for_result(None));
        assert_eq!(job.state(), State::Complete);
        assert!(job.output().last() < 1_000);
    }
}
