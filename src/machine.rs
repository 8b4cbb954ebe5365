//! # Drive one run of a workload through its lifecycle on a worker thread.
//!
//! [`PhaseMachine`] owns the run: the dedicated worker thread, the atomically
//! observable [`State`], the `finished`/`result` pair, and the WORKING-phase
//! wall-clock window. It is constructed already running and drives a run
//! exactly once.
//!
//! # High-level architecture
//!
//! ```text
//!   launching thread                     worker thread
//!   ┌──────────────────┐                 ┌─────────────────────────────┐
//!   │ PhaseMachine     │                 │ Setup ─► Working ─► Teardown│
//!   │  state()         │ ◄── atomics ──  │   │    step()+sleep loop    │
//!   │  wait_for_result │ ◄── condvar ──  │   ▼                         │
//!   │  cancel()        │ ── flag ──────► │ Complete (finished, result) │
//!   └──────────────────┘                 └─────────────────────────────┘
//! ```
//!
//! - A phase body reporting failure, or a configured [`FailurePoint`] match,
//!   marks the run failed as soon as that phase finishes; the remaining
//!   required phases still execute. Teardown in particular runs even after a
//!   failed setup or working phase.
//! - Cancellation takes effect at the next phase or step boundary: bodies not
//!   yet started are skipped (teardown included) and the run jumps straight
//!   to [`State::Complete`] with `result == false`.
//! - `wait_for_result` never cancels anything; a timeout only stops waiting.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::gate::ExecGate;
use crate::state::{FailurePoint, State};
use crate::work::{StepStatus, WorkContext, Workload};

/// Final outcome pair, guarded by the wait-protocol mutex.
#[derive(Default)]
struct Completion {
    finished: bool,
    result: bool,
}

/// Wall-clock window of the WORKING phase. `stopped` stays `None` while the
/// phase is still running, so `elapsed` keeps growing until the phase exits.
#[derive(Default)]
struct WorkWindow {
    started: Option<Instant>,
    stopped: Option<Instant>,
}

/// Shared between the worker thread (sole writer) and any number of readers.
struct Shared {
    state: AtomicU8,
    keep_going: Arc<AtomicBool>,
    done: Mutex<Completion>,
    signal: Condvar,
    window: Mutex<WorkWindow>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(State::NotStarted.as_u8()),
            keep_going: Arc::new(AtomicBool::new(true)),
            done: Mutex::new(Completion::default()),
            signal: Condvar::new(),
            window: Mutex::new(WorkWindow::default()),
        }
    }

    fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: State) {
        debug!(state = state.as_str(), "phase transition");
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn keep_going(&self) -> bool {
        self.keep_going.load(Ordering::Acquire)
    }

    // The Complete store happens inside the critical section so no reader
    // can observe `state() == Complete` while `finished()` still says false.
    fn finish(&self, result: bool) {
        let mut done = self.done.lock();
        self.set_state(State::Complete);
        done.finished = true;
        done.result = result;
        self.signal.notify_all();
    }

    fn close_window(&self) {
        let mut window = self.window.lock();
        if window.started.is_some() && window.stopped.is_none() {
            window.stopped = Some(Instant::now());
        }
    }
}

/// One run of one workload on one dedicated worker thread.
///
/// Constructed running via [`PhaseMachine::spawn`]; handle types decide what
/// happens to the thread when they go away ([`Control`](crate::Control) joins,
/// [`Job`](crate::Job) cancels and detaches).
pub struct PhaseMachine {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl PhaseMachine {
    /// Starts a worker thread driving `work` through the lifecycle.
    ///
    /// Returns without blocking; the worker begins running concurrently.
    pub fn spawn<W: Workload>(work: W, fail_after: FailurePoint, gate: ExecGate) -> Self {
        let shared = Arc::new(Shared::new());
        let worker_shared = shared.clone();
        let thread = thread::spawn(move || drive(work, &worker_shared, fail_after, gate));
        Self {
            shared,
            thread: Some(thread),
        }
    }

    /// Current lifecycle state, readable from any thread.
    pub fn state(&self) -> State {
        self.shared.state()
    }

    /// True once the run has reached [`State::Complete`].
    pub fn finished(&self) -> bool {
        self.shared.done.lock().finished
    }

    /// Blocks until the run completes or `timeout` elapses, whichever first.
    ///
    /// Returns the run's result: `true` only if the run finished with every
    /// applicable phase succeeding. A timeout returns `false` and leaves the
    /// run untouched. Safe to call repeatedly and from multiple threads.
    pub fn wait_for_result(&self, timeout: Option<Duration>) -> bool {
        let mut done = self.shared.done.lock();
        match timeout {
            None => {
                while !done.finished {
                    self.shared.signal.wait(&mut done);
                }
            }
            Some(limit) => {
                self.shared
                    .signal
                    .wait_while_for(&mut done, |d| !d.finished, limit);
            }
        }
        done.finished && done.result
    }

    /// Wall-clock time spent inside WORKING so far.
    ///
    /// Grows monotonically while the phase runs, freezes when it exits, and
    /// is zero if WORKING was never entered. Setup and teardown time is
    /// deliberately excluded.
    pub fn elapsed(&self) -> Duration {
        let window = self.shared.window.lock();
        match window.started {
            None => Duration::ZERO,
            Some(started) => window.stopped.unwrap_or_else(Instant::now) - started,
        }
    }

    /// Requests cancellation; returns immediately.
    ///
    /// The worker observes the flag at the next phase or step boundary, skips
    /// every body not yet started, and completes with `result == false`.
    pub fn cancel(&self) {
        self.shared.keep_going.store(false, Ordering::Release);
    }

    /// Blocks until the worker thread has fully exited.
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            // The completion guard in `drive` already recorded a panicking
            // workload as a failed run.
            let _ = handle.join();
        }
    }
}

// Dropping a PhaseMachine on its own detaches the worker thread; the handle
// types layer their opposing wait/cancel policies on top.

/// Completes the run when the worker-thread body exits, however it exits.
/// A panicking workload must still release every waiter, so the unwind path
/// reports the default `result = false`.
struct CompleteOnExit<'a> {
    shared: &'a Shared,
    result: bool,
}

impl Drop for CompleteOnExit<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            warn!("workload panicked; completing the run as failed");
        }
        self.shared.close_window();
        self.shared.finish(self.result);
    }
}

/// Worker-thread body: one run, exactly once.
fn drive<W: Workload>(mut work: W, shared: &Shared, fail_after: FailurePoint, gate: ExecGate) {
    let mut completion = CompleteOnExit {
        shared,
        result: false,
    };
    let cx = WorkContext::new(gate, shared.keep_going.clone());
    let mut failed = false;

    if shared.keep_going() {
        shared.set_state(State::Setup);
        if let Err(err) = work.setup(&cx) {
            warn!(error = %err, label = err.as_label(), "setup failed");
            failed = true;
        }
        if fail_after.triggers_after(State::Setup) {
            debug!(point = fail_after.as_label(), "injected failure");
            failed = true;
        }
    }

    // A failed setup never enters WORKING but still reaches teardown.
    if !failed && shared.keep_going() {
        shared.set_state(State::Working);
        shared.window.lock().started = Some(Instant::now());

        while shared.keep_going() {
            match work.step(&cx) {
                Ok(StepStatus::Done) => break,
                Ok(StepStatus::Continue) => cx.sleep(work.step_delay()),
                Err(err) => {
                    warn!(error = %err, label = err.as_label(), "step failed");
                    failed = true;
                    break;
                }
            }
        }

        shared.window.lock().stopped = Some(Instant::now());
        if fail_after.triggers_after(State::Working) {
            debug!(point = fail_after.as_label(), "injected failure");
            failed = true;
        }
    }

    // Teardown runs even after a failure; only cancellation skips it.
    if shared.keep_going() {
        shared.set_state(State::Teardown);
        if let Err(err) = work.teardown(&cx) {
            warn!(error = %err, label = err.as_label(), "teardown failed");
            failed = true;
        }
        if fail_after.triggers_after(State::Teardown) {
            debug!(point = fail_after.as_label(), "injected failure");
            failed = true;
        }
    }

    let cancelled = !shared.keep_going();
    if cancelled {
        debug!("run cancelled");
    }
    completion.result = !failed && !cancelled;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkError;
    use parking_lot::Mutex as PlMutex;

    /// Records which phase bodies ran, in order.
    #[derive(Clone, Default)]
    struct Probe {
        calls: Arc<PlMutex<Vec<&'static str>>>,
        steps_until_done: usize,
        fail_in: Option<&'static str>,
        step_delay: Duration,
    }

    impl Probe {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().clone()
        }

        fn record(&self, name: &'static str) -> Result<(), WorkError> {
            self.calls.lock().push(name);
            if self.fail_in == Some(name) {
                Err(WorkError::failed(name))
            } else {
                Ok(())
            }
        }
    }

    impl Workload for Probe {
        fn setup(&mut self, _cx: &WorkContext) -> Result<(), WorkError> {
            self.record("setup")
        }

        fn step(&mut self, _cx: &WorkContext) -> Result<StepStatus, WorkError> {
            self.record("step")?;
            if self.steps_until_done == 0 {
                return Ok(StepStatus::Done);
            }
            self.steps_until_done -= 1;
            Ok(StepStatus::Continue)
        }

        fn teardown(&mut self, _cx: &WorkContext) -> Result<(), WorkError> {
            self.record("teardown")
        }

        fn step_delay(&self) -> Duration {
            self.step_delay
        }
    }

    fn spawn(probe: &Probe, fail_after: FailurePoint) -> PhaseMachine {
        PhaseMachine::spawn(probe.clone(), fail_after, ExecGate::new())
    }

    #[test]
    fn test_clean_run_visits_every_phase_in_order() {
        let probe = Probe {
            steps_until_done: 2,
            ..Probe::default()
        };
        let machine = spawn(&probe, FailurePoint::Incomplete);

        assert!(machine.wait_for_result(None));
        assert!(machine.finished());
        assert_eq!(machine.state(), State::Complete);
        assert_eq!(
            probe.calls(),
            vec!["setup", "step", "step", "step", "teardown"]
        );
    }

    #[test]
    fn test_injected_setup_failure_skips_working_but_not_teardown() {
        let probe = Probe::default();
        let machine = spawn(&probe, FailurePoint::Setup);

        assert!(!machine.wait_for_result(None));
        assert_eq!(probe.calls(), vec!["setup", "teardown"]);
        assert_eq!(machine.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_injected_working_failure_still_tears_down() {
        let probe = Probe::default();
        let machine = spawn(&probe, FailurePoint::Working);

        assert!(!machine.wait_for_result(None));
        assert_eq!(probe.calls(), vec!["setup", "step", "teardown"]);
    }

    #[test]
    fn test_injected_teardown_failure_reports_after_running_it() {
        let probe = Probe::default();
        let machine = spawn(&probe, FailurePoint::Teardown);

        assert!(!machine.wait_for_result(None));
        assert_eq!(probe.calls(), vec!["setup", "step", "teardown"]);
    }

    #[test]
    fn test_step_error_is_absorbed_into_result() {
        let probe = Probe {
            fail_in: Some("step"),
            ..Probe::default()
        };
        let machine = spawn(&probe, FailurePoint::Incomplete);

        assert!(!machine.wait_for_result(None));
        assert!(machine.finished());
        assert_eq!(probe.calls(), vec!["setup", "step", "teardown"]);
    }

    #[test]
    fn test_cancel_skips_bodies_not_yet_started() {
        let probe = Probe {
            steps_until_done: 1_000,
            step_delay: Duration::from_millis(20),
            ..Probe::default()
        };
        let mut machine = spawn(&probe, FailurePoint::Incomplete);

        // Let it reach WORKING, then pull the plug.
        while machine.state() < State::Working {
            thread::sleep(Duration::from_millis(1));
        }
        machine.cancel();
        machine.join();

        assert_eq!(machine.state(), State::Complete);
        assert!(machine.finished());
        assert!(!machine.wait_for_result(None));
        assert!(!probe.calls().contains(&"teardown"));
    }

    #[test]
    fn test_wait_timeout_returns_false_without_cancelling() {
        let probe = Probe {
            steps_until_done: 4,
            step_delay: Duration::from_millis(60),
            ..Probe::default()
        };
        let machine = spawn(&probe, FailurePoint::Incomplete);

        assert!(!machine.wait_for_result(Some(Duration::from_millis(40))));
        // The run is unaffected and still completes successfully.
        assert!(machine.wait_for_result(None));
    }

    #[test]
    fn test_elapsed_covers_only_the_working_phase() {
        let probe = Probe {
            steps_until_done: 2,
            step_delay: Duration::from_millis(50),
            ..Probe::default()
        };
        let machine = spawn(&probe, FailurePoint::Incomplete);
        machine.wait_for_result(None);

        let elapsed = machine.elapsed();
        assert!(elapsed >= Duration::from_millis(100), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(400), "elapsed {elapsed:?}");
        // Frozen after completion.
        thread::sleep(Duration::from_millis(30));
        assert_eq!(machine.elapsed(), elapsed);
    }

    /// Panics in the named phase body.
    struct Exploder {
        phase: &'static str,
    }

    impl Workload for Exploder {
        fn setup(&mut self, _cx: &WorkContext) -> Result<(), WorkError> {
            if self.phase == "setup" {
                panic!("boom in setup");
            }
            Ok(())
        }

        fn step(&mut self, _cx: &WorkContext) -> Result<StepStatus, WorkError> {
            if self.phase == "step" {
                panic!("boom in step");
            }
            Ok(StepStatus::Done)
        }
    }

    #[test]
    fn test_panicking_setup_still_completes_the_run() {
        let machine = PhaseMachine::spawn(
            Exploder { phase: "setup" },
            FailurePoint::Incomplete,
            ExecGate::new(),
        );

        assert!(!machine.wait_for_result(Some(Duration::from_secs(2))));
        assert!(machine.finished());
        assert_eq!(machine.state(), State::Complete);
        // Unbounded waits must not hang either.
        assert!(!machine.wait_for_result(None));
    }

    #[test]
    fn test_panicking_step_freezes_elapsed() {
        let machine = PhaseMachine::spawn(
            Exploder { phase: "step" },
            FailurePoint::Incomplete,
            ExecGate::new(),
        );

        assert!(!machine.wait_for_result(None));
        let elapsed = machine.elapsed();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(machine.elapsed(), elapsed);
    }

    #[test]
    fn test_complete_state_implies_finished() {
        let probe = Probe {
            steps_until_done: 3,
            step_delay: Duration::from_millis(1),
            ..Probe::default()
        };
        let machine = spawn(&probe, FailurePoint::Incomplete);

        while machine.state() != State::Complete {
            thread::yield_now();
        }
        assert!(machine.finished());
        assert!(machine.wait_for_result(None));
    }

    #[test]
    fn test_result_is_false_until_finished() {
        let probe = Probe {
            steps_until_done: 3,
            step_delay: Duration::from_millis(30),
            ..Probe::default()
        };
        let machine = spawn(&probe, FailurePoint::Incomplete);
        assert!(!machine.wait_for_result(Some(Duration::ZERO)) || machine.finished());
        assert!(machine.wait_for_result(None));
    }
}
