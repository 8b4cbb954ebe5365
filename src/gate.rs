//! # Shared exclusive execution gate and blocking-wait primitives.
//!
//! [`ExecGate`] models a process-wide exclusive lock of the kind some host
//! runtimes impose on all application threads: unless a thread explicitly
//! releases it around a blocking wait, every other thread's work serializes
//! behind it. The gate is an explicit, injectable value rather than a hidden
//! global, so the contrast between the two wait variants stays testable and
//! the design still makes sense on runtimes with no such lock at all.
//!
//! Two variants of "block this thread for duration `d`":
//!
//! - [`ExecGate::block_for`] — acquire the gate and **hold it** for the whole
//!   wait. N concurrent callers finish in ≈ N·d.
//! - [`ExecGate::sleep_for`] — wait **without holding** the gate. N concurrent
//!   callers finish in ≈ d.
//!
//! The per-step wait inside a run's WORKING phase always uses the releasing
//! variant; holding the gate there would cap the whole process at
//! single-worker throughput regardless of thread count.
//!
//! # Example
//! ```no_run
//! use jobvisor::{block_for_one_second, sleep_for_one_second, ExecGate};
//!
//! let gate = ExecGate::new();
//! sleep_for_one_second(&gate); // overlaps with other sleepers
//! block_for_one_second(&gate); // serializes with other holders
//! ```

use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

/// A cloneable handle to one shared exclusive execution lock.
///
/// Clones refer to the same underlying lock. [`ExecGate::global`] returns the
/// process-wide default used by launches that do not inject their own.
#[derive(Clone, Debug, Default)]
pub struct ExecGate {
    inner: Arc<Mutex<()>>,
}

/// RAII witness of exclusive gate ownership; releases on drop.
pub struct GateGuard<'a> {
    _held: MutexGuard<'a, ()>,
}

impl ExecGate {
    /// Creates a fresh gate, shared with nobody until cloned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the process-wide default gate.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<ExecGate> = OnceLock::new();
        GLOBAL.get_or_init(ExecGate::new).clone()
    }

    /// Acquires the gate exclusively, blocking until it is free.
    pub fn acquire(&self) -> GateGuard<'_> {
        GateGuard {
            _held: self.inner.lock(),
        }
    }

    /// Blocks for `d` while **holding** the gate (the lock-retaining variant).
    ///
    /// Exists to demonstrate and verify the serialization this causes; real
    /// phase code should never sleep under the gate.
    pub fn block_for(&self, d: Duration) {
        let _held = self.acquire();
        thread::sleep(d);
    }

    /// Blocks for `d` without touching the gate (the lock-releasing variant).
    ///
    /// Concurrent callers overlap freely; a batch of N completes in roughly
    /// the longest individual duration rather than their sum.
    pub fn sleep_for(&self, d: Duration) {
        thread::sleep(d);
    }
}

/// Diagnostic: one-second wait that holds the gate for its whole duration.
///
/// N threads calling this concurrently on the same gate take ≈ N seconds.
pub fn block_for_one_second(gate: &ExecGate) {
    gate.block_for(Duration::from_secs(1));
}

/// Diagnostic: one-second wait that leaves the gate free.
///
/// N threads calling this concurrently on the same gate take ≈ 1 second.
pub fn sleep_for_one_second(gate: &ExecGate) {
    gate.sleep_for(Duration::from_secs(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    const UNIT: Duration = Duration::from_millis(150);

    fn run_concurrently(gate: &ExecGate, n: usize, f: fn(&ExecGate, Duration)) -> Duration {
        let started = Instant::now();
        let handles: Vec<_> = (0..n)
            .map(|_| {
                let gate = gate.clone();
                thread::spawn(move || f(&gate, UNIT))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        started.elapsed()
    }

    #[test]
    fn test_retaining_waits_serialize() {
        let gate = ExecGate::new();
        let elapsed = run_concurrently(&gate, 3, ExecGate::block_for);
        assert!(elapsed >= UNIT * 3, "took only {elapsed:?}");
    }

    #[test]
    fn test_releasing_waits_overlap() {
        let gate = ExecGate::new();
        let elapsed = run_concurrently(&gate, 3, ExecGate::sleep_for);
        assert!(elapsed < UNIT * 2, "took {elapsed:?}");
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let gate = ExecGate::new();
        drop(gate.acquire());
        // A second acquire must not deadlock.
        drop(gate.acquire());
    }

    #[test]
    fn test_clones_share_one_lock() {
        let gate = ExecGate::new();
        let twin = gate.clone();
        let _held = gate.acquire();
        assert!(twin.inner.try_lock().is_none());
    }

    #[test]
    fn test_global_gate_is_one_instance() {
        let a = ExecGate::global();
        let b = ExecGate::global();
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
    }
}
