//! # jobvisor
//!
//! **Jobvisor** is a small job-execution primitive for Rust.
//!
//! It runs one unit of work on a dedicated background thread through a fixed
//! four-phase lifecycle, exposes the live phase and a final pass/fail result
//! to the launching thread, and offers two handle types with opposite
//! ownership contracts for what happens when the handle goes away.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌───────────────┐      ┌──────────────────────┐
//!   │   Workload    │      │  JobInput (Count, …) │
//!   │ setup/step/   │ ◄─── │  validate + build    │
//!   │ teardown      │      └──────────┬───────────┘
//!   └───────┬───────┘                 │
//!           │   Control::launch()     │   launch()
//!           ▼                         ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │ PhaseMachine (one dedicated worker thread per run)         │
//! │  - atomically observable State                             │
//! │  - finished / result, condvar for wait_for_result          │
//! │  - WORKING-phase elapsed window                            │
//! │  - cancellation flag, honored at phase/step boundaries     │
//! └───────┬──────────────────────────────────────┬─────────────┘
//!         ▼                                      ▼
//!   ┌───────────────┐                      ┌───────────────┐
//!   │    Control    │                      │     Job       │
//!   │ drop: block   │                      │ drop: cancel  │
//!   │ until done    │                      │ and detach    │
//!   └───────────────┘                      └───────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! NotStarted ──► Setup ──► Working ──► Teardown ──► Complete
//!
//! worker thread {
//!   ├─► Setup:    workload.setup()
//!   ├─► Working:  loop { workload.step(); gate-releasing wait(step_delay) }
//!   │             (elapsed accumulates here, and only here)
//!   ├─► Teardown: workload.teardown()   — runs even after a failed phase
//!   └─► Complete: finished = true, result = no failure && not cancelled
//! }
//!
//! failure injection: fail_after = Setup | Working | Teardown forces a
//! failure at the end of that phase; later required phases still run
//! (Setup-fail skips Working but not Teardown).
//!
//! cancellation: takes effect at the next phase/step boundary; bodies not
//! yet started are skipped and the run jumps to Complete with result=false.
//! ```
//!
//! ## Blocking without serializing
//!
//! Every wait inside a phase goes through [`ExecGate`], an explicit shared
//! exclusive execution lock. The lock-releasing wait ([`ExecGate::sleep_for`])
//! lets N concurrent runs' waits overlap (batch ≈ max of the durations); the
//! lock-retaining wait ([`ExecGate::block_for`]) exists to demonstrate what
//! happens otherwise (batch ≈ sum). The WORKING-phase per-step wait always
//! uses the releasing variant.
//!
//! ## Example
//! ```
//! use jobvisor::{launch, Count};
//!
//! let input = Count {
//!     start: 1,
//!     end: 3,
//!     delay_ms: 10,
//!     ..Count::default()
//! };
//!
//! let job = launch(input).expect("valid range");
//! assert!(job.wait_for_result(None));
//! assert_eq!(job.output().last(), 3);
//! ```

mod control;
mod count;
mod error;
mod gate;
mod job;
mod machine;
mod state;
mod work;

// ---- Public re-exports ----

pub use control::Control;
pub use count::{Count, CountOutput, CountWork};
pub use error::{ConfigError, WorkError};
pub use gate::{block_for_one_second, sleep_for_one_second, ExecGate, GateGuard};
pub use job::{launch, launch_with_gate, Job, JobInput};
pub use machine::PhaseMachine;
pub use state::{FailurePoint, State};
pub use work::{StepStatus, WorkContext, Workload};
