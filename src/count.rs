//! # Reference workload: count between two numbers with a delay per step.
//!
//! [`Count`] does no useful work — not unless incrementing a counter and
//! sleeping count as useful work — but it exercises every part of the engine:
//!
//! - SETUP: one lock-releasing sleep of `delay_ms`, simulating setup.
//! - WORKING: writes `start..=end` (inclusive) to [`CountOutput::last`], one
//!   value per step, with the machine's per-step wait of `delay_ms` after
//!   each write.
//! - TEARDOWN: one lock-releasing sleep of `delay_ms`, simulating teardown.
//!
//! Setting [`Count::fail_after`] forces the run to fail at the end of the
//! named phase, for observing which later phases still execute.
//!
//! # Example
//! ```
//! use jobvisor::Count;
//!
//! let mut input = Count::default();
//! assert_eq!((input.start, input.end, input.delay_ms), (1, 100, 1000));
//!
//! // Mutable freely before launch; launch consumes the value.
//! input.end = 10;
//! input.delay_ms = 100;
//! ```

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigError, WorkError};
use crate::job::JobInput;
use crate::state::FailurePoint;
use crate::work::{StepStatus, WorkContext, Workload};

/// Configuration for one counting run.
///
/// A plain value type: mutate it freely, then hand it to
/// [`launch`](crate::launch), which validates and consumes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Count {
    /// First number in the sequence (inclusive).
    pub start: i64,
    /// Final number in the sequence (inclusive); must be ≥ `start`.
    pub end: i64,
    /// Per-step delay, also used once each by setup and teardown.
    pub delay_ms: u64,
    /// Optional forced failure at the end of the named phase.
    pub fail_after: FailurePoint,
}

impl Default for Count {
    fn default() -> Self {
        Self {
            start: 1,
            end: 100,
            delay_ms: 1000,
            fail_after: FailurePoint::Incomplete,
        }
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Count(start={}, end={}, delay_ms={})",
            self.start, self.end, self.delay_ms
        )
    }
}

/// Live output of a counting run.
///
/// Written once per WORKING step by the worker thread; everyone else gets
/// the getter. Starts at 0 until the first step lands.
#[derive(Debug, Default)]
pub struct CountOutput {
    last: AtomicI64,
}

impl CountOutput {
    /// The last number counted by the job thread.
    pub fn last(&self) -> i64 {
        self.last.load(Ordering::Acquire)
    }
}

/// The counting workload itself; built by [`Count`] at launch.
pub struct CountWork {
    /// Next value to write; `None` once the sequence is exhausted.
    next: Option<i64>,
    end: i64,
    delay: Duration,
    output: Arc<CountOutput>,
}

impl Workload for CountWork {
    fn setup(&mut self, cx: &WorkContext) -> Result<(), WorkError> {
        // Simulate setup happening.
        cx.sleep(self.delay);
        Ok(())
    }

    fn step(&mut self, _cx: &WorkContext) -> Result<StepStatus, WorkError> {
        let Some(value) = self.next else {
            return Ok(StepStatus::Done);
        };
        self.output.last.store(value, Ordering::Release);
        // Advancing only below `end` keeps the increment in range even when
        // the sequence runs all the way up to i64::MAX.
        self.next = if value < self.end { Some(value + 1) } else { None };
        Ok(StepStatus::Continue)
    }

    fn teardown(&mut self, cx: &WorkContext) -> Result<(), WorkError> {
        // Simulate teardown happening.
        cx.sleep(self.delay);
        Ok(())
    }

    fn step_delay(&self) -> Duration {
        self.delay
    }
}

impl JobInput for Count {
    type Output = CountOutput;
    type Work = CountWork;

    fn validate(&self) -> Result<(), ConfigError> {
        if self.end < self.start {
            return Err(ConfigError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    fn fail_after(&self) -> FailurePoint {
        self.fail_after
    }

    fn build(&self) -> (Arc<Self::Output>, Self::Work) {
        let output = Arc::new(CountOutput::default());
        let work = CountWork {
            next: Some(self.start),
            end: self.end,
            delay: Duration::from_millis(self.delay_ms),
            output: output.clone(),
        };
        (output, work)
    }
}
