//! Error types used by the jobvisor runtime and workloads.
//!
//! Two small enums with different audiences:
//!
//! - [`ConfigError`] — launch-time rejection of an invalid configuration.
//!   Surfaces as the `Err` of [`launch`](crate::launch) and never mid-run.
//! - [`WorkError`] — a phase body reporting failure. Absorbed by the phase
//!   machine: it flips the run's final `result` to `false` but never aborts
//!   the remaining required phases (teardown still runs).
//!
//! Both provide `as_label()` for stable snake_case identifiers in logs.

use thiserror::Error;

/// Errors detected while validating a job configuration at launch.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The counting range is inverted; the run would never terminate sanely.
    #[error("invalid range: end {end} < start {start}")]
    InvalidRange {
        /// Configured first value (inclusive).
        start: i64,
        /// Configured final value (inclusive).
        end: i64,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use jobvisor::ConfigError;
    ///
    /// let err = ConfigError::InvalidRange { start: 10, end: 1 };
    /// assert_eq!(err.as_label(), "config_invalid_range");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidRange { .. } => "config_invalid_range",
        }
    }
}

/// Failure reported by a workload phase body.
///
/// The machine logs the error and records the run as failed; it is never
/// propagated to the launching thread beyond the final boolean result.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkError {
    /// The phase body could not do its work.
    #[error("phase failed: {reason}")]
    Failed {
        /// Human-readable description of what went wrong.
        reason: String,
    },
}

impl WorkError {
    /// Convenience constructor for the common case.
    pub fn failed(reason: impl Into<String>) -> Self {
        WorkError::Failed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Failed { .. } => "work_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display_names_both_bounds() {
        let err = ConfigError::InvalidRange { start: 5, end: 2 };
        assert_eq!(err.to_string(), "invalid range: end 2 < start 5");
    }

    #[test]
    fn test_work_error_helper_and_label() {
        let err = WorkError::failed("disk on fire");
        assert_eq!(err.to_string(), "phase failed: disk on fire");
        assert_eq!(err.as_label(), "work_failed");
    }
}
