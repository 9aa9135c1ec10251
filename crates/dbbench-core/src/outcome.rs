//! Outcome of a single timed attempt.

use std::time::{Duration, Instant};

use crate::error::OperationError;

/// Error text recorded when a failure carries no message of its own.
pub(crate) const UNKNOWN_ERROR: &str = "unknown error";

/// What happened when an operation was executed once.
///
/// Produced by a backend and consumed by the runner within one run; never
/// persisted directly.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    /// Elapsed wall-clock time of the attempt.
    pub duration: Duration,
    /// Whether the attempt completed without error.
    pub success: bool,
    /// Rows, nodes or edges touched. Zero for pure reads.
    pub records_affected: u64,
    /// Cause of the failure; `Some` iff `success` is false.
    pub error: Option<String>,
}

impl OperationOutcome {
    /// A successful attempt.
    pub fn success(duration: Duration, records_affected: u64) -> Self {
        Self {
            duration,
            success: true,
            records_affected,
            error: None,
        }
    }

    /// A failed attempt. An empty message is replaced so the error is never blank.
    pub fn failure(duration: Duration, error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = UNKNOWN_ERROR.to_string();
        }
        Self {
            duration,
            success: false,
            records_affected: 0,
            error: Some(error),
        }
    }

    /// Time exactly one driver call.
    ///
    /// The closure returns the number of records it touched. Only the closure
    /// is inside the measured window, so backends can pick parameters and
    /// clean up caches around it without skewing the latency.
    pub fn timed<F>(call: F) -> Self
    where
        F: FnOnce() -> Result<u64, OperationError>,
    {
        let start = Instant::now();
        let result = call();
        let elapsed = start.elapsed();

        match result {
            Ok(records) => Self::success(elapsed, records),
            Err(e) => Self::failure(elapsed, e.to_string()),
        }
    }
}
