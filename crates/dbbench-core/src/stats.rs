//! Summary statistics over successful durations.
//!
//! These formulas are part of the result schema (see [`crate::result`]) and
//! must produce bit-identical output in every implementation:
//!
//! - **mean**: left-to-right sum of the durations in input order, divided by
//!   `n`, then clamped into `[min, max]` to absorb summation rounding
//! - **median**: durations sorted ascending (IEEE total order); the middle
//!   value for odd `n`, `(lo + hi) / 2` of the two middle values for even `n`
//! - **std**: sample standard deviation `sqrt(sum((x - mean)^2) / (n - 1))`,
//!   squares summed in input order; `0.0` when `n == 1`
//! - **min** / **max**: smallest and largest duration
//! - **count**: `n`

use serde::{Deserialize, Serialize};

/// Latency statistics for one (operation, database) group, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub count: u64,
}

impl OperationStats {
    /// Compute statistics over `durations`, in the order given.
    ///
    /// Returns `None` for an empty slice: groups without successful results
    /// are omitted rather than reported as zero or NaN.
    pub fn from_durations(durations: &[f64]) -> Option<Self> {
        let n = durations.len();
        if n == 0 {
            return None;
        }

        let mut sorted = durations.to_vec();
        sorted.sort_by(f64::total_cmp);
        let (min, max) = (sorted[0], sorted[n - 1]);

        let mut sum = 0.0;
        for &d in durations {
            sum += d;
        }
        let mean = (sum / n as f64).clamp(min, max);

        let std = if n < 2 {
            0.0
        } else {
            let mut squares = 0.0;
            for &d in durations {
                let diff = d - mean;
                squares += diff * diff;
            }
            (squares / (n - 1) as f64).sqrt()
        };

        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Some(Self {
            mean,
            median,
            std,
            min,
            max,
            count: n as u64,
        })
    }
}
