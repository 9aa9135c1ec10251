//! The benchmark result record exchanged between runner, analyzer and storage.
//!
//! # Schema (version 1)
//!
//! | column             | type    | notes                                   |
//! |--------------------|---------|-----------------------------------------|
//! | `operation`        | string  | stable across vendors                   |
//! | `database`         | string  | logical database under test             |
//! | `vendor`           | string  | backend implementation, may equal above |
//! | `duration_ms`      | float   | finite, non-negative                    |
//! | `success`          | bool    | `true` / `false`                        |
//! | `records_affected` | integer | non-negative                            |
//! | `error`            | string  | present iff `success` is false          |
//!
//! Any independent implementation of the analyzer must read exactly these
//! columns and apply the formulas documented in [`crate::stats`]. Changing
//! either requires bumping [`SCHEMA_VERSION`].

use serde::{Deserialize, Serialize};

use crate::outcome::{OperationOutcome, UNKNOWN_ERROR};
use crate::runner::Target;

/// Version of the record layout and statistics formulas.
pub const SCHEMA_VERSION: u32 = 1;

/// Column names of the row export, in order.
pub const COLUMNS: [&str; 7] = [
    "operation",
    "database",
    "vendor",
    "duration_ms",
    "success",
    "records_affected",
    "error",
];

/// Columns a row export must carry. `error` may be omitted entirely.
pub(crate) const REQUIRED_COLUMNS: [&str; 6] = [
    "operation",
    "database",
    "vendor",
    "duration_ms",
    "success",
    "records_affected",
];

/// One durable record of a single timed attempt.
///
/// Immutable once created: fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResult")]
pub struct BenchmarkResult {
    operation: String,
    database: String,
    vendor: String,
    duration_ms: f64,
    success: bool,
    records_affected: u64,
    error: Option<String>,
}

impl BenchmarkResult {
    /// Record a successful attempt.
    ///
    /// A negative or NaN duration is stored as `0.0` and an infinite one as
    /// `f64::MAX`, so every record can be read back from an export.
    pub fn succeeded(
        operation: impl Into<String>,
        database: impl Into<String>,
        vendor: impl Into<String>,
        duration_ms: f64,
        records_affected: u64,
    ) -> Self {
        Self {
            operation: operation.into(),
            database: database.into(),
            vendor: vendor.into(),
            duration_ms: clamp_duration(duration_ms),
            success: true,
            records_affected,
            error: None,
        }
    }

    /// Record a failed attempt.
    ///
    /// Durations are normalised as in [`BenchmarkResult::succeeded`]. A blank
    /// error is replaced with a placeholder.
    pub fn failed(
        operation: impl Into<String>,
        database: impl Into<String>,
        vendor: impl Into<String>,
        duration_ms: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            database: database.into(),
            vendor: vendor.into(),
            duration_ms: clamp_duration(duration_ms),
            success: false,
            records_affected: 0,
            error: Some(error_text(Some(error.into()))),
        }
    }

    /// Build the record for one runner attempt.
    pub fn from_outcome(operation: &str, target: &Target, outcome: &OperationOutcome) -> Self {
        // Integer nanoseconds keep whole-millisecond durations exact.
        let duration_ms = outcome.duration.as_nanos() as f64 / 1_000_000.0;

        Self {
            operation: operation.to_string(),
            database: target.database().to_string(),
            vendor: target.vendor().to_string(),
            duration_ms,
            success: outcome.success,
            records_affected: outcome.records_affected,
            error: if outcome.success {
                None
            } else {
                Some(error_text(outcome.error.clone()))
            },
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn records_affected(&self) -> u64 {
        self.records_affected
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

fn clamp_duration(ms: f64) -> f64 {
    if ms.is_nan() {
        0.0
    } else {
        ms.clamp(0.0, f64::MAX)
    }
}

fn error_text(error: Option<String>) -> String {
    error
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// Wire shape of a row before validation.
#[derive(Deserialize)]
struct RawResult {
    operation: String,
    database: String,
    vendor: String,
    duration_ms: f64,
    success: bool,
    records_affected: u64,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<RawResult> for BenchmarkResult {
    type Error = String;

    fn try_from(raw: RawResult) -> Result<Self, Self::Error> {
        if raw.operation.is_empty() {
            return Err("operation must not be empty".to_string());
        }
        if raw.database.is_empty() {
            return Err("database must not be empty".to_string());
        }
        if raw.vendor.is_empty() {
            return Err("vendor must not be empty".to_string());
        }
        if !raw.duration_ms.is_finite() || raw.duration_ms < 0.0 {
            return Err(format!(
                "duration_ms must be finite and non-negative, got {}",
                raw.duration_ms
            ));
        }

        let error = raw.error.filter(|e| !e.is_empty());
        match (raw.success, &error) {
            (true, Some(e)) => {
                return Err(format!("successful result carries an error: {}", e));
            }
            (false, None) => {
                return Err("failed result is missing its error".to_string());
            }
            _ => {}
        }

        Ok(Self {
            operation: raw.operation,
            database: raw.database,
            vendor: raw.vendor,
            duration_ms: raw.duration_ms,
            success: raw.success,
            records_affected: raw.records_affected,
            error,
        })
    }
}
