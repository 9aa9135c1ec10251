//! Error types for benchmark execution and export.

use std::path::PathBuf;

use thiserror::Error;

/// A backend could not be reached or prepared.
///
/// Fatal for the vendor that raised it only; the session carries on with
/// the remaining vendors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The backend was unreachable or rejected the credentials.
    #[error("failed to connect to {vendor}: {message}")]
    Unreachable { vendor: String, message: String },

    /// Schema or seed data setup failed after connecting.
    #[error("failed to prepare {vendor}: {message}")]
    Setup { vendor: String, message: String },

    /// No configuration section exists for the vendor.
    #[error("configuration not found for {db_type}/{vendor}")]
    NotConfigured { db_type: String, vendor: String },

    /// The vendor is configured but no adapter is compiled in.
    #[error("no adapter available for {db_type}/{vendor}")]
    Unsupported { db_type: String, vendor: String },

    /// The vendor's worker stopped before reporting.
    #[error("benchmark worker for {vendor} aborted: {message}")]
    Aborted { vendor: String, message: String },
}

/// A single timed attempt failed.
///
/// Recorded as a failed benchmark result, never propagated out of the runner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// The backend does not implement the operation.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// The driver reported an error.
    #[error("query failed: {0}")]
    Query(String),

    /// The operation needs rows that are not there (e.g. lookups on an empty table).
    #[error("no data available: {0}")]
    NoData(String),

    /// The backend is not connected.
    #[error("not connected")]
    NotConnected,

    /// The attempt panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Durable export or import failed.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem error on the given path.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding or decoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding or decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The row export header lacks a required column.
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    /// A row could not be turned into a benchmark result.
    #[error("invalid row {row}: {message}")]
    InvalidRow { row: usize, message: String },
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Invalid runner or session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Repetitions must be positive.
    #[error("repetitions must be at least 1")]
    ZeroRepetitions,

    /// Output directory was empty.
    #[error("output directory must not be empty")]
    EmptyOutputDir,

    /// Database type selector was not recognised.
    #[error("unknown database type '{0}' (expected relational, graph or all)")]
    UnknownDbType(String),
}

/// Top-level error for callers that drive a whole session.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for dbbench operations.
pub type Result<T> = std::result::Result<T, Error>;
