//! dbbench Core - Benchmark execution and results aggregation.
//!
//! This crate times named operations against interchangeable database
//! backends and turns the raw timings into comparable statistics.
//!
//! # Pipeline
//!
//! - **Runner**: executes one operation N times against a [`Backend`] and emits
//!   one [`BenchmarkResult`] per measured attempt
//! - **Session**: runs one Runner per vendor, each on its own thread
//! - **Analyzer**: groups results by (operation, database) and computes
//!   [`OperationStats`]
//! - **Export**: CSV for raw results, JSON for the [`SummaryTree`]

pub mod analyzer;
pub mod backend;
pub mod config;
pub mod error;
pub mod export;
pub mod outcome;
pub mod result;
pub mod runner;
pub mod session;
pub mod stats;
pub mod summary;

pub use analyzer::Analyzer;
pub use backend::{Backend, Params, Workload};
pub use config::{DbType, RunnerConfig, SessionConfig};
pub use error::{ConfigError, ConnectionError, Error, ExportError, OperationError, Result};
pub use outcome::OperationOutcome;
pub use result::{BenchmarkResult, COLUMNS, SCHEMA_VERSION};
pub use runner::{Runner, Target};
pub use session::{Job, Session, SessionReport, VendorReport, VendorStatus};
pub use stats::OperationStats;
pub use summary::{Comparison, OrderedMap, SummaryTree};
