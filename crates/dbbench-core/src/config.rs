//! Runner and session configuration.
//!
//! Everything the core needs is passed in through these values; nothing is
//! read from the environment or from files here.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Default repetitions per operation.
pub const DEFAULT_REPETITIONS: usize = 100;

/// Default warm-up attempts per operation.
pub const DEFAULT_WARMUP: usize = 0;

/// Default output directory for exports.
pub const DEFAULT_OUTPUT_DIR: &str = "results";

/// Repetition policy for a [`Runner`](crate::Runner).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Measured attempts per operation.
    pub repetitions: usize,
    /// Attempts executed before measuring, then discarded.
    pub warmup: usize,
}

impl RunnerConfig {
    /// Create a configuration with the given repetitions and no warm-up.
    pub fn new(repetitions: usize) -> Self {
        Self {
            repetitions,
            warmup: DEFAULT_WARMUP,
        }
    }

    /// Set the number of warm-up attempts.
    pub fn with_warmup(mut self, warmup: usize) -> Self {
        self.warmup = warmup;
        self
    }

    /// Check the configuration before any attempt is made.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repetitions == 0 {
            return Err(ConfigError::ZeroRepetitions);
        }
        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REPETITIONS)
    }
}

/// Which family of databases a session benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DbType {
    Relational,
    Graph,
    #[default]
    All,
}

impl DbType {
    /// Check whether this selector covers `other`.
    pub fn includes(self, other: DbType) -> bool {
        self == DbType::All || self == other
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DbType::Relational => "relational",
            DbType::Graph => "graph",
            DbType::All => "all",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relational" => Ok(DbType::Relational),
            "graph" => Ok(DbType::Graph),
            "all" => Ok(DbType::All),
            _ => Err(ConfigError::UnknownDbType(s.to_string())),
        }
    }
}

/// Session-level settings handed down from the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Repetition policy shared by every runner in the session.
    pub runner: RunnerConfig,
    /// Directory exports are written to.
    pub output_dir: PathBuf,
    /// Database family selector.
    pub db_type: DbType,
    /// Vendor allow-list. Empty means every configured vendor.
    pub vendors: Vec<String>,
    /// Whether backends load seed data before benchmarking.
    pub setup: bool,
}

impl SessionConfig {
    /// Create a session configuration with default settings.
    pub fn new() -> Self {
        Self {
            runner: RunnerConfig::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            db_type: DbType::All,
            vendors: Vec::new(),
            setup: true,
        }
    }

    /// Set the runner configuration.
    pub fn with_runner(mut self, runner: RunnerConfig) -> Self {
        self.runner = runner;
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the database family selector.
    pub fn with_db_type(mut self, db_type: DbType) -> Self {
        self.db_type = db_type;
        self
    }

    /// Restrict the session to the given vendors.
    pub fn with_vendors<I, S>(mut self, vendors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vendors = vendors.into_iter().map(Into::into).collect();
        self
    }

    /// Skip loading seed data.
    pub fn without_setup(mut self) -> Self {
        self.setup = false;
        self
    }

    /// Check whether a vendor passes the allow-list.
    pub fn allows_vendor(&self, vendor: &str) -> bool {
        self.vendors.is_empty() || self.vendors.iter().any(|v| v == vendor)
    }

    /// Check the configuration before any backend is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.runner.validate()?;
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputDir);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
