//! Database configuration file.
//!
//! A YAML document with one section per database family, each mapping vendor
//! names to connection settings, plus an optional `workload` section that
//! overrides per-operation repetition counts:
//!
//! ```yaml
//! relational:
//!   sqlite: { path: bench.db, scale: small }
//!   postgresql: { host: localhost, port: 5432, database: bench, user: bench }
//! graph:
//!   neo4j: { url: "bolt://localhost:7687" }
//! workload:
//!   insert_batch: 10
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use dbbench_backends::{Catalog, Overrides, VendorSettings};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/databases.yaml";

/// Failure to load the configuration file.
#[derive(Debug, Error)]
pub enum FileConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileConfig {
    #[serde(flatten)]
    pub catalog: Catalog,

    /// Per-operation repetition counts. Zero skips the operation.
    #[serde(default)]
    pub workload: BTreeMap<String, usize>,
}

impl FileConfig {
    /// Parse a configuration document.
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document parses as null.
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(source)
    }

    /// Load the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FileConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| FileConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&source).map_err(|source| FileConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            path = %path.display(),
            relational = config.catalog.relational.len(),
            graph = config.catalog.graph.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Load `path` if given, else the default file if it exists, else an
    /// in-memory SQLite setup.
    pub fn resolve(path: Option<&Path>) -> Result<Self, FileConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let default = Path::new(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::load(default);
        }

        warn!(
            path = DEFAULT_CONFIG_PATH,
            "configuration file not found, benchmarking in-memory sqlite only"
        );
        Ok(Self::builtin())
    }

    /// Built-in configuration: SQLite in memory.
    pub fn builtin() -> Self {
        let mut catalog = Catalog::default();
        catalog
            .relational
            .insert(dbbench_backends::registry::SQLITE, VendorSettings::default());
        Self {
            catalog,
            workload: BTreeMap::new(),
        }
    }

    /// Repetition overrides from the `workload` section.
    ///
    /// With `global`, operations not listed in the section use the runner's
    /// repetition count instead of their suite defaults.
    pub fn overrides(&self, global: bool) -> Overrides {
        let overrides = if global {
            Overrides::new().with_global()
        } else {
            Overrides::new()
        };
        self.workload
            .iter()
            .fold(overrides, |o, (operation, &count)| {
                o.with_operation(operation.clone(), count)
            })
    }
}
