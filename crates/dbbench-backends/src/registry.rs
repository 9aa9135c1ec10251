//! Vendor registry.
//!
//! Maps configured vendors to adapters and plans the jobs of a session.
//! Requested vendors that cannot run in this build still get a job, backed
//! by an [`UnavailableBackend`], so they show up as skipped in the report.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use dbbench_core::{Backend, DbType, Job, OrderedMap, SessionConfig, Workload};

use crate::backends::sqlite::{self, SqliteBackend};
use crate::backends::UnavailableBackend;
use crate::fixtures::Scale;
use crate::suite::{suite_for, Overrides};

pub const SQLITE: &str = sqlite::VENDOR;
pub const POSTGRESQL: &str = "postgresql";
pub const MYSQL: &str = "mysql";
pub const NEO4J: &str = "neo4j";
pub const ARANGODB: &str = "arangodb";

/// Families a session can cover, in run order.
pub const FAMILIES: [DbType; 2] = [DbType::Relational, DbType::Graph];

/// Connection settings of one vendor.
///
/// Either a full `url` or its parts may be given. For SQLite, `path` (or
/// `database`) names the database file; it defaults to an in-memory database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VendorSettings {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub path: Option<PathBuf>,
    /// Seed data size. Defaults to [`Scale::Medium`].
    pub scale: Option<Scale>,
}

impl VendorSettings {
    /// Connection URL, built from its parts when `url` is absent.
    ///
    /// Returns `None` without either a `url` or a `host`.
    pub fn url(&self, scheme: &str) -> Option<String> {
        if let Some(url) = &self.url {
            return Some(url.clone());
        }

        let host = self.host.as_deref()?;
        let mut url = format!("{}://", scheme);
        if let Some(user) = &self.user {
            url.push_str(user);
            if let Some(password) = &self.password {
                url.push(':');
                url.push_str(password);
            }
            url.push('@');
        }
        url.push_str(host);
        if let Some(port) = self.port {
            let _ = write!(url, ":{}", port);
        }
        if let Some(database) = &self.database {
            url.push('/');
            url.push_str(database);
        }
        Some(url)
    }

    /// SQLite database file, or `":memory:"`.
    pub fn sqlite_path(&self) -> PathBuf {
        self.path
            .clone()
            .or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(sqlite::IN_MEMORY))
    }
}

/// Configured vendors per database family, in configuration order.
///
/// A bare vendor key (`sqlite:` with no value) takes default settings, and a
/// bare section key configures no vendors.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Catalog {
    #[serde(deserialize_with = "vendor_section")]
    pub relational: OrderedMap<VendorSettings>,
    #[serde(deserialize_with = "vendor_section")]
    pub graph: OrderedMap<VendorSettings>,
}

fn vendor_section<'de, D>(deserializer: D) -> Result<OrderedMap<VendorSettings>, D::Error>
where
    D: Deserializer<'de>,
{
    let section = Option::<OrderedMap<Option<VendorSettings>>>::deserialize(deserializer)?;
    Ok(section
        .unwrap_or_default()
        .into_iter()
        .map(|(vendor, settings)| (vendor, settings.unwrap_or_default()))
        .collect())
}

impl Catalog {
    /// The vendors configured for one family. `All` has no section of its own.
    pub fn section(&self, db_type: DbType) -> Option<&OrderedMap<VendorSettings>> {
        match db_type {
            DbType::Relational => Some(&self.relational),
            DbType::Graph => Some(&self.graph),
            DbType::All => None,
        }
    }

    /// Check whether any included family configures `vendor`.
    fn configures(&self, selector: DbType, vendor: &str) -> bool {
        FAMILIES
            .into_iter()
            .filter(|&family| selector.includes(family))
            .filter_map(|family| self.section(family))
            .any(|section| section.contains_key(vendor))
    }
}

/// Create the adapter for a configured vendor.
///
/// Vendors without a compiled-in adapter get an [`UnavailableBackend`].
pub fn create_backend(
    db_type: DbType,
    vendor: &str,
    settings: &VendorSettings,
    seed: bool,
) -> Box<dyn Backend> {
    let scale = settings.scale.unwrap_or_default();

    match (db_type, vendor) {
        (DbType::Relational, SQLITE) => {
            let backend = SqliteBackend::new(settings.sqlite_path()).with_scale(scale);
            Box::new(if seed { backend } else { backend.without_seed() })
        }
        #[cfg(feature = "postgres")]
        (DbType::Relational, POSTGRESQL) => {
            use crate::backends::PostgresBackend;

            let Some(url) = settings.url("postgres") else {
                return Box::new(UnavailableBackend::new(
                    vendor,
                    dbbench_core::ConnectionError::Unreachable {
                        vendor: vendor.to_string(),
                        message: "no url or host configured".to_string(),
                    },
                ));
            };
            let backend = PostgresBackend::new(url).with_scale(scale);
            Box::new(if seed { backend } else { backend.without_seed() })
        }
        _ => Box::new(UnavailableBackend::unsupported(db_type.as_str(), vendor)),
    }
}

/// Plan one job per selected vendor.
///
/// Vendors come from each included family's configuration section, in
/// configuration order, filtered by the session's allow-list. Allow-listed
/// vendors that no included family configures are planned as skipped.
pub fn build_jobs(config: &SessionConfig, catalog: &Catalog, overrides: &Overrides) -> Vec<Job> {
    let families: Vec<DbType> = FAMILIES
        .into_iter()
        .filter(|&family| config.db_type.includes(family))
        .collect();

    let operations: Vec<Workload> = families.iter().flat_map(|&f| suite_for(f)).collect();
    for name in overrides.unknown(&operations) {
        warn!(operation = name, "workload override matches no operation");
    }

    let mut jobs = Vec::new();
    for family in families {
        let Some(section) = catalog.section(family) else {
            continue;
        };
        let workload = overrides.apply(suite_for(family));

        for (vendor, settings) in section.iter() {
            if !config.allows_vendor(vendor) {
                debug!(db_type = %family, vendor, "vendor not selected");
                continue;
            }
            info!(db_type = %family, vendor, "vendor planned");
            let backend = create_backend(family, vendor, settings, config.setup);
            jobs.push(Job::new(backend, workload.clone()));
        }
    }

    for vendor in &config.vendors {
        if !catalog.configures(config.db_type, vendor) {
            warn!(db_type = %config.db_type, vendor = %vendor, "vendor not configured");
            let backend = UnavailableBackend::not_configured(config.db_type.as_str(), vendor);
            jobs.push(Job::new(Box::new(backend), Vec::new()));
        }
    }

    jobs
}
