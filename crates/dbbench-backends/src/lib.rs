//! dbbench Backends - Vendor adapters and workload suites.
//!
//! This crate connects the `dbbench-core` runner to real databases.
//!
//! # Contents
//!
//! - **Suites**: the relational and graph operation lists with their default
//!   repetitions
//! - **Fixtures**: deterministic seed data and per-attempt data generation
//! - **Backends**: SQLite (always) and PostgreSQL (`postgres` feature)
//! - **Registry**: turns configured vendors into session jobs

pub mod backends;
pub mod fixtures;
pub mod registry;
pub mod suite;

pub use backends::{SqliteBackend, UnavailableBackend};
#[cfg(feature = "postgres")]
pub use backends::PostgresBackend;
pub use fixtures::{generate_posts, generate_users, DataGen, Scale};
pub use registry::{build_jobs, create_backend, Catalog, VendorSettings};
pub use suite::{graph_suite, relational_suite, suite_for, Overrides};
