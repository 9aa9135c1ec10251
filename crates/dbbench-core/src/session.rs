//! Benchmark sessions.
//!
//! A session runs one job per (database, vendor) pair. Jobs run concurrently,
//! one OS thread each, because they hold independent connections and write to
//! private result buffers. Within a job every operation runs sequentially.

use std::fs;
use std::path::Path;
use std::thread;

use tracing::{info, warn};

use crate::analyzer::Analyzer;
use crate::backend::{Backend, Workload};
use crate::config::SessionConfig;
use crate::error::{ConfigError, ConnectionError, ExportError};
use crate::export::{self, ExportPaths};
use crate::result::BenchmarkResult;
use crate::runner::{Runner, Target};
use crate::summary::OrderedMap;

/// One vendor's share of a session.
pub struct Job {
    target: Target,
    backend: Box<dyn Backend>,
    workload: Vec<Workload>,
}

impl Job {
    /// Create a job whose database name is the backend's vendor name.
    pub fn new(backend: Box<dyn Backend>, workload: Vec<Workload>) -> Self {
        let target = Target::vendor_only(backend.vendor());
        Self {
            target,
            backend,
            workload,
        }
    }

    /// Tag results with a database name different from the vendor.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.target = Target::new(database, self.target.vendor());
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }
}

/// How a vendor's job ended.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorStatus {
    /// All operations ran. `failures` lists operations with failed attempts.
    Completed {
        attempts: usize,
        failures: OrderedMap<usize>,
    },
    /// The vendor contributed no results.
    Skipped { reason: ConnectionError },
}

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorReport {
    pub target: Target,
    pub status: VendorStatus,
}

impl VendorReport {
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, VendorStatus::Skipped { .. })
    }
}

/// Everything a session produced.
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    /// Results of every job, concatenated in job order.
    pub results: Vec<BenchmarkResult>,
    /// One report per job, in job order.
    pub vendors: Vec<VendorReport>,
}

impl SessionReport {
    /// Build an analyzer over the session's results.
    pub fn analyzer(&self) -> Analyzer {
        Analyzer::new(self.results.clone())
    }

    /// Reports of vendors that were skipped.
    pub fn skipped(&self) -> impl Iterator<Item = &VendorReport> {
        self.vendors.iter().filter(|v| v.is_skipped())
    }

    /// Write the raw results and the summary into `dir`, creating it first.
    pub fn export(&self, dir: impl AsRef<Path>) -> crate::Result<ExportPaths> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;
        Ok(export::export_all(dir, &self.analyzer())?)
    }
}

/// Runs jobs with a shared repetition policy.
#[derive(Debug, Clone)]
pub struct Session {
    runner: Runner,
}

impl Session {
    /// Create a session from validated configuration.
    pub fn new(config: &SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            runner: Runner::new(config.runner)?,
        })
    }

    /// Run every job to completion.
    ///
    /// A job whose backend cannot connect or prepare is reported as skipped;
    /// the other jobs are unaffected.
    pub fn run(&self, jobs: Vec<Job>) -> SessionReport {
        let targets: Vec<Target> = jobs.iter().map(|j| j.target.clone()).collect();

        let outputs: Vec<thread::Result<(Vec<BenchmarkResult>, VendorReport)>> =
            thread::scope(|scope| {
                let handles: Vec<_> = jobs
                    .into_iter()
                    .map(|job| scope.spawn(move || self.run_job(job)))
                    .collect();
                handles.into_iter().map(|h| h.join()).collect()
            });

        let mut report = SessionReport::default();
        for (target, output) in targets.into_iter().zip(outputs) {
            match output {
                Ok((results, vendor)) => {
                    report.results.extend(results);
                    report.vendors.push(vendor);
                }
                Err(_) => {
                    warn!(vendor = target.vendor(), "benchmark worker panicked");
                    report.vendors.push(VendorReport {
                        status: VendorStatus::Skipped {
                            reason: ConnectionError::Aborted {
                                vendor: target.vendor().to_string(),
                                message: "worker panicked".to_string(),
                            },
                        },
                        target,
                    });
                }
            }
        }

        report
    }

    /// Run one job on the current thread.
    fn run_job(&self, job: Job) -> (Vec<BenchmarkResult>, VendorReport) {
        let Job {
            target,
            mut backend,
            workload,
        } = job;

        info!(vendor = target.vendor(), database = target.database(), "benchmarking vendor");

        if let Err(reason) = open(backend.as_mut()) {
            warn!(vendor = target.vendor(), error = %reason, "vendor skipped");
            backend.disconnect();
            return (
                Vec::new(),
                VendorReport {
                    target,
                    status: VendorStatus::Skipped { reason },
                },
            );
        }

        let mut results = Vec::new();
        let mut failures = OrderedMap::new();
        for item in &workload {
            let batch = self.runner.run_workload(backend.as_mut(), &target, item);
            let failed = batch.iter().filter(|r| !r.success()).count();
            if failed > 0 {
                warn!(
                    vendor = target.vendor(),
                    operation = %item.operation,
                    failed,
                    "operation had failed attempts"
                );
                *failures.get_or_insert_default(&item.operation) += failed;
            }
            results.extend(batch);
        }

        backend.cleanup();
        backend.disconnect();

        info!(
            vendor = target.vendor(),
            attempts = results.len(),
            operations = workload.len(),
            "vendor finished"
        );

        let status = VendorStatus::Completed {
            attempts: results.len(),
            failures,
        };
        (results, VendorReport { target, status })
    }
}

fn open(backend: &mut dyn Backend) -> Result<(), ConnectionError> {
    backend.connect()?;
    backend.prepare()
}
