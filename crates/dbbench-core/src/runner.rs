//! Benchmark runner.
//!
//! Executes one named operation a fixed number of times against a backend
//! capability and turns every measured attempt into a [`BenchmarkResult`].
//!
//! Attempts are strictly sequential. A failing attempt is recorded and the
//! loop continues, so a run always yields exactly `repetitions` results.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, trace};

use crate::backend::{Backend, Workload};
use crate::config::RunnerConfig;
use crate::error::{ConfigError, OperationError};
use crate::outcome::OperationOutcome;
use crate::result::BenchmarkResult;

/// The (database, vendor) pair results are tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    database: String,
    vendor: String,
}

impl Target {
    /// Create a target with distinct database and vendor names.
    pub fn new(database: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            vendor: vendor.into(),
        }
    }

    /// Create a target whose database name is the vendor name.
    pub fn vendor_only(vendor: impl Into<String>) -> Self {
        let vendor = vendor.into();
        Self {
            database: vendor.clone(),
            vendor,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }
}

/// Drives repeated execution of an operation.
#[derive(Debug, Clone)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Create a runner, rejecting invalid repetition settings.
    pub fn new(config: RunnerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `operation` with the configured repetitions.
    ///
    /// `attempt` is called `warmup + repetitions` times. When it returns
    /// `Ok`, the outcome's own duration is recorded; when it returns `Err`
    /// or panics, the runner's measurement around the call is recorded.
    pub fn run<F>(&self, operation: &str, target: &Target, attempt: F) -> Vec<BenchmarkResult>
    where
        F: FnMut() -> Result<OperationOutcome, OperationError>,
    {
        self.run_n(operation, target, self.config.repetitions, attempt)
    }

    /// Run `operation` with an explicit repetition count.
    pub fn run_n<F>(
        &self,
        operation: &str,
        target: &Target,
        repetitions: usize,
        mut attempt: F,
    ) -> Vec<BenchmarkResult>
    where
        F: FnMut() -> Result<OperationOutcome, OperationError>,
    {
        for i in 0..self.config.warmup {
            let outcome = time_attempt(&mut attempt);
            trace!(
                operation,
                vendor = target.vendor(),
                warmup = i + 1,
                success = outcome.success,
                "warm-up attempt discarded"
            );
        }

        let mut results = Vec::with_capacity(repetitions);
        for i in 0..repetitions {
            let outcome = time_attempt(&mut attempt);
            if let Some(error) = &outcome.error {
                debug!(
                    operation,
                    vendor = target.vendor(),
                    attempt = i + 1,
                    error = %error,
                    "attempt failed"
                );
            } else {
                trace!(
                    operation,
                    vendor = target.vendor(),
                    attempt = i + 1,
                    duration_us = outcome.duration.as_micros() as u64,
                    "attempt completed"
                );
            }
            results.push(BenchmarkResult::from_outcome(operation, target, &outcome));
        }

        let failures = results.iter().filter(|r| !r.success()).count();
        debug!(
            operation,
            database = target.database(),
            vendor = target.vendor(),
            repetitions,
            failures,
            "operation benchmarked"
        );

        results
    }

    /// Run one workload entry against a backend.
    ///
    /// An entry with `repetitions: Some(0)` is skipped and yields no results.
    pub fn run_workload(
        &self,
        backend: &mut dyn Backend,
        target: &Target,
        workload: &Workload,
    ) -> Vec<BenchmarkResult> {
        let repetitions = workload.repetitions.unwrap_or(self.config.repetitions);
        let operation = workload.operation.as_str();
        let params = &workload.params;

        self.run_n(operation, target, repetitions, || {
            backend.perform(operation, params)
        })
    }
}

/// Invoke the capability once, converting errors and panics into failed outcomes.
fn time_attempt<F>(attempt: &mut F) -> OperationOutcome
where
    F: FnMut() -> Result<OperationOutcome, OperationError>,
{
    let start = Instant::now();
    let result = panic::catch_unwind(AssertUnwindSafe(|| attempt()));
    let elapsed = start.elapsed();

    match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => OperationOutcome::failure(elapsed, e.to_string()),
        Err(payload) => OperationOutcome::failure(
            elapsed,
            OperationError::Panicked(panic_message(payload.as_ref())).to_string(),
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Params;
    use crate::error::ConnectionError;
    use std::time::Duration;

    fn fixed(ms: u64) -> Result<OperationOutcome, OperationError> {
        Ok(OperationOutcome::success(Duration::from_millis(ms), 1))
    }

    #[test]
    fn test_runner_rejects_zero_repetitions() {
        assert!(Runner::new(RunnerConfig::new(0)).is_err());
    }

    #[test]
    fn test_run_uses_outcome_durations() {
        let runner = Runner::new(RunnerConfig::new(3)).unwrap();
        let target = Target::vendor_only("sqlite");
        let mut durations = [10, 12, 11].into_iter();

        let results = runner.run("insert_single", &target, || fixed(durations.next().unwrap()));

        let observed: Vec<f64> = results.iter().map(|r| r.duration_ms()).collect();
        assert_eq!(observed, vec![10.0, 12.0, 11.0]);
        assert!(results.iter().all(|r| r.operation() == "insert_single"));
        assert!(results.iter().all(|r| r.database() == "sqlite"));
        assert!(results.iter().all(|r| r.vendor() == "sqlite"));
    }

    #[test]
    fn test_failure_isolation() {
        let runner = Runner::new(RunnerConfig::new(5)).unwrap();
        let target = Target::vendor_only("mysql");
        let mut call = 0;

        let results = runner.run("update", &target, || {
            call += 1;
            if call == 2 || call == 4 {
                Err(OperationError::Query(format!("deadlock on attempt {}", call)))
            } else {
                fixed(1)
            }
        });

        assert_eq!(results.len(), 5);
        for (i, result) in results.iter().enumerate() {
            let position = i + 1;
            if position == 2 || position == 4 {
                assert!(!result.success());
                assert!(!result.error().unwrap().is_empty());
            } else {
                assert!(result.success());
                assert!(result.error().is_none());
            }
        }
    }

    #[test]
    fn test_failed_outcome_is_recorded() {
        let runner = Runner::new(RunnerConfig::new(2)).unwrap();
        let target = Target::vendor_only("sqlite");

        let results = runner.run("delete", &target, || {
            Ok(OperationOutcome::failure(Duration::from_millis(4), "locked"))
        });

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.success()));
        assert!(results.iter().all(|r| r.error() == Some("locked")));
        assert!(results.iter().all(|r| r.duration_ms() == 4.0));
    }

    #[test]
    fn test_panic_is_recorded_and_loop_continues() {
        let runner = Runner::new(RunnerConfig::new(3)).unwrap();
        let target = Target::vendor_only("sqlite");
        let mut call = 0;

        let results = runner.run("select_by_id", &target, || {
            call += 1;
            if call == 1 {
                panic!("driver exploded");
            }
            fixed(2)
        });

        assert_eq!(results.len(), 3);
        assert!(!results[0].success());
        assert_eq!(results[0].error(), Some("panicked: driver exploded"));
        assert!(results[1].success());
        assert!(results[2].success());
    }

    #[test]
    fn test_warmup_executed_but_discarded() {
        let runner = Runner::new(RunnerConfig::new(3).with_warmup(2)).unwrap();
        let target = Target::vendor_only("sqlite");
        let mut calls = 0u64;

        let results = runner.run("aggregate_query", &target, || {
            calls += 1;
            fixed(calls)
        });

        assert_eq!(calls, 5);
        let observed: Vec<f64> = results.iter().map(|r| r.duration_ms()).collect();
        assert_eq!(observed, vec![3.0, 4.0, 5.0]);
    }

    struct CountingBackend {
        calls: usize,
    }

    impl Backend for CountingBackend {
        fn vendor(&self) -> &str {
            "counting"
        }

        fn connect(&mut self) -> Result<(), ConnectionError> {
            Ok(())
        }

        fn perform(
            &mut self,
            operation: &str,
            params: &Params,
        ) -> Result<OperationOutcome, OperationError> {
            self.calls += 1;
            if operation != "insert_batch" {
                return Err(OperationError::UnknownOperation(operation.to_string()));
            }
            let batch = params.get_u64("batch_size").unwrap_or(1);
            Ok(OperationOutcome::success(Duration::from_millis(1), batch))
        }

        fn disconnect(&mut self) {}
    }

    #[test]
    fn test_run_workload_overrides_repetitions() {
        let runner = Runner::new(RunnerConfig::new(10)).unwrap();
        let target = Target::vendor_only("counting");
        let mut backend = CountingBackend { calls: 0 };
        let workload = Workload::new("insert_batch")
            .with_repetitions(4)
            .with_params(Params::new().with("batch_size", 25));

        let results = runner.run_workload(&mut backend, &target, &workload);

        assert_eq!(results.len(), 4);
        assert_eq!(backend.calls, 4);
        assert!(results.iter().all(|r| r.records_affected() == 25));
    }

    #[test]
    fn test_run_workload_unknown_operation_fails_every_attempt() {
        let runner = Runner::new(RunnerConfig::new(3)).unwrap();
        let target = Target::vendor_only("counting");
        let mut backend = CountingBackend { calls: 0 };

        let results = runner.run_workload(&mut backend, &target, &Workload::new("traverse"));

        assert_eq!(results.len(), 3);
        assert!(results
            .iter()
            .all(|r| r.error() == Some("unknown operation: traverse")));
    }
}
