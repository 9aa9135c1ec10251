//! The backend capability every vendor adapter implements.
//!
//! The runner never sees SQL or graph queries: an adapter turns an operation
//! name plus [`Params`] into one driver call and reports an
//! [`OperationOutcome`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConnectionError, OperationError};
use crate::outcome::OperationOutcome;

/// A database backend under test.
///
/// Implementations own their connection. A backend is driven by exactly one
/// runner at a time, so methods take `&mut self`; `Send` lets the session
/// move each backend onto its own worker thread.
pub trait Backend: Send {
    /// Backend implementation identifier (e.g. "sqlite", "postgresql").
    fn vendor(&self) -> &str;

    /// Establish the connection.
    fn connect(&mut self) -> Result<(), ConnectionError>;

    /// Create schema and, if the backend was configured to, load seed data.
    fn prepare(&mut self) -> Result<(), ConnectionError> {
        Ok(())
    }

    /// Execute one attempt of `operation`.
    ///
    /// Adapters should time only the driver call (see
    /// [`OperationOutcome::timed`]). Returning `Err` means the attempt failed
    /// before reaching the driver; the runner records it with its own timing.
    fn perform(
        &mut self,
        operation: &str,
        params: &Params,
    ) -> Result<OperationOutcome, OperationError>;

    /// Remove test data.
    fn cleanup(&mut self) {}

    /// Close the connection. Must be safe to call when not connected.
    fn disconnect(&mut self);
}

/// Loosely typed operation knobs (batch sizes, limits).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get a raw parameter value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get an unsigned integer parameter.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Get a string parameter.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One entry of a benchmark plan: which operation, how often, with what knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    /// Operation name passed to [`Backend::perform`].
    pub operation: String,
    /// Repetitions for this operation; falls back to the runner default.
    pub repetitions: Option<usize>,
    /// Parameters passed on every attempt.
    pub params: Params,
}

impl Workload {
    /// Create a workload entry using the runner's default repetitions.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            repetitions: None,
            params: Params::new(),
        }
    }

    /// Set the repetitions for this entry.
    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = Some(repetitions);
        self
    }

    /// Set the parameters for this entry.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}
