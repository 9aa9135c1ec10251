//! Placeholder for vendors that cannot be benchmarked in this build.

use dbbench_core::{Backend, ConnectionError, OperationError, OperationOutcome, Params};

/// A backend whose `connect` always fails with a fixed reason.
///
/// Lets the session report requested vendors without an adapter (or without
/// configuration) as skipped instead of silently dropping them.
#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    vendor: String,
    reason: ConnectionError,
}

impl UnavailableBackend {
    pub fn new(vendor: impl Into<String>, reason: ConnectionError) -> Self {
        Self {
            vendor: vendor.into(),
            reason,
        }
    }

    /// The vendor is requested but has no configuration section.
    pub fn not_configured(db_type: &str, vendor: &str) -> Self {
        Self::new(
            vendor,
            ConnectionError::NotConfigured {
                db_type: db_type.to_string(),
                vendor: vendor.to_string(),
            },
        )
    }

    /// The vendor is configured but no adapter is compiled in.
    pub fn unsupported(db_type: &str, vendor: &str) -> Self {
        Self::new(
            vendor,
            ConnectionError::Unsupported {
                db_type: db_type.to_string(),
                vendor: vendor.to_string(),
            },
        )
    }

    pub fn reason(&self) -> &ConnectionError {
        &self.reason
    }
}

impl Backend for UnavailableBackend {
    fn vendor(&self) -> &str {
        &self.vendor
    }

    fn connect(&mut self) -> Result<(), ConnectionError> {
        Err(self.reason.clone())
    }

    fn perform(
        &mut self,
        _operation: &str,
        _params: &Params,
    ) -> Result<OperationOutcome, OperationError> {
        Err(OperationError::NotConnected)
    }

    fn disconnect(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_reports_reason() {
        let mut backend = UnavailableBackend::unsupported("graph", "neo4j");

        assert_eq!(backend.vendor(), "neo4j");
        let err = backend.connect().unwrap_err();
        assert_eq!(err.to_string(), "no adapter available for graph/neo4j");
        assert_eq!(&err, backend.reason());
    }

    #[test]
    fn test_not_configured_message() {
        let mut backend = UnavailableBackend::not_configured("relational", "mysql");
        assert_eq!(
            backend.connect().unwrap_err().to_string(),
            "configuration not found for relational/mysql"
        );
        assert_eq!(
            backend.perform("insert_single", &Params::new()),
            Err(OperationError::NotConnected)
        );
    }
}
