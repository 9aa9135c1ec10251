//! Workload suites.
//!
//! A suite is the ordered list of operations run against every vendor of one
//! database family, with the repetitions each operation gets by default.

use std::collections::BTreeMap;

use dbbench_core::{DbType, Params, Workload};

pub const INSERT_SINGLE: &str = "insert_single";
pub const INSERT_BATCH: &str = "insert_batch";
pub const SELECT_BY_ID: &str = "select_by_id";
pub const SELECT_BY_EMAIL: &str = "select_by_email";
pub const SELECT_WITH_JOIN: &str = "select_with_join";
pub const UPDATE: &str = "update";
pub const AGGREGATE_QUERY: &str = "aggregate_query";
pub const COMPLEX_QUERY: &str = "complex_query";
pub const DELETE: &str = "delete";

pub const CREATE_NODE: &str = "create_node";
pub const CREATE_RELATIONSHIP: &str = "create_relationship";
pub const FIND_NODE_BY_ID: &str = "find_node_by_id";
pub const TRAVERSE_RELATIONSHIPS: &str = "traverse_relationships";
pub const PATTERN_MATCHING: &str = "pattern_matching";
pub const SHORTEST_PATH: &str = "shortest_path";

/// Parameter key for the rows inserted per `insert_batch` attempt.
pub const BATCH_SIZE: &str = "batch_size";

/// Rows per `insert_batch` attempt unless overridden.
pub const DEFAULT_BATCH_SIZE: u64 = 50;

/// Relational operations with their default repetitions, in run order.
pub const RELATIONAL_OPERATIONS: [(&str, usize); 9] = [
    (INSERT_SINGLE, 100),
    (INSERT_BATCH, 5),
    (SELECT_BY_ID, 500),
    (SELECT_BY_EMAIL, 500),
    (SELECT_WITH_JOIN, 100),
    (UPDATE, 500),
    (AGGREGATE_QUERY, 50),
    (COMPLEX_QUERY, 25),
    (DELETE, 50),
];

/// Graph operations with their default repetitions, in run order.
pub const GRAPH_OPERATIONS: [(&str, usize); 6] = [
    (CREATE_NODE, 100),
    (CREATE_RELATIONSHIP, 50),
    (FIND_NODE_BY_ID, 500),
    (TRAVERSE_RELATIONSHIPS, 100),
    (PATTERN_MATCHING, 50),
    (SHORTEST_PATH, 25),
];

/// The relational suite with default repetitions.
pub fn relational_suite() -> Vec<Workload> {
    RELATIONAL_OPERATIONS
        .iter()
        .map(|&(operation, repetitions)| {
            let workload = Workload::new(operation).with_repetitions(repetitions);
            if operation == INSERT_BATCH {
                workload.with_params(Params::new().with(BATCH_SIZE, DEFAULT_BATCH_SIZE))
            } else {
                workload
            }
        })
        .collect()
}

/// The graph suite with default repetitions.
pub fn graph_suite() -> Vec<Workload> {
    GRAPH_OPERATIONS
        .iter()
        .map(|&(operation, repetitions)| Workload::new(operation).with_repetitions(repetitions))
        .collect()
}

/// The suite for one database family. `All` is not a family and has none.
pub fn suite_for(db_type: DbType) -> Vec<Workload> {
    match db_type {
        DbType::Relational => relational_suite(),
        DbType::Graph => graph_suite(),
        DbType::All => Vec::new(),
    }
}

/// Repetition overrides applied on top of suite defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Replaces every default so the runner's repetitions apply.
    pub global: bool,
    /// Per-operation repetitions, applied after `global`.
    pub operations: BTreeMap<String, usize>,
}

impl Overrides {
    /// No overrides: suite defaults apply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the runner's repetitions for every operation.
    pub fn with_global(mut self) -> Self {
        self.global = true;
        self
    }

    /// Set the repetitions of one operation.
    pub fn with_operation(mut self, operation: impl Into<String>, repetitions: usize) -> Self {
        self.operations.insert(operation.into(), repetitions);
        self
    }

    /// Apply the overrides to a suite.
    ///
    /// A per-operation override of zero removes the operation from the run.
    pub fn apply(&self, suite: Vec<Workload>) -> Vec<Workload> {
        suite
            .into_iter()
            .map(|mut workload| {
                if self.global {
                    workload.repetitions = None;
                }
                if let Some(&n) = self.operations.get(&workload.operation) {
                    workload.repetitions = Some(n);
                }
                workload
            })
            .collect()
    }

    /// Operation names that match no operation in `suite`.
    pub fn unknown<'a>(&'a self, suite: &[Workload]) -> Vec<&'a str> {
        self.operations
            .keys()
            .filter(|name| !suite.iter().any(|w| &w.operation == *name))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relational_suite_defaults() {
        let suite = relational_suite();
        let names: Vec<_> = suite.iter().map(|w| w.operation.as_str()).collect();

        assert_eq!(names.first(), Some(&INSERT_SINGLE));
        assert_eq!(names.last(), Some(&DELETE));
        assert_eq!(suite.len(), 9);
        assert_eq!(suite[1].repetitions, Some(5));
        assert_eq!(suite[1].params.get_u64(BATCH_SIZE), Some(50));
        assert!(suite[0].params.is_empty());
    }

    #[test]
    fn test_suite_for_family() {
        assert_eq!(suite_for(DbType::Graph).len(), 6);
        assert_eq!(suite_for(DbType::Relational).len(), 9);
        assert!(suite_for(DbType::All).is_empty());
    }

    #[test]
    fn test_global_override_clears_defaults() {
        let suite = Overrides::new().with_global().apply(relational_suite());
        assert!(suite.iter().all(|w| w.repetitions.is_none()));
    }

    #[test]
    fn test_operation_override_wins_over_global() {
        let overrides = Overrides::new()
            .with_global()
            .with_operation(INSERT_BATCH, 2)
            .with_operation(DELETE, 0);
        let suite = overrides.apply(relational_suite());

        let reps = |op: &str| suite.iter().find(|w| w.operation == op).unwrap().repetitions;
        assert_eq!(reps(INSERT_BATCH), Some(2));
        assert_eq!(reps(DELETE), Some(0));
        assert_eq!(reps(UPDATE), None);
    }

    #[test]
    fn test_unknown_overrides_reported() {
        let overrides = Overrides::new()
            .with_operation(UPDATE, 3)
            .with_operation("vacuum", 1);
        assert_eq!(overrides.unknown(&relational_suite()), vec!["vacuum"]);
    }
}
