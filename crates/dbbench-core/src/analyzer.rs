//! Results analyzer.
//!
//! Groups benchmark results by (operation, database) and answers statistical
//! queries over them. The analyzer holds an immutable snapshot of its input;
//! every query is a pure function of that snapshot, so repeated calls return
//! identical output and no locking is needed.

use std::collections::HashMap;

use crate::result::BenchmarkResult;
use crate::stats::OperationStats;
use crate::summary::{Comparison, OrderedMap, SummaryTree};

/// Statistical queries over a collection of benchmark results.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    results: Vec<BenchmarkResult>,
}

/// Durations of one group, in input order.
struct Group<'a> {
    operation: &'a str,
    database: &'a str,
    durations: Vec<f64>,
    failures: usize,
}

impl Analyzer {
    /// Create an analyzer over `results`. Order does not affect statistics.
    pub fn new(results: Vec<BenchmarkResult>) -> Self {
        Self { results }
    }

    /// The results this analyzer was built from.
    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Statistics for every (operation, database) group with at least one
    /// successful result.
    ///
    /// Operations are keyed in the order they first appear in the input, even
    /// when their earliest groups failed every attempt. Databases follow the
    /// first appearance of their group within the operation.
    pub fn summary_statistics(&self) -> SummaryTree {
        let groups = self.groups();
        let mut tree = SummaryTree::new();

        for operation in self.operations() {
            let comparison = compare(&groups, operation);
            if !comparison.is_empty() {
                tree.insert(operation, comparison);
            }
        }

        tree
    }

    /// Statistics per database for one operation. Empty if the operation is unknown.
    pub fn comparison_by_operation(&self, operation: &str) -> Comparison {
        compare(&self.groups(), operation)
    }

    /// A new analyzer over the results matching `predicate`.
    ///
    /// The original analyzer is left untouched, so filters chain.
    pub fn filter<P>(&self, predicate: P) -> Analyzer
    where
        P: Fn(&BenchmarkResult) -> bool,
    {
        Analyzer::new(self.results.iter().filter(|r| predicate(r)).cloned().collect())
    }

    /// Distinct operation names in first-seen order.
    pub fn operations(&self) -> Vec<&str> {
        distinct(self.results.iter().map(BenchmarkResult::operation))
    }

    /// Distinct database names in first-seen order.
    pub fn databases(&self) -> Vec<&str> {
        distinct(self.results.iter().map(BenchmarkResult::database))
    }

    /// Number of failed results per operation then database.
    ///
    /// Only groups with at least one failure appear.
    pub fn failure_counts(&self) -> OrderedMap<OrderedMap<usize>> {
        let groups = self.groups();
        let mut counts = OrderedMap::new();

        for operation in self.operations() {
            let failed: OrderedMap<usize> = groups
                .iter()
                .filter(|g| g.operation == operation && g.failures > 0)
                .map(|g| (g.database.to_string(), g.failures))
                .collect();
            if !failed.is_empty() {
                counts.insert(operation, failed);
            }
        }

        counts
    }

    /// Partition results into (operation, database) groups in first-seen order.
    fn groups(&self) -> Vec<Group<'_>> {
        let mut index: HashMap<(&str, &str), usize> = HashMap::new();
        let mut groups: Vec<Group<'_>> = Vec::new();

        for result in &self.results {
            let key = (result.operation(), result.database());
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(Group {
                    operation: key.0,
                    database: key.1,
                    durations: Vec::new(),
                    failures: 0,
                });
                groups.len() - 1
            });

            let group = &mut groups[slot];
            if result.success() {
                group.durations.push(result.duration_ms());
            } else {
                group.failures += 1;
            }
        }

        groups
    }
}

impl FromIterator<BenchmarkResult> for Analyzer {
    fn from_iter<I: IntoIterator<Item = BenchmarkResult>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Statistics of each group of `operation` that has successful results.
fn compare(groups: &[Group<'_>], operation: &str) -> Comparison {
    groups
        .iter()
        .filter(|g| g.operation == operation)
        .filter_map(|g| {
            OperationStats::from_durations(&g.durations).map(|s| (g.database.to_string(), s))
        })
        .collect()
}

fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for name in names {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}
