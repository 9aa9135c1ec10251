//! Console output for session reports.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use serde_json::json;

use dbbench_core::{SummaryTree, VendorReport, VendorStatus};

/// Output format for the console report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format per-(operation, database) statistics.
    fn format_summary(&self, tree: &SummaryTree) -> String;

    /// Format how each vendor's job ended.
    fn format_vendors(&self, vendors: &[VendorReport]) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

fn ms(value: f64) -> String {
    format!("{:.3}", value)
}

fn status_label(status: &VendorStatus) -> &'static str {
    match status {
        VendorStatus::Completed { failures, .. } if failures.is_empty() => "ok",
        VendorStatus::Completed { .. } => "partial",
        VendorStatus::Skipped { .. } => "skipped",
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_summary(&self, tree: &SummaryTree) -> String {
        if tree.is_empty() {
            return "No results to analyze.".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec![
            "Operation",
            "Database",
            "Count",
            "Mean (ms)",
            "Median (ms)",
            "Std (ms)",
            "Min (ms)",
            "Max (ms)",
        ]);

        for (operation, comparison) in tree.iter() {
            for (database, stats) in comparison.iter() {
                table.add_row(vec![
                    Cell::new(operation),
                    Cell::new(database),
                    Cell::new(stats.count),
                    Cell::new(ms(stats.mean)),
                    Cell::new(ms(stats.median)),
                    Cell::new(ms(stats.std)),
                    Cell::new(ms(stats.min)),
                    Cell::new(ms(stats.max)),
                ]);
            }
        }

        table.to_string()
    }

    fn format_vendors(&self, vendors: &[VendorReport]) -> String {
        if vendors.is_empty() {
            return "No vendors selected.".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec!["Vendor", "Status", "Details"]);

        for report in vendors {
            let details = match &report.status {
                VendorStatus::Completed { attempts, failures } => {
                    let mut details = format!("{} attempt(s)", attempts);
                    for (operation, count) in failures.iter() {
                        details.push_str(&format!(", {} failed: {}", operation, count));
                    }
                    details
                }
                VendorStatus::Skipped { reason } => reason.to_string(),
            };
            table.add_row(vec![
                Cell::new(report.target.vendor()),
                Cell::new(status_label(&report.status)),
                Cell::new(details),
            ]);
        }

        table.to_string()
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_summary(&self, tree: &SummaryTree) -> String {
        serde_json::to_string_pretty(tree).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_vendors(&self, vendors: &[VendorReport]) -> String {
        let entries: Vec<_> = vendors
            .iter()
            .map(|report| match &report.status {
                VendorStatus::Completed { attempts, failures } => json!({
                    "vendor": report.target.vendor(),
                    "status": status_label(&report.status),
                    "attempts": attempts,
                    "failures": failures,
                }),
                VendorStatus::Skipped { reason } => json!({
                    "vendor": report.target.vendor(),
                    "status": status_label(&report.status),
                    "reason": reason.to_string(),
                }),
            })
            .collect();

        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_message(&self, message: &str) -> String {
        json!({ "message": message }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbbench_core::{ConnectionError, OperationStats, OrderedMap, Target};

    fn tree() -> SummaryTree {
        let mut comparison = OrderedMap::new();
        comparison.insert(
            "sqlite",
            OperationStats::from_durations(&[1.0, 2.0, 3.0]).unwrap(),
        );
        let mut tree = SummaryTree::new();
        tree.insert("select_by_id", comparison);
        tree
    }

    fn vendors() -> Vec<VendorReport> {
        let mut failures = OrderedMap::new();
        failures.insert("update", 3);
        vec![
            VendorReport {
                target: Target::vendor_only("sqlite"),
                status: VendorStatus::Completed {
                    attempts: 10,
                    failures,
                },
            },
            VendorReport {
                target: Target::vendor_only("neo4j"),
                status: VendorStatus::Skipped {
                    reason: ConnectionError::Unsupported {
                        db_type: "graph".to_string(),
                        vendor: "neo4j".to_string(),
                    },
                },
            },
        ]
    }

    #[test]
    fn test_table_summary() {
        let output = TableFormatter.format_summary(&tree());
        assert!(output.contains("select_by_id"));
        assert!(output.contains("sqlite"));
        assert!(output.contains("2.000"));
    }

    #[test]
    fn test_table_summary_empty() {
        let output = TableFormatter.format_summary(&SummaryTree::new());
        assert_eq!(output, "No results to analyze.");
    }

    #[test]
    fn test_table_vendors() {
        let output = TableFormatter.format_vendors(&vendors());
        assert!(output.contains("partial"));
        assert!(output.contains("update failed: 3"));
        assert!(output.contains("no adapter available for graph/neo4j"));
    }

    #[test]
    fn test_json_summary_round_trips() {
        let output = JsonFormatter.format_summary(&tree());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["select_by_id"]["sqlite"]["count"], 3);
        assert_eq!(value["select_by_id"]["sqlite"]["median"], 2.0);
    }

    #[test]
    fn test_json_vendors() {
        let output = JsonFormatter.format_vendors(&vendors());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["status"], "partial");
        assert_eq!(value[0]["failures"]["update"], 3);
        assert_eq!(value[1]["status"], "skipped");
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
