//! dbbench - Benchmark relational and graph databases.
//!
//! Runs the operation suite of each configured vendor, prints per-operation
//! statistics and exports the raw results and the summary.

mod config;
mod formatter;

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dbbench_core::config::{DEFAULT_OUTPUT_DIR, DEFAULT_REPETITIONS, DEFAULT_WARMUP};
use dbbench_core::{DbType, RunnerConfig, Session, SessionConfig};

use crate::config::FileConfig;
use crate::formatter::{create_formatter, OutputFormat};

/// dbbench - Compare database performance.
#[derive(Parser, Debug)]
#[command(name = "dbbench")]
#[command(version, about, long_about = None)]
struct Args {
    /// Database family to benchmark: relational, graph or all
    #[arg(short = 't', long = "type", default_value = "all")]
    db_type: DbType,

    /// Only benchmark these vendors
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    vendors: Vec<String>,

    /// Database configuration file [default: config/databases.yaml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip loading seed data
    #[arg(long)]
    no_setup: bool,

    /// Directory for the exported results
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Repetitions for every operation, replacing the suite defaults
    #[arg(short = 'n', long)]
    repetitions: Option<usize>,

    /// Unrecorded attempts before each operation
    #[arg(short, long, default_value_t = DEFAULT_WARMUP)]
    warmup: usize,

    /// Console output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("dbbench={}", level))),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let runner = RunnerConfig::new(self.repetitions.unwrap_or(DEFAULT_REPETITIONS))
            .with_warmup(self.warmup);
        let config = SessionConfig::new()
            .with_runner(runner)
            .with_output_dir(&self.output_dir)
            .with_db_type(self.db_type)
            .with_vendors(self.vendors.iter().cloned());

        if self.no_setup {
            config.without_setup()
        } else {
            config
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let session_config = args.session_config();
    let session = Session::new(&session_config)?;

    let file = FileConfig::resolve(args.config.as_deref())?;
    let overrides = file.overrides(args.repetitions.is_some());
    let jobs = dbbench_backends::build_jobs(&session_config, &file.catalog, &overrides);

    let formatter = create_formatter(args.format);
    if jobs.is_empty() {
        println!("{}", formatter.format_message("No vendors selected."));
        return Ok(());
    }

    info!(
        db_type = %session_config.db_type,
        vendors = jobs.len(),
        "starting benchmark session"
    );
    let report = session.run(jobs);

    println!("{}", formatter.format_vendors(&report.vendors));

    let analyzer = report.analyzer();
    let summary = analyzer.summary_statistics();
    println!("{}", formatter.format_summary(&summary));

    if analyzer.is_empty() {
        return Ok(());
    }

    let paths = report.export(&session_config.output_dir)?;
    println!(
        "{}",
        formatter.format_message(&format!(
            "Results saved to {} and {} (schema version {})",
            paths.results.display(),
            paths.summary.display(),
            paths.schema_version
        ))
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbbench_core::export;
    use std::fs;
    use std::io::Write;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("dbbench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.db_type, DbType::All);
        assert!(args.vendors.is_empty());
        assert_eq!(args.output_dir, PathBuf::from("results"));
        assert_eq!(args.repetitions, None);
        assert_eq!(args.format, OutputFormat::Table);

        let config = args.session_config();
        assert_eq!(config.runner.repetitions, DEFAULT_REPETITIONS);
        assert!(config.setup);
    }

    #[test]
    fn test_session_options() {
        let args = parse(&[
            "--type",
            "relational",
            "--vendors",
            "sqlite,postgresql",
            "-n",
            "7",
            "--warmup",
            "2",
            "--no-setup",
        ]);
        let config = args.session_config();

        assert_eq!(config.db_type, DbType::Relational);
        assert_eq!(config.vendors, vec!["sqlite", "postgresql"]);
        assert_eq!(config.runner.repetitions, 7);
        assert_eq!(config.runner.warmup, 2);
        assert!(!config.setup);
    }

    #[test]
    fn test_rejects_unknown_type() {
        let argv = ["dbbench", "--type", "document"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        let args = parse(&["-n", "0", "--config", "unused.yaml"]);
        let err = run(args).unwrap_err();
        assert_eq!(err.to_string(), "repetitions must be at least 1");
    }

    #[test]
    fn test_run_exports_results() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("databases.yaml");
        let mut file = fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            "relational:\n  sqlite: {{ scale: tiny }}\nworkload:\n  insert_batch: 1"
        )
        .unwrap();

        let output = dir.path().join("out");
        let args = parse(&[
            "--config",
            config_path.to_str().unwrap(),
            "--output-dir",
            output.to_str().unwrap(),
            "--type",
            "relational",
            "-n",
            "2",
        ]);
        run(args).unwrap();

        let results = export::import_csv(output.join(export::RESULTS_FILE)).unwrap();
        // 8 operations x 2 repetitions + 1 batch insert.
        assert_eq!(results.len(), 17);
        let summary = export::import_summary(output.join(export::SUMMARY_FILE)).unwrap();
        assert_eq!(summary.get("insert_batch").unwrap().get("sqlite").unwrap().count, 1);
    }

    #[test]
    fn test_run_without_results_skips_export() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("databases.yaml");
        fs::write(&config_path, "graph:\n  neo4j: { url: \"bolt://localhost:7687\" }\n").unwrap();

        let output = dir.path().join("out");
        let args = parse(&[
            "--config",
            config_path.to_str().unwrap(),
            "--output-dir",
            output.to_str().unwrap(),
        ]);
        run(args).unwrap();

        assert!(!output.exists());
    }
}
