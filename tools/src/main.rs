//! risk-report: headless delinquency risk analysis.
//!
//! Usage:
//!   risk-report --db bank.db [--table delinquency_prediction] [--config analysis.json]
//!               [--charts-dir images] [--json report.json]
//!   risk-report --synthetic 500 --seed 42 --charts-dir images
//!
//! `--synthetic` needs an empty target table; with `--db` point it at a
//! fresh database file or a new `--table`.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use delinquency_core::{
    analytics::{self, InsightsReport},
    charts::ChartSet,
    config::AnalysisConfig,
    report,
    risk_scorer::{score_and_tier_batch, OutOfRangeWarning, RecordFailure},
    store::DelinquencyStore,
    synthetic,
};
use std::env;
use std::path::Path;

#[derive(serde::Serialize)]
struct ReportEnvelope<'a> {
    generated_at: DateTime<Utc>,
    table: &'a str,
    rows: usize,
    failures: &'a [RecordFailure],
    warnings: &'a [OutOfRangeWarning],
    report: &'a InsightsReport,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match str_arg(&args, "--config") {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(table) = str_arg(&args, "--table") {
        config.table = table.to_string();
    }
    let synthetic_rows = parse_arg(&args, "--synthetic", 0usize);
    let seed = parse_arg(&args, "--seed", 42u64);
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let charts_dir = str_arg(&args, "--charts-dir");
    let json_out = str_arg(&args, "--json");

    if db == ":memory:" && synthetic_rows == 0 {
        bail!("nothing to analyze: pass --db <path> or --synthetic <rows>");
    }

    println!("Banking Delinquency Analysis (risk-report)");
    println!("  db:        {db}");
    println!("  table:     {}", config.table);
    if synthetic_rows > 0 {
        println!("  synthetic: {synthetic_rows} rows (seed {seed})");
    }
    println!("{}", "=".repeat(60));

    let mut store = DelinquencyStore::open(db)?.with_table(&config.table)?;
    if synthetic_rows > 0 {
        store.migrate()?;
        synthetic::populate(&mut store, synthetic_rows, seed)?;
    }

    println!("\n1. Loading data...");
    let loaded = store.load_rows()?;
    let customers = loaded.customers;
    let column_types = store.column_types()?;
    println!(
        "Data loaded: {} rows, {} columns",
        customers.len(),
        column_types.len()
    );

    println!("\n2. Generating data overview...");
    let overview = analytics::overview(&customers, column_types);
    print!("{}", report::render_overview(&overview));

    println!("\n3. Calculating risk scores...");
    let outcome = score_and_tier_batch(customers).with_load_failures(loaded.failures);
    for f in &outcome.failures {
        log::warn!("row {} ({}): {}", f.index, f.customer_id, f.error);
    }
    println!(
        "Risk score calculated: {} scored, {} failures, {} range warnings",
        outcome.fully_scored(),
        outcome.failures.len(),
        outcome.warnings.len()
    );

    let insights = analytics::analyze(&outcome.records, &config)?;

    println!("\n4. Generating chart data...");
    match charts_dir {
        Some(dir) => {
            ChartSet::from_report(&insights).write_json(Path::new(dir))?;
            println!("Chart data written to {dir}");
        }
        None => println!("Skipped (pass --charts-dir to write chart data)"),
    }

    println!("\n5. Generating insights report...");
    print!("{}", report::render_insights(&insights));

    if let Some(path) = json_out {
        let envelope = ReportEnvelope {
            generated_at: Utc::now(),
            table: &config.table,
            rows: outcome.records.len(),
            failures: &outcome.failures,
            warnings: &outcome.warnings,
            report: &insights,
        };
        std::fs::write(path, serde_json::to_string_pretty(&envelope)?)?;
        println!("Report JSON written to {path}");
    }

    println!("\n{}", "=".repeat(60));
    println!("ANALYSIS COMPLETED SUCCESSFULLY!");
    println!("{}", "=".repeat(60));
    Ok(())
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
