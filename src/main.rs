mod analysis;
mod compare;
mod config;
mod data;
mod error;
mod layout;
mod loader;
mod output;
mod pipeline;
mod resample;
mod symbol;

use std::io::IsTerminal;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{AppConfig, ChartArgs, Command, CompareArgs};
use error::PipelineError;
use loader::{fetch_with_fallback, CsvDirectorySource};
use output::{print_chart_report, print_comparison_report, write_json};
use pipeline::{build_bundle, days_before, fetch_start};
use symbol::{exchange_timezone, normalize_symbol};

const COMPARISON_SAMPLE_ROWS: usize = 12;

fn main() -> Result<()> {
    setup_tracing();
    let config = AppConfig::parse();
    match run(&config) {
        Err(err) => match err.downcast_ref::<PipelineError>() {
            Some(reason @ (PipelineError::FetchEmpty { .. } | PipelineError::NoOverlap { .. })) => {
                println!("No data: {reason}");
                Ok(())
            }
            _ => Err(err),
        },
        ok => ok,
    }
}

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: &AppConfig) -> Result<()> {
    let source = CsvDirectorySource::new(&config.data_dir);
    match &config.command {
        Command::Chart(args) => run_chart(&source, args),
        Command::Compare(args) => run_compare(&source, args),
    }
}

fn run_chart(source: &CsvDirectorySource, args: &ChartArgs) -> Result<()> {
    let request = args.render_request();
    let today = Utc::now()
        .with_timezone(&exchange_timezone(&request.symbol))
        .date_naive();
    let start = args
        .start
        .unwrap_or_else(|| fetch_start(request.period, request.display_count, today));
    info!(symbol = %request.symbol, %start, period = %request.period, "preparing chart");

    let fetched = fetch_with_fallback(source, &request.symbol, start)?;
    let bundle = build_bundle(&request, &fetched.symbol, &fetched.bars);
    print_chart_report(&bundle);

    if let Some(path) = &args.json {
        write_json(path, &bundle)
            .with_context(|| format!("failed to export render bundle for {}", bundle.symbol))?;
        info!(path = %path.display(), "wrote render bundle");
    }
    Ok(())
}

fn run_compare(source: &CsvDirectorySource, args: &CompareArgs) -> Result<()> {
    let first = normalize_symbol(&args.first);
    let second = normalize_symbol(&args.second);
    let today = Utc::now().with_timezone(&exchange_timezone(&first)).date_naive();
    let start = days_before(today, args.lookback_days.max(1));

    let comparison = compare::compare(source, &first, &second, start)?;
    print_comparison_report(&comparison, COMPARISON_SAMPLE_ROWS);

    if let Some(path) = &args.json {
        write_json(path, &comparison)?;
        info!(path = %path.display(), "wrote comparison");
    }
    Ok(())
}
