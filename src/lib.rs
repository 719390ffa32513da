pub mod analysis;
pub mod classify;
pub mod cli;
pub mod config;
pub mod correlation;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod quality;
pub mod recommend;
pub mod remote;
pub mod report;
pub mod segments;
pub mod stats;
pub mod summary;
pub mod table;
pub mod temporal;
pub mod themes;
pub mod trend;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{AnalyzeArgs, Cli, Commands, CorrelateArgs, InputArgs, StatsArgs},
    config::{AnalysisConfig, RemoteConfig},
    data::Table,
    remote::HttpInsightService,
    table::print_table,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_insight", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => handle_analyze(&args),
        Commands::Classify(args) => handle_classify(&args),
        Commands::Stats(args) => handle_stats(&args),
        Commands::Correlate(args) => handle_correlate(&args),
        Commands::Themes(args) => handle_themes(&args),
    }
}

/// Builds the effective configuration: YAML file or preset, then flag overrides.
fn resolve_config(args: &InputArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::for_preset(args.preset),
    };
    if let Some(rows) = args.sample_rows {
        config.sample_rows = rows;
    }
    if let Some(threshold) = args.correlation_threshold {
        config.correlation_threshold = threshold;
    }
    config.validate()?;
    debug!("Effective configuration: {config:?}");
    Ok(config)
}

fn load_input(args: &InputArgs) -> Result<Table> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Reading '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(io_utils::resolve_input_delimiter(&args.input, args.delimiter))
    );
    let table = io_utils::load_table(&args.input, args.format, args.delimiter, encoding)?;
    analysis::ensure_analyzable(&table)?;
    Ok(table)
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<()> {
    let mut config = resolve_config(&args.input)?;
    if let Some(endpoint) = &args.remote_endpoint {
        let remote = config.remote.get_or_insert_with(RemoteConfig::default);
        remote.endpoint = endpoint.clone();
    }
    if let Some(timeout) = args.remote_timeout {
        match config.remote.as_mut() {
            Some(remote) => remote.timeout_secs = timeout,
            None => warn!("--remote-timeout ignored: no insight service endpoint configured"),
        }
    }
    config.validate()?;

    let table = load_input(&args.input)?;
    let mut result = analysis::analyze(&table, &config)?;

    if let Some(remote) = &config.remote {
        info!("Requesting insights from {}", remote.endpoint);
        match HttpInsightService::from_config(remote) {
            Ok(service) => {
                remote::enrich(
                    &mut result,
                    &table,
                    &service,
                    remote.effective_sample_rows(),
                );
            }
            Err(err) => warn!("Insight service unavailable, keeping rule-based output: {err}"),
        }
    }

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&result).context("Serializing analysis result")?;
        println!("{rendered}");
    } else {
        print!("{}", report::render(&result));
    }
    Ok(())
}

fn handle_classify(args: &InputArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let table = load_input(args)?;
    let classifications = classify::classify(&table, &config);
    print_table(
        &report::classification_headers(),
        &report::classification_rows(&classifications),
    );
    Ok(())
}

fn handle_stats(args: &StatsArgs) -> Result<()> {
    let config = resolve_config(&args.input)?;
    let table = load_input(&args.input)?;
    let columns = if args.columns.is_empty() {
        classify::classify(&table, &config).numeric()
    } else {
        args.columns
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(|c| {
                table
                    .find_column(c)
                    .map(str::to_string)
                    .ok_or_else(|| error::AnalysisError::UnknownColumn(c.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?
    };
    debug!("Statistics columns: {columns:?}");
    let statistics = analysis::column_statistics(&table, &columns);
    if statistics.is_empty() {
        info!("No numeric columns to summarize");
        return Ok(());
    }
    print_table(&stats::render_headers(), &stats::render_rows(&statistics));
    Ok(())
}

fn handle_correlate(args: &CorrelateArgs) -> Result<()> {
    let mut config = resolve_config(&args.input)?;
    if let Some(threshold) = args.threshold {
        config.correlation_threshold = threshold;
        config.validate()?;
    }
    let table = load_input(&args.input)?;
    let numeric = classify::classify(&table, &config).numeric();
    let correlations =
        correlation::compute_correlations(&table, &numeric, config.correlation_threshold);
    if correlations.is_empty() {
        info!(
            "No correlations above |r| > {} among {} numeric column(s)",
            config.correlation_threshold,
            numeric.len()
        );
        return Ok(());
    }
    print_table(
        &report::correlation_headers(),
        &correlation::render_rows(&correlations),
    );
    Ok(())
}

fn handle_themes(args: &InputArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let table = load_input(args)?;
    let result = analysis::analyze(&table, &config)?;
    if result.themes.is_empty() {
        info!("No themes detected");
        return Ok(());
    }
    print_table(&report::theme_headers(), &themes::render_rows(&result.themes));
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
