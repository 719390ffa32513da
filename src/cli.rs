use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{config::Preset, io_utils::InputFormat};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Classify, profile and summarize tabular data",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full analysis and print a report (or JSON with --json)
    Analyze(AnalyzeArgs),
    /// Classify every column as numeric, date or categorical
    Classify(InputArgs),
    /// Produce descriptive statistics for numeric columns
    Stats(StatsArgs),
    /// List pairwise correlations between numeric columns
    Correlate(CorrelateArgs),
    /// Detect domain themes such as financial market or time series data
    Themes(InputArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input CSV or JSON file ('-' reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Input format (auto picks JSON for .json files, CSV otherwise)
    #[arg(long, value_enum, default_value = "auto")]
    pub format: InputFormat,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file with analysis settings (overrides --preset)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Built-in settings to start from
    #[arg(long, value_enum, default_value = "exploratory")]
    pub preset: Preset,
    /// Number of leading rows sampled for type classification
    #[arg(long = "sample-rows")]
    pub sample_rows: Option<usize>,
    /// Minimum |r| for a correlation to be reported
    #[arg(long = "correlation-threshold")]
    pub correlation_threshold: Option<f64>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Emit the full analysis result as JSON
    #[arg(long)]
    pub json: bool,
    /// Insight service endpoint to enrich the report with
    #[arg(long = "remote-endpoint")]
    pub remote_endpoint: Option<String>,
    /// Seconds to wait for the insight service
    #[arg(long = "remote-timeout")]
    pub remote_timeout: Option<u64>,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Restrict statistics to these columns (defaults to every numeric column)
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CorrelateArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Minimum |r| to report (takes precedence over --correlation-threshold)
    #[arg(long)]
    pub threshold: Option<f64>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
