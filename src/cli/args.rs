//! Command-line argument definitions using clap

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Abfunnel - analyze an A/B-tested acquisition funnel with significance tests
#[derive(Parser, Debug)]
#[command(name = "abfunnel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database holding the visits, fitness_tests, applications,
    /// and purchases tables (opened read-only)
    #[arg(short, long)]
    pub database: PathBuf,

    /// Analysis window start (YYYY-MM-DD); earlier visits are excluded
    #[arg(long, default_value = "2017-07-01", value_parser = parse_window_start)]
    pub since: NaiveDate,

    /// Directory for chart artifacts
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Significance level for chi-squared verdicts
    #[arg(long, default_value = "0.05", value_parser = validate_alpha)]
    pub alpha: f64,

    /// Skip chart rendering
    #[arg(long, default_value = "false")]
    pub skip_charts: bool,

    /// Export the complete analysis as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,
}

/// Validator for the window start date
fn parse_window_start(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a valid date (expected YYYY-MM-DD)", s))
}

/// Validator for the alpha parameter
fn validate_alpha(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value <= 0.0 || value >= 1.0 {
        Err(format!(
            "alpha must be strictly between 0 and 1, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}
