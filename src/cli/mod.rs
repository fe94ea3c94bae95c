//! Command-line parsing for the fashion trend explorer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the query/forecast code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{DEFAULT_HORIZON, Dimension, MAX_HORIZON};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ft", version, about = "Fashion catalog trend explorer and forecaster")]
pub struct Cli {
    /// Catalog CSV (defaults to `FT_CATALOG`, then `data/styles.csv`).
    #[arg(long, global = true, value_name = "CSV")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Count products by one or two dimensions and print the recommended chart.
    Explore(ExploreArgs),
    /// Project yearly product counts for one dimension value.
    Forecast(ForecastArgs),
    /// Write a synthetic catalog CSV.
    Sample(SampleArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same pipeline as `ft explore` / `ft forecast`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

/// Filters shared by `explore` and `forecast`.
#[derive(Debug, Args, Clone, Default)]
pub struct FilterArgs {
    /// First year to include (inclusive).
    #[arg(long)]
    pub year_min: Option<i32>,

    /// Last year to include (inclusive).
    #[arg(long)]
    pub year_max: Option<i32>,

    /// Keep only these genders (repeatable).
    #[arg(long, value_name = "GENDER")]
    pub gender: Vec<String>,

    /// Keep only records whose DIM equals VALUE (repeatable; values for the same
    /// dimension are OR-ed).
    #[arg(long = "filter", value_name = "DIM=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(Dimension, String)>,
}

/// Terminal output and export options.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Preview the first N matching records.
    #[arg(long, default_value_t = 0)]
    pub rows: usize,

    /// Export counts (or the historical + forecast table) to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the full view to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

impl Default for OutputArgs {
    fn default() -> Self {
        Self {
            no_plot: false,
            width: 80,
            height: 20,
            rows: 0,
            export: None,
            export_json: None,
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ExploreArgs {
    /// Dimension to group by.
    #[arg(long = "by", value_enum, default_value_t = Dimension::Year)]
    pub group_by: Dimension,

    /// Optional second dimension (ignored when equal to `--by`).
    #[arg(long = "compare", value_enum)]
    pub compare_by: Option<Dimension>,

    /// Largest number of pie slices / line series (defaults to `FT_MAX_SERIES`, then 8).
    #[arg(long)]
    pub max_series: Option<usize>,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct ForecastArgs {
    /// Dimension whose value is forecast.
    #[arg(long = "by", value_enum, default_value_t = Dimension::BaseColour)]
    pub dimension: Dimension,

    /// Value to forecast (e.g. `Navy Blue`).
    #[arg(long)]
    pub value: String,

    /// Years to project past the last observed year.
    #[arg(
        long,
        default_value_t = DEFAULT_HORIZON,
        value_parser = clap::value_parser!(u32).range(1..=MAX_HORIZON as i64)
    )]
    pub years: u32,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Number of rows to generate.
    #[arg(long, default_value_t = 2000)]
    pub rows: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV path.
    #[arg(long, value_name = "CSV", default_value = "data/styles.csv")]
    pub out: PathBuf,

    /// First year of the generated range.
    #[arg(long, default_value_t = 2008)]
    pub year_min: i32,

    /// Last year of the generated range.
    #[arg(long, default_value_t = 2019)]
    pub year_max: i32,

    /// Probability that a row is written without a year.
    #[arg(long, default_value_t = 0.02)]
    pub missing_year_rate: f64,

    /// Probability that a row is written with a field missing.
    #[arg(long, default_value_t = 0.005)]
    pub malformed_rate: f64,
}

#[derive(Debug, Parser, Clone, Default)]
pub struct TuiArgs {
    /// Largest number of pie slices / line series (defaults to `FT_MAX_SERIES`, then 8).
    #[arg(long)]
    pub max_series: Option<usize>,
}

/// Parse `DIM=VALUE` (dimension names are matched case-insensitively).
fn parse_filter(raw: &str) -> Result<(Dimension, String), String> {
    let (dim, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected DIM=VALUE, got '{raw}'"))?;
    let dim = Dimension::from_str(dim.trim(), true).map_err(|_| {
        let names: Vec<&str> = Dimension::ALL.iter().map(|d| d.header_name()).collect();
        format!("unknown dimension '{}' (expected one of: {})", dim.trim(), names.join(", "))
    })?;
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("empty value in '{raw}'"));
    }
    Ok((dim, value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn filter_specs_parse_dimension_and_value() {
        assert_eq!(
            parse_filter("baseColour=Navy Blue").unwrap(),
            (Dimension::BaseColour, "Navy Blue".to_string())
        );
        assert_eq!(parse_filter("SEASON = Fall").unwrap(), (Dimension::Season, "Fall".to_string()));
        assert!(parse_filter("colour").is_err());
        assert!(parse_filter("fabric=Silk").is_err());
        assert!(parse_filter("gender=").is_err());
    }

    #[test]
    fn forecast_years_are_bounded() {
        let ok = Cli::try_parse_from(["ft", "forecast", "--value", "Black", "--years", "5"]);
        assert!(ok.is_ok());
        let too_far = Cli::try_parse_from(["ft", "forecast", "--value", "Black", "--years", "6"]);
        assert!(too_far.is_err());
        let zero = Cli::try_parse_from(["ft", "forecast", "--value", "Black", "--years", "0"]);
        assert!(zero.is_err());
    }

    #[test]
    fn explore_accepts_header_names_and_aliases() {
        let cli = Cli::try_parse_from([
            "ft",
            "--catalog",
            "styles.csv",
            "explore",
            "--by",
            "masterCategory",
            "--compare",
            "color",
            "--gender",
            "Men",
            "--gender",
            "Women",
        ])
        .unwrap();
        assert_eq!(cli.catalog, Some(PathBuf::from("styles.csv")));
        let Command::Explore(args) = cli.command else {
            panic!("expected explore");
        };
        assert_eq!(args.group_by, Dimension::MasterCategory);
        assert_eq!(args.compare_by, Some(Dimension::BaseColour));
        assert_eq!(args.filter.gender, vec!["Men".to_string(), "Women".to_string()]);
    }
}
