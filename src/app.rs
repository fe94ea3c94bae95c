//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the catalog
//! - runs the explore / forecast pipelines
//! - prints reports/plots
//! - writes optional exports

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, ExploreArgs, FilterArgs, ForecastArgs, OutputArgs, SampleArgs};
use crate::domain::{DEFAULT_MAX_SERIES, DashboardConfig, DimValue, Dimension, ExploreQuery, ForecastQuery};
use crate::error::AppError;
use crate::io::cache::CatalogCache;
use crate::query::filter::FilterSelection;

pub mod pipeline;

/// Catalog used when neither `--catalog` nor `FT_CATALOG` is set.
pub const DEFAULT_CATALOG_PATH: &str = "data/styles.csv";

const SUBCOMMANDS: [&str; 4] = ["explore", "forecast", "sample", "tui"];

/// Entry point for the `ft` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` is optional; a missing file is not an error.
    dotenvy::dotenv().ok();

    // We want `ft` and `ft --catalog x.csv` to behave like `ft tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // Log lines would corrupt the alternate screen, so the TUI runs without a subscriber.
    if !matches!(cli.command, Command::Tui(_)) {
        init_tracing();
    }

    let env = EnvDefaults::from_env();
    match cli.command {
        Command::Explore(args) => {
            let config = config_from_args(cli.catalog, args.max_series, &args.output, &env);
            handle_explore(&args, &config)
        }
        Command::Forecast(args) => {
            let config = config_from_args(cli.catalog, None, &args.output, &env);
            handle_forecast(&args, &config)
        }
        Command::Sample(args) => handle_sample(&args),
        Command::Tui(args) => {
            let config = config_from_args(cli.catalog, args.max_series, &OutputArgs::default(), &env);
            crate::tui::run(config)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // `try_init` fails only when a subscriber is already installed (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Defaults read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDefaults {
    pub catalog: Option<PathBuf>,
    pub max_series: Option<usize>,
}

impl EnvDefaults {
    pub fn from_env() -> Self {
        let catalog = std::env::var_os("FT_CATALOG")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let max_series = std::env::var("FT_MAX_SERIES").ok().and_then(|raw| {
            let parsed = raw.trim().parse::<usize>().ok().filter(|n| *n > 0);
            if parsed.is_none() {
                tracing::warn!(value = %raw, "ignoring invalid FT_MAX_SERIES");
            }
            parsed
        });
        Self { catalog, max_series }
    }
}

/// Merge CLI flags with environment defaults. Flags win.
pub fn config_from_args(
    catalog: Option<PathBuf>,
    max_series: Option<usize>,
    output: &OutputArgs,
    env: &EnvDefaults,
) -> DashboardConfig {
    DashboardConfig {
        catalog_path: catalog
            .or_else(|| env.catalog.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH)),
        max_series: max_series.or(env.max_series).unwrap_or(DEFAULT_MAX_SERIES).max(1),
        plot: !output.no_plot,
        plot_width: output.width,
        plot_height: output.height,
        preview_rows: output.rows,
        export_csv: output.export.clone(),
        export_json: output.export_json.clone(),
    }
}

/// Build a filter selection from `--year-min/--year-max/--gender/--filter`.
pub fn filter_from_args(args: &FilterArgs) -> Result<FilterSelection, AppError> {
    if let (Some(lo), Some(hi)) = (args.year_min, args.year_max) {
        if hi < lo {
            return Err(AppError::new(
                2,
                format!("Invalid year range: --year-max ({hi}) is before --year-min ({lo})."),
            ));
        }
    }

    let mut filter = FilterSelection::new().with_year_range(args.year_min, args.year_max);

    if !args.gender.is_empty() {
        let genders = args
            .gender
            .iter()
            .map(|g| parse_dimension_value(Dimension::Gender, g))
            .collect::<Result<Vec<_>, _>>()?;
        filter = filter.restrict(Dimension::Gender, genders);
    }

    for (dim, raw) in &args.filters {
        let value = parse_dimension_value(*dim, raw)?;
        let mut values: Vec<DimValue> = filter.allowed(*dim).into_iter().flatten().cloned().collect();
        values.push(value);
        filter.set_allowed(*dim, values);
    }

    Ok(filter)
}

fn parse_dimension_value(dim: Dimension, raw: &str) -> Result<DimValue, AppError> {
    dim.parse_value(raw)
        .ok_or_else(|| AppError::new(2, format!("Invalid {} value: '{raw}'.", dim.header_name())))
}

fn handle_explore(args: &ExploreArgs, config: &DashboardConfig) -> Result<(), AppError> {
    let mut cache = CatalogCache::new();
    let ingested = cache.get_or_load(&config.catalog_path)?;

    let query = ExploreQuery {
        filter: filter_from_args(&args.filter)?,
        group_by: args.group_by,
        compare_by: args.compare_by,
        max_series: config.max_series,
    };
    let view = pipeline::run_explore(&ingested.catalog, &query);

    println!("{}", crate::report::format_load_summary(&ingested));
    println!("{}", crate::report::format_explore_report(&view));

    if config.plot && !view.aggregation.is_empty() {
        println!(
            "{}",
            crate::plot::render_explore_plot(&view, config.plot_width, config.plot_height)
        );
    }

    if config.preview_rows > 0 {
        let filtered = query.filter.apply(&ingested.catalog);
        println!(
            "{}",
            crate::report::format_record_preview(filtered.iter(), config.preview_rows)
        );
    }

    if let Some(path) = &config.export_csv {
        crate::io::export::write_explore_csv(path, &view)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::export::write_explore_json(path, &view)?;
    }

    Ok(())
}

fn handle_forecast(args: &ForecastArgs, config: &DashboardConfig) -> Result<(), AppError> {
    let mut cache = CatalogCache::new();
    let ingested = cache.get_or_load(&config.catalog_path)?;

    let query = ForecastQuery {
        filter: filter_from_args(&args.filter)?,
        dimension: args.dimension,
        value: parse_dimension_value(args.dimension, &args.value)?,
        horizon: args.years,
    };

    println!("{}", crate::report::format_load_summary(&ingested));
    let view = pipeline::run_forecast(&ingested.catalog, &query)?;
    println!("{}", crate::report::format_forecast_report(&view));

    if config.plot {
        println!(
            "{}",
            crate::plot::render_forecast_plot(&view, config.plot_width, config.plot_height)
        );
    }

    if config.preview_rows > 0 {
        let filtered = query.filter.apply(&ingested.catalog);
        let matching = filtered
            .iter()
            .filter(|r| r.matches(query.dimension, &query.value));
        println!(
            "{}",
            crate::report::format_record_preview(matching, config.preview_rows)
        );
    }

    if let Some(path) = &config.export_csv {
        crate::io::export::write_forecast_csv(path, &view)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::export::write_forecast_json(path, &view)?;
    }

    Ok(())
}

fn handle_sample(args: &SampleArgs) -> Result<(), AppError> {
    let config = crate::data::SampleConfig {
        rows: args.rows,
        seed: args.seed,
        year_min: args.year_min,
        year_max: args.year_max,
        missing_year_rate: args.missing_year_rate,
        malformed_rate: args.malformed_rate,
    };

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::new(2, format!("Failed to create directory '{}': {e}", parent.display()))
        })?;
    }

    let summary = crate::data::write_sample_csv(&args.out, &config)?;
    println!(
        "Wrote {} rows to {} ({} without a year, {} malformed).",
        summary.rows_written,
        args.out.display(),
        summary.missing_year,
        summary.malformed
    );
    Ok(())
}

/// Rewrite argv so `ft` defaults to `ft tui`.
///
/// Rules:
/// - `ft`                          -> `ft tui`
/// - `ft --catalog x.csv`          -> `ft tui --catalog x.csv`
/// - `ft --catalog x.csv explore`  -> unchanged
/// - `ft --help/--version/-h`      -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    // A subcommand may follow global flags (`--catalog x.csv explore`).
    let has_subcommand = argv.iter().skip(1).any(|a| SUBCOMMANDS.contains(&a.as_str()));
    if has_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_the_tui() {
        assert_eq!(rewrite_args(argv(&["ft"])), argv(&["ft", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["ft", "--catalog", "x.csv"])),
            argv(&["ft", "tui", "--catalog", "x.csv"])
        );
    }

    #[test]
    fn explicit_subcommands_and_help_are_untouched() {
        for args in [
            &["ft", "explore", "--by", "season"][..],
            &["ft", "--catalog", "x.csv", "forecast", "--value", "Black"][..],
            &["ft", "--help"][..],
            &["ft", "-V"][..],
        ] {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }

    #[test]
    fn flags_override_environment_defaults() {
        let env = EnvDefaults {
            catalog: Some(PathBuf::from("env.csv")),
            max_series: Some(5),
        };

        let from_env = config_from_args(None, None, &OutputArgs::default(), &env);
        assert_eq!(from_env.catalog_path, PathBuf::from("env.csv"));
        assert_eq!(from_env.max_series, 5);

        let from_flags = config_from_args(Some(PathBuf::from("cli.csv")), Some(3), &OutputArgs::default(), &env);
        assert_eq!(from_flags.catalog_path, PathBuf::from("cli.csv"));
        assert_eq!(from_flags.max_series, 3);

        let defaults = config_from_args(None, None, &OutputArgs::default(), &EnvDefaults::default());
        assert_eq!(defaults.catalog_path, PathBuf::from(DEFAULT_CATALOG_PATH));
        assert_eq!(defaults.max_series, DEFAULT_MAX_SERIES);
        assert!(defaults.plot);
    }

    #[test]
    fn filter_args_build_a_selection() {
        let args = FilterArgs {
            year_min: Some(2012),
            year_max: None,
            gender: vec!["Men".to_string()],
            filters: vec![
                (Dimension::BaseColour, "Black".to_string()),
                (Dimension::BaseColour, "Navy Blue".to_string()),
            ],
        };
        let filter = filter_from_args(&args).unwrap();

        let colours = filter.allowed(Dimension::BaseColour).unwrap();
        assert_eq!(colours.len(), 2);
        assert!(filter.is_allowed(Dimension::Gender, &DimValue::Text("Men".to_string())));
        assert!(!filter.is_allowed(Dimension::Gender, &DimValue::Text("Women".to_string())));
    }

    #[test]
    fn inverted_year_range_is_an_input_error() {
        let args = FilterArgs {
            year_min: Some(2015),
            year_max: Some(2012),
            ..FilterArgs::default()
        };
        assert_eq!(filter_from_args(&args).unwrap_err().exit_code(), 2);

        let bad_year = FilterArgs {
            filters: vec![(Dimension::Year, "soon".to_string())],
            ..FilterArgs::default()
        };
        assert_eq!(filter_from_args(&bad_year).unwrap_err().exit_code(), 2);
    }
}
