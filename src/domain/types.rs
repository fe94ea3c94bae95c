//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during filtering/aggregation
//! - exported to JSON/CSV
//! - rendered by both the text reports and the TUI

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::query::filter::FilterSelection;

/// Default limit on pie slices / line series before a chart stops being readable.
pub const DEFAULT_MAX_SERIES: usize = 8;

/// Default forecast horizon (years ahead).
pub const DEFAULT_HORIZON: u32 = 3;

/// Largest horizon the front-ends offer.
pub const MAX_HORIZON: u32 = 5;

/// A categorical or temporal field usable for grouping.
///
/// The value names match the CSV header names so that they can be typed on
/// the command line exactly as they appear in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
pub enum Dimension {
    #[serde(rename = "year")]
    #[value(name = "year")]
    Year,
    #[serde(rename = "gender")]
    #[value(name = "gender")]
    Gender,
    #[serde(rename = "masterCategory")]
    #[value(name = "masterCategory", alias = "master-category")]
    MasterCategory,
    #[serde(rename = "subCategory")]
    #[value(name = "subCategory", alias = "sub-category")]
    SubCategory,
    #[serde(rename = "articleType")]
    #[value(name = "articleType", alias = "article-type")]
    ArticleType,
    #[serde(rename = "baseColour")]
    #[value(name = "baseColour", aliases = ["base-colour", "color"])]
    BaseColour,
    #[serde(rename = "season")]
    #[value(name = "season")]
    Season,
    #[serde(rename = "usage")]
    #[value(name = "usage")]
    Usage,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::Year,
        Dimension::Gender,
        Dimension::MasterCategory,
        Dimension::SubCategory,
        Dimension::ArticleType,
        Dimension::BaseColour,
        Dimension::Season,
        Dimension::Usage,
    ];

    /// Column name in the catalog CSV.
    pub fn header_name(self) -> &'static str {
        match self {
            Dimension::Year => "year",
            Dimension::Gender => "gender",
            Dimension::MasterCategory => "masterCategory",
            Dimension::SubCategory => "subCategory",
            Dimension::ArticleType => "articleType",
            Dimension::BaseColour => "baseColour",
            Dimension::Season => "season",
            Dimension::Usage => "usage",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Dimension::Year => "Year",
            Dimension::Gender => "Gender",
            Dimension::MasterCategory => "Master Category",
            Dimension::SubCategory => "Sub Category",
            Dimension::ArticleType => "Article Type",
            Dimension::BaseColour => "Base Colour",
            Dimension::Season => "Season",
            Dimension::Usage => "Usage",
        }
    }

    pub fn is_temporal(self) -> bool {
        self == Dimension::Year
    }

    /// Parse a user-supplied value for this dimension.
    ///
    /// Years must be integers; any other dimension accepts the trimmed text as-is.
    pub fn parse_value(self, raw: &str) -> Option<DimValue> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match self {
            Dimension::Year => raw.parse::<i32>().ok().map(DimValue::Year),
            _ => Some(DimValue::Text(raw.to_string())),
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_name())
    }
}

/// A single dimension value: years order numerically, text lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimValue {
    Year(i32),
    Text(String),
}

impl fmt::Display for DimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimValue::Year(y) => write!(f, "{y}"),
            DimValue::Text(s) => f.write_str(s),
        }
    }
}

/// One product from the catalog.
///
/// Every record carries an integer year; rows without one never make it past ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub gender: Option<String>,
    pub master_category: Option<String>,
    pub sub_category: Option<String>,
    pub article_type: Option<String>,
    pub base_colour: Option<String>,
    pub season: Option<String>,
    pub usage: Option<String>,
    pub product_display_name: Option<String>,
    pub year: i32,
}

impl Record {
    /// The record's value for `dim`, or `None` when the field is absent.
    pub fn value(&self, dim: Dimension) -> Option<DimValue> {
        match dim {
            Dimension::Year => Some(DimValue::Year(self.year)),
            _ => self.text(dim).map(|s| DimValue::Text(s.to_string())),
        }
    }

    /// Borrowed text of a categorical field (`None` for `year`).
    pub fn text(&self, dim: Dimension) -> Option<&str> {
        let field = match dim {
            Dimension::Year => return None,
            Dimension::Gender => &self.gender,
            Dimension::MasterCategory => &self.master_category,
            Dimension::SubCategory => &self.sub_category,
            Dimension::ArticleType => &self.article_type,
            Dimension::BaseColour => &self.base_colour,
            Dimension::Season => &self.season,
            Dimension::Usage => &self.usage,
        };
        field.as_deref()
    }

    /// Whether the record's value for `dim` equals `value`.
    pub fn matches(&self, dim: Dimension, value: &DimValue) -> bool {
        match (dim, value) {
            (Dimension::Year, DimValue::Year(y)) => self.year == *y,
            (Dimension::Year, DimValue::Text(_)) => false,
            (_, DimValue::Text(s)) => self.text(dim) == Some(s.as_str()),
            (_, DimValue::Year(_)) => false,
        }
    }
}

/// The full in-memory product catalog, immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<Record>,
}

impl Catalog {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest year present (the default year range).
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }
}

/// Presentation mode recommended for an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Pie,
    Bar,
}

impl ChartKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Bar => "bar",
        }
    }
}

/// Counts per value of a single dimension, count descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSeries {
    pub dimension: Dimension,
    pub entries: Vec<(DimValue, u64)>,
}

impl CountSeries {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn get(&self, key: &DimValue) -> Option<u64> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, c)| *c)
    }
}

/// Counts per pair of values: rows are `dim1` values, columns `dim2` values.
///
/// Missing combinations are stored as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountTable {
    pub row_dimension: Dimension,
    pub column_dimension: Dimension,
    pub rows: Vec<DimValue>,
    pub columns: Vec<DimValue>,
    /// Row-major: `cells[row][column]`.
    pub cells: Vec<Vec<u64>>,
}

impl CountTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }

    pub fn row_sums(&self) -> Vec<u64> {
        self.cells.iter().map(|row| row.iter().sum()).collect()
    }

    /// The column as an ordered `(row, count)` series (used for line/bar series).
    pub fn column_series(&self, column: usize) -> Vec<(DimValue, u64)> {
        self.rows
            .iter()
            .zip(self.cells.iter())
            .map(|(row, cells)| (row.clone(), cells[column]))
            .collect()
    }
}

/// Result of the aggregation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Aggregation {
    Single(CountSeries),
    Pair(CountTable),
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        match self {
            Aggregation::Single(s) => s.is_empty(),
            Aggregation::Pair(t) => t.is_empty(),
        }
    }

    pub fn total(&self) -> u64 {
        match self {
            Aggregation::Single(s) => s.total(),
            Aggregation::Pair(t) => t.total(),
        }
    }
}

/// Sparse per-year counts (only years with at least one record appear).
pub type YearSeries = BTreeMap<i32, u64>;

/// Projected counts per future year.
pub type ForecastSeries = BTreeMap<i32, u64>;

/// Direction of a forecast relative to its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

impl TrendDirection {
    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
        }
    }
}

/// What the Explore view should compute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreQuery {
    pub filter: FilterSelection,
    pub group_by: Dimension,
    pub compare_by: Option<Dimension>,
    pub max_series: usize,
}

/// What the Forecast view should compute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastQuery {
    pub filter: FilterSelection,
    pub dimension: Dimension,
    pub value: DimValue,
    pub horizon: u32,
}

/// A full run's configuration as understood by the host process.
///
/// This is derived from CLI flags plus `.env`/environment defaults.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub catalog_path: PathBuf,
    pub max_series: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    /// Number of filtered records to preview below the report (0 disables).
    pub preview_rows: usize,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}
