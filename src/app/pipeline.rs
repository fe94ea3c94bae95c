//! Shared explore/forecast pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! filter -> aggregate -> chart selection -> insight, and
//! filter -> yearly history -> forecast -> direction -> insight.
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use serde::Serialize;

use crate::domain::{
    Aggregation, Catalog, ChartKind, DimValue, Dimension, ExploreQuery, ForecastQuery, ForecastSeries,
    TrendDirection, YearSeries,
};
use crate::error::NoDataError;
use crate::forecast::{forecast, trend_direction, yearly_history};
use crate::query::aggregate::{aggregate, normalize_pair};
use crate::query::chart::resolve_chart;
use crate::query::filter::FilterSelection;
use crate::report::insight::{aggregation_insight, forecast_insight};

/// All computed outputs of one explore interaction.
#[derive(Debug, Clone, Serialize)]
pub struct ExploreView {
    pub filter: FilterSelection,
    pub group_by: Dimension,
    /// Second dimension after normalization (`None` when absent or equal to `group_by`).
    pub compare_by: Option<Dimension>,
    pub max_series: usize,
    pub catalog_rows: usize,
    pub filtered_rows: usize,
    pub aggregation: Aggregation,
    pub chart: ChartKind,
    pub insight: Option<String>,
}

/// Whether a combined forecast row was observed or projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Historical,
    Forecast,
}

impl RowKind {
    pub fn label(self) -> &'static str {
        match self {
            RowKind::Historical => "historical",
            RowKind::Forecast => "forecast",
        }
    }
}

/// One row of the historical + forecast table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CombinedRow {
    pub year: i32,
    pub count: u64,
    pub kind: RowKind,
}

/// All computed outputs of one forecast interaction.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastView {
    pub filter: FilterSelection,
    pub dimension: Dimension,
    pub value: DimValue,
    pub horizon: u32,
    pub filtered_rows: usize,
    pub history: YearSeries,
    pub forecast: ForecastSeries,
    pub direction: TrendDirection,
    pub insight: String,
}

impl ForecastView {
    /// First projected year (the year after the last observation).
    pub fn forecast_start(&self) -> Option<i32> {
        first_projected_year(&self.history, &self.forecast)
    }

    /// History followed by the projection, in year order.
    pub fn combined(&self) -> Vec<CombinedRow> {
        let observed = self.history.iter().map(|(&year, &count)| CombinedRow {
            year,
            count,
            kind: RowKind::Historical,
        });
        let projected = self.forecast.iter().map(|(&year, &count)| CombinedRow {
            year,
            count,
            kind: RowKind::Forecast,
        });
        observed.chain(projected).collect()
    }
}

/// Filter, aggregate and pick a chart for the Explore view.
///
/// An empty selection is not an error here: the aggregation comes back empty
/// and `insight` is `None`.
pub fn run_explore(catalog: &Catalog, query: &ExploreQuery) -> ExploreView {
    let view = query.filter.apply(catalog);
    let compare_by = normalize_pair(query.group_by, query.compare_by);
    let aggregation = aggregate(&view, query.group_by, compare_by);
    let chart = resolve_chart(&aggregation, query.group_by, compare_by, query.max_series);
    let insight = aggregation_insight(&aggregation).ok();

    tracing::debug!(
        group_by = %query.group_by,
        compare_by = ?compare_by,
        rows = view.len(),
        chart = chart.display_name(),
        "explore view computed"
    );

    ExploreView {
        filter: query.filter.clone(),
        group_by: query.group_by,
        compare_by,
        max_series: query.max_series,
        catalog_rows: catalog.len(),
        filtered_rows: view.len(),
        aggregation,
        chart,
        insight,
    }
}

/// Filter, build the yearly history for one value and project it forward.
pub fn run_forecast(catalog: &Catalog, query: &ForecastQuery) -> Result<ForecastView, NoDataError> {
    let view = query.filter.apply(catalog);
    let history = yearly_history(&view, query.dimension, &query.value);
    if history.is_empty() {
        return Err(NoDataError::new(format!("{} = {}", query.dimension, query.value)));
    }

    let projected = forecast(&history, query.horizon)?;
    let direction = trend_direction(&history, &projected);
    let start = first_projected_year(&history, &projected).unwrap_or_default();
    let insight = forecast_insight(query.dimension, &query.value, start, direction);

    tracing::debug!(
        dimension = %query.dimension,
        value = %query.value,
        years = history.len(),
        horizon = query.horizon,
        direction = direction.label(),
        "forecast view computed"
    );

    Ok(ForecastView {
        filter: query.filter.clone(),
        dimension: query.dimension,
        value: query.value.clone(),
        horizon: query.horizon,
        filtered_rows: view.len(),
        history,
        forecast: projected,
        direction,
        insight,
    })
}

fn first_projected_year(history: &YearSeries, forecast: &ForecastSeries) -> Option<i32> {
    forecast
        .keys()
        .next()
        .copied()
        .or_else(|| history.keys().next_back().map(|y| y + 1))
}
