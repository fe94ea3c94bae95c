//! Formatted terminal output for explore and forecast runs.
//!
//! We keep formatting code in one place so:
//! - the query/forecast code stays clean and testable
//! - output changes are localized (the tests below pin the layout)

use crate::app::pipeline::{ExploreView, ForecastView};
use crate::domain::{Aggregation, CountSeries, CountTable, Record};
use crate::io::ingest::IngestedCatalog;
use crate::query::filter::FilterSelection;

const KEY_WIDTH: usize = 24;
const CELL_WIDTH: usize = 10;

/// Catalog load diagnostics (rows read/used/skipped).
pub fn format_load_summary(ingest: &IngestedCatalog) -> String {
    let mut out = format!(
        "Catalog: rows={} | used={} | skipped={} (missing year={}, malformed={})",
        ingest.rows_read,
        ingest.rows_used,
        ingest.rows_skipped(),
        ingest.missing_year,
        ingest.row_errors.len(),
    );
    if let Some((lo, hi)) = ingest.catalog.year_bounds() {
        out.push_str(&format!(" | year=[{lo}, {hi}]"));
    }
    out.push('\n');
    out
}

/// Format the explore summary: selection, counts, chart mode and insight.
pub fn format_explore_report(view: &ExploreView) -> String {
    let mut out = String::new();

    out.push_str("=== ft - Fashion Trend Explorer ===\n");
    out.push_str(&format!("Filters: {}\n", describe_filter(&view.filter)));
    match view.compare_by {
        Some(dim2) => out.push_str(&format!(
            "Group by: {} x {}\n",
            view.group_by.display_name(),
            dim2.display_name()
        )),
        None => out.push_str(&format!("Group by: {}\n", view.group_by.display_name())),
    }
    out.push_str(&format!(
        "Products: {} of {} in selection\n",
        view.filtered_rows, view.catalog_rows
    ));

    out.push('\n');
    match &view.aggregation {
        Aggregation::Single(series) => out.push_str(&format_count_series(series)),
        Aggregation::Pair(table) => out.push_str(&format_count_table(table, view.max_series)),
    }

    out.push_str(&format!("\nChart: {}\n", view.chart.display_name()));
    match &view.insight {
        Some(insight) => out.push_str(&format!("Insight: {insight}\n")),
        None => out.push_str("Insight: No data for this selection. Change filters or grouping.\n"),
    }

    out
}

/// Format the forecast summary with the combined historical/forecast table.
pub fn format_forecast_report(view: &ForecastView) -> String {
    let mut out = String::new();

    out.push_str("=== ft - Fashion Trend Forecast ===\n");
    out.push_str(&format!("Filters: {}\n", describe_filter(&view.filter)));
    out.push_str(&format!(
        "Series: {} = '{}' | horizon={}y | products in selection={}\n",
        view.dimension.display_name(),
        view.value,
        view.horizon,
        view.filtered_rows
    ));

    out.push('\n');
    out.push_str(format!("{:<6} {:>8} {:<10}", "year", "count", "type").trim_end());
    out.push('\n');
    out.push_str(&format!("{:-<6} {:-<8} {:-<10}", "", "", ""));
    out.push('\n');
    for row in view.combined() {
        out.push_str(format!("{:<6} {:>8} {:<10}", row.year, row.count, row.kind.label()).trim_end());
        out.push('\n');
    }

    out.push_str(&format!("\nTrend: {}\n", view.direction.label()));
    out.push_str(&format!("Insight: {}\n", view.insight));
    out
}

/// Preview the first `n` records (id, gender, colour, article, year, name).
pub fn format_record_preview<'a>(records: impl IntoIterator<Item = &'a Record>, n: usize) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>8} {:<8} {:<12} {:<14} {:>6} {:<30}",
            "id", "gender", "colour", "article", "year", "name"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!("{:-<8} {:-<8} {:-<12} {:-<14} {:-<6} {:-<30}", "", "", "", "", "", ""));
    out.push('\n');

    for r in records.into_iter().take(n) {
        out.push_str(
            format!(
                "{:>8} {:<8} {:<12} {:<14} {:>6} {:<30}",
                r.id,
                truncate(r.gender.as_deref().unwrap_or(""), 8),
                truncate(r.base_colour.as_deref().unwrap_or(""), 12),
                truncate(r.article_type.as_deref().unwrap_or(""), 14),
                r.year,
                truncate(r.product_display_name.as_deref().unwrap_or(""), 30),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn format_count_series(series: &CountSeries) -> String {
    let mut out = String::new();
    let total = series.total();

    out.push_str(&format!("{:<KEY_WIDTH$} {:>8} {:>7}", series.dimension.header_name(), "count", "share"));
    out.push('\n');
    out.push_str(&format!("{:-<KEY_WIDTH$} {:-<8} {:-<7}", "", "", ""));
    out.push('\n');

    for (key, count) in &series.entries {
        let share = if total == 0 { 0.0 } else { *count as f64 * 100.0 / total as f64 };
        out.push_str(&format!(
            "{:<KEY_WIDTH$} {:>8} {:>6.1}%",
            truncate(&key.to_string(), KEY_WIDTH),
            count,
            share
        ));
        out.push('\n');
    }
    out.push_str(&format!("{:<KEY_WIDTH$} {:>8}\n", "total", total));
    out
}

/// Pair table with one column per `dim2` value; wide tables show the first
/// `max_columns` columns plus an aggregated "(other)" column.
fn format_count_table(table: &CountTable, max_columns: usize) -> String {
    let mut out = String::new();
    let shown = table.columns.len().min(max_columns.max(1));
    let has_other = shown < table.columns.len();

    let mut header = format!(
        "{:<KEY_WIDTH$}",
        truncate(
            &format!("{} \\ {}", table.row_dimension.header_name(), table.column_dimension.header_name()),
            KEY_WIDTH
        )
    );
    for col in &table.columns[..shown] {
        header.push_str(&format!(" {:>CELL_WIDTH$}", truncate(&col.to_string(), CELL_WIDTH)));
    }
    if has_other {
        header.push_str(&format!(" {:>CELL_WIDTH$}", "(other)"));
    }
    header.push_str(&format!(" {:>8}", "total"));
    out.push_str(&header);
    out.push('\n');
    out.push_str(&"-".repeat(header.chars().count()));
    out.push('\n');

    for (row, cells) in table.rows.iter().zip(&table.cells) {
        let mut line = format!("{:<KEY_WIDTH$}", truncate(&row.to_string(), KEY_WIDTH));
        for count in &cells[..shown] {
            line.push_str(&format!(" {count:>CELL_WIDTH$}"));
        }
        if has_other {
            let other: u64 = cells[shown..].iter().sum();
            line.push_str(&format!(" {other:>CELL_WIDTH$}"));
        }
        let total: u64 = cells.iter().sum();
        line.push_str(&format!(" {total:>8}"));
        out.push_str(&line);
        out.push('\n');
    }

    if has_other {
        out.push_str(&format!(
            "({} of {} {} columns shown)\n",
            shown,
            table.columns.len(),
            table.column_dimension.header_name()
        ));
    }
    out
}

/// One-line description of the active constraints.
pub fn describe_filter(filter: &FilterSelection) -> String {
    let mut parts = Vec::new();
    match (filter.year_min, filter.year_max) {
        (None, None) => {}
        (lo, hi) => parts.push(format!(
            "year=[{}, {}]",
            lo.map(|y| y.to_string()).unwrap_or_else(|| "..".to_string()),
            hi.map(|y| y.to_string()).unwrap_or_else(|| "..".to_string()),
        )),
    }
    for dim in filter.constrained_dimensions() {
        let values: Vec<String> = filter
            .allowed(dim)
            .map(|set| set.iter().map(|v| v.to_string()).collect())
            .unwrap_or_default();
        parts.push(format!("{}={{{}}}", dim.header_name(), values.join(", ")));
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(" | ")
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
