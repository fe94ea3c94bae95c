//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - line charts: observed points `o` joined by `-`, projected points `x` joined by `.`
//!   (multi-series line charts use one letter per series)
//! - bar charts: `#` bars with counts
//! - pie charts: share bars with percentages
//! - pair bar charts: stacked bars, one letter per column value

use crate::app::pipeline::{ExploreView, ForecastView};
use crate::domain::{Aggregation, ChartKind, CountSeries, CountTable, DimValue, ForecastSeries, YearSeries};
use crate::report::format::truncate;

const LABEL_WIDTH: usize = 20;
const SERIES_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// One polyline on an xy plot.
#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub points: Vec<(f64, f64)>,
    /// Character used for the connecting stroke (`None` draws markers only).
    pub stroke: Option<char>,
    pub marker: char,
    /// Whether the marker is drawn on the first point (a bridge from another series skips it).
    pub mark_first: bool,
}

/// Render the chart recommended for an explore view.
pub fn render_explore_plot(view: &ExploreView, width: usize, height: usize) -> String {
    if view.aggregation.is_empty() {
        return "Plot: (no data)\n".to_string();
    }
    match (&view.aggregation, view.chart) {
        (Aggregation::Single(series), ChartKind::Line) => render_year_line(series, width, height),
        (Aggregation::Single(series), ChartKind::Pie) => render_pie_shares(series, width),
        (Aggregation::Single(series), ChartKind::Bar) => render_bar_chart(series, width),
        (Aggregation::Pair(table), ChartKind::Line) => render_year_lines(table, width, height),
        (Aggregation::Pair(table), _) => render_stacked_bars(table, width),
    }
}

/// Render history (`o`, `-`) and projection (`x`, `.`) on one grid.
pub fn render_forecast_plot(view: &ForecastView, width: usize, height: usize) -> String {
    render_history_and_forecast(&view.history, &view.forecast, width, height)
}

pub fn render_history_and_forecast(
    history: &YearSeries,
    forecast: &ForecastSeries,
    width: usize,
    height: usize,
) -> String {
    let observed: Vec<(f64, f64)> = history.iter().map(|(&y, &c)| (y as f64, c as f64)).collect();

    // The projection stroke starts from the last observation so the two lines join.
    let mut projected: Vec<(f64, f64)> = observed.last().copied().into_iter().collect();
    let bridged = !projected.is_empty();
    projected.extend(forecast.iter().map(|(&y, &c)| (y as f64, c as f64)));

    let series = [
        PlotSeries {
            points: observed,
            stroke: Some('-'),
            marker: 'o',
            mark_first: true,
        },
        PlotSeries {
            points: projected,
            stroke: Some('.'),
            marker: 'x',
            mark_first: !bridged,
        },
    ];

    let mut out = render_xy(&series, "year", width, height);
    out.push_str("o historical  x forecast\n");
    out
}

fn render_year_line(series: &CountSeries, width: usize, height: usize) -> String {
    let mut points: Vec<(f64, f64)> = series
        .entries
        .iter()
        .filter_map(|(k, c)| year_of(k).map(|y| (y as f64, *c as f64)))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    render_xy(
        &[PlotSeries {
            points,
            stroke: Some('-'),
            marker: 'o',
            mark_first: true,
        }],
        series.dimension.header_name(),
        width,
        height,
    )
}

/// One line per column value over the year rows.
fn render_year_lines(table: &CountTable, width: usize, height: usize) -> String {
    let mut all = Vec::with_capacity(table.columns.len());
    let mut legend = Vec::with_capacity(table.columns.len());

    for (col, (value, letter)) in table.columns.iter().zip(series_letters()).enumerate() {
        let points = table
            .column_series(col)
            .into_iter()
            .filter_map(|(k, c)| year_of(&k).map(|y| (y as f64, c as f64)))
            .collect();
        all.push(PlotSeries {
            points,
            stroke: Some('.'),
            marker: letter,
            mark_first: true,
        });
        legend.push(format!("{letter}={value}"));
    }

    let mut out = render_xy(&all, table.row_dimension.header_name(), width, height);
    out.push_str(&legend.join("  "));
    out.push('\n');
    out
}

/// Horizontal `#` bars scaled to the largest count.
pub fn render_bar_chart(series: &CountSeries, width: usize) -> String {
    let entries: Vec<(String, u64)> = series.entries.iter().map(|(k, c)| (k.to_string(), *c)).collect();
    let max = entries.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let (label_w, bar_w) = bar_layout(entries.iter().map(|(k, _)| k.as_str()), width, 8);

    let mut out = format!("Bars: {} | max={max}\n", series.dimension.header_name());
    for (label, count) in &entries {
        let len = scaled(*count, max, bar_w);
        out.push_str(
            format!(
                "{:<label_w$} |{} {count}",
                truncate(label, label_w),
                "#".repeat(len),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Pie slices as share bars (each bar is a fraction of the full width).
pub fn render_pie_shares(series: &CountSeries, width: usize) -> String {
    let total = series.total();
    let labels: Vec<String> = series.entries.iter().map(|(k, _)| k.to_string()).collect();
    let (label_w, bar_w) = bar_layout(labels.iter().map(String::as_str), width, 8);

    let mut out = format!("Shares: {} | total={total}\n", series.dimension.header_name());
    for (label, (_, count)) in labels.iter().zip(&series.entries) {
        let share = if total == 0 { 0.0 } else { *count as f64 / total as f64 };
        let len = scaled(*count, total, bar_w);
        out.push_str(&format!(
            "{:<label_w$} |{}{} {:>5.1}%",
            truncate(label, label_w),
            "#".repeat(len),
            " ".repeat(bar_w - len),
            share * 100.0,
        ));
        out.push('\n');
    }
    out
}

/// Stacked bars: one bar per row, one letter per column value.
pub fn render_stacked_bars(table: &CountTable, width: usize) -> String {
    let sums = table.row_sums();
    let max = sums.iter().copied().max().unwrap_or(0);
    let labels: Vec<String> = table.rows.iter().map(|r| r.to_string()).collect();
    let (label_w, bar_w) = bar_layout(labels.iter().map(String::as_str), width, 8);

    let mut out = format!(
        "Bars: {} by {} | max={max}\n",
        table.row_dimension.header_name(),
        table.column_dimension.header_name()
    );
    for ((label, cells), total) in labels.iter().zip(&table.cells).zip(&sums) {
        let mut bar = String::new();
        let mut cum = 0u64;
        for (count, letter) in cells.iter().zip(series_letters()) {
            let start = scaled(cum, max, bar_w);
            cum += count;
            let end = scaled(cum, max, bar_w);
            bar.extend(std::iter::repeat_n(letter, end - start));
        }
        out.push_str(format!("{:<label_w$} |{bar} {total}", truncate(label, label_w)).trim_end());
        out.push('\n');
    }

    let legend: Vec<String> = table
        .columns
        .iter()
        .zip(series_letters())
        .map(|(value, letter)| format!("{letter}={value}"))
        .collect();
    out.push_str(&legend.join("  "));
    out.push('\n');
    out
}

/// Render xy polylines on a fixed grid with a small range header.
pub fn render_xy(series: &[PlotSeries], x_name: &str, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((x_min, x_max)) = axis_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.0))) else {
        return "Plot: (no data)\n".to_string();
    };
    let (y_min, y_max) =
        axis_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.1))).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Strokes first so markers overlay them.
    for s in series {
        let Some(stroke) = s.stroke else { continue };
        let mut prev = None;
        for &(x, y) in &s.points {
            let cx = map_x(x, x_min, x_max, width);
            let cy = map_y(y, y_min, y_max, height);
            if let Some((x0, y0)) = prev {
                draw_line(&mut grid, x0, y0, cx, cy, stroke);
            }
            prev = Some((cx, cy));
        }
    }
    for s in series {
        let skip = usize::from(!s.mark_first);
        for &(x, y) in s.points.iter().skip(skip) {
            grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = s.marker;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {x_name}=[{x_min:.0}, {x_max:.0}] | count=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn year_of(value: &DimValue) -> Option<i32> {
    match value {
        DimValue::Year(y) => Some(*y),
        DimValue::Text(_) => None,
    }
}

fn series_letters() -> impl Iterator<Item = char> {
    SERIES_LETTERS.iter().map(|&b| b as char).cycle()
}

/// Label column width and bar width for a horizontal chart.
fn bar_layout<'a>(labels: impl Iterator<Item = &'a str>, width: usize, count_room: usize) -> (usize, usize) {
    let label_w = labels.map(|l| l.chars().count()).max().unwrap_or(0).clamp(1, LABEL_WIDTH);
    let bar_w = width.saturating_sub(label_w + 2 + count_room).max(10);
    (label_w, bar_w)
}

fn scaled(value: u64, max: u64, width: usize) -> usize {
    if max == 0 {
        return 0;
    }
    ((value as f64 / max as f64) * width as f64).round() as usize
}

/// Min/max of finite values, widened by one unit on each side when flat.
fn axis_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    if max > min { Some((min, max)) } else { Some((min - 1.0, max + 1.0)) }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Dimension;

    fn text(s: &str) -> DimValue {
        DimValue::Text(s.to_string())
    }

    #[test]
    fn forecast_plot_golden_snapshot_small() {
        let history: YearSeries = [(2016, 10), (2017, 20), (2018, 30)].into_iter().collect();
        let forecast: ForecastSeries = [(2019, 40), (2020, 50)].into_iter().collect();

        let txt = render_history_and_forecast(&history, &forecast, 10, 5);
        let expected = concat!(
            "Plot: year=[2016, 2020] | count=[8.00, 52.00]\n",
            "        .x\n",
            "      .x  \n",
            "    -o    \n",
            " -o-      \n",
            "o         \n",
            "o historical  x forecast\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn bar_chart_scales_to_the_largest_count() {
        let series = CountSeries {
            dimension: Dimension::ArticleType,
            entries: vec![(text("Tshirts"), 20), (text("Shirts"), 10), (text("Socks"), 0)],
        };
        let txt = render_bar_chart(&series, 37);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "Bars: articleType | max=20");
        assert_eq!(lines[1], format!("Tshirts |{} 20", "#".repeat(20)));
        assert_eq!(lines[2], format!("Shirts  |{} 10", "#".repeat(10)));
        assert_eq!(lines[3], "Socks   | 0");
    }

    #[test]
    fn pie_shares_show_percentages() {
        let series = CountSeries {
            dimension: Dimension::Gender,
            entries: vec![(text("Men"), 3), (text("Women"), 1)],
        };
        let txt = render_pie_shares(&series, 35);
        assert!(txt.contains(&format!("Men   |{}{}  75.0%", "#".repeat(15), " ".repeat(5))));
        assert!(txt.contains(&format!("Women |{}{}  25.0%", "#".repeat(5), " ".repeat(15))));
    }

    #[test]
    fn stacked_bars_use_one_letter_per_column() {
        let table = CountTable {
            row_dimension: Dimension::Gender,
            column_dimension: Dimension::Season,
            rows: vec![text("Men"), text("Women")],
            columns: vec![text("Fall"), text("Summer")],
            cells: vec![vec![5, 5], vec![2, 3]],
        };
        let txt = render_stacked_bars(&table, 25);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[1], format!("Men   |{}{} 10", "a".repeat(5), "b".repeat(5)));
        assert_eq!(lines[2], format!("Women |{}{} 5", "a".repeat(2), "b".repeat(3)));
        assert_eq!(lines[3], "a=Fall  b=Summer");
    }

    #[test]
    fn single_point_line_still_renders() {
        let series = CountSeries {
            dimension: Dimension::Year,
            entries: vec![(DimValue::Year(2012), 4)],
        };
        let txt = render_year_line(&series, 10, 5);
        assert!(txt.starts_with("Plot: year=[2011, 2013]"));
        let markers: usize = txt.lines().skip(1).map(|l| l.matches('o').count()).sum();
        assert_eq!(markers, 1);
    }
}
