//! Chart-type selection.
//!
//! Rules, in order:
//! 1. `year` on the x-axis with no second dimension, or with a second dimension that
//!    reads well as a handful of lines (colour, gender, master category): `line`
//! 2. a single dimension with at most `max_series` keys: `pie`
//! 3. everything else: `bar`
//!
//! A two-dimension line chart additionally needs at most `max_series` columns,
//! otherwise the legend becomes unreadable and we fall back to `bar`.

use crate::domain::{Aggregation, ChartKind, Dimension};
use crate::query::aggregate::normalize_pair;

/// Second dimensions that keep a per-year line chart readable.
pub const LINE_COMPANIONS: [Dimension; 3] = [Dimension::BaseColour, Dimension::Gender, Dimension::MasterCategory];

pub fn select_chart(dim1: Dimension, dim2: Option<Dimension>, cardinality: usize, max_series: usize) -> ChartKind {
    let sequential_x = dim1.is_temporal() && dim2.is_none_or(|d| LINE_COMPANIONS.contains(&d));
    if sequential_x {
        ChartKind::Line
    } else if dim2.is_none() && cardinality <= max_series {
        ChartKind::Pie
    } else {
        ChartKind::Bar
    }
}

/// Pick the chart for a computed aggregation.
pub fn resolve_chart(aggregation: &Aggregation, dim1: Dimension, dim2: Option<Dimension>, max_series: usize) -> ChartKind {
    let dim2 = normalize_pair(dim1, dim2);
    match aggregation {
        Aggregation::Single(series) => select_chart(dim1, None, series.len(), max_series),
        Aggregation::Pair(table) => {
            let columns = table.columns.len();
            match select_chart(dim1, dim2, columns, max_series) {
                ChartKind::Line if columns > max_series => ChartKind::Bar,
                kind => kind,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CountTable, DimValue, DEFAULT_MAX_SERIES};

    #[test]
    fn year_alone_is_always_a_line() {
        for n in [0, 1, 8, 9, 500] {
            assert_eq!(select_chart(Dimension::Year, None, n, DEFAULT_MAX_SERIES), ChartKind::Line);
        }
    }

    #[test]
    fn small_categorical_is_a_pie_large_is_a_bar() {
        for dim in Dimension::ALL.into_iter().filter(|d| !d.is_temporal()) {
            assert_eq!(select_chart(dim, None, 8, DEFAULT_MAX_SERIES), ChartKind::Pie);
            assert_eq!(select_chart(dim, None, 9, DEFAULT_MAX_SERIES), ChartKind::Bar);
        }
    }

    #[test]
    fn year_with_companion_is_a_line() {
        for dim in LINE_COMPANIONS {
            assert_eq!(select_chart(Dimension::Year, Some(dim), 30, DEFAULT_MAX_SERIES), ChartKind::Line);
        }
        assert_eq!(
            select_chart(Dimension::Year, Some(Dimension::Season), 4, DEFAULT_MAX_SERIES),
            ChartKind::Bar
        );
    }

    #[test]
    fn two_categorical_dimensions_are_bars() {
        assert_eq!(
            select_chart(Dimension::Gender, Some(Dimension::MasterCategory), 3, DEFAULT_MAX_SERIES),
            ChartKind::Bar
        );
    }

    #[test]
    fn threshold_is_configurable() {
        assert_eq!(select_chart(Dimension::Season, None, 4, 3), ChartKind::Bar);
        assert_eq!(select_chart(Dimension::Season, None, 4, 4), ChartKind::Pie);
    }

    fn table(columns: usize) -> Aggregation {
        Aggregation::Pair(CountTable {
            row_dimension: Dimension::Year,
            column_dimension: Dimension::BaseColour,
            rows: vec![DimValue::Year(2012)],
            columns: (0..columns).map(|i| DimValue::Text(format!("c{i}"))).collect(),
            cells: vec![vec![1; columns]],
        })
    }

    #[test]
    fn wide_line_falls_back_to_bar() {
        let narrow = table(8);
        let wide = table(9);
        assert_eq!(
            resolve_chart(&narrow, Dimension::Year, Some(Dimension::BaseColour), DEFAULT_MAX_SERIES),
            ChartKind::Line
        );
        assert_eq!(
            resolve_chart(&wide, Dimension::Year, Some(Dimension::BaseColour), DEFAULT_MAX_SERIES),
            ChartKind::Bar
        );
    }
}
