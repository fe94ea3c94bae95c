//! One-sentence business insights for computed views.

use crate::domain::{Aggregation, DimValue, Dimension, TrendDirection};
use crate::error::NoDataError;

/// Headline for an aggregation: the top value (single) or the heaviest row (pair).
pub fn aggregation_insight(aggregation: &Aggregation) -> Result<String, NoDataError> {
    match aggregation {
        Aggregation::Single(series) => {
            let (value, count) = series
                .entries
                .first()
                .ok_or_else(|| NoDataError::new(format!("no {} values", series.dimension)))?;
            Ok(format!(
                "The most common {} is {value} with {count} products.",
                series.dimension
            ))
        }
        Aggregation::Pair(table) => {
            let sums = table.row_sums();
            // First row wins ties, matching row order.
            let best = sums
                .iter()
                .enumerate()
                .fold(None::<(usize, u64)>, |best, (i, &s)| match best {
                    Some((_, b)) if b >= s => best,
                    _ => Some((i, s)),
                })
                .map(|(i, _)| &table.rows[i])
                .ok_or_else(|| {
                    NoDataError::new(format!(
                        "no {} / {} pairs",
                        table.row_dimension, table.column_dimension
                    ))
                })?;
            Ok(format!(
                "The {} with the most products across {} is {best}.",
                table.row_dimension, table.column_dimension
            ))
        }
    }
}

pub fn forecast_insight(dim: Dimension, value: &DimValue, start_year: i32, direction: TrendDirection) -> String {
    format!(
        "From {start_year} onward, '{value}' ({dim}) is projected to be {}.",
        direction.label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CountSeries, CountTable};

    fn text(s: &str) -> DimValue {
        DimValue::Text(s.to_string())
    }

    #[test]
    fn single_insight_names_the_top_value() {
        let agg = Aggregation::Single(CountSeries {
            dimension: Dimension::BaseColour,
            entries: vec![(text("Black"), 42), (text("White"), 30)],
        });
        assert_eq!(
            aggregation_insight(&agg).unwrap(),
            "The most common baseColour is Black with 42 products."
        );
    }

    #[test]
    fn pair_insight_picks_largest_row_first_on_ties() {
        let agg = Aggregation::Pair(CountTable {
            row_dimension: Dimension::Gender,
            column_dimension: Dimension::Season,
            rows: vec![text("Men"), text("Unisex"), text("Women")],
            columns: vec![text("Fall"), text("Summer")],
            cells: vec![vec![3, 4], vec![1, 0], vec![5, 2]],
        });
        assert_eq!(
            aggregation_insight(&agg).unwrap(),
            "The gender with the most products across season is Men."
        );
    }

    #[test]
    fn empty_aggregation_has_no_insight() {
        let agg = Aggregation::Single(CountSeries {
            dimension: Dimension::Usage,
            entries: Vec::new(),
        });
        assert!(aggregation_insight(&agg).is_err());
    }

    #[test]
    fn forecast_insight_reads_naturally() {
        let s = forecast_insight(Dimension::BaseColour, &text("Navy Blue"), 2019, TrendDirection::Increasing);
        assert_eq!(s, "From 2019 onward, 'Navy Blue' (baseColour) is projected to be increasing.");
    }
}
