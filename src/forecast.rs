//! Per-value yearly history and linear trend projection.

use crate::domain::{DimValue, Dimension, ForecastSeries, TrendDirection, YearSeries};
use crate::error::NoDataError;
use crate::math::fit_line;
use crate::query::filter::FilteredView;

/// Count records per year whose `dim` value equals `value`.
///
/// The result is sparse: years with no matching record are absent.
pub fn yearly_history(view: &FilteredView<'_>, dim: Dimension, value: &DimValue) -> YearSeries {
    let mut history = YearSeries::new();
    for record in view.iter().filter(|r| r.matches(dim, value)) {
        *history.entry(record.year).or_default() += 1;
    }
    history
}

/// Project `horizon` years past the last observed year.
///
/// With at least two non-zero years the projection follows an OLS line through
/// every `(year, count)` pair in `history`, rounded to the nearest integer and
/// clamped at zero. Flatter histories project zero.
///
/// Years past `i32::MAX` cannot be represented, so the series stops there.
pub fn forecast(history: &YearSeries, horizon: u32) -> Result<ForecastSeries, NoDataError> {
    let Some((&last_year, _)) = history.last_key_value() else {
        return Err(NoDataError::new("empty history"));
    };

    let steps = i32::try_from(horizon).unwrap_or(i32::MAX);
    let future = match last_year.checked_add(1) {
        Some(first) => first..=last_year.saturating_add(steps),
        None => 1..=0,
    };

    let non_zero = history.values().filter(|&&c| c != 0).count();
    let line = if non_zero >= 2 {
        let points: Vec<(f64, f64)> = history.iter().map(|(&y, &c)| (y as f64, c as f64)).collect();
        fit_line(&points)
    } else {
        None
    };

    let out: ForecastSeries = match line {
        Some(line) => future.map(|year| (year, project(line.eval(year as f64)))).collect(),
        None => future.map(|year| (year, 0)).collect(),
    };
    Ok(out)
}

fn project(value: f64) -> u64 {
    let rounded = value.round();
    if rounded.is_finite() && rounded > 0.0 {
        rounded as u64
    } else {
        0
    }
}

/// Whether the projection sits above the historical average.
pub fn trend_direction(history: &YearSeries, forecast: &ForecastSeries) -> TrendDirection {
    if mean(forecast.values()) > mean(history.values()) {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    }
}

fn mean<'a>(values: impl Iterator<Item = &'a u64>) -> f64 {
    let (sum, n) = values.fold((0u64, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum as f64 / n as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Catalog, Record};
    use proptest::prelude::*;

    fn series(pairs: &[(i32, u64)]) -> YearSeries {
        pairs.iter().copied().collect()
    }

    #[test]
    fn single_point_history_projects_zero() {
        let out = forecast(&series(&[(2018, 5)]), 3).unwrap();
        assert_eq!(out, series(&[(2019, 0), (2020, 0), (2021, 0)]));
    }

    #[test]
    fn exact_linear_history_is_extended() {
        let out = forecast(&series(&[(2016, 10), (2017, 20), (2018, 30)]), 2).unwrap();
        assert_eq!(out, series(&[(2019, 40), (2020, 50)]));
    }

    #[test]
    fn empty_history_is_no_data() {
        for k in 1..=5 {
            assert!(forecast(&YearSeries::new(), k).is_err());
        }
    }

    #[test]
    fn declining_history_clamps_at_zero() {
        let out = forecast(&series(&[(2010, 30), (2011, 20), (2012, 10)]), 3).unwrap();
        assert_eq!(out, series(&[(2013, 0), (2014, 0), (2015, 0)]));
    }

    #[test]
    fn fit_uses_sparse_years_without_densifying() {
        // Points (2010, 2) and (2014, 10): slope 2/year. Densifying would add zeros
        // for 2011..2013 and flatten the line.
        let out = forecast(&series(&[(2010, 2), (2014, 10)]), 1).unwrap();
        assert_eq!(out, series(&[(2015, 12)]));
    }

    #[test]
    fn zeros_in_history_still_count_as_points() {
        // Only one non-zero entry: degenerate even though three years are present.
        let out = forecast(&series(&[(2010, 0), (2011, 0), (2012, 7)]), 2).unwrap();
        assert_eq!(out, series(&[(2013, 0), (2014, 0)]));

        // Two non-zero entries: the zero year is kept in the fit.
        // x = [2010, 2011, 2012], y = [4, 0, 8] -> slope 2, mean 4 at 2011.
        let out = forecast(&series(&[(2010, 4), (2011, 0), (2012, 8)]), 1).unwrap();
        assert_eq!(out, series(&[(2013, 8)]));
    }

    #[test]
    fn projections_round_to_nearest() {
        // y = [1, 2, 4] over 2000..=2002: slope 1.5 through (2001, 7/3).
        // 2003 -> 5.33 and 2004 -> 6.83; truncation would give 5 and 6.
        let out = forecast(&series(&[(2000, 1), (2001, 2), (2002, 4)]), 2).unwrap();
        assert_eq!(out, series(&[(2003, 5), (2004, 7)]));
    }

    #[test]
    fn horizon_stops_at_the_last_representable_year() {
        let near_end = series(&[(i32::MAX - 1, 5)]);
        let out = forecast(&near_end, 3).unwrap();
        assert_eq!(out, series(&[(i32::MAX, 0)]));

        let at_end = series(&[(i32::MAX, 5)]);
        assert!(forecast(&at_end, 2).unwrap().is_empty());

        let huge = forecast(&near_end, u32::MAX).unwrap();
        assert_eq!(huge.keys().copied().collect::<Vec<_>>(), vec![i32::MAX]);
    }

    #[test]
    fn direction_compares_means() {
        let history = series(&[(2016, 10), (2017, 20), (2018, 30)]);
        let up = forecast(&history, 2).unwrap();
        assert_eq!(trend_direction(&history, &up), TrendDirection::Increasing);

        let flat = series(&[(2019, 0)]);
        assert_eq!(trend_direction(&history, &flat), TrendDirection::Decreasing);
    }

    #[test]
    fn history_counts_matching_records_per_year() {
        let rec = |colour: &str, year: i32| Record {
            id: 0,
            gender: None,
            master_category: None,
            sub_category: None,
            article_type: None,
            base_colour: Some(colour.to_string()),
            season: None,
            usage: None,
            product_display_name: None,
            year,
        };
        let cat = Catalog::new(vec![
            rec("Black", 2011),
            rec("Black", 2011),
            rec("White", 2012),
            rec("Black", 2014),
        ]);
        let view = FilteredView::all(&cat);
        let history = yearly_history(&view, Dimension::BaseColour, &DimValue::Text("Black".to_string()));
        assert_eq!(history, series(&[(2011, 2), (2014, 1)]));
    }

    proptest! {
        #[test]
        fn forecast_is_pure_and_covers_the_horizon(
            entries in proptest::collection::btree_map(1990i32..2030, 0u64..500, 1..12),
            horizon in 1u32..6,
        ) {
            let a = forecast(&entries, horizon).unwrap();
            let b = forecast(&entries, horizon).unwrap();
            prop_assert_eq!(&a, &b);

            let last = *entries.keys().next_back().unwrap();
            let keys: Vec<i32> = a.keys().copied().collect();
            let expected: Vec<i32> = (1..=horizon as i32).map(|k| last + k).collect();
            prop_assert_eq!(keys, expected);
        }
    }
}
