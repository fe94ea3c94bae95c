//! Grouping and counting over a filtered view.
//!
//! Two shapes are produced:
//! - single dimension: `(value, count)` pairs ordered by count descending
//! - dimension pair: a zero-filled table with sorted row and column keys
//!
//! Records with an absent value in a grouping dimension cannot provide a key and
//! are left out of that grouping. In pair mode this means a record missing
//! *either* value is not counted anywhere in the table.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{Aggregation, CountSeries, CountTable, DimValue, Dimension};
use crate::query::filter::FilteredView;

/// Aggregate `view` by `dim1`, optionally split by `dim2`.
///
/// `dim2 == dim1` is treated as no second dimension. An empty view yields an
/// empty aggregation.
pub fn aggregate(view: &FilteredView<'_>, dim1: Dimension, dim2: Option<Dimension>) -> Aggregation {
    match normalize_pair(dim1, dim2) {
        None => Aggregation::Single(count_by(view, dim1)),
        Some(dim2) => Aggregation::Pair(count_by_pair(view, dim1, dim2)),
    }
}

/// Drop a second dimension that repeats the first.
pub fn normalize_pair(dim1: Dimension, dim2: Option<Dimension>) -> Option<Dimension> {
    dim2.filter(|d| *d != dim1)
}

/// Count records per value of `dim`, count descending (ties by ascending value).
pub fn count_by(view: &FilteredView<'_>, dim: Dimension) -> CountSeries {
    let mut counts: HashMap<DimValue, u64> = HashMap::new();
    for value in view.iter().filter_map(|r| r.value(dim)) {
        *counts.entry(value).or_default() += 1;
    }

    let mut entries: Vec<(DimValue, u64)> = counts.into_iter().collect();
    entries.sort_by(|(ka, ca), (kb, cb)| cb.cmp(ca).then_with(|| ka.cmp(kb)));

    CountSeries {
        dimension: dim,
        entries,
    }
}

/// Count records per `(dim1, dim2)` pair into a zero-filled table.
pub fn count_by_pair(view: &FilteredView<'_>, dim1: Dimension, dim2: Dimension) -> CountTable {
    let mut counts: BTreeMap<(DimValue, DimValue), u64> = BTreeMap::new();
    for record in view.iter() {
        let (Some(a), Some(b)) = (record.value(dim1), record.value(dim2)) else {
            continue;
        };
        *counts.entry((a, b)).or_default() += 1;
    }

    let rows: Vec<DimValue> = counts
        .keys()
        .map(|(a, _)| a.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let columns: Vec<DimValue> = counts
        .keys()
        .map(|(_, b)| b.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let row_index: HashMap<&DimValue, usize> = rows.iter().enumerate().map(|(i, v)| (v, i)).collect();
    let column_index: HashMap<&DimValue, usize> = columns.iter().enumerate().map(|(i, v)| (v, i)).collect();

    let mut cells = vec![vec![0u64; columns.len()]; rows.len()];
    for ((a, b), n) in &counts {
        cells[row_index[a]][column_index[b]] = *n;
    }

    CountTable {
        row_dimension: dim1,
        column_dimension: dim2,
        rows,
        columns,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Catalog, Record};
    use proptest::prelude::*;

    fn rec(gender: Option<&str>, colour: Option<&str>, year: i32) -> Record {
        Record {
            id: 0,
            gender: gender.map(str::to_string),
            master_category: None,
            sub_category: None,
            article_type: None,
            base_colour: colour.map(str::to_string),
            season: None,
            usage: None,
            product_display_name: None,
            year,
        }
    }

    fn text(s: &str) -> DimValue {
        DimValue::Text(s.to_string())
    }

    fn sample() -> Catalog {
        Catalog::new(vec![
            rec(Some("Men"), Some("Black"), 2011),
            rec(Some("Men"), Some("Blue"), 2011),
            rec(Some("Women"), Some("Black"), 2012),
            rec(Some("Men"), Some("Black"), 2012),
            rec(None, Some("White"), 2012),
            rec(Some("Women"), None, 2013),
        ])
    }

    #[test]
    fn single_dimension_sorted_by_count() {
        let cat = sample();
        let view = FilteredView::all(&cat);
        let Aggregation::Single(series) = aggregate(&view, Dimension::Gender, None) else {
            panic!("expected single mode");
        };
        assert_eq!(series.entries, vec![(text("Men"), 3), (text("Women"), 2)]);
        assert_eq!(series.total(), 5);
    }

    #[test]
    fn ties_break_by_value() {
        let cat = sample();
        let view = FilteredView::all(&cat);
        let series = count_by(&view, Dimension::Year);
        assert_eq!(
            series.entries,
            vec![
                (DimValue::Year(2012), 3),
                (DimValue::Year(2011), 2),
                (DimValue::Year(2013), 1)
            ]
        );
    }

    #[test]
    fn pair_table_zero_fills_and_drops_absent_keys() {
        let cat = sample();
        let view = FilteredView::all(&cat);
        let Aggregation::Pair(table) = aggregate(&view, Dimension::Gender, Some(Dimension::BaseColour)) else {
            panic!("expected pair mode");
        };
        assert_eq!(table.rows, vec![text("Men"), text("Women")]);
        assert_eq!(table.columns, vec![text("Black"), text("Blue")]);
        assert_eq!(table.cells, vec![vec![2, 1], vec![1, 0]]);
        // Two records are missing one of the keys.
        assert_eq!(table.total(), 4);
    }

    #[test]
    fn repeated_dimension_collapses_to_single() {
        let cat = sample();
        let view = FilteredView::all(&cat);
        let agg = aggregate(&view, Dimension::BaseColour, Some(Dimension::BaseColour));
        assert!(matches!(agg, Aggregation::Single(_)));
    }

    #[test]
    fn empty_view_is_empty_not_an_error() {
        let cat = Catalog::default();
        let view = FilteredView::all(&cat);
        assert!(aggregate(&view, Dimension::Season, None).is_empty());
        assert!(aggregate(&view, Dimension::Season, Some(Dimension::Usage)).is_empty());
    }

    fn arb_record() -> impl Strategy<Value = Record> {
        let opt = |choices: &'static [&'static str]| {
            proptest::option::of(proptest::sample::select(choices)).prop_map(|v| v.map(str::to_string))
        };
        (
            opt(&["Men", "Women", "Boys", "Unisex"]),
            opt(&["Black", "White", "Red"]),
            opt(&["Summer", "Fall"]),
            2008i32..2019,
        )
            .prop_map(|(gender, base_colour, season, year)| Record {
                id: 0,
                gender,
                master_category: None,
                sub_category: None,
                article_type: None,
                base_colour,
                season,
                usage: None,
                product_display_name: None,
                year,
            })
    }

    fn arb_dimension() -> impl Strategy<Value = Dimension> {
        proptest::sample::select(vec![
            Dimension::Year,
            Dimension::Gender,
            Dimension::BaseColour,
            Dimension::Season,
        ])
    }

    proptest! {
        #[test]
        fn single_counts_sum_to_present_values(
            records in proptest::collection::vec(arb_record(), 0..60),
            dim in arb_dimension(),
        ) {
            let cat = Catalog::new(records);
            let view = FilteredView::all(&cat);
            let expected = view.iter().filter(|r| r.value(dim).is_some()).count() as u64;
            prop_assert_eq!(count_by(&view, dim).total(), expected);
        }

        #[test]
        fn pair_cells_sum_to_records_with_both_values(
            records in proptest::collection::vec(arb_record(), 0..60),
            d1 in arb_dimension(),
            d2 in arb_dimension(),
        ) {
            prop_assume!(d1 != d2);
            let cat = Catalog::new(records);
            let view = FilteredView::all(&cat);
            let expected = view
                .iter()
                .filter(|r| r.value(d1).is_some() && r.value(d2).is_some())
                .count() as u64;
            let table = count_by_pair(&view, d1, d2);
            prop_assert_eq!(table.total(), expected);
            prop_assert!(table.cells.iter().all(|row| row.len() == table.columns.len()));
        }
    }
}
