//! Filter selections and the filtered view they produce.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::{Catalog, DimValue, Dimension, Record};

/// Fields with more distinct values than this are not offered as filters.
pub const MAX_FILTER_CHOICES: usize = 30;

/// User-selected constraints: an inclusive year range plus allowed values per dimension.
///
/// A dimension without an entry is unconstrained. A constrained dimension only
/// admits records whose value is present and allowed; absent values never match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    allowed: BTreeMap<Dimension, BTreeSet<DimValue>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year_range(mut self, lo: Option<i32>, hi: Option<i32>) -> Self {
        self.year_min = lo;
        self.year_max = hi;
        self
    }

    /// Constrain `dim` to exactly `values` (an empty set excludes everything).
    pub fn restrict(mut self, dim: Dimension, values: impl IntoIterator<Item = DimValue>) -> Self {
        self.set_allowed(dim, values);
        self
    }

    pub fn set_allowed(&mut self, dim: Dimension, values: impl IntoIterator<Item = DimValue>) {
        self.allowed.insert(dim, values.into_iter().collect());
    }

    pub fn allowed(&self, dim: Dimension) -> Option<&BTreeSet<DimValue>> {
        self.allowed.get(&dim)
    }

    pub fn constrained_dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.allowed.keys().copied()
    }

    /// Whether `value` passes the constraint on `dim` (true when unconstrained).
    pub fn is_allowed(&self, dim: Dimension, value: &DimValue) -> bool {
        self.allowed.get(&dim).is_none_or(|set| set.contains(value))
    }

    /// Flip one value in or out of the allowed set for `dim`.
    ///
    /// An unconstrained dimension starts from `universe` (every choice selected),
    /// so the first toggle deselects `value`. The constraint stays in place after
    /// that, even once every choice is selected again, so absent values keep
    /// being excluded.
    pub fn toggle(&mut self, dim: Dimension, value: &DimValue, universe: &[DimValue]) {
        let set = self
            .allowed
            .entry(dim)
            .or_insert_with(|| universe.iter().cloned().collect());
        if !set.remove(value) {
            set.insert(value.clone());
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.year_min.is_some_and(|lo| record.year < lo) {
            return false;
        }
        if self.year_max.is_some_and(|hi| record.year > hi) {
            return false;
        }
        self.allowed.iter().all(|(dim, set)| {
            record
                .value(*dim)
                .is_some_and(|value| set.contains(&value))
        })
    }

    pub fn apply<'a>(&self, catalog: &'a Catalog) -> FilteredView<'a> {
        FilteredView {
            records: catalog.records().iter().filter(|r| self.matches(r)).collect(),
        }
    }
}

/// Read-only subset of a catalog, in catalog order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    records: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    /// The whole catalog, unfiltered.
    pub fn all(catalog: &'a Catalog) -> Self {
        Self {
            records: catalog.records().iter().collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct present values of `dim` in this view.
    pub fn distinct_values(&self, dim: Dimension) -> Vec<DimValue> {
        self.iter()
            .filter_map(|r| r.value(dim))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Dimensions with few enough distinct values to be offered as filters.
    pub fn filterable_dimensions(&self, max_distinct: usize) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|dim| {
                let mut seen = BTreeSet::new();
                for value in self.iter().filter_map(|r| r.value(*dim)) {
                    seen.insert(value);
                    if seen.len() > max_distinct {
                        return false;
                    }
                }
                true
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: i64, gender: Option<&str>, colour: Option<&str>, year: i32) -> Record {
        Record {
            id,
            gender: gender.map(str::to_string),
            master_category: Some("Apparel".to_string()),
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

    fn catalog() -> Catalog {
        Catalog::new(vec![
            rec(1, Some("Men"), Some("Black"), 2010),
            rec(2, Some("Women"), Some("White"), 2012),
            rec(3, None, Some("Black"), 2014),
            rec(4, Some("Men"), None, 2016),
        ])
    }

    fn ids(view: &FilteredView<'_>) -> Vec<i64> {
        view.iter().map(|r| r.id).collect()
    }

    #[test]
    fn default_selection_keeps_everything() {
        let cat = catalog();
        let view = FilterSelection::new().apply(&cat);
        assert_eq!(ids(&view), vec![1, 2, 3, 4]);
    }

    #[test]
    fn year_range_is_inclusive() {
        let cat = catalog();
        let view = FilterSelection::new()
            .with_year_range(Some(2012), Some(2014))
            .apply(&cat);
        assert_eq!(ids(&view), vec![2, 3]);
    }

    #[test]
    fn constraint_excludes_absent_values() {
        let cat = catalog();
        let view = FilterSelection::new()
            .restrict(Dimension::Gender, [text("Men"), text("Women")])
            .apply(&cat);
        assert_eq!(ids(&view), vec![1, 2, 4]);
    }

    #[test]
    fn empty_allowed_set_excludes_everything() {
        let cat = catalog();
        let view = FilterSelection::new()
            .restrict(Dimension::BaseColour, Vec::<DimValue>::new())
            .apply(&cat);
        assert!(view.is_empty());
    }

    #[test]
    fn toggle_starts_from_all_and_keeps_full_selection_constrained() {
        let cat = catalog();
        let universe = vec![text("Men"), text("Women")];
        let mut sel = FilterSelection::new();

        sel.toggle(Dimension::Gender, &text("Women"), &universe);
        assert_eq!(
            sel.allowed(Dimension::Gender).map(|s| s.len()),
            Some(1)
        );
        assert!(sel.is_allowed(Dimension::Gender, &text("Men")));
        assert!(!sel.is_allowed(Dimension::Gender, &text("Women")));

        sel.toggle(Dimension::Gender, &text("Women"), &universe);
        assert_eq!(
            sel.allowed(Dimension::Gender).map(|s| s.len()),
            Some(2)
        );
        // Record 3 has no gender and stays out once gender is constrained.
        assert_eq!(ids(&sel.apply(&cat)), vec![1, 2, 4]);
    }

    #[test]
    fn distinct_values_are_sorted_and_skip_absent() {
        let cat = catalog();
        let view = FilteredView::all(&cat);
        assert_eq!(
            view.distinct_values(Dimension::BaseColour),
            vec![text("Black"), text("White")]
        );
        assert_eq!(
            view.distinct_values(Dimension::Year),
            vec![
                DimValue::Year(2010),
                DimValue::Year(2012),
                DimValue::Year(2014),
                DimValue::Year(2016)
            ]
        );
    }

    #[test]
    fn filterable_dimensions_skip_wide_fields() {
        let cat = catalog();
        let view = FilteredView::all(&cat);
        let dims = view.filterable_dimensions(2);
        assert!(dims.contains(&Dimension::Gender));
        assert!(dims.contains(&Dimension::BaseColour));
        assert!(!dims.contains(&Dimension::Year));
    }
}
