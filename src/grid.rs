//! Sort, filter and grouping state of the table, and the projection of the
//! dataset into the rows that are shown.

use std::collections::{HashMap, HashSet};
use tracing::trace;

use crate::coercion::Value;
use crate::columns::ColumnSpec;
use crate::compare::compare_values;
use crate::dataset::Record;
use crate::filter::{FilterCondition, FilterModel};
use crate::format::format_value;

pub const BLANK_GROUP: &str = "(Blanks)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

/// A row of the projected table: either a group header or an index into the dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum GridRow {
    Group {
        key: String,
        count: usize,
        expanded: bool,
    },
    Record(usize),
}

#[derive(Debug, Clone, Default)]
pub struct GridState {
    sort: Option<SortState>,
    filters: FilterModel,
    group_by: Option<usize>,
    expanded: HashSet<String>,
}

impl GridState {
    pub fn sort(&self) -> Option<SortState> {
        self.sort
    }

    pub fn sort_direction(&self, column: usize) -> Option<SortDirection> {
        self.sort
            .filter(|s| s.column == column)
            .map(|s| s.direction)
    }

    /// unsorted -> ascending -> descending -> unsorted. Only one column is sorted at a time.
    pub fn cycle_sort(&mut self, column: usize) -> Option<SortDirection> {
        let next = match self.sort_direction(column) {
            None => Some(SortDirection::Ascending),
            Some(SortDirection::Ascending) => Some(SortDirection::Descending),
            Some(SortDirection::Descending) => None,
        };
        self.set_sort(column, next);
        next
    }

    pub fn set_sort(&mut self, column: usize, direction: Option<SortDirection>) {
        trace!("Sort column {column}: {direction:?}");
        self.sort = direction.map(|direction| SortState { column, direction });
    }

    pub fn filters(&self) -> &FilterModel {
        &self.filters
    }

    pub fn set_filter(&mut self, column: usize, condition: Option<FilterCondition>) {
        trace!("Filter column {column}: {condition:?}");
        self.filters.set(column, condition);
    }

    /// Drops every column filter and the sort. Grouping is kept.
    pub fn clear_filters_and_sort(&mut self) {
        self.filters.clear();
        self.sort = None;
    }

    pub fn group_by(&self) -> Option<usize> {
        self.group_by
    }

    /// Groups by `column` if the column allows it. Returns false otherwise.
    pub fn set_group_by(&mut self, column: Option<usize>, columns: &[ColumnSpec]) -> bool {
        if let Some(cidx) = column
            && !columns.get(cidx).is_some_and(|c| c.groupable)
        {
            return false;
        }
        if self.group_by != column {
            self.expanded.clear();
        }
        self.group_by = column;
        true
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    /// Returns the new expansion state of the group.
    pub fn toggle_group_expanded(&mut self, key: &str) -> bool {
        if self.expanded.remove(key) {
            false
        } else {
            self.expanded.insert(key.to_string());
            true
        }
    }

    /// Filter, then sort (stable), then group.
    pub fn project(&self, records: &[Record], columns: &[ColumnSpec]) -> Vec<GridRow> {
        let mut indices: Vec<usize> = (0..records.len())
            .filter(|&idx| self.filters.matches(&records[idx], columns))
            .collect();

        if let Some(SortState { column, direction }) = self.sort
            && let Some(spec) = columns.get(column)
        {
            // Coerce once per row, not once per comparison
            let mut keyed: Vec<(Value, usize)> = indices
                .into_iter()
                .map(|idx| (spec.value(&records[idx]), idx))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| {
                let ord = compare_values(a, b);
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
            indices = keyed.into_iter().map(|(_, idx)| idx).collect();
        }

        let Some((gcol, spec)) = self
            .group_by
            .and_then(|cidx| columns.get(cidx).map(|spec| (cidx, spec)))
        else {
            return indices.into_iter().map(GridRow::Record).collect();
        };

        let mut groups: Vec<(Value, String, Vec<usize>)> = Vec::new();
        let mut lookup: HashMap<String, usize> = HashMap::new();
        for idx in indices {
            let value = spec.value(&records[idx]);
            let key = group_key(&value);
            let gidx = *lookup.entry(key.clone()).or_insert_with(|| {
                groups.push((value, key, Vec::new()));
                groups.len() - 1
            });
            groups[gidx].2.push(idx);
        }

        let descending = self.sort_direction(gcol) == Some(SortDirection::Descending);
        groups.sort_by(|a, b| {
            let ord = compare_values(&a.0, &b.0).then_with(|| a.1.cmp(&b.1));
            if descending { ord.reverse() } else { ord }
        });

        let mut rows = Vec::with_capacity(groups.len());
        for (_, key, members) in groups {
            let expanded = self.is_expanded(&key);
            rows.push(GridRow::Group {
                key,
                count: members.len(),
                expanded,
            });
            if expanded {
                rows.extend(members.into_iter().map(GridRow::Record));
            }
        }
        rows
    }
}

pub fn group_key(value: &Value) -> String {
    let key = format_value(value);
    if key.is_empty() {
        BLANK_GROUP.to_string()
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{column_index, neo_columns};
    use crate::dataset::Field;
    use crate::filter::FilterKind;

    fn neo(designation: &str, h_mag: &str, orbit_class: &str) -> Record {
        Record {
            designation: Some(designation.into()),
            h_mag: Some(h_mag.into()),
            orbit_class: Some(orbit_class.into()),
            ..Default::default()
        }
    }

    fn records() -> Vec<Record> {
        vec![
            neo("a", "18.3", "Apollo"),
            neo("b", "", "Amor"),
            neo("c", "5.1", "Apollo"),
        ]
    }

    fn col(field: Field) -> usize {
        column_index(&neo_columns(), field).unwrap()
    }

    fn record_order(rows: &[GridRow]) -> Vec<usize> {
        rows.iter()
            .filter_map(|r| match r {
                GridRow::Record(idx) => Some(*idx),
                GridRow::Group { .. } => None,
            })
            .collect()
    }

    #[test]
    fn sort_cycles_through_three_states() {
        let mut grid = GridState::default();
        let h = col(Field::HMag);
        assert_eq!(grid.cycle_sort(h), Some(SortDirection::Ascending));
        assert_eq!(grid.cycle_sort(h), Some(SortDirection::Descending));
        assert_eq!(grid.cycle_sort(h), None);
        assert_eq!(grid.sort(), None);
    }

    #[test]
    fn only_one_column_sorted() {
        let mut grid = GridState::default();
        grid.cycle_sort(col(Field::HMag));
        grid.cycle_sort(col(Field::HMag));
        assert_eq!(grid.cycle_sort(col(Field::Designation)), Some(SortDirection::Ascending));
        assert_eq!(grid.sort_direction(col(Field::HMag)), None);
    }

    #[test]
    fn ascending_puts_absent_first() {
        let columns = neo_columns();
        let mut grid = GridState::default();
        grid.cycle_sort(col(Field::HMag));
        let rows = grid.project(&records(), &columns);
        assert_eq!(record_order(&rows), vec![1, 2, 0]);

        grid.cycle_sort(col(Field::HMag));
        let rows = grid.project(&records(), &columns);
        assert_eq!(record_order(&rows), vec![0, 2, 1]);
    }

    #[test]
    fn date_sort_mixes_formats() {
        let columns = neo_columns();
        let dated = |raw: &str| Record {
            discovery_date: Some(raw.into()),
            ..Default::default()
        };
        let data = vec![
            dated("2020-05-01T00:00:00.000"),
            dated("1999-12-31"),
            dated("not a date"),
            dated("2020-04-30 23:59:59"),
        ];
        let mut grid = GridState::default();
        grid.cycle_sort(col(Field::DiscoveryDate));
        assert_eq!(record_order(&grid.project(&data, &columns)), vec![2, 1, 3, 0]);
        grid.cycle_sort(col(Field::DiscoveryDate));
        assert_eq!(record_order(&grid.project(&data, &columns)), vec![0, 3, 1, 2]);
    }

    #[test]
    fn sort_is_stable() {
        let columns = neo_columns();
        let data = vec![
            neo("x", "1", "Apollo"),
            neo("y", "2", "apollo"),
            neo("z", "3", "APOLLO"),
        ];
        let mut grid = GridState::default();
        grid.cycle_sort(col(Field::OrbitClass));
        assert_eq!(record_order(&grid.project(&data, &columns)), vec![0, 1, 2]);
    }

    #[test]
    fn clear_resets_filter_and_sort() {
        let columns = neo_columns();
        let mut grid = GridState::default();
        let d = col(Field::Designation);
        grid.set_filter(
            d,
            FilterCondition::parse(FilterKind::Text, "c").unwrap(),
        );
        grid.cycle_sort(col(Field::HMag));
        assert_eq!(record_order(&grid.project(&records(), &columns)), vec![2]);

        grid.clear_filters_and_sort();
        assert!(grid.filters().is_empty());
        for cidx in 0..columns.len() {
            assert_eq!(grid.sort_direction(cidx), None);
        }
        assert_eq!(record_order(&grid.project(&records(), &columns)), vec![0, 1, 2]);
    }

    #[test]
    fn filters_combine_with_and() {
        let columns = neo_columns();
        let mut grid = GridState::default();
        grid.set_filter(
            col(Field::OrbitClass),
            FilterCondition::parse(FilterKind::Text, "=apollo").unwrap(),
        );
        grid.set_filter(
            col(Field::HMag),
            FilterCondition::parse(FilterKind::Number, ">10").unwrap(),
        );
        assert_eq!(record_order(&grid.project(&records(), &columns)), vec![0]);
    }

    #[test]
    fn grouping_only_on_groupable_columns() {
        let columns = neo_columns();
        let mut grid = GridState::default();
        assert!(!grid.set_group_by(Some(col(Field::HMag)), &columns));
        assert_eq!(grid.group_by(), None);
        assert!(grid.set_group_by(Some(col(Field::OrbitClass)), &columns));
    }

    #[test]
    fn groups_collapse_and_expand() {
        let columns = neo_columns();
        let mut data = records();
        data.push(Record::default());
        let mut grid = GridState::default();
        grid.set_group_by(Some(col(Field::OrbitClass)), &columns);

        let rows = grid.project(&data, &columns);
        assert_eq!(
            rows,
            vec![
                GridRow::Group { key: BLANK_GROUP.into(), count: 1, expanded: false },
                GridRow::Group { key: "Amor".into(), count: 1, expanded: false },
                GridRow::Group { key: "Apollo".into(), count: 2, expanded: false },
            ]
        );

        grid.cycle_sort(col(Field::HMag));
        assert!(grid.toggle_group_expanded("Apollo"));
        let rows = grid.project(&data, &columns);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[3], GridRow::Record(2));
        assert_eq!(rows[4], GridRow::Record(0));
    }

    #[test]
    fn group_order_follows_sort_on_group_column() {
        let columns = neo_columns();
        let mut grid = GridState::default();
        let oc = col(Field::OrbitClass);
        grid.set_group_by(Some(oc), &columns);
        grid.set_sort(oc, Some(SortDirection::Descending));
        let keys: Vec<String> = grid
            .project(&records(), &columns)
            .into_iter()
            .filter_map(|r| match r {
                GridRow::Group { key, .. } => Some(key),
                GridRow::Record(_) => None,
            })
            .collect();
        assert_eq!(keys, vec!["Apollo".to_string(), "Amor".to_string()]);
    }
}
