use std::cmp::Ordering;

use crate::coercion::{Value, ValueKind, coerce};
use crate::compare::{compare_dates, compare_numbers, compare_raw, compare_text};
use crate::dataset::{Field, Record};
use crate::filter::FilterKind;
use crate::format::format_value;

/// Declares how one field is read, compared, filtered and displayed.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub field: Field,
    pub header: &'static str,
    pub kind: ValueKind,
    pub filter: FilterKind,
    pub groupable: bool,
    pub sortable: bool,
}

impl ColumnSpec {
    pub fn new(field: Field, header: &'static str, kind: ValueKind) -> Self {
        let filter = match kind {
            ValueKind::Text => FilterKind::Text,
            ValueKind::Number => FilterKind::Number,
            ValueKind::Date => FilterKind::Date,
            ValueKind::Flag => FilterKind::Flag,
        };
        Self {
            field,
            header,
            kind,
            filter,
            groupable: false,
            sortable: true,
        }
    }

    pub fn groupable(mut self) -> Self {
        self.groupable = true;
        self
    }

    pub fn raw<'a>(&self, record: &'a Record) -> Option<&'a str> {
        record.get(self.field)
    }

    pub fn value(&self, record: &Record) -> Value {
        coerce(self.kind, self.raw(record))
    }

    pub fn display(&self, record: &Record) -> String {
        format_value(&self.value(record))
    }

    /// Sort comparator of the column, absent values first.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let (a, b) = (self.raw(a), self.raw(b));
        match self.kind {
            ValueKind::Text => compare_text(a, b),
            ValueKind::Number => compare_numbers(a, b),
            ValueKind::Date => compare_dates(a, b),
            ValueKind::Flag => compare_raw(ValueKind::Flag, a, b),
        }
    }
}

/// Column model of the near-Earth object overview.
pub fn neo_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new(Field::Designation, "Designation", ValueKind::Text),
        ColumnSpec::new(Field::DiscoveryDate, "Discovery Date", ValueKind::Date),
        ColumnSpec::new(Field::HMag, "H (mag)", ValueKind::Number),
        ColumnSpec::new(Field::MoidAu, "MOID (au)", ValueKind::Number),
        ColumnSpec::new(Field::QAu1, "q (au)", ValueKind::Number),
        ColumnSpec::new(Field::QAu2, "Q (au)", ValueKind::Number),
        ColumnSpec::new(Field::PeriodYr, "Period (yr)", ValueKind::Number),
        ColumnSpec::new(Field::IDeg, "Inclination (deg)", ValueKind::Number),
        ColumnSpec::new(Field::Pha, "Potentially Hazardous", ValueKind::Flag),
        ColumnSpec::new(Field::OrbitClass, "Orbit Class", ValueKind::Text).groupable(),
    ]
}

pub fn column_index(columns: &[ColumnSpec], field: Field) -> Option<usize> {
    columns.iter().position(|c| c.field == field)
}
