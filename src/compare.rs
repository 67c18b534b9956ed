use std::cmp::Ordering;

use crate::coercion::{Value, ValueKind, coerce, coerce_date, coerce_number, coerce_text};

/// Total order over coerced values of one column.
/// Absent values (and unknown flags) sort before everything else and equal each other.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.is_absent(), b.is_absent()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Flag(x), Value::Flag(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        // A column only ever yields one kind; keep the order total anyway.
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Absent => 0,
        Value::Flag(_) => 1,
        Value::Number(_) => 2,
        Value::Date(_) => 3,
        Value::Text(_) => 4,
    }
}

pub fn compare_raw(kind: ValueKind, a: Option<&str>, b: Option<&str>) -> Ordering {
    compare_values(&coerce(kind, a), &coerce(kind, b))
}

/// Case-insensitive; missing and empty strings sort first.
pub fn compare_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    compare_values(&coerce_text(a), &coerce_text(b))
}

pub fn compare_numbers(a: Option<&str>, b: Option<&str>) -> Ordering {
    compare_values(&coerce_number(a), &coerce_number(b))
}

pub fn compare_dates(a: Option<&str>, b: Option<&str>) -> Ordering {
    compare_values(&coerce_date(a), &coerce_date(b))
}
