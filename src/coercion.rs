use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// How a raw string field is read before it is displayed, compared or filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Number,
    Date,
    Flag,
}

/// Yes/No flag as stored in the dataset ("Y", "N", "N/A").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    Unknown,
    No,
    Yes,
}

/// A field after coercion. `Absent` covers missing, empty and unparseable input.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Absent,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
    Flag(Flag),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent | Value::Flag(Flag::Unknown))
    }
}

pub fn coerce(kind: ValueKind, raw: Option<&str>) -> Value {
    match kind {
        ValueKind::Text => coerce_text(raw),
        ValueKind::Number => coerce_number(raw),
        ValueKind::Date => coerce_date(raw),
        ValueKind::Flag => Value::Flag(coerce_flag(raw)),
    }
}

pub fn coerce_text(raw: Option<&str>) -> Value {
    match raw {
        Some(s) if !s.trim().is_empty() => Value::Text(s.to_string()),
        _ => Value::Absent,
    }
}

pub fn coerce_number(raw: Option<&str>) -> Value {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Value::Absent;
    };
    // f64 parsing accepts "inf" and "NaN", neither of which is a usable number here.
    // "-0" is the same number as "0" for display, filters and sorting.
    match s.parse::<f64>() {
        Ok(v) if v == 0.0 => Value::Number(0.0),
        Ok(v) if v.is_finite() => Value::Number(v),
        _ => Value::Absent,
    }
}

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%S%.f",
];

pub fn coerce_date(raw: Option<&str>) -> Value {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Value::Absent;
    };
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(Value::Date)
            .unwrap_or(Value::Absent);
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Value::Date(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Value::Date(dt.with_timezone(&Utc).naive_utc());
    }
    Value::Absent
}

pub fn coerce_flag(raw: Option<&str>) -> Flag {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("y") | Some("yes") => Flag::Yes,
        Some("n") | Some("no") => Flag::No,
        _ => Flag::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_numbers_are_absent() {
        let inputs = [
            None,
            Some(""),
            Some("   "),
            Some("abc"),
            Some("1.2.3"),
            Some("NaN"),
            Some("inf"),
        ];
        for raw in inputs {
            assert_eq!(coerce_number(raw), Value::Absent, "input {raw:?}");
        }
    }

    #[test]
    fn numbers_parse_with_whitespace_and_sign() {
        assert_eq!(coerce_number(Some("18.3")), Value::Number(18.3));
        assert_eq!(coerce_number(Some(" -0.25 ")), Value::Number(-0.25));
        assert_eq!(coerce_number(Some("0")), Value::Number(0.0));
        assert_eq!(coerce_number(Some("1e3")), Value::Number(1000.0));
        assert!(matches!(coerce_number(Some("-0.0")), Value::Number(n) if n.is_sign_positive()));
    }

    #[test]
    fn malformed_dates_are_absent() {
        for raw in [None, Some(""), Some("yesterday"), Some("2020-13-01"), Some("2020-02-30")] {
            assert_eq!(coerce_date(raw), Value::Absent, "input {raw:?}");
        }
    }

    #[test]
    fn dates_in_dataset_formats() {
        let expected = NaiveDate::from_ymd_opt(2020, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(coerce_date(Some("2020-05-01")), Value::Date(expected));
        assert_eq!(coerce_date(Some("2020-05-01T00:00:00.000")), Value::Date(expected));
        assert_eq!(coerce_date(Some("2020-05-01T00:00:00Z")), Value::Date(expected));
        assert_eq!(coerce_date(Some("2020-05-01T02:00:00+02:00")), Value::Date(expected));
    }

    #[test]
    fn flag_codes() {
        assert_eq!(coerce_flag(Some("Y")), Flag::Yes);
        assert_eq!(coerce_flag(Some("y")), Flag::Yes);
        assert_eq!(coerce_flag(Some("N")), Flag::No);
        assert_eq!(coerce_flag(Some("n")), Flag::No);
        assert_eq!(coerce_flag(Some("N/A")), Flag::Unknown);
        assert_eq!(coerce_flag(Some("")), Flag::Unknown);
        assert_eq!(coerce_flag(None), Flag::Unknown);
    }

    #[test]
    fn empty_text_is_absent() {
        assert_eq!(coerce_text(Some("")), Value::Absent);
        assert_eq!(coerce_text(None), Value::Absent);
        assert_eq!(coerce_text(Some("Apollo")), Value::Text("Apollo".into()));
    }

    #[test]
    fn unknown_flag_counts_as_absent() {
        assert!(coerce(ValueKind::Flag, Some("N/A")).is_absent());
        assert!(!coerce(ValueKind::Flag, Some("N")).is_absent());
    }
}
