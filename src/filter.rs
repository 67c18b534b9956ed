use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::coercion::{Flag, Value, coerce_date, coerce_number};
use crate::columns::ColumnSpec;
use crate::dataset::Record;
use crate::format::format_value;

/// Which filter a column offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Text,
    Number,
    Date,
    Flag,
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("\"{0}\" is not a number")]
    InvalidNumber(String),
    #[error("\"{0}\" is not a date (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("\"{0}\" is not a flag (use yes or no)")]
    InvalidFlag(String),
    #[error("Filter term is empty")]
    EmptyTerm,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison<T> {
    Equals(T),
    NotEqual(T),
    LessThan(T),
    LessOrEqual(T),
    GreaterThan(T),
    GreaterOrEqual(T),
    /// Exclusive on both ends.
    InRange(T, T),
}

impl<T: PartialOrd + Copy> Comparison<T> {
    fn test(&self, v: T) -> bool {
        match *self {
            Comparison::Equals(x) => v == x,
            Comparison::NotEqual(x) => v != x,
            Comparison::LessThan(x) => v < x,
            Comparison::LessOrEqual(x) => v <= x,
            Comparison::GreaterThan(x) => v > x,
            Comparison::GreaterOrEqual(x) => v >= x,
            Comparison::InRange(lo, hi) => v > lo && v < hi,
        }
    }

    fn parse(
        input: &str,
        parse_term: impl Fn(&str) -> Option<T>,
        error: fn(String) -> FilterError,
    ) -> Result<Self, FilterError> {
        let term = |s: &str| {
            let s = s.trim();
            if s.is_empty() {
                return Err(FilterError::EmptyTerm);
            }
            parse_term(s).ok_or_else(|| error(s.to_string()))
        };

        let prefixes: [(&str, fn(T) -> Comparison<T>); 6] = [
            (">=", Comparison::GreaterOrEqual),
            ("<=", Comparison::LessOrEqual),
            ("!=", Comparison::NotEqual),
            (">", Comparison::GreaterThan),
            ("<", Comparison::LessThan),
            ("=", Comparison::Equals),
        ];
        for (prefix, build) in prefixes {
            if let Some(rest) = input.strip_prefix(prefix) {
                return Ok(build(term(rest)?));
            }
        }
        if let Some((lo, hi)) = input.split_once("..") {
            let (lo, hi) = (term(lo)?, term(hi)?);
            return Ok(if hi < lo {
                Comparison::InRange(hi, lo)
            } else {
                Comparison::InRange(lo, hi)
            });
        }
        Ok(Comparison::Equals(term(input)?))
    }
}

impl<T: fmt::Display> fmt::Display for Comparison<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Equals(x) => write!(f, "= {x}"),
            Comparison::NotEqual(x) => write!(f, "!= {x}"),
            Comparison::LessThan(x) => write!(f, "< {x}"),
            Comparison::LessOrEqual(x) => write!(f, "<= {x}"),
            Comparison::GreaterThan(x) => write!(f, "> {x}"),
            Comparison::GreaterOrEqual(x) => write!(f, ">= {x}"),
            Comparison::InRange(lo, hi) => write!(f, "in ({lo}, {hi})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    Contains,
    NotContains,
    Equals,
    NotEqual,
    StartsWith,
    EndsWith,
}

/// One column's filter. Text terms are stored lowercased.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Blank,
    NotBlank,
    Text(TextOp, String),
    Number(Comparison<f64>),
    Date(Comparison<NaiveDate>),
    Flag(Flag),
}

impl FilterCondition {
    /// Parses user input for a column of the given kind.
    /// Empty input means "no filter" and yields `Ok(None)`.
    pub fn parse(kind: FilterKind, input: &str) -> Result<Option<Self>, FilterError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }
        match input.to_lowercase().as_str() {
            "(blank)" => return Ok(Some(FilterCondition::Blank)),
            "(notblank)" => return Ok(Some(FilterCondition::NotBlank)),
            _ => {}
        }

        let condition = match kind {
            FilterKind::Text => Self::parse_text(input)?,
            FilterKind::Number => FilterCondition::Number(Comparison::parse(
                input,
                |s| match coerce_number(Some(s)) {
                    Value::Number(n) => Some(n),
                    _ => None,
                },
                FilterError::InvalidNumber,
            )?),
            FilterKind::Date => FilterCondition::Date(Comparison::parse(
                input,
                |s| match coerce_date(Some(s)) {
                    Value::Date(d) => Some(d.date()),
                    _ => None,
                },
                FilterError::InvalidDate,
            )?),
            FilterKind::Flag => match input.to_lowercase().as_str() {
                "yes" | "y" => FilterCondition::Flag(Flag::Yes),
                "no" | "n" => FilterCondition::Flag(Flag::No),
                _ => return Err(FilterError::InvalidFlag(input.to_string())),
            },
        };
        Ok(Some(condition))
    }

    fn parse_text(input: &str) -> Result<Self, FilterError> {
        let (op, term) = if let Some(rest) = input.strip_prefix("!=") {
            (TextOp::NotEqual, rest)
        } else if let Some(rest) = input.strip_prefix('!') {
            (TextOp::NotContains, rest)
        } else if let Some(rest) = input.strip_prefix('=') {
            (TextOp::Equals, rest)
        } else if let Some(rest) = input.strip_prefix('^') {
            (TextOp::StartsWith, rest)
        } else if let Some(rest) = input.strip_suffix('$') {
            (TextOp::EndsWith, rest)
        } else {
            (TextOp::Contains, input)
        };
        if term.is_empty() {
            return Err(FilterError::EmptyTerm);
        }
        Ok(FilterCondition::Text(op, term.to_lowercase()))
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FilterCondition::Blank => value.is_absent(),
            FilterCondition::NotBlank => !value.is_absent(),
            FilterCondition::Text(op, term) => {
                if value.is_absent() {
                    // A blank cell neither contains nor equals anything.
                    return matches!(op, TextOp::NotContains | TextOp::NotEqual);
                }
                let text = format_value(value).to_lowercase();
                match op {
                    TextOp::Contains => text.contains(term.as_str()),
                    TextOp::NotContains => !text.contains(term.as_str()),
                    TextOp::Equals => text == *term,
                    TextOp::NotEqual => text != *term,
                    TextOp::StartsWith => text.starts_with(term.as_str()),
                    TextOp::EndsWith => text.ends_with(term.as_str()),
                }
            }
            FilterCondition::Number(cmp) => match value {
                Value::Number(n) => cmp.test(*n),
                _ => false,
            },
            FilterCondition::Date(cmp) => match value {
                Value::Date(d) => cmp.test(d.date()),
                _ => false,
            },
            FilterCondition::Flag(flag) => matches!(value, Value::Flag(f) if f == flag),
        }
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterCondition::Blank => write!(f, "is blank"),
            FilterCondition::NotBlank => write!(f, "is not blank"),
            FilterCondition::Text(op, term) => {
                let op = match op {
                    TextOp::Contains => "contains",
                    TextOp::NotContains => "does not contain",
                    TextOp::Equals => "equals",
                    TextOp::NotEqual => "does not equal",
                    TextOp::StartsWith => "starts with",
                    TextOp::EndsWith => "ends with",
                };
                write!(f, "{op} \"{term}\"")
            }
            FilterCondition::Number(cmp) => write!(f, "{cmp}"),
            FilterCondition::Date(cmp) => write!(f, "{cmp}"),
            FilterCondition::Flag(flag) => write!(f, "= {flag:?}"),
        }
    }
}

/// Active filters keyed by column index. All of them have to match.
#[derive(Debug, Clone, Default)]
pub struct FilterModel {
    conditions: BTreeMap<usize, FilterCondition>,
}

impl FilterModel {
    pub fn set(&mut self, column: usize, condition: Option<FilterCondition>) {
        match condition {
            Some(c) => {
                self.conditions.insert(column, c);
            }
            None => {
                self.conditions.remove(&column);
            }
        }
    }

    pub fn is_filtered(&self, column: usize) -> bool {
        self.conditions.contains_key(&column)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn clear(&mut self) {
        self.conditions.clear();
    }

    pub fn matches(&self, record: &Record, columns: &[ColumnSpec]) -> bool {
        self.conditions.iter().all(|(&cidx, condition)| {
            columns
                .get(cidx)
                .is_none_or(|spec| condition.matches(&spec.value(record)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coercion::{ValueKind, coerce};

    fn number(raw: &str) -> Value {
        coerce(ValueKind::Number, Some(raw))
    }

    #[test]
    fn empty_input_clears() {
        assert_eq!(FilterCondition::parse(FilterKind::Text, "  "), Ok(None));
        assert_eq!(FilterCondition::parse(FilterKind::Number, ""), Ok(None));
    }

    #[test]
    fn text_operators() {
        let parse = |s| FilterCondition::parse(FilterKind::Text, s).unwrap().unwrap();
        assert_eq!(parse("Eros"), FilterCondition::Text(TextOp::Contains, "eros".into()));
        assert_eq!(parse("=Eros"), FilterCondition::Text(TextOp::Equals, "eros".into()));
        assert_eq!(parse("!=Eros"), FilterCondition::Text(TextOp::NotEqual, "eros".into()));
        assert_eq!(parse("!Eros"), FilterCondition::Text(TextOp::NotContains, "eros".into()));
        assert_eq!(parse("^433"), FilterCondition::Text(TextOp::StartsWith, "433".into()));
        assert_eq!(parse("PA)$"), FilterCondition::Text(TextOp::EndsWith, "pa)".into()));
        assert_eq!(
            FilterCondition::parse(FilterKind::Text, "="),
            Err(FilterError::EmptyTerm)
        );
    }

    #[test]
    fn text_matching_ignores_case() {
        let value = Value::Text("433 Eros (A898 PA)".into());
        let contains = FilterCondition::parse(FilterKind::Text, "EROS").unwrap().unwrap();
        assert!(contains.matches(&value));
        let not_contains = FilterCondition::parse(FilterKind::Text, "!eros").unwrap().unwrap();
        assert!(!not_contains.matches(&value));
        assert!(not_contains.matches(&Value::Absent));
        assert!(!contains.matches(&Value::Absent));
    }

    #[test]
    fn number_operators() {
        let parse = |s| FilterCondition::parse(FilterKind::Number, s).unwrap().unwrap();
        assert!(parse(">18").matches(&number("18.3")));
        assert!(!parse(">18.3").matches(&number("18.3")));
        assert!(parse(">=18.3").matches(&number("18.3")));
        assert!(parse("<5.2").matches(&number("5.1")));
        assert!(parse("5.1").matches(&number("5.10")));
        assert!(parse("!=5").matches(&number("5.1")));
        assert!(parse("1..10").matches(&number("5.1")));
        assert!(!parse("1..10").matches(&number("10")));
        assert_eq!(parse("10..1"), FilterCondition::Number(Comparison::InRange(1.0, 10.0)));
    }

    #[test]
    fn absent_only_matches_blank() {
        let absent = number("");
        for input in [">0", "<0", "=0", "!=0", "-1..1", "(notblank)"] {
            let cond = FilterCondition::parse(FilterKind::Number, input).unwrap().unwrap();
            assert!(!cond.matches(&absent), "{input} matched an absent value");
        }
        let blank = FilterCondition::parse(FilterKind::Number, "(Blank)").unwrap().unwrap();
        assert!(blank.matches(&absent));
        assert!(!blank.matches(&number("0")));
    }

    #[test]
    fn invalid_terms_are_errors() {
        assert_eq!(
            FilterCondition::parse(FilterKind::Number, ">abc"),
            Err(FilterError::InvalidNumber("abc".into()))
        );
        assert_eq!(
            FilterCondition::parse(FilterKind::Date, "2020-31-01"),
            Err(FilterError::InvalidDate("2020-31-01".into()))
        );
        assert_eq!(
            FilterCondition::parse(FilterKind::Flag, "maybe"),
            Err(FilterError::InvalidFlag("maybe".into()))
        );
        assert_eq!(
            FilterCondition::parse(FilterKind::Number, "1.."),
            Err(FilterError::EmptyTerm)
        );
    }

    #[test]
    fn dates_compare_by_day() {
        let value = coerce(ValueKind::Date, Some("2020-05-01T13:45:00.000"));
        let parse = |s| FilterCondition::parse(FilterKind::Date, s).unwrap().unwrap();
        assert!(parse("2020-05-01").matches(&value));
        assert!(parse(">2020-04-30").matches(&value));
        assert!(!parse("<2020-05-01").matches(&value));
    }

    #[test]
    fn flag_aliases() {
        let yes = FilterCondition::parse(FilterKind::Flag, "Yes").unwrap().unwrap();
        let no = FilterCondition::parse(FilterKind::Flag, "n").unwrap().unwrap();
        assert!(yes.matches(&coerce(ValueKind::Flag, Some("Y"))));
        assert!(!yes.matches(&coerce(ValueKind::Flag, Some("N/A"))));
        assert!(no.matches(&coerce(ValueKind::Flag, Some("N"))));
        assert!(!no.matches(&coerce(ValueKind::Flag, Some("N/A"))));
    }

    #[test]
    fn model_set_and_clear() {
        let mut model = FilterModel::default();
        model.set(2, Some(FilterCondition::NotBlank));
        model.set(0, Some(FilterCondition::Blank));
        assert_eq!(model.len(), 2);
        assert!(model.is_filtered(2));
        model.set(2, None);
        assert!(!model.is_filtered(2));
        model.clear();
        assert!(model.is_empty());
    }
}
