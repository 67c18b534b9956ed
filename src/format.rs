use chrono::NaiveDateTime;

use crate::coercion::{Flag, Value};

const MAX_FRACTION_DIGITS: usize = 3;

/// Display projection of a coerced value. Absent values render as an empty cell.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Absent => String::new(),
        Value::Text(s) => s.clone(),
        Value::Number(n) => format_number(*n),
        Value::Date(d) => format_date(d),
        Value::Flag(f) => format_flag(*f).to_string(),
    }
}

/// "May 1, 2020"
pub fn format_date(date: &NaiveDateTime) -> String {
    date.format("%b %-d, %Y").to_string()
}

pub fn format_flag(flag: Flag) -> &'static str {
    match flag {
        Flag::Yes => "Yes",
        Flag::No => "No",
        Flag::Unknown => "",
    }
}

/// en-US style number: grouped thousands, at most three fraction digits.
pub fn format_number(n: f64) -> String {
    let rendered = format!("{:.*}", MAX_FRACTION_DIGITS, round_half_away(n));
    let (sign, digits) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(rendered.len() + int_part.len() / 3);
    // Rounding can leave "-0.000" behind
    if int_part.chars().any(|c| c != '0') || !frac_part.is_empty() {
        out.push_str(sign);
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn round_half_away(n: f64) -> f64 {
    let scale = 10f64.powi(MAX_FRACTION_DIGITS as i32);
    let scaled = n * scale;
    // Skip values where scaling would lose the integer part
    if !scaled.is_finite() || scaled.abs() >= 1e15 {
        return n;
    }
    scaled.round() / scale
}

fn group_thousands(int_part: &str) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, chr) in int_part.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(chr);
    }
    out
}
