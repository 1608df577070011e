//! Comparator library
//!
//! Every comparator is a pure `(operand, field value) -> bool` function.
//! None of them fail: missing or malformed data yields `false`.

use crate::condition::cache;
use crate::condition::value::FieldValue;
use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

/// Comparators the evaluator can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    // Generic / text
    Equals,
    DoesNotEqual,
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
    MatchesRegex,
    DoesNotMatchRegex,
    LengthEquals,
    LengthDoesNotEqual,
    LengthGreaterThan,
    LengthGreaterThanOrEqual,
    LengthLessThan,
    LengthLessThanOrEqual,

    // Number
    NumberEquals,
    NumberDoesNotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,

    // Checkbox
    CheckboxEquals,
    CheckboxDoesNotEqual,
    IsChecked,
    IsNotChecked,

    // Multi select
    ListContains,
    ListDoesNotContain,

    // Date
    DateEquals,
    Before,
    After,
    OnOrBefore,
    OnOrAfter,
    PastWeek,
    PastMonth,
    PastYear,
    NextWeek,
    NextMonth,
    NextYear,

    // Matrix
    MatrixEquals,
    MatrixDoesNotEqual,
    MatrixContains,
    MatrixDoesNotContain,
}

/// Relative date windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Window {
    Week,
    Month,
    Year,
}

impl Comparator {
    /// Apply the comparator. `today` anchors the relative date windows.
    pub fn apply(&self, operand: &FieldValue, field: &FieldValue, today: NaiveDate) -> bool {
        use Comparator::*;

        match self {
            Equals => check_equals(operand, field),
            DoesNotEqual => !check_equals(operand, field),
            Contains => check_contains(operand, field),
            DoesNotContain => !check_contains(operand, field),
            StartsWith => check_affix(operand, field, |text, affix| text.starts_with(affix)),
            EndsWith => check_affix(operand, field, |text, affix| text.ends_with(affix)),
            IsEmpty => field.is_empty(),
            IsNotEmpty => !field.is_empty(),
            MatchesRegex => check_regex(operand, field),
            DoesNotMatchRegex => !check_regex(operand, field),
            LengthEquals => check_length(operand, field, |o| o == Ordering::Equal),
            LengthDoesNotEqual => check_length(operand, field, |o| o != Ordering::Equal),
            LengthGreaterThan => check_length(operand, field, |o| o == Ordering::Greater),
            LengthGreaterThanOrEqual => check_length(operand, field, |o| o != Ordering::Less),
            LengthLessThan => check_length(operand, field, |o| o == Ordering::Less),
            LengthLessThanOrEqual => check_length(operand, field, |o| o != Ordering::Greater),

            NumberEquals => check_number_equals(operand, field),
            NumberDoesNotEqual => !check_number_equals(operand, field),
            GreaterThan => compare_numbers(operand, field, |f, o| f > o),
            LessThan => compare_numbers(operand, field, |f, o| f < o),
            GreaterThanOrEqual => compare_numbers(operand, field, |f, o| f >= o),
            LessThanOrEqual => compare_numbers(operand, field, |f, o| f <= o),

            CheckboxEquals => operand.is_truthy() == field.is_truthy(),
            CheckboxDoesNotEqual => operand.is_truthy() != field.is_truthy(),
            IsChecked => field.is_truthy(),
            IsNotChecked => !field.is_truthy(),

            ListContains => check_list_contains(operand, field),
            ListDoesNotContain => !check_list_contains(operand, field),

            DateEquals => compare_dates(operand, field, |f, o| f == o),
            Before => compare_dates(operand, field, |f, o| f < o),
            After => compare_dates(operand, field, |f, o| f > o),
            OnOrBefore => compare_dates(operand, field, |f, o| f <= o),
            OnOrAfter => compare_dates(operand, field, |f, o| f >= o),
            PastWeek => check_past(field, today, Window::Week),
            PastMonth => check_past(field, today, Window::Month),
            PastYear => check_past(field, today, Window::Year),
            NextWeek => check_next(field, today, Window::Week),
            NextMonth => check_next(field, today, Window::Month),
            NextYear => check_next(field, today, Window::Year),

            MatrixEquals => check_matrix_equals(operand, field),
            MatrixDoesNotEqual => !check_matrix_equals(operand, field),
            MatrixContains => check_matrix_contains(operand, field),
            MatrixDoesNotContain => !check_matrix_contains(operand, field),
        }
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

fn check_equals(operand: &FieldValue, field: &FieldValue) -> bool {
    operand.loosely_equals(field)
}

/// Substring for text, membership for lists
fn check_contains(operand: &FieldValue, field: &FieldValue) -> bool {
    if let Some(items) = field.as_list() {
        return items.iter().any(|item| item.loosely_equals(operand));
    }
    match (field.as_text(), operand.as_text()) {
        (Some(text), Some(needle)) => text.contains(needle.as_ref()),
        _ => false,
    }
}

fn check_affix(operand: &FieldValue, field: &FieldValue, test: fn(&str, &str) -> bool) -> bool {
    match (field.as_text(), operand.as_text()) {
        (Some(text), Some(affix)) => test(&text, &affix),
        _ => false,
    }
}

fn check_regex(operand: &FieldValue, field: &FieldValue) -> bool {
    let (Some(text), FieldValue::String(pattern)) = (field.as_text(), operand) else {
        return false;
    };
    match cache::compiled_regex(pattern) {
        Some(regex) => regex.is_match(&text),
        None => {
            tracing::debug!(pattern = %pattern, "invalid regex in condition, treating as not matched");
            false
        }
    }
}

/// Compare the character length of the field with the operand.
/// Empty or missing field values never satisfy a length comparison.
fn check_length(operand: &FieldValue, field: &FieldValue, test: fn(Ordering) -> bool) -> bool {
    let Some(text) = field.as_text() else {
        return false;
    };
    if text.is_empty() {
        return false;
    }
    let Some(expected) = operand.as_number() else {
        return false;
    };
    let length = text.chars().count() as f64;
    length.partial_cmp(&expected).is_some_and(test)
}

// ---------------------------------------------------------------------------
// Number
// ---------------------------------------------------------------------------

fn check_number_equals(operand: &FieldValue, field: &FieldValue) -> bool {
    match (field.as_number(), operand.as_number()) {
        (Some(f), Some(o)) => f == o,
        _ => false,
    }
}

/// Unknown is never greater or less than anything
fn compare_numbers(operand: &FieldValue, field: &FieldValue, test: fn(f64, f64) -> bool) -> bool {
    match (field.as_number(), operand.as_number()) {
        (Some(f), Some(o)) => test(f, o),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// A list operand must be a subset of the selection; a scalar must be a member.
/// A scalar field value behaves like a one-element selection.
fn check_list_contains(operand: &FieldValue, field: &FieldValue) -> bool {
    if field.is_null() {
        return false;
    }
    let selected: &[FieldValue] = match field.as_list() {
        Some(items) => items,
        None => std::slice::from_ref(field),
    };
    let is_selected = |wanted: &FieldValue| selected.iter().any(|s| s.loosely_equals(wanted));

    match operand.as_list() {
        Some(wanted) => wanted.iter().all(is_selected),
        None => is_selected(operand),
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse a date value, truncated to the day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `YYYY-MM-DD HH:MM[:SS]`.
/// A date range (list) is represented by its first element.
pub fn parse_date(value: &FieldValue) -> Option<NaiveDate> {
    let text = match value {
        FieldValue::String(s) => s.trim(),
        FieldValue::List(items) => return items.first().and_then(parse_date),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    const LOCAL_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
}

fn compare_dates(
    operand: &FieldValue,
    field: &FieldValue,
    test: fn(NaiveDate, NaiveDate) -> bool,
) -> bool {
    match (parse_date(field), parse_date(operand)) {
        (Some(f), Some(o)) => test(f, o),
        _ => false,
    }
}

fn window_start(today: NaiveDate, window: Window) -> Option<NaiveDate> {
    match window {
        Window::Week => today.checked_sub_signed(Duration::days(7)),
        Window::Month => today.checked_sub_months(Months::new(1)),
        Window::Year => today.checked_sub_months(Months::new(12)),
    }
}

fn window_end(today: NaiveDate, window: Window) -> Option<NaiveDate> {
    match window {
        Window::Week => today.checked_add_signed(Duration::days(7)),
        Window::Month => today.checked_add_months(Months::new(1)),
        Window::Year => today.checked_add_months(Months::new(12)),
    }
}

/// Field date within `[today - window, today]`
fn check_past(field: &FieldValue, today: NaiveDate, window: Window) -> bool {
    match (parse_date(field), window_start(today, window)) {
        (Some(date), Some(start)) => start <= date && date <= today,
        _ => false,
    }
}

/// Field date within `[today, today + window]`
fn check_next(field: &FieldValue, today: NaiveDate, window: Window) -> bool {
    match (parse_date(field), window_end(today, window)) {
        (Some(date), Some(end)) => today <= date && date <= end,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Matrix
// ---------------------------------------------------------------------------

/// Full structural equality of the row -> column mapping
fn check_matrix_equals(operand: &FieldValue, field: &FieldValue) -> bool {
    match (operand.as_map(), field.as_map()) {
        (Some(_), Some(_)) => operand.loosely_equals(field),
        _ => false,
    }
}

/// Every row in the operand must be answered identically in the field
fn check_matrix_contains(operand: &FieldValue, field: &FieldValue) -> bool {
    match (operand.as_map(), field.as_map()) {
        (Some(wanted), Some(answered)) => wanted.iter().all(|(row, column)| {
            answered
                .get(row)
                .is_some_and(|given| given.loosely_equals(column))
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    fn v(value: serde_json::Value) -> FieldValue {
        FieldValue::from(value)
    }

    fn apply(cmp: Comparator, operand: serde_json::Value, field: serde_json::Value) -> bool {
        cmp.apply(&v(operand), &v(field), today())
    }

    #[test]
    fn test_text_comparators() {
        assert!(apply(Comparator::Equals, json!("Bob"), json!("Bob")));
        assert!(!apply(Comparator::Equals, json!("Bob"), json!("bob")));
        assert!(apply(Comparator::DoesNotEqual, json!("Bob"), json!(null)));
        assert!(apply(Comparator::Contains, json!("ell"), json!("hello")));
        assert!(apply(Comparator::Contains, json!("b"), json!(["a", "b"])));
        assert!(!apply(Comparator::Contains, json!("x"), json!(null)));
        assert!(apply(Comparator::DoesNotContain, json!("x"), json!("hello")));
        assert!(apply(Comparator::StartsWith, json!("he"), json!("hello")));
        assert!(apply(Comparator::EndsWith, json!("lo"), json!("hello")));
        assert!(!apply(Comparator::EndsWith, json!("lo"), json!(null)));
    }

    #[test]
    fn test_emptiness() {
        assert!(apply(Comparator::IsEmpty, json!(true), json!(null)));
        assert!(apply(Comparator::IsEmpty, json!(true), json!("")));
        assert!(apply(Comparator::IsEmpty, json!(true), json!([])));
        assert!(!apply(Comparator::IsEmpty, json!(true), json!("x")));
        assert!(!apply(Comparator::IsEmpty, json!(true), json!(0)));
        assert!(apply(Comparator::IsNotEmpty, json!(true), json!(["file.pdf"])));
    }

    #[test]
    fn test_regex() {
        assert!(apply(Comparator::MatchesRegex, json!("^[A-Z]{3}-\\d+$"), json!("ABC-12")));
        assert!(!apply(Comparator::MatchesRegex, json!("^\\d+$"), json!("ABC")));
        assert!(apply(Comparator::MatchesRegex, json!("b"), json!("abc")));
        assert!(!apply(Comparator::MatchesRegex, json!("["), json!("[")));
        assert!(apply(Comparator::DoesNotMatchRegex, json!("^\\d+$"), json!("ABC")));
        assert!(!apply(Comparator::MatchesRegex, json!(".*"), json!(null)));
    }

    #[test]
    fn test_content_length() {
        assert!(apply(Comparator::LengthEquals, json!(5), json!("héllo")));
        assert!(apply(Comparator::LengthGreaterThan, json!(3), json!("abcd")));
        assert!(!apply(Comparator::LengthGreaterThan, json!(4), json!("abcd")));
        assert!(apply(Comparator::LengthGreaterThanOrEqual, json!(4), json!("abcd")));
        assert!(apply(Comparator::LengthLessThan, json!("10"), json!("abcd")));
        assert!(apply(Comparator::LengthLessThanOrEqual, json!(4), json!("abcd")));
        assert!(apply(Comparator::LengthDoesNotEqual, json!(3), json!("abcd")));
        assert!(!apply(Comparator::LengthLessThan, json!(3), json!("")));
        assert!(!apply(Comparator::LengthLessThan, json!(3), json!(null)));
    }

    #[test]
    fn test_content_length_fractional_operand() {
        assert!(!apply(Comparator::LengthEquals, json!(3.5), json!("abc")));
        assert!(apply(Comparator::LengthDoesNotEqual, json!(3.5), json!("abc")));
        assert!(apply(Comparator::LengthLessThan, json!(3.5), json!("abc")));
        assert!(!apply(Comparator::LengthGreaterThanOrEqual, json!(3.5), json!("abc")));
        assert!(apply(Comparator::LengthGreaterThan, json!(3.5), json!("abcd")));
    }

    #[test]
    fn test_number_ordering() {
        assert!(apply(Comparator::LessThan, json!(0), json!(-1)));
        assert!(!apply(Comparator::LessThan, json!(0), json!(0)));
        assert!(!apply(Comparator::LessThan, json!(0), json!(null)));
        assert!(!apply(Comparator::GreaterThan, json!(0), json!(null)));
        assert!(apply(Comparator::GreaterThan, json!("18"), json!(20)));
        assert!(apply(Comparator::GreaterThanOrEqual, json!(18), json!("18")));
        assert!(apply(Comparator::LessThanOrEqual, json!(2.5), json!(2.5)));
        assert!(!apply(Comparator::GreaterThan, json!(1), json!("abc")));
    }

    #[test]
    fn test_number_equality() {
        assert!(apply(Comparator::NumberEquals, json!(3), json!(3.0)));
        assert!(apply(Comparator::NumberEquals, json!("3"), json!(3)));
        assert!(!apply(Comparator::NumberEquals, json!(3), json!(null)));
        assert!(apply(Comparator::NumberDoesNotEqual, json!(3), json!(4)));
    }

    #[test]
    fn test_checkbox() {
        assert!(apply(Comparator::IsChecked, json!(true), json!(true)));
        assert!(apply(Comparator::CheckboxEquals, json!(true), json!(true)));
        assert!(!apply(Comparator::IsNotChecked, json!(true), json!(true)));
        assert!(apply(Comparator::IsNotChecked, json!(true), json!(null)));
        assert!(apply(Comparator::CheckboxEquals, json!(false), json!(null)));
        assert!(apply(Comparator::CheckboxDoesNotEqual, json!(true), json!(false)));
    }

    #[test]
    fn test_list_contains() {
        assert!(apply(Comparator::ListContains, json!(["a", "b"]), json!(["a", "b", "c"])));
        assert!(!apply(Comparator::ListContains, json!(["a", "b"]), json!(["a"])));
        assert!(apply(Comparator::ListContains, json!("c"), json!(["a", "b", "c"])));
        assert!(apply(Comparator::ListContains, json!("a"), json!("a")));
        assert!(!apply(Comparator::ListContains, json!("a"), json!(null)));
        assert!(apply(Comparator::ListDoesNotContain, json!("z"), json!(["a"])));
        assert!(apply(Comparator::ListDoesNotContain, json!("z"), json!(null)));
    }

    #[test]
    fn test_date_ordering() {
        assert!(apply(Comparator::DateEquals, json!("2024-05-01"), json!("2024-05-01T13:45:00Z")));
        assert!(apply(Comparator::Before, json!("2024-05-02"), json!("2024-05-01")));
        assert!(!apply(Comparator::Before, json!("2024-05-01"), json!("2024-05-01")));
        assert!(apply(Comparator::OnOrBefore, json!("2024-05-01"), json!("2024-05-01 08:00")));
        assert!(apply(Comparator::After, json!("2024-05-01"), json!("2024-06-01")));
        assert!(apply(Comparator::OnOrAfter, json!("2024-05-01"), json!("2024-05-01")));
        assert!(!apply(Comparator::After, json!("2024-05-01"), json!(null)));
        assert!(!apply(Comparator::After, json!("not a date"), json!("2024-06-01")));
        assert!(apply(Comparator::After, json!("2024-05-01"), json!(["2024-06-01", "2024-06-05"])));
    }

    #[test]
    fn test_date_windows_include_today() {
        for cmp in [
            Comparator::PastWeek,
            Comparator::NextWeek,
            Comparator::PastMonth,
            Comparator::NextMonth,
            Comparator::PastYear,
            Comparator::NextYear,
        ] {
            assert!(apply(cmp, json!({}), json!("2024-05-15")), "{:?}", cmp);
        }
    }

    #[test]
    fn test_date_window_boundaries() {
        assert!(apply(Comparator::PastWeek, json!({}), json!("2024-05-08")));
        assert!(!apply(Comparator::PastWeek, json!({}), json!("2024-05-07")));
        assert!(!apply(Comparator::PastWeek, json!({}), json!("2024-05-16")));
        assert!(apply(Comparator::NextWeek, json!({}), json!("2024-05-22")));
        assert!(!apply(Comparator::NextWeek, json!({}), json!("2024-05-23")));
        // Calendar months, not 30 days
        assert!(apply(Comparator::PastMonth, json!({}), json!("2024-04-15")));
        assert!(!apply(Comparator::PastMonth, json!({}), json!("2024-04-14")));
        assert!(apply(Comparator::NextYear, json!({}), json!("2025-05-15")));
        assert!(!apply(Comparator::NextYear, json!({}), json!("2025-05-16")));
        assert!(!apply(Comparator::PastYear, json!({}), json!(null)));
    }

    #[test]
    fn test_matrix() {
        let operand = json!({"Row1": "ColA", "Row2": "ColB"});
        assert!(apply(Comparator::MatrixEquals, operand.clone(), json!({"Row1": "ColA", "Row2": "ColB"})));
        assert!(!apply(Comparator::MatrixEquals, operand.clone(), json!({"Row1": "ColA", "Row2": "ColC"})));
        assert!(!apply(Comparator::MatrixEquals, json!({"Row1": "ColA"}), json!({"Row1": "ColA", "Row2": "ColB"})));
        assert!(apply(Comparator::MatrixContains, json!({"Row1": "ColA"}), json!({"Row1": "ColA", "Row2": "ColB"})));
        assert!(!apply(Comparator::MatrixContains, operand.clone(), json!({"Row1": "ColA"})));
        assert!(!apply(Comparator::MatrixEquals, operand.clone(), json!(null)));
        assert!(apply(Comparator::MatrixDoesNotContain, operand, json!({"Row1": "ColB"})));
    }
}
