//! Condition mapping table
//!
//! Which operators are legal for which field type, what operand shape each
//! one expects, and which comparator the evaluator runs for it. Both the
//! runtime evaluator and the save-time validator read this one table.

use crate::condition::ast::FieldType;
use crate::condition::comparator::Comparator;
use crate::condition::value::FieldValue;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use smallvec::{smallvec, SmallVec};

/// Operand shapes an operator may accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    String,
    Boolean,
    Number,
    /// Keyed mapping (matrix rows, empty `{}` placeholders)
    Object,
    Array,
}

impl ExpectedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpectedType::String => "string",
            ExpectedType::Boolean => "boolean",
            ExpectedType::Number => "number",
            ExpectedType::Object => "object",
            ExpectedType::Array => "array",
        }
    }

    /// Whether an operand has this shape. Numeric strings count as numbers.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match self {
            ExpectedType::String => matches!(value, FieldValue::String(_)),
            ExpectedType::Boolean => matches!(value, FieldValue::Bool(_)),
            ExpectedType::Number => value.as_number().is_some(),
            // An empty JSON list decodes the same as `{}` for placeholder operands
            ExpectedType::Object => match value {
                FieldValue::Map(_) => true,
                FieldValue::List(items) => items.is_empty(),
                _ => false,
            },
            ExpectedType::Array => matches!(value, FieldValue::List(_)),
        }
    }
}

/// Extra constraints on an operand beyond its shape
#[derive(Debug, Clone, PartialEq)]
pub enum ValueFormat {
    /// Must compile as a regular expression
    Regex,
    /// Must parse as a calendar date
    Date,
    /// Must be one of the listed values
    Enum(&'static [bool]),
    /// Must be an empty object or list
    Empty,
}

/// One row of the mapping table
#[derive(Debug, Clone)]
pub struct OperatorSpec {
    pub expected: SmallVec<[ExpectedType; 2]>,
    pub format: Option<ValueFormat>,
    pub comparator: Comparator,
}

impl OperatorSpec {
    fn new(expected: ExpectedType, comparator: Comparator) -> Self {
        Self {
            expected: smallvec![expected],
            format: None,
            comparator,
        }
    }

    fn any_of(expected: &[ExpectedType], comparator: Comparator) -> Self {
        Self {
            expected: expected.iter().copied().collect(),
            format: None,
            comparator,
        }
    }

    fn with_format(mut self, format: ValueFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Operators available to one field type
pub type OperatorTable = AHashMap<&'static str, OperatorSpec>;

const ONLY_TRUE: &[bool] = &[true];

static CONDITION_MAPPING: Lazy<AHashMap<&'static str, OperatorTable>> = Lazy::new(build_mapping);

/// Look up the operator table for a field type
#[inline]
pub fn operators_for(field_type: &FieldType) -> Option<&'static OperatorTable> {
    CONDITION_MAPPING.get(field_type.as_str())
}

/// Look up a single operator for a field type
#[inline]
pub fn lookup(field_type: &FieldType, operator: &str) -> Option<&'static OperatorSpec> {
    operators_for(field_type).and_then(|ops| ops.get(operator))
}

fn emptiness_operators(table: &mut OperatorTable) {
    table.insert(
        "is_empty",
        OperatorSpec::new(ExpectedType::Boolean, Comparator::IsEmpty)
            .with_format(ValueFormat::Enum(ONLY_TRUE)),
    );
    table.insert(
        "is_not_empty",
        OperatorSpec::new(ExpectedType::Boolean, Comparator::IsNotEmpty)
            .with_format(ValueFormat::Enum(ONLY_TRUE)),
    );
}

fn content_length_operators(table: &mut OperatorTable) {
    let rows = [
        ("content_length_equals", Comparator::LengthEquals),
        ("content_length_does_not_equal", Comparator::LengthDoesNotEqual),
        ("content_length_greater_than", Comparator::LengthGreaterThan),
        (
            "content_length_greater_than_or_equal_to",
            Comparator::LengthGreaterThanOrEqual,
        ),
        ("content_length_less_than", Comparator::LengthLessThan),
        (
            "content_length_less_than_or_equal_to",
            Comparator::LengthLessThanOrEqual,
        ),
    ];
    for (name, comparator) in rows {
        table.insert(name, OperatorSpec::new(ExpectedType::Number, comparator));
    }
}

fn text_operators() -> OperatorTable {
    let mut table = OperatorTable::new();
    let rows = [
        ("equals", Comparator::Equals),
        ("does_not_equal", Comparator::DoesNotEqual),
        ("contains", Comparator::Contains),
        ("does_not_contain", Comparator::DoesNotContain),
        ("starts_with", Comparator::StartsWith),
        ("ends_with", Comparator::EndsWith),
    ];
    for (name, comparator) in rows {
        table.insert(name, OperatorSpec::new(ExpectedType::String, comparator));
    }
    table.insert(
        "matches_regex",
        OperatorSpec::new(ExpectedType::String, Comparator::MatchesRegex)
            .with_format(ValueFormat::Regex),
    );
    table.insert(
        "does_not_match_regex",
        OperatorSpec::new(ExpectedType::String, Comparator::DoesNotMatchRegex)
            .with_format(ValueFormat::Regex),
    );
    emptiness_operators(&mut table);
    content_length_operators(&mut table);
    table
}

fn number_operators() -> OperatorTable {
    let mut table = OperatorTable::new();
    let rows = [
        ("equals", Comparator::NumberEquals),
        ("does_not_equal", Comparator::NumberDoesNotEqual),
        ("greater_than", Comparator::GreaterThan),
        ("less_than", Comparator::LessThan),
        ("greater_than_or_equal_to", Comparator::GreaterThanOrEqual),
        ("less_than_or_equal_to", Comparator::LessThanOrEqual),
    ];
    for (name, comparator) in rows {
        table.insert(name, OperatorSpec::new(ExpectedType::Number, comparator));
    }
    emptiness_operators(&mut table);
    content_length_operators(&mut table);
    table
}

fn checkbox_operators() -> OperatorTable {
    let mut table = OperatorTable::new();
    // equals / does_not_equal are kept for logic trees saved before is_checked existed
    table.insert(
        "equals",
        OperatorSpec::new(ExpectedType::Boolean, Comparator::CheckboxEquals),
    );
    table.insert(
        "does_not_equal",
        OperatorSpec::new(ExpectedType::Boolean, Comparator::CheckboxDoesNotEqual),
    );
    table.insert(
        "is_checked",
        OperatorSpec::new(ExpectedType::Boolean, Comparator::IsChecked)
            .with_format(ValueFormat::Enum(ONLY_TRUE)),
    );
    table.insert(
        "is_not_checked",
        OperatorSpec::new(ExpectedType::Boolean, Comparator::IsNotChecked)
            .with_format(ValueFormat::Enum(ONLY_TRUE)),
    );
    table
}

fn select_operators() -> OperatorTable {
    let mut table = OperatorTable::new();
    table.insert(
        "equals",
        OperatorSpec::new(ExpectedType::String, Comparator::Equals),
    );
    table.insert(
        "does_not_equal",
        OperatorSpec::new(ExpectedType::String, Comparator::DoesNotEqual),
    );
    emptiness_operators(&mut table);
    table
}

fn multi_select_operators() -> OperatorTable {
    let mut table = OperatorTable::new();
    let accepted = [ExpectedType::String, ExpectedType::Array];
    table.insert(
        "contains",
        OperatorSpec::any_of(&accepted, Comparator::ListContains),
    );
    table.insert(
        "does_not_contain",
        OperatorSpec::any_of(&accepted, Comparator::ListDoesNotContain),
    );
    emptiness_operators(&mut table);
    table
}

fn date_operators() -> OperatorTable {
    let mut table = OperatorTable::new();
    let ordered = [
        ("equals", Comparator::DateEquals),
        ("before", Comparator::Before),
        ("after", Comparator::After),
        ("on_or_before", Comparator::OnOrBefore),
        ("on_or_after", Comparator::OnOrAfter),
    ];
    for (name, comparator) in ordered {
        table.insert(
            name,
            OperatorSpec::new(ExpectedType::String, comparator).with_format(ValueFormat::Date),
        );
    }
    let windows = [
        ("past_week", Comparator::PastWeek),
        ("past_month", Comparator::PastMonth),
        ("past_year", Comparator::PastYear),
        ("next_week", Comparator::NextWeek),
        ("next_month", Comparator::NextMonth),
        ("next_year", Comparator::NextYear),
    ];
    for (name, comparator) in windows {
        table.insert(
            name,
            OperatorSpec::new(ExpectedType::Object, comparator).with_format(ValueFormat::Empty),
        );
    }
    emptiness_operators(&mut table);
    table
}

fn files_operators() -> OperatorTable {
    let mut table = OperatorTable::new();
    emptiness_operators(&mut table);
    table
}

fn matrix_operators() -> OperatorTable {
    let mut table = OperatorTable::new();
    let rows = [
        ("equals", Comparator::MatrixEquals),
        ("does_not_equal", Comparator::MatrixDoesNotEqual),
        ("contains", Comparator::MatrixContains),
        ("does_not_contain", Comparator::MatrixDoesNotContain),
    ];
    for (name, comparator) in rows {
        table.insert(name, OperatorSpec::new(ExpectedType::Object, comparator));
    }
    table
}

fn build_mapping() -> AHashMap<&'static str, OperatorTable> {
    let mut mapping = AHashMap::with_capacity(16);

    let text = text_operators();
    for name in ["text", "url", "email", "phone_number"] {
        mapping.insert(name, text.clone());
    }

    let number = number_operators();
    for name in ["number", "rating", "scale", "slider"] {
        mapping.insert(name, number.clone());
    }

    mapping.insert("checkbox", checkbox_operators());
    mapping.insert("select", select_operators());
    mapping.insert("multi_select", multi_select_operators());
    mapping.insert("date", date_operators());
    mapping.insert("files", files_operators());
    mapping.insert("matrix", matrix_operators());
    mapping
}
