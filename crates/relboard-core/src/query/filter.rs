use crate::value::Value;
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

///
/// FilterOpParseError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("unknown filter operator '{op}'")]
pub struct FilterOpParseError {
    pub op: String,
}

///
/// FilterOp
///
/// Comparison operators of the backend's filter grammar.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
    In,
}

impl FilterOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::Ilike => "ilike",
            Self::Is => "is",
            Self::In => "in",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = FilterOpParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "eq" => Self::Eq,
            "neq" => Self::Neq,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "like" => Self::Like,
            "ilike" => Self::Ilike,
            "is" => Self::Is,
            "in" => Self::In,
            other => {
                return Err(FilterOpParseError {
                    op: other.to_string(),
                });
            }
        };

        Ok(op)
    }
}

///
/// Filter
///
/// One `column.op.value` predicate.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }

    /// Right-hand side of a query-string pair: `op.value`.
    #[must_use]
    pub fn operand(&self) -> String {
        format!("{}.{}", self.op, self.value.to_literal())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.column, self.operand())
    }
}

///
/// Conjunction
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

///
/// FilterSet
///
/// User filters joined by a single conjunction; never mixed.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSet {
    pub conjunction: Conjunction,
    pub filters: Vec<Filter>,
}

impl FilterSet {
    #[must_use]
    pub const fn new(conjunction: Conjunction, filters: Vec<Filter>) -> Self {
        Self {
            conjunction,
            filters,
        }
    }

    #[must_use]
    pub fn all(filters: Vec<Filter>) -> Self {
        Self::new(Conjunction::And, filters)
    }

    #[must_use]
    pub fn any(filters: Vec<Filter>) -> Self {
        Self::new(Conjunction::Or, filters)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        match (self.conjunction, self.filters.as_slice()) {
            (_, []) => Vec::new(),
            (Conjunction::Or, filters @ [_, _, ..]) => {
                vec![("or".to_string(), disjunction(filters))]
            }
            (_, filters) => filters
                .iter()
                .map(|filter| (filter.column.clone(), filter.operand()))
                .collect(),
        }
    }
}

fn disjunction(filters: &[Filter]) -> String {
    let parts: Vec<String> = filters.iter().map(ToString::to_string).collect();

    format!("({})", parts.join(","))
}

///
/// Sort
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sort {
    pub column: String,
    pub ascending: bool,
}

impl Sort {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.ascending { "asc" } else { "desc" };

        write!(f, "{}.{direction}", self.column)
    }
}

///
/// RowRange
///
/// Inclusive zero-based row offsets, as sent in the `Range` header.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RowRange {
    pub start: u64,
    pub end: u64,
}

impl RowRange {
    /// Window for a 1-based page number. Page 0 is treated as page 1.
    #[must_use]
    pub const fn window(page_number: u64, size: u64) -> Self {
        let size = if size == 0 { 1 } else { size };
        let index = page_number.saturating_sub(1);
        let start = index.saturating_mul(size);

        Self {
            start,
            end: start.saturating_add(size - 1),
        }
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

///
/// MatchFilter
///
/// Row selector for update and delete. `AnyOf` renders as `or=(...)`.
///

#[derive(Clone, Debug, PartialEq)]
pub enum MatchFilter {
    Condition(Filter),
    AnyOf(Vec<Filter>),
}

impl MatchFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Condition(Filter::eq(column, value))
    }

    /// `column` equal to any of `values`; a single value collapses to `eq`.
    #[must_use]
    pub fn any_eq(column: &str, values: &[Value]) -> Self {
        match values {
            [value] => Self::eq(column, value.clone()),
            values => Self::AnyOf(
                values
                    .iter()
                    .map(|value| Filter::eq(column, value.clone()))
                    .collect(),
            ),
        }
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        match self {
            Self::Condition(filter) => std::slice::from_ref(filter),
            Self::AnyOf(filters) => filters,
        }
    }

    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        match self {
            Self::Condition(filter) => vec![(filter.column.clone(), filter.operand())],
            Self::AnyOf(filters) => vec![("or".to_string(), disjunction(filters))],
        }
    }
}

impl fmt::Display for MatchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Condition(filter) => write!(f, "{filter}"),
            Self::AnyOf(filters) => write!(f, "or={}", disjunction(filters)),
        }
    }
}
