//! Query Filter Model - conjunctive filters, one sort key and a limit.
//!
//! ## Example
//!
//! ```ignore
//! use document_repo::{Direction, Operator, Query};
//!
//! let query = Query::new()
//!     .filter(("status", Operator::Eq, "active"))
//!     .filter(("age", Operator::Gte, 18))
//!     .order_by("age", Direction::Descending)
//!     .limit(10);
//! ```
//!
//! Stores evaluate filter, then sort, then limit.

mod eval;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::value::{Document, Value};

pub use eval::{compare_values, lookup, sort_documents};

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Lt,
    Lte,
    Eq,
    NotEq,
    Gte,
    Gt,
    ArrayContains,
    ArrayContainsAny,
    In,
    NotIn,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Gte => ">=",
            Operator::Gt => ">",
            Operator::ArrayContains => "array-contains",
            Operator::ArrayContainsAny => "array-contains-any",
            Operator::In => "in",
            Operator::NotIn => "not-in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown filter operator: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::NotEq),
            ">=" => Ok(Operator::Gte),
            ">" => Ok(Operator::Gt),
            "array-contains" => Ok(Operator::ArrayContains),
            "array-contains-any" => Ok(Operator::ArrayContainsAny),
            "in" => Ok(Operator::In),
            "not-in" => Ok(Operator::NotIn),
            other => Err(UnknownOperator(other.to_string())),
        }
    }
}

/// One `(field, operator, value)` constraint. `field` may be a dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }
}

impl<F: Into<String>, V: Into<Value>> From<(F, Operator, V)> for Filter {
    fn from((field, op, value): (F, Operator, V)) -> Self {
        Filter::new(field, op, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Ascending)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Descending)
    }
}

/// Filters applied together (logical AND), then an optional sort, then an
/// optional limit. An empty query scans the whole collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    filters: Vec<Filter>,
    order_by: Option<OrderBy>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn filters<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Filter>,
    {
        self.filters.extend(filters.into_iter().map(Into::into));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy::new(field, direction));
        self
    }

    pub fn with_order(mut self, order_by: Option<OrderBy>) -> Self {
        self.order_by = order_by;
        self
    }

    /// `0` means unbounded.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn with_limit(self, limit: Option<usize>) -> Self {
        self.limit(limit.unwrap_or(0))
    }

    pub fn filter_list(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// Whether a document body satisfies every filter.
    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|filter| eval::matches(filter, document))
    }
}

impl From<Filter> for Query {
    fn from(filter: Filter) -> Self {
        Query::new().filter(filter)
    }
}

impl From<Vec<Filter>> for Query {
    fn from(filters: Vec<Filter>) -> Self {
        Query::new().filters(filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_parse_from_wire_strings() {
        for op in [
            Operator::Lt,
            Operator::Lte,
            Operator::Eq,
            Operator::NotEq,
            Operator::Gte,
            Operator::Gt,
            Operator::ArrayContains,
            Operator::ArrayContainsAny,
            Operator::In,
            Operator::NotIn,
        ] {
            assert_eq!(op.as_str().parse::<Operator>(), Ok(op));
        }
        assert_eq!(
            "=~".parse::<Operator>(),
            Err(UnknownOperator("=~".to_string()))
        );
    }

    #[test]
    fn zero_limit_is_unbounded() {
        assert_eq!(Query::new().limit(0).max_results(), None);
        assert_eq!(Query::new().limit(3).max_results(), Some(3));
        assert_eq!(Query::new().with_limit(None).max_results(), None);
    }

    #[test]
    fn builds_from_tuples() {
        let query = Query::new()
            .filter(("status", Operator::Eq, "active"))
            .filters(vec![("age", Operator::Gte, 18)]);

        assert_eq!(
            query.filter_list(),
            &[
                Filter::equals("status", "active"),
                Filter::new("age", Operator::Gte, 18),
            ]
        );
        assert_eq!(query.ordering(), None);
    }
}
