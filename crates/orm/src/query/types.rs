//! Query Builder Types - Core types and enums for query building

use std::fmt;

use crate::backends::DatabaseValue;

/// Query operator types
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    NotLike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    Between,
    NotBetween,
    /// Caller-supplied comparison rendered verbatim
    Custom(String),
}

impl QueryOperator {
    /// Parse a comparison operator; anything unknown is kept as `Custom`
    pub fn parse(operator: &str) -> Self {
        match operator.trim().to_uppercase().as_str() {
            "=" => QueryOperator::Equal,
            "!=" | "<>" => QueryOperator::NotEqual,
            ">" => QueryOperator::GreaterThan,
            ">=" => QueryOperator::GreaterThanOrEqual,
            "<" => QueryOperator::LessThan,
            "<=" => QueryOperator::LessThanOrEqual,
            "LIKE" => QueryOperator::Like,
            "NOT LIKE" => QueryOperator::NotLike,
            "IN" => QueryOperator::In,
            "NOT IN" => QueryOperator::NotIn,
            "IS NULL" => QueryOperator::IsNull,
            "IS NOT NULL" => QueryOperator::IsNotNull,
            "BETWEEN" => QueryOperator::Between,
            "NOT BETWEEN" => QueryOperator::NotBetween,
            _ => QueryOperator::Custom(operator.trim().to_string()),
        }
    }
}

impl From<&str> for QueryOperator {
    fn from(operator: &str) -> Self {
        QueryOperator::parse(operator)
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOperator::Equal => write!(f, "="),
            QueryOperator::NotEqual => write!(f, "!="),
            QueryOperator::GreaterThan => write!(f, ">"),
            QueryOperator::GreaterThanOrEqual => write!(f, ">="),
            QueryOperator::LessThan => write!(f, "<"),
            QueryOperator::LessThanOrEqual => write!(f, "<="),
            QueryOperator::Like => write!(f, "LIKE"),
            QueryOperator::NotLike => write!(f, "NOT LIKE"),
            QueryOperator::In => write!(f, "IN"),
            QueryOperator::NotIn => write!(f, "NOT IN"),
            QueryOperator::IsNull => write!(f, "IS NULL"),
            QueryOperator::IsNotNull => write!(f, "IS NOT NULL"),
            QueryOperator::Between => write!(f, "BETWEEN"),
            QueryOperator::NotBetween => write!(f, "NOT BETWEEN"),
            QueryOperator::Custom(op) => write!(f, "{}", op),
        }
    }
}

/// Boolean joiner attached to a clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn as_str(self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where (or having) clause condition
#[derive(Debug, Clone, PartialEq)]
pub struct WhereCondition {
    pub combinator: Combinator,
    pub column: String,
    pub operator: QueryOperator,
    pub value: Option<DatabaseValue>,
    pub values: Vec<DatabaseValue>, // For IN, NOT IN, BETWEEN
}

impl WhereCondition {
    pub(crate) fn single(
        combinator: Combinator,
        column: &str,
        operator: QueryOperator,
        value: DatabaseValue,
    ) -> Self {
        Self {
            combinator,
            column: column.to_string(),
            operator,
            value: Some(value),
            values: Vec::new(),
        }
    }

    pub(crate) fn list(
        combinator: Combinator,
        column: &str,
        operator: QueryOperator,
        values: Vec<DatabaseValue>,
    ) -> Self {
        Self {
            combinator,
            column: column.to_string(),
            operator,
            value: None,
            values,
        }
    }

    pub(crate) fn bare(combinator: Combinator, column: &str, operator: QueryOperator) -> Self {
        Self::list(combinator, column, operator, Vec::new())
    }

    /// Build a condition from an operator given as text
    ///
    /// `IN`/`NOT IN` take an `Array` value as their list (a scalar becomes a
    /// one-element list), `BETWEEN` takes a two-element `Array`, and the null
    /// checks ignore the value.
    pub(crate) fn with_operator(
        combinator: Combinator,
        column: &str,
        operator: QueryOperator,
        value: DatabaseValue,
    ) -> Self {
        match operator {
            QueryOperator::In
            | QueryOperator::NotIn
            | QueryOperator::Between
            | QueryOperator::NotBetween => {
                let values = match value {
                    DatabaseValue::Array(items) => items,
                    scalar => vec![scalar],
                };
                Self::list(combinator, column, operator, values)
            }
            QueryOperator::IsNull | QueryOperator::IsNotNull => {
                Self::bare(combinator, column, operator)
            }
            _ => Self::single(combinator, column, operator, value),
        }
    }
}

/// Literal SQL fragment with its own bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RawClause {
    pub combinator: Combinator,
    pub sql: String,
    pub params: Vec<DatabaseValue>,
}

/// Join types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER JOIN"),
            JoinType::Left => write!(f, "LEFT JOIN"),
            JoinType::Right => write!(f, "RIGHT JOIN"),
        }
    }
}

/// Join clause
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub left: String,
    pub right: String,
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}
