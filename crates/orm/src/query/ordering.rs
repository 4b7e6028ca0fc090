//! Query Builder ORDER BY, GROUP BY, HAVING operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;

impl QueryBuilder {
    /// Add ORDER BY clause (ascending)
    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by.push((column.to_string(), OrderDirection::Asc));
        self
    }

    /// Add ORDER BY clause (descending)
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order_by.push((column.to_string(), OrderDirection::Desc));
        self
    }

    /// Add GROUP BY columns (comma separated)
    pub fn group_by(mut self, columns: &str) -> Self {
        self.group_by.extend(
            columns
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        );
        self
    }

    /// Add HAVING condition
    pub fn having<T: Into<DatabaseValue>>(mut self, column: &str, operator: &str, value: T) -> Self {
        self.having_conditions.push(WhereCondition::with_operator(
            Combinator::And,
            column,
            QueryOperator::parse(operator),
            value.into(),
        ));
        self
    }

    /// Add OR HAVING condition
    pub fn or_having<T: Into<DatabaseValue>>(mut self, column: &str, operator: &str, value: T) -> Self {
        self.having_conditions.push(WhereCondition::with_operator(
            Combinator::Or,
            column,
            QueryOperator::parse(operator),
            value.into(),
        ));
        self
    }

    /// Add raw HAVING fragment with its own parameters
    pub fn having_raw(mut self, sql: &str, params: Vec<DatabaseValue>) -> Self {
        self.raw_having.push(RawClause {
            combinator: Combinator::And,
            sql: sql.to_string(),
            params,
        });
        self
    }

    /// Add raw OR HAVING fragment with its own parameters
    pub fn or_having_raw(mut self, sql: &str, params: Vec<DatabaseValue>) -> Self {
        self.raw_having.push(RawClause {
            combinator: Combinator::Or,
            sql: sql.to_string(),
            params,
        });
        self
    }
}
