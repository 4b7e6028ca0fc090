//! Query Builder WHERE clause operations
//!
//! Every method appends to an ordered list. The first rendered clause gets
//! the `WHERE` keyword whatever its combinator, so `or_where_*` as the very
//! first call behaves like its `AND` twin.

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;

impl QueryBuilder {
    fn push_where(mut self, condition: WhereCondition) -> Self {
        self.where_conditions.push(condition);
        self
    }

    fn push_raw_where(mut self, combinator: Combinator, sql: &str, params: Vec<DatabaseValue>) -> Self {
        self.raw_where.push(RawClause {
            combinator,
            sql: sql.to_string(),
            params,
        });
        self
    }

    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_where(WhereCondition::single(
            Combinator::And,
            column,
            QueryOperator::Equal,
            value.into(),
        ))
    }

    /// Add OR WHERE condition with equality
    pub fn or_where_eq<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_where(WhereCondition::single(
            Combinator::Or,
            column,
            QueryOperator::Equal,
            value.into(),
        ))
    }

    /// Add WHERE condition with custom operator
    ///
    /// For `IN`/`NOT IN` pass the list as a `DatabaseValue::Array`; for
    /// `BETWEEN` pass a two-element array. `IS NULL`/`IS NOT NULL` ignore
    /// the value.
    pub fn where_condition<T: Into<DatabaseValue>>(
        self,
        column: &str,
        operator: &str,
        value: T,
    ) -> Self {
        self.push_where(WhereCondition::with_operator(
            Combinator::And,
            column,
            QueryOperator::parse(operator),
            value.into(),
        ))
    }

    /// Add OR WHERE condition with custom operator
    pub fn or_where_condition<T: Into<DatabaseValue>>(
        self,
        column: &str,
        operator: &str,
        value: T,
    ) -> Self {
        self.push_where(WhereCondition::with_operator(
            Combinator::Or,
            column,
            QueryOperator::parse(operator),
            value.into(),
        ))
    }

    /// Add WHERE condition with IN
    pub fn where_in<T: Into<DatabaseValue>>(self, column: &str, values: Vec<T>) -> Self {
        self.push_where(WhereCondition::list(
            Combinator::And,
            column,
            QueryOperator::In,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn or_where_in<T: Into<DatabaseValue>>(self, column: &str, values: Vec<T>) -> Self {
        self.push_where(WhereCondition::list(
            Combinator::Or,
            column,
            QueryOperator::In,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Add WHERE condition with NOT IN
    pub fn where_not_in<T: Into<DatabaseValue>>(self, column: &str, values: Vec<T>) -> Self {
        self.push_where(WhereCondition::list(
            Combinator::And,
            column,
            QueryOperator::NotIn,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn or_where_not_in<T: Into<DatabaseValue>>(self, column: &str, values: Vec<T>) -> Self {
        self.push_where(WhereCondition::list(
            Combinator::Or,
            column,
            QueryOperator::NotIn,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Add WHERE condition with IS NULL
    pub fn where_null(self, column: &str) -> Self {
        self.push_where(WhereCondition::bare(Combinator::And, column, QueryOperator::IsNull))
    }

    pub fn or_where_null(self, column: &str) -> Self {
        self.push_where(WhereCondition::bare(Combinator::Or, column, QueryOperator::IsNull))
    }

    /// Add WHERE condition with IS NOT NULL
    pub fn where_not_null(self, column: &str) -> Self {
        self.push_where(WhereCondition::bare(Combinator::And, column, QueryOperator::IsNotNull))
    }

    pub fn or_where_not_null(self, column: &str) -> Self {
        self.push_where(WhereCondition::bare(Combinator::Or, column, QueryOperator::IsNotNull))
    }

    /// Add WHERE condition with BETWEEN
    pub fn where_between<T: Into<DatabaseValue>>(self, column: &str, start: T, end: T) -> Self {
        self.push_where(WhereCondition::list(
            Combinator::And,
            column,
            QueryOperator::Between,
            vec![start.into(), end.into()],
        ))
    }

    pub fn or_where_between<T: Into<DatabaseValue>>(self, column: &str, start: T, end: T) -> Self {
        self.push_where(WhereCondition::list(
            Combinator::Or,
            column,
            QueryOperator::Between,
            vec![start.into(), end.into()],
        ))
    }

    /// Add WHERE condition with NOT BETWEEN
    pub fn where_not_between<T: Into<DatabaseValue>>(self, column: &str, start: T, end: T) -> Self {
        self.push_where(WhereCondition::list(
            Combinator::And,
            column,
            QueryOperator::NotBetween,
            vec![start.into(), end.into()],
        ))
    }

    pub fn or_where_not_between<T: Into<DatabaseValue>>(
        self,
        column: &str,
        start: T,
        end: T,
    ) -> Self {
        self.push_where(WhereCondition::list(
            Combinator::Or,
            column,
            QueryOperator::NotBetween,
            vec![start.into(), end.into()],
        ))
    }

    /// Add raw WHERE fragment with its own parameters
    pub fn where_raw(self, sql: &str, params: Vec<DatabaseValue>) -> Self {
        self.push_raw_where(Combinator::And, sql, params)
    }

    /// Add raw OR WHERE fragment with its own parameters
    pub fn or_where_raw(self, sql: &str, params: Vec<DatabaseValue>) -> Self {
        self.push_raw_where(Combinator::Or, sql, params)
    }
}
