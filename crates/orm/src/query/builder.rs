//! Query Builder - Core builder state
//!
//! A builder is scoped to one model, mutated through chained calls and
//! consumed by exactly one terminal operation. It is neither
//! `Clone` nor `Sync`.

use std::fmt;

use super::types::*;
use super::with::RelationRequest;
use crate::backends::DatabaseValue;
use crate::model::{ModelMeta, Record};

/// Query builder for constructing and running one SELECT statement
pub struct QueryBuilder {
    pub(crate) entity: ModelMeta,
    pub(crate) table: String,
    pub(crate) select_fields: Vec<String>,
    pub(crate) raw_select: Vec<String>,
    pub(crate) scopes: Vec<WhereCondition>,
    pub(crate) where_conditions: Vec<WhereCondition>,
    pub(crate) raw_where: Vec<RawClause>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) raw_joins: Vec<String>,
    pub(crate) group_by: Vec<String>,
    pub(crate) having_conditions: Vec<WhereCondition>,
    pub(crate) raw_having: Vec<RawClause>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) limit_count: Option<u64>,
    pub(crate) offset_value: Option<u64>,
    pub(crate) relations: Vec<RelationRequest>,
    pub(crate) bound_rows: Option<Vec<Record>>,
}

impl QueryBuilder {
    /// Create a new query builder for the given model
    pub fn new(entity: ModelMeta) -> Self {
        Self {
            entity,
            table: entity.table.to_string(),
            select_fields: Vec::new(),
            raw_select: Vec::new(),
            scopes: Vec::new(),
            where_conditions: Vec::new(),
            raw_where: Vec::new(),
            joins: Vec::new(),
            raw_joins: Vec::new(),
            group_by: Vec::new(),
            having_conditions: Vec::new(),
            raw_having: Vec::new(),
            order_by: Vec::new(),
            limit_count: None,
            offset_value: None,
            relations: Vec::new(),
            bound_rows: None,
        }
    }

    /// The model this builder hydrates rows into
    pub fn entity(&self) -> ModelMeta {
        self.entity
    }

    /// Target table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Set the LIMIT
    pub fn limit(mut self, count: u64) -> Self {
        self.limit_count = Some(count);
        self
    }

    /// Set the OFFSET
    pub fn offset(mut self, count: u64) -> Self {
        self.offset_value = Some(count);
        self
    }

    /// Run only the eager-load phase against rows that were already fetched
    ///
    /// The base statement is skipped entirely; `get` returns the same rows
    /// enriched with the requested relations.
    pub fn bind_to(mut self, rows: Vec<Record>) -> Self {
        self.bound_rows = Some(rows);
        self
    }

    pub fn is_bound(&self) -> bool {
        self.bound_rows.is_some()
    }

    /// Restrict the statement to `column IN (values)` regardless of the
    /// user-supplied conditions
    ///
    /// Scopes are ANDed ahead of the WHERE body, which is parenthesised
    /// when both are present. An `OR` in the body never widens the result
    /// past the scope.
    pub(crate) fn scope_where_in(mut self, column: &str, values: Vec<DatabaseValue>) -> Self {
        self.scopes
            .push(WhereCondition::list(Combinator::And, column, QueryOperator::In, values));
        self
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("select_fields", &self.select_fields)
            .field("raw_select", &self.raw_select)
            .field("scopes", &self.scopes)
            .field("where_conditions", &self.where_conditions)
            .field("raw_where", &self.raw_where)
            .field("joins", &self.joins)
            .field("raw_joins", &self.raw_joins)
            .field("group_by", &self.group_by)
            .field("having_conditions", &self.having_conditions)
            .field("raw_having", &self.raw_having)
            .field("order_by", &self.order_by)
            .field("limit_count", &self.limit_count)
            .field("offset_value", &self.offset_value)
            .field("relations", &self.relations)
            .field("bound_rows", &self.bound_rows.as_ref().map(Vec::len))
            .finish()
    }
}
