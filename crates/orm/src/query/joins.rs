//! Query Builder JOIN operations

use super::builder::QueryBuilder;
use super::types::*;

impl QueryBuilder {
    fn push_join(mut self, join_type: JoinType, table: &str, left_col: &str, right_col: &str) -> Self {
        self.joins.push(JoinClause {
            join_type,
            table: table.to_string(),
            left: left_col.to_string(),
            right: right_col.to_string(),
        });
        self
    }

    /// Add INNER JOIN to the query
    pub fn join(self, table: &str, left_col: &str, right_col: &str) -> Self {
        self.push_join(JoinType::Inner, table, left_col, right_col)
    }

    /// Add LEFT JOIN to the query
    pub fn left_join(self, table: &str, left_col: &str, right_col: &str) -> Self {
        self.push_join(JoinType::Left, table, left_col, right_col)
    }

    /// Add RIGHT JOIN to the query
    pub fn right_join(self, table: &str, left_col: &str, right_col: &str) -> Self {
        self.push_join(JoinType::Right, table, left_col, right_col)
    }

    /// Append a literal join fragment, rendered after the structured joins
    pub fn join_raw(mut self, sql: &str) -> Self {
        self.raw_joins.push(sql.to_string());
        self
    }
}
