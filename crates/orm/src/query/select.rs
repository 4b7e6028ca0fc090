//! Query Builder SELECT operations

use super::builder::QueryBuilder;

impl QueryBuilder {
    /// Add SELECT fields to the query (comma separated)
    ///
    /// Expressions that themselves contain commas belong in `select_raw`.
    pub fn select(mut self, fields: &str) -> Self {
        self.select_fields.extend(
            fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
        );
        self
    }

    /// Append a literal expression to the select list
    pub fn select_raw(mut self, expression: &str) -> Self {
        self.raw_select.push(expression.to_string());
        self
    }
}
