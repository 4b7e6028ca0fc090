//! Query Builder SQL generation
//!
//! Identifiers and keywords are interpolated as given; only values travel
//! through `?` placeholders. Parameters are collected in the exact order
//! their placeholders appear: scopes, where, raw where, having, raw having.

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;

impl QueryBuilder {
    /// Generate SQL with `?` placeholders and the matching parameter list
    pub fn to_sql_with_params(&self) -> (String, Vec<DatabaseValue>) {
        let mut sql = String::new();
        let mut params = Vec::new();

        // SELECT clause
        sql.push_str("SELECT ");
        let mut fields: Vec<&str> = if self.select_fields.is_empty() {
            vec!["*"]
        } else {
            self.select_fields.iter().map(String::as_str).collect()
        };
        fields.extend(self.raw_select.iter().map(String::as_str));
        sql.push_str(&fields.join(", "));

        // FROM clause
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        // JOIN clauses
        for join in &self.joins {
            sql.push_str(&format!(" {} {} ON {} = {}", join.join_type, join.table, join.left, join.right));
        }
        for raw in &self.raw_joins {
            sql.push(' ');
            sql.push_str(raw);
        }

        push_conditions(
            &mut sql,
            &mut params,
            "WHERE",
            &self.scopes,
            &self.where_conditions,
            &self.raw_where,
        );

        // GROUP BY clause
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        push_conditions(
            &mut sql,
            &mut params,
            "HAVING",
            &[],
            &self.having_conditions,
            &self.raw_having,
        );

        self.build_order_limit_clause(&mut sql);

        (sql, params)
    }

    /// Convert the query to SQL string
    pub fn to_sql(&self) -> String {
        self.to_sql_with_params().0
    }

    /// Wrap the statement so it counts its own result rows
    pub fn to_count_sql_with_params(&self) -> (String, Vec<DatabaseValue>) {
        let (inner, params) = self.to_sql_with_params();
        (
            format!("SELECT COUNT(*) AS aggregate FROM ({}) AS aggregate_table", inner),
            params,
        )
    }

    /// Helper method to build ORDER BY, LIMIT and OFFSET clauses
    fn build_order_limit_clause(&self, sql: &mut String) {
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let order: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction))
                .collect();
            sql.push_str(&order.join(", "));
        }

        if let Some(limit) = self.limit_count {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_value {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
    }
}

/// Render scopes, then structured and raw conditions, under one keyword
///
/// Without scopes the first rendered clause takes `keyword` and every later
/// clause renders its own combinator. Scopes are joined with `AND` and the
/// remaining clauses follow as one parenthesised group.
fn push_conditions(
    sql: &mut String,
    params: &mut Vec<DatabaseValue>,
    keyword: &str,
    scopes: &[WhereCondition],
    conditions: &[WhereCondition],
    raw: &[RawClause],
) {
    let mut body = String::new();
    let mut body_params = Vec::new();
    render_clauses(&mut body, &mut body_params, conditions, raw);

    if scopes.is_empty() {
        if !body.is_empty() {
            sql.push(' ');
            sql.push_str(keyword);
            sql.push(' ');
            sql.push_str(&body);
            params.extend(body_params);
        }
        return;
    }

    sql.push(' ');
    sql.push_str(keyword);
    for (index, scope) in scopes.iter().enumerate() {
        sql.push_str(if index == 0 { " " } else { " AND " });
        render_condition(sql, params, scope);
    }
    if !body.is_empty() {
        sql.push_str(" AND (");
        sql.push_str(&body);
        sql.push(')');
        params.extend(body_params);
    }
}

/// Clause list without a leading keyword; the first combinator is dropped
fn render_clauses(
    sql: &mut String,
    params: &mut Vec<DatabaseValue>,
    conditions: &[WhereCondition],
    raw: &[RawClause],
) {
    let mut first = true;

    for condition in conditions {
        if !first {
            sql.push(' ');
            sql.push_str(condition.combinator.as_str());
            sql.push(' ');
        }
        first = false;
        render_condition(sql, params, condition);
    }

    for clause in raw {
        if !first {
            sql.push(' ');
            sql.push_str(clause.combinator.as_str());
            sql.push(' ');
        }
        first = false;
        sql.push_str(&clause.sql);
        params.extend(clause.params.iter().cloned());
    }
}

fn render_condition(sql: &mut String, params: &mut Vec<DatabaseValue>, condition: &WhereCondition) {
    match condition.operator {
        QueryOperator::In | QueryOperator::NotIn => {
            if condition.values.is_empty() {
                // `IN ()` is a syntax error; an empty set matches nothing
                let always = if condition.operator == QueryOperator::In {
                    "1 = 0"
                } else {
                    "1 = 1"
                };
                sql.push_str(always);
                return;
            }
            let placeholders = vec!["?"; condition.values.len()].join(", ");
            sql.push_str(&format!("{} {} ({})", condition.column, condition.operator, placeholders));
            params.extend(condition.values.iter().cloned());
        }
        QueryOperator::Between | QueryOperator::NotBetween => {
            sql.push_str(&format!("{} {} ? AND ?", condition.column, condition.operator));
            let mut range = condition.values.iter().cloned();
            params.push(range.next().unwrap_or(DatabaseValue::Null));
            params.push(range.next().unwrap_or(DatabaseValue::Null));
        }
        QueryOperator::IsNull | QueryOperator::IsNotNull => {
            sql.push_str(&format!("{} {}", condition.column, condition.operator));
        }
        _ => {
            sql.push_str(&format!("{} {} ?", condition.column, condition.operator));
            params.push(condition.value.clone().unwrap_or(DatabaseValue::Null));
        }
    }
}
