//! Testing utilities - a scripted in-memory gateway
//!
//! `MockGateway` answers statements from a queue of prepared responses and
//! records every statement it receives, so tests can assert both the data
//! that came back and the exact SQL that was issued.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::backends::{ConnectionGateway, DatabaseValue, ExecuteResult, Row};
use crate::error::{ModelError, OrmResult};

/// A statement received by the mock, as it was sent
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: Vec<DatabaseValue>,
}

#[derive(Debug)]
enum Scripted {
    Rows(Vec<Row>),
    Result(ExecuteResult),
    Error(ModelError),
}

/// Gateway that replays queued responses in order
///
/// An exhausted queue answers `fetch_all` with no rows and `execute` with a
/// default result, so tests only script what they care about.
#[derive(Debug, Default)]
pub struct MockGateway {
    responses: Mutex<VecDeque<Scripted>>,
    statements: Mutex<Vec<RecordedStatement>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows for the next `fetch_all`
    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        lock(&self.responses).push_back(Scripted::Rows(rows));
        self
    }

    /// Queue the outcome of the next `execute`
    pub fn push_result(&self, result: ExecuteResult) -> &Self {
        lock(&self.responses).push_back(Scripted::Result(result));
        self
    }

    /// Make the next statement fail with `error`
    pub fn push_error(&self, error: ModelError) -> &Self {
        lock(&self.responses).push_back(Scripted::Error(error));
        self
    }

    /// Every statement received so far, oldest first
    pub fn statements(&self) -> Vec<RecordedStatement> {
        lock(&self.statements).clone()
    }

    pub fn statement_count(&self) -> usize {
        lock(&self.statements).len()
    }

    /// SQL text of every statement received so far
    pub fn sql_log(&self) -> Vec<String> {
        lock(&self.statements).iter().map(|s| s.sql.clone()).collect()
    }

    pub fn clear(&self) {
        lock(&self.statements).clear();
        lock(&self.responses).clear();
    }

    fn record(&self, sql: &str, params: &[DatabaseValue]) -> Option<Scripted> {
        lock(&self.statements).push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        lock(&self.responses).pop_front()
    }
}

#[async_trait]
impl ConnectionGateway for MockGateway {
    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Row>> {
        match self.record(sql, params) {
            Some(Scripted::Rows(rows)) => Ok(rows),
            Some(Scripted::Error(error)) => Err(error),
            Some(Scripted::Result(_)) => Err(ModelError::Query(format!(
                "mock expected an execute call, got a query: {}",
                sql
            ))),
            None => Ok(Vec::new()),
        }
    }

    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<ExecuteResult> {
        match self.record(sql, params) {
            Some(Scripted::Result(result)) => Ok(result),
            Some(Scripted::Error(error)) => Err(error),
            Some(Scripted::Rows(_)) => Err(ModelError::Query(format!(
                "mock expected a query, got an execute call: {}",
                sql
            ))),
            None => Ok(ExecuteResult::default()),
        }
    }
}

/// Build a row from a JSON object literal; anything else yields an empty row
pub fn row(value: JsonValue) -> Row {
    match value {
        JsonValue::Object(map) => map,
        _ => Row::new(),
    }
}

/// Build several rows from a JSON array literal
pub fn rows(value: JsonValue) -> Vec<Row> {
    match value {
        JsonValue::Array(items) => items.into_iter().map(row).collect(),
        other => vec![row(other)],
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
