//! Query Builder execution
//!
//! Every terminal operation consumes the builder. Statements go through the
//! [`ConnectionGateway`] handed in by the caller; errors come back unchanged.

use tracing::debug;

use super::builder::QueryBuilder;
use crate::backends::{ConnectionGateway, DatabaseValue};
use crate::error::{ModelError, ModelResult};
use crate::model::{ModelMeta, Record};
use crate::relationships::eager_loading::{load_relations, validate_requests};

impl QueryBuilder {
    /// Run the base statement and hydrate the rows, without eager loading
    pub async fn execute(self, gateway: &dyn ConnectionGateway) -> ModelResult<Vec<Record>> {
        let (sql, params) = self.to_sql_with_params();
        fetch_records(self.entity, &sql, &params, gateway).await
    }

    /// Run the base statement, then resolve every requested relation
    ///
    /// A builder configured with [`bind_to`](QueryBuilder::bind_to) skips the
    /// base statement and only enriches the bound rows. Requested relations
    /// are checked before anything is sent to the database.
    pub async fn get(mut self, gateway: &dyn ConnectionGateway) -> ModelResult<Vec<Record>> {
        let entity = self.entity;
        let requests = std::mem::take(&mut self.relations);
        validate_requests(entity, &requests)?;

        let rows = match self.bound_rows.take() {
            Some(rows) => rows,
            None => self.execute(gateway).await?,
        };

        if requests.is_empty() {
            return Ok(rows);
        }

        load_relations(entity, rows, requests, gateway).await
    }

    /// First matching record, or `None` for an empty result
    ///
    /// Adds `LIMIT 1` unless a limit was already set.
    pub async fn first(mut self, gateway: &dyn ConnectionGateway) -> ModelResult<Option<Record>> {
        if self.limit_count.is_none() && !self.is_bound() {
            self.limit_count = Some(1);
        }
        Ok(self.get(gateway).await?.into_iter().next())
    }

    /// First matching record, or `ModelError::NotFound`
    pub async fn first_or_fail(self, gateway: &dyn ConnectionGateway) -> ModelResult<Record> {
        let table = self.table.clone();
        self.first(gateway)
            .await?
            .ok_or(ModelError::NotFound(table))
    }

    /// Record whose primary key equals `id`
    pub async fn find<T: Into<DatabaseValue>>(
        self,
        gateway: &dyn ConnectionGateway,
        id: T,
    ) -> ModelResult<Option<Record>> {
        let primary_key = self.entity.primary_key;
        self.where_eq(primary_key, id).first(gateway).await
    }

    /// Number of rows the statement would return
    pub async fn count(self, gateway: &dyn ConnectionGateway) -> ModelResult<u64> {
        let (sql, params) = self.to_count_sql_with_params();
        debug!(sql = %sql, params = params.len(), "Executing count query");

        let rows = gateway.fetch_all(&sql, &params).await?;
        let value = rows.first().and_then(|row| row.get("aggregate"));

        match value {
            Some(v) => v
                .as_u64()
                .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
                .ok_or_else(|| ModelError::Serialization(format!("unexpected count value: {}", v))),
            None => Ok(0),
        }
    }
}

/// Dispatch one SELECT and wrap each row as a record of `entity`
pub(crate) async fn fetch_records(
    entity: ModelMeta,
    sql: &str,
    params: &[DatabaseValue],
    gateway: &dyn ConnectionGateway,
) -> ModelResult<Vec<Record>> {
    debug!(sql = %sql, params = params.len(), table = entity.table, "Executing query");
    let rows = gateway.fetch_all(sql, params).await?;
    Ok(rows.into_iter().map(|row| Record::new(entity, row)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use crate::testing::{row, MockGateway};
    use serde_json::json;

    struct Ticket;

    impl Model for Ticket {
        fn table_name() -> &'static str {
            "tickets"
        }
    }

    #[tokio::test]
    async fn test_first_adds_limit_once() {
        let gateway = MockGateway::new();
        gateway.push_rows(vec![row(json!({"id": 1}))]);
        gateway.push_rows(vec![]);

        let first = Ticket::query().first(&gateway).await.unwrap();
        assert_eq!(first.unwrap().get::<i64>("id").unwrap(), 1);

        let none = Ticket::query().limit(5).first(&gateway).await.unwrap();
        assert!(none.is_none());

        let statements = gateway.statements();
        assert_eq!(statements[0].sql, "SELECT * FROM tickets LIMIT 1");
        assert_eq!(statements[1].sql, "SELECT * FROM tickets LIMIT 5");
    }

    #[tokio::test]
    async fn test_first_or_fail_and_find() {
        let gateway = MockGateway::new();
        gateway.push_rows(vec![]);
        gateway.push_rows(vec![row(json!({"id": 12, "subject": "login"}))]);

        let err = Ticket::query().first_or_fail(&gateway).await.unwrap_err();
        assert_eq!(err, ModelError::NotFound("tickets".to_string()));

        let found = Ticket::find(&gateway, 12).await.unwrap().unwrap();
        assert_eq!(found.get::<String>("subject").unwrap(), "login");

        let statements = gateway.statements();
        assert_eq!(statements[1].sql, "SELECT * FROM tickets WHERE id = ? LIMIT 1");
        assert_eq!(statements[1].params, vec![DatabaseValue::Int32(12)]);
    }

    #[tokio::test]
    async fn test_count_reads_aggregate() {
        let gateway = MockGateway::new();
        gateway.push_rows(vec![row(json!({"aggregate": 3}))]);

        let total = Ticket::where_eq("open", true).count(&gateway).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(
            gateway.statements()[0].sql,
            "SELECT COUNT(*) AS aggregate FROM (SELECT * FROM tickets WHERE open = ?) AS aggregate_table"
        );
    }

    #[tokio::test]
    async fn test_gateway_error_propagates_unchanged() {
        let gateway = MockGateway::new();
        gateway.push_error(ModelError::Database("syntax error near 'FORM'".to_string()));

        let err = Ticket::query().get(&gateway).await.unwrap_err();
        assert_eq!(err, ModelError::Database("syntax error near 'FORM'".to_string()));
    }
}
