//! CRUD Operations - Persistence for records
//!
//! Each operation issues exactly one statement keyed by the model's primary
//! key column. Database errors propagate unchanged; nothing is retried.

use serde_json::Value as JsonValue;
use tracing::debug;

use super::record::Record;
use crate::backends::{ConnectionGateway, DatabaseValue, Row};
use crate::error::{ModelError, ModelResult};
use crate::query::QueryBuilder;

impl Record {
    /// Create and insert a record in one step
    pub async fn create(
        meta: super::ModelMeta,
        attributes: Row,
        gateway: &dyn ConnectionGateway,
    ) -> ModelResult<Record> {
        let mut record = Record::new(meta, attributes);
        record.save(gateway).await?;
        Ok(record)
    }

    /// Insert or update depending on whether the primary key is set
    ///
    /// With a truthy primary key every other column becomes a `SET`
    /// assignment; otherwise every present column is inserted and the
    /// generated identifier, if any, is written back.
    pub async fn save(&mut self, gateway: &dyn ConnectionGateway) -> ModelResult<()> {
        if self.has_primary_key() {
            self.update(gateway).await
        } else {
            self.insert(gateway).await
        }
    }

    async fn update(&mut self, gateway: &dyn ConnectionGateway) -> ModelResult<()> {
        let meta = self.meta();
        let key = self.primary_key().cloned().ok_or(ModelError::MissingPrimaryKey)?;

        let (columns, mut params) = split_columns(self.attributes(), meta.primary_key);
        if columns.is_empty() {
            debug!(table = meta.table, "Nothing to update");
            return Ok(());
        }

        let assignments: Vec<String> = columns.iter().map(|c| format!("{} = ?", c)).collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            meta.table,
            assignments.join(", "),
            meta.primary_key
        );
        params.push(DatabaseValue::from_json(key));

        debug!(sql = %sql, params = params.len(), "Updating record");
        gateway.execute(&sql, &params).await?;
        Ok(())
    }

    async fn insert(&mut self, gateway: &dyn ConnectionGateway) -> ModelResult<()> {
        let meta = self.meta();
        let (columns, params) = split_columns(self.attributes(), meta.primary_key);

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            meta.table,
            columns.join(", "),
            placeholders
        );

        debug!(sql = %sql, params = params.len(), "Inserting record");
        let result = gateway.execute(&sql, &params).await?;

        if let Some(id) = result.last_insert_id {
            self.attributes_mut()
                .insert(meta.primary_key.to_string(), JsonValue::from(id));
        }
        Ok(())
    }

    /// Delete the row this record was loaded from
    pub async fn delete(&self, gateway: &dyn ConnectionGateway) -> ModelResult<u64> {
        let meta = self.meta();
        let key = self.primary_key().cloned().ok_or(ModelError::MissingPrimaryKey)?;

        let sql = format!("DELETE FROM {} WHERE {} = ?", meta.table, meta.primary_key);
        let params = vec![DatabaseValue::from_json(key)];

        debug!(sql = %sql, "Deleting record");
        let result = gateway.execute(&sql, &params).await?;
        Ok(result.rows_affected)
    }

    /// Re-read the row and merge its columns onto this record
    ///
    /// Fresh columns overwrite stale ones; columns the fresh row does not
    /// carry are left untouched.
    pub async fn refresh(&mut self, gateway: &dyn ConnectionGateway) -> ModelResult<()> {
        let meta = self.meta();
        let key = self.primary_key().cloned().ok_or(ModelError::MissingPrimaryKey)?;

        let fresh = QueryBuilder::new(meta)
            .where_eq(meta.primary_key, DatabaseValue::from_json(key))
            .first(gateway)
            .await?
            .ok_or_else(|| ModelError::NotFound(meta.table.to_string()))?;

        let attributes = self.attributes_mut();
        for (column, value) in fresh.into_attributes() {
            attributes.insert(column, value);
        }
        Ok(())
    }
}

/// Columns other than the primary key, with their bound values
fn split_columns(attributes: &Row, primary_key: &str) -> (Vec<String>, Vec<DatabaseValue>) {
    attributes
        .iter()
        .filter(|(column, _)| column.as_str() != primary_key)
        .map(|(column, value)| (column.clone(), DatabaseValue::from_json(value.clone())))
        .unzip()
}
