//! MySQL Gateway Implementation
//!
//! Production [`ConnectionGateway`] over a sqlx MySQL pool. The pool is
//! created explicitly from a [`DatabaseConfig`] and handed to callers; there
//! is no process-wide connection.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySql, MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Row as SqlxRow, TypeInfo, ValueRef};
use std::time::Duration;

use super::core::*;
use crate::config::DatabaseConfig;
use crate::error::{OrmError, OrmResult};

/// Gateway backed by a pooled MySQL connection set
#[derive(Debug, Clone)]
pub struct MySqlGateway {
    pool: MySqlPool,
}

impl MySqlGateway {
    /// Open a pool using the given configuration
    pub async fn connect(config: &DatabaseConfig) -> OrmResult<Self> {
        config.validate()?;

        tracing::debug!(
            "Creating MySQL pool for {}: max={}, min={}, timeout={}s, idle_timeout={:?}s, max_lifetime={:?}s",
            config.redacted_url(),
            config.max_connections,
            config.min_connections,
            config.acquire_timeout,
            config.idle_timeout,
            config.max_lifetime
        );

        let mut options = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout_duration())
            .test_before_acquire(config.test_before_acquire);

        if let Some(idle_timeout) = config.idle_timeout {
            options = options.idle_timeout(Duration::from_secs(idle_timeout));
        }

        if let Some(max_lifetime) = config.max_lifetime {
            options = options.max_lifetime(Duration::from_secs(max_lifetime));
        }

        let pool = options.connect(&config.url).await.map_err(|e| {
            tracing::error!("Failed to create MySQL pool: {}", e);
            OrmError::Connection(format!("Failed to create MySQL pool: {}", e))
        })?;

        tracing::info!(
            "MySQL pool created with {} max connections",
            config.max_connections
        );
        Ok(Self { pool })
    }

    /// Wrap an already configured pool
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Close every connection; later statements fail with a connection error
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("MySQL pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[async_trait]
impl ConnectionGateway for MySqlGateway {
    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Row>> {
        let (sql, params) = expand_array_placeholders(sql, params);

        let mut query = sqlx::query(&sql);
        for param in &params {
            query = bind_database_value(query, param);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(mysql_row_to_map).collect()
    }

    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<ExecuteResult> {
        let (sql, params) = expand_array_placeholders(sql, params);

        let mut query = sqlx::query(&sql);
        for param in &params {
            query = bind_database_value(query, param);
        }

        let result = query.execute(&self.pool).await?;
        let last_insert_id = result.last_insert_id();

        Ok(ExecuteResult {
            rows_affected: result.rows_affected(),
            last_insert_id: (last_insert_id > 0).then_some(last_insert_id),
        })
    }
}

/// Helper function to bind DatabaseValue to a sqlx query
fn bind_database_value<'a>(
    query: Query<'a, MySql, MySqlArguments>,
    value: &DatabaseValue,
) -> Query<'a, MySql, MySqlArguments> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Int32(i) => query.bind(*i),
        DatabaseValue::Int64(i) => query.bind(*i),
        DatabaseValue::UInt64(i) => query.bind(*i),
        DatabaseValue::Float64(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
        DatabaseValue::Bytes(b) => query.bind(b.clone()),
        // CHAR(36) is the common MySQL layout for UUID columns
        DatabaseValue::Uuid(u) => query.bind(u.to_string()),
        DatabaseValue::DateTime(dt) => query.bind(*dt),
        DatabaseValue::Date(d) => query.bind(*d),
        DatabaseValue::Json(j) => query.bind(j.clone()),
        // Only reachable when an array is nested inside another array
        DatabaseValue::Array(_) => query.bind(value.to_json()),
    }
}

/// Convert a MySQL row into an ordered column map
fn mysql_row_to_map(row: &MySqlRow) -> OrmResult<Row> {
    let mut map = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), mysql_value_to_json(row, index)?);
    }
    Ok(map)
}

/// Convert a MySQL column value to JSON
fn mysql_value_to_json(row: &MySqlRow, index: usize) -> OrmResult<JsonValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(JsonValue::Null);
    }

    let type_name = row.columns()[index].type_info().name();

    let value = match column_decode(type_name) {
        ColumnDecode::Bool => JsonValue::Bool(row.try_get::<bool, _>(index)?),
        // the integer decoders refuse YEAR, so it is read as its raw u16
        ColumnDecode::Year => JsonValue::from(row.try_get_unchecked::<u16, _>(index)?),
        ColumnDecode::Unsigned => JsonValue::from(row.try_get::<u64, _>(index)?),
        ColumnDecode::Signed => JsonValue::from(row.try_get::<i64, _>(index)?),
        ColumnDecode::Float => JsonValue::from(row.try_get::<f32, _>(index)? as f64),
        ColumnDecode::Double => JsonValue::from(row.try_get::<f64, _>(index)?),
        ColumnDecode::Timestamp => JsonValue::String(
            row.try_get::<chrono::DateTime<chrono::Utc>, _>(index)?
                .to_rfc3339(),
        ),
        ColumnDecode::DateTime => JsonValue::String(
            row.try_get::<chrono::NaiveDateTime, _>(index)?
                .to_string(),
        ),
        ColumnDecode::Date => JsonValue::String(row.try_get::<chrono::NaiveDate, _>(index)?.to_string()),
        ColumnDecode::Time => JsonValue::String(row.try_get::<chrono::NaiveTime, _>(index)?.to_string()),
        ColumnDecode::Json => row.try_get::<JsonValue, _>(index)?,
        ColumnDecode::Bytes => {
            let bytes: Vec<u8> = row.try_get(index)?;
            JsonValue::Array(bytes.into_iter().map(JsonValue::from).collect())
        }
        ColumnDecode::Text => match row.try_get_unchecked::<String, _>(index) {
            Ok(text) => JsonValue::String(text),
            Err(_) => {
                let bytes: Vec<u8> = row.try_get_unchecked(index)?;
                JsonValue::String(String::from_utf8_lossy(&bytes).into_owned())
            }
        },
    };

    Ok(value)
}

/// How a column's value is read, chosen from its MySQL type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnDecode {
    Bool,
    Year,
    Unsigned,
    Signed,
    Float,
    Double,
    Timestamp,
    DateTime,
    Date,
    Time,
    Json,
    Bytes,
    /// DECIMAL, ENUM, SET and text types arrive as text on the wire
    Text,
}

fn column_decode(type_name: &str) -> ColumnDecode {
    match type_name {
        "BOOLEAN" => ColumnDecode::Bool,
        "YEAR" => ColumnDecode::Year,
        name if name.ends_with("UNSIGNED") => ColumnDecode::Unsigned,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => ColumnDecode::Signed,
        "FLOAT" => ColumnDecode::Float,
        "DOUBLE" => ColumnDecode::Double,
        "TIMESTAMP" => ColumnDecode::Timestamp,
        "DATETIME" => ColumnDecode::DateTime,
        "DATE" => ColumnDecode::Date,
        "TIME" => ColumnDecode::Time,
        "JSON" => ColumnDecode::Json,
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => ColumnDecode::Bytes,
        _ => ColumnDecode::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_is_not_decoded_as_signed_integer() {
        assert_eq!(column_decode("YEAR"), ColumnDecode::Year);
        assert_eq!(column_decode("SMALLINT"), ColumnDecode::Signed);
        assert_eq!(column_decode("SMALLINT UNSIGNED"), ColumnDecode::Unsigned);
        assert_eq!(column_decode("BIGINT UNSIGNED"), ColumnDecode::Unsigned);
    }

    #[test]
    fn test_column_decode_falls_back_to_text() {
        assert_eq!(column_decode("BOOLEAN"), ColumnDecode::Bool);
        assert_eq!(column_decode("DATETIME"), ColumnDecode::DateTime);
        assert_eq!(column_decode("MEDIUMBLOB"), ColumnDecode::Bytes);
        assert_eq!(column_decode("DECIMAL"), ColumnDecode::Text);
        assert_eq!(column_decode("ENUM"), ColumnDecode::Text);
        assert_eq!(column_decode("VARCHAR"), ColumnDecode::Text);
    }
}
