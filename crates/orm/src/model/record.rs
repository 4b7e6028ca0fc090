//! Record - one hydrated row of a model
//!
//! Columns are kept as an ordered key-value map with typed getters on top.
//! Eager-loaded relations are stored next to the columns, never merged into
//! them, so a relation named like a column cannot shadow it.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use super::core_trait::ModelMeta;
use crate::backends::Row;
use crate::error::{ModelError, ModelResult};

/// Value attached to a record under a relation name
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// `HasOne` / `BelongsTo`: the match, or none
    One(Option<Box<Record>>),
    /// `HasMany` / `BelongsToMany`: every match, possibly empty
    Many(Vec<Record>),
}

impl Related {
    pub fn as_one(&self) -> Option<&Record> {
        match self {
            Related::One(record) => record.as_deref(),
            Related::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> &[Record] {
        match self {
            Related::Many(records) => records,
            Related::One(_) => &[],
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Related::One(Some(record)) => record.to_json(),
            Related::One(None) => JsonValue::Null,
            Related::Many(records) => JsonValue::Array(records.iter().map(Record::to_json).collect()),
        }
    }
}

/// A row of a model's table plus anything eager loading attached to it
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    meta: ModelMeta,
    attributes: Row,
    relations: BTreeMap<String, Related>,
    pivot: Option<Row>,
}

impl Record {
    pub fn new(meta: ModelMeta, attributes: Row) -> Self {
        Self {
            meta,
            attributes,
            relations: BTreeMap::new(),
            pivot: None,
        }
    }

    pub fn meta(&self) -> ModelMeta {
        self.meta
    }

    pub fn table(&self) -> &'static str {
        self.meta.table
    }

    pub fn attributes(&self) -> &Row {
        &self.attributes
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Row {
        &mut self.attributes
    }

    pub fn into_attributes(self) -> Row {
        self.attributes
    }

    /// Raw column value
    pub fn attribute(&self, column: &str) -> Option<&JsonValue> {
        self.attributes.get(column)
    }

    /// Typed column value; a missing column is an error
    pub fn get<T: DeserializeOwned>(&self, column: &str) -> ModelResult<T> {
        let value = self.attributes.get(column).ok_or_else(|| {
            ModelError::Serialization(format!(
                "column '{}' is not present on {}",
                column, self.meta.table
            ))
        })?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Typed column value, `None` when missing or of another type
    pub fn try_get<T: DeserializeOwned>(&self, column: &str) -> Option<T> {
        self.get(column).ok()
    }

    /// Set a column value
    pub fn set<V: Into<JsonValue>>(&mut self, column: &str, value: V) -> &mut Self {
        self.attributes.insert(column.to_string(), value.into());
        self
    }

    /// Primary key value, if the column is present and not null
    pub fn primary_key(&self) -> Option<&JsonValue> {
        self.attributes
            .get(self.meta.primary_key)
            .filter(|value| !value.is_null())
    }

    /// True when the primary key holds a usable identifier
    ///
    /// `null`, `false`, `0` and `""` all count as absent.
    pub fn has_primary_key(&self) -> bool {
        self.primary_key().map(is_truthy).unwrap_or(false)
    }

    pub fn related(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    /// Single related record loaded under `name`
    pub fn one(&self, name: &str) -> Option<&Record> {
        self.relations.get(name).and_then(Related::as_one)
    }

    /// Related records loaded under `name`; empty when nothing was loaded
    pub fn many(&self, name: &str) -> &[Record] {
        self.relations.get(name).map(Related::as_many).unwrap_or(&[])
    }

    pub fn relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn relations(&self) -> &BTreeMap<String, Related> {
        &self.relations
    }

    pub fn set_relation(&mut self, name: &str, related: Related) {
        self.relations.insert(name.to_string(), related);
    }

    /// Pivot row this record was reached through, for many-to-many results
    pub fn pivot(&self) -> Option<&Row> {
        self.pivot.as_ref()
    }

    pub(crate) fn with_pivot(mut self, pivot: Row) -> Self {
        self.pivot = Some(pivot);
        self
    }

    /// Deserialize the columns into a typed struct
    pub fn deserialize<T: DeserializeOwned>(&self) -> ModelResult<T> {
        Ok(serde_json::from_value(JsonValue::Object(self.attributes.clone()))?)
    }

    /// Columns, then relations, then `pivot` when present
    pub fn to_json(&self) -> JsonValue {
        let mut object = self.attributes.clone();
        for (name, related) in &self.relations {
            object.insert(name.clone(), related.to_json());
        }
        if let Some(pivot) = &self.pivot {
            object.insert("pivot".to_string(), JsonValue::Object(pivot.clone()));
        }
        JsonValue::Object(object)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

pub(crate) fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}
