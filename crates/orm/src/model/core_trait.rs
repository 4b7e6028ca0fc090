//! Core Model Trait - Base definition for database entities
//!
//! A model is a zero-sized declaration: table name, primary key name and the
//! relations it exposes. Rows themselves live in [`Record`]; [`ModelMeta`]
//! carries a model's declaration around without generics.

use std::fmt;

use super::record::Record;
use crate::backends::{ConnectionGateway, DatabaseValue, Row};
use crate::error::ModelResult;
use crate::query::{IntoRelationPaths, QueryBuilder};
use crate::relationships::Relation;

/// Core trait for database models
pub trait Model: Send + Sync + 'static {
    /// Table name for this model
    fn table_name() -> &'static str;

    /// Primary key field name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Relation declared under `name`, if any
    ///
    /// Implementations match on the name and build the descriptor with the
    /// provided constructors:
    ///
    /// ```ignore
    /// fn relation(name: &str) -> Option<Relation> {
    ///     match name {
    ///         "posts" => Some(Self::has_many::<Post>("user_id", "id")),
    ///         _ => None,
    ///     }
    /// }
    /// ```
    fn relation(_name: &str) -> Option<Relation> {
        None
    }

    /// Runtime declaration of this model
    fn meta() -> ModelMeta
    where
        Self: Sized,
    {
        ModelMeta::of::<Self>()
    }

    /// Start a query scoped to this model
    fn query() -> QueryBuilder
    where
        Self: Sized,
    {
        QueryBuilder::new(Self::meta())
    }

    /// Build an unsaved record of this model
    fn make(attributes: Row) -> Record
    where
        Self: Sized,
    {
        Record::new(Self::meta(), attributes)
    }

    /// Insert a new row and return it with its generated key
    #[allow(async_fn_in_trait)]
    async fn create(gateway: &dyn ConnectionGateway, attributes: Row) -> ModelResult<Record>
    where
        Self: Sized,
    {
        Record::create(Self::meta(), attributes, gateway).await
    }

    // Relation constructors

    fn has_one<R: Model>(foreign_key: &str, local_key: &str) -> Relation
    where
        Self: Sized,
    {
        Relation::has_one(Self::meta(), R::meta(), foreign_key, local_key)
    }

    fn has_many<R: Model>(foreign_key: &str, local_key: &str) -> Relation
    where
        Self: Sized,
    {
        Relation::has_many(Self::meta(), R::meta(), foreign_key, local_key)
    }

    fn belongs_to<R: Model>(foreign_key: &str, owner_key: &str) -> Relation
    where
        Self: Sized,
    {
        Relation::belongs_to(Self::meta(), R::meta(), foreign_key, owner_key)
    }

    fn belongs_to_many<R: Model>(pivot_table: &str, foreign_key: &str, related_key: &str) -> Relation
    where
        Self: Sized,
    {
        Relation::belongs_to_many(Self::meta(), R::meta(), pivot_table, foreign_key, related_key)
    }

    // Query shortcuts

    fn select(fields: &str) -> QueryBuilder
    where
        Self: Sized,
    {
        Self::query().select(fields)
    }

    fn where_eq<T: Into<DatabaseValue>>(column: &str, value: T) -> QueryBuilder
    where
        Self: Sized,
    {
        Self::query().where_eq(column, value)
    }

    fn where_condition<T: Into<DatabaseValue>>(column: &str, operator: &str, value: T) -> QueryBuilder
    where
        Self: Sized,
    {
        Self::query().where_condition(column, operator, value)
    }

    fn where_in<T: Into<DatabaseValue>>(column: &str, values: Vec<T>) -> QueryBuilder
    where
        Self: Sized,
    {
        Self::query().where_in(column, values)
    }

    fn where_raw(sql: &str, params: Vec<DatabaseValue>) -> QueryBuilder
    where
        Self: Sized,
    {
        Self::query().where_raw(sql, params)
    }

    fn or_where_raw(sql: &str, params: Vec<DatabaseValue>) -> QueryBuilder
    where
        Self: Sized,
    {
        Self::query().or_where_raw(sql, params)
    }

    fn select_raw(expression: &str) -> QueryBuilder
    where
        Self: Sized,
    {
        Self::query().select_raw(expression)
    }

    fn join_raw(sql: &str) -> QueryBuilder
    where
        Self: Sized,
    {
        Self::query().join_raw(sql)
    }

    fn having_raw(sql: &str, params: Vec<DatabaseValue>) -> QueryBuilder
    where
        Self: Sized,
    {
        Self::query().having_raw(sql, params)
    }

    fn or_having_raw(sql: &str, params: Vec<DatabaseValue>) -> QueryBuilder
    where
        Self: Sized,
    {
        Self::query().or_having_raw(sql, params)
    }

    fn with<P: IntoRelationPaths>(relations: P) -> QueryBuilder
    where
        Self: Sized,
    {
        Self::query().with(relations)
    }

    /// First row of the table, if any
    #[allow(async_fn_in_trait)]
    async fn first(gateway: &dyn ConnectionGateway) -> ModelResult<Option<Record>>
    where
        Self: Sized,
    {
        Self::query().first(gateway).await
    }

    /// Fetch every row of the table
    #[allow(async_fn_in_trait)]
    async fn all(gateway: &dyn ConnectionGateway) -> ModelResult<Vec<Record>>
    where
        Self: Sized,
    {
        Self::query().get(gateway).await
    }

    /// Find a row by primary key
    #[allow(async_fn_in_trait)]
    async fn find<T: Into<DatabaseValue>>(gateway: &dyn ConnectionGateway, id: T) -> ModelResult<Option<Record>>
    where
        Self: Sized,
    {
        Self::query().find(gateway, id).await
    }
}

/// Runtime view of a [`Model`] declaration
///
/// Copyable so descriptors, builders and records can point at a model
/// without being generic over it.
#[derive(Clone, Copy)]
pub struct ModelMeta {
    pub table: &'static str,
    pub primary_key: &'static str,
    pub type_name: &'static str,
    relations: fn(&str) -> Option<Relation>,
}

impl ModelMeta {
    pub fn of<M: Model>() -> Self {
        Self {
            table: M::table_name(),
            primary_key: M::primary_key_name(),
            type_name: std::any::type_name::<M>(),
            relations: M::relation,
        }
    }

    /// Build the descriptor declared under `name`
    pub fn relation(&self, name: &str) -> Option<Relation> {
        (self.relations)(name)
    }

    /// Short model name, without the module path
    pub fn model_name(&self) -> &'static str {
        self.type_name.rsplit("::").next().unwrap_or(self.type_name)
    }
}

impl PartialEq for ModelMeta {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.type_name == other.type_name
    }
}

impl Eq for ModelMeta {}

impl fmt::Debug for ModelMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelMeta")
            .field("model", &self.model_name())
            .field("table", &self.table)
            .field("primary_key", &self.primary_key)
            .finish()
    }
}
