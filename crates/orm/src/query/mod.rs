//! Query Builder Module - fluent, model-scoped SELECT builder

pub mod builder;
pub mod execution;
pub mod joins;
pub mod ordering;
pub mod select;
pub mod sql_generation;
pub mod types;
pub mod where_clause;
pub mod with;

pub use builder::QueryBuilder;
pub use types::{
    Combinator, JoinClause, JoinType, OrderDirection, QueryOperator, RawClause, WhereCondition,
};
pub use with::{IntoRelationPaths, RelationConstraint, RelationRequest};
