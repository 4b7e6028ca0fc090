//! Relationships Module - relation descriptors and batched eager loading

pub mod eager_loading;
pub mod types;

pub use eager_loading::{load_relations, validate_requests, LoadFuture};
pub use types::{Relation, RelationKind};
