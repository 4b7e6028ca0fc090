//! # quarry-orm: fluent queries with batched eager loading
//!
//! Models declare a table, a primary key and their relations. Queries are
//! built per model, rendered to a single `?`-placeholder statement and run
//! through a [`ConnectionGateway`]. Requested relations are then attached in
//! batches: one extra statement per relation level, never one per row.
//!
//! ```ignore
//! let gateway = MySqlGateway::connect(&DatabaseConfig::from_env()?).await?;
//! let users = User::where_condition("status", "=", "active")
//!     .with("posts.comments")
//!     .get(&gateway)
//!     .await?;
//! ```

pub mod backends;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod relationships;
pub mod testing;

pub use backends::{ConnectionGateway, DatabaseValue, ExecuteResult, MySqlGateway, Row};
pub use config::{ConfigError, DatabaseConfig};
pub use error::*;
pub use model::{Model, ModelMeta, Record, Related};
pub use query::{IntoRelationPaths, QueryBuilder, RelationRequest};
pub use relationships::{Relation, RelationKind};
