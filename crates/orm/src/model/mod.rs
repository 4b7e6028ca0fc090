//! Model System - declarations, records and persistence
//!
//! - `core_trait`: the `Model` trait and its runtime view `ModelMeta`
//! - `record`: `Record`, one hydrated row plus its loaded relations
//! - `crud_operations`: save, delete and refresh for records

pub mod core_trait;
pub mod crud_operations;
pub mod record;

pub use core_trait::{Model, ModelMeta};
pub use record::{Record, Related};
