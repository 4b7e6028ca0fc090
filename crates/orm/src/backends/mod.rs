//! Database Gateways
//!
//! The core only needs [`ConnectionGateway`]. `mysql` provides the pooled
//! production implementation; tests use [`crate::testing::MockGateway`].

pub mod core;
pub mod mysql;

// Re-export core traits and types
pub use self::core::*;
pub use mysql::MySqlGateway;
