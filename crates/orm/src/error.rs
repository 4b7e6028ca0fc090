//! Error types for the ORM
//!
//! Statement failures are carried as `ModelError::Database` and handed back
//! to the caller unchanged. Nothing in this crate retries a statement.

use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Statement execution failed (syntax, constraint violation, connectivity)
    #[error("Database error: {0}")]
    Database(String),

    /// Record not found in database
    #[error("Record not found in table '{0}'")]
    NotFound(String),

    /// Primary key is missing or invalid
    #[error("Primary key is missing or invalid")]
    MissingPrimaryKey,

    /// Relationship declaration or loading failed
    #[error("Relationship error: {0}")]
    Relationship(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Connection pool error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query building error
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                ModelError::Connection(err.to_string())
            }
            other => ModelError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

/// Error types for relationship operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RelationshipError {
    /// Eager load requested for a relation the model never declared
    #[error("Relation '{relation}' is not declared on model '{model}'")]
    NotDeclared { model: String, relation: String },

    /// Invalid relationship configuration
    #[error("Invalid relationship configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<RelationshipError> for ModelError {
    fn from(err: RelationshipError) -> Self {
        ModelError::Relationship(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_error_conversion_keeps_names() {
        let err: ModelError = RelationshipError::NotDeclared {
            model: "users".to_string(),
            relation: "avatars".to_string(),
        }
        .into();

        match err {
            ModelError::Relationship(msg) => {
                assert!(msg.contains("avatars"));
                assert!(msg.contains("users"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ModelError::NotFound("posts".to_string()).to_string(),
            "Record not found in table 'posts'"
        );
        assert_eq!(
            ModelError::MissingPrimaryKey.to_string(),
            "Primary key is missing or invalid"
        );
    }
}
