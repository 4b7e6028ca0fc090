//! Relationship Types - Descriptors for declared associations

use std::fmt;

use crate::error::RelationshipError;
use crate::model::ModelMeta;

/// Defines the type of relationship between models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// One-to-one relationship (hasOne)
    HasOne,
    /// One-to-many relationship (hasMany)
    HasMany,
    /// Many-to-one relationship (belongsTo)
    BelongsTo,
    /// Many-to-many relationship through a pivot table
    BelongsToMany,
}

impl RelationKind {
    /// Returns true if this relationship resolves to a sequence
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::BelongsToMany)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationKind::HasOne => "HasOne",
            RelationKind::HasMany => "HasMany",
            RelationKind::BelongsTo => "BelongsTo",
            RelationKind::BelongsToMany => "BelongsToMany",
        };
        f.write_str(name)
    }
}

/// One declared association between two models
///
/// Built on demand by [`Model::relation`](crate::model::Model::relation) and
/// never cached. Key names are never checked against a schema; only blank
/// names are rejected, by [`Relation::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    /// `related.foreign_key == parent.local_key`, at most one related row
    HasOne {
        parent: ModelMeta,
        related: ModelMeta,
        foreign_key: String,
        local_key: String,
    },
    /// `related.foreign_key == parent.local_key`, any number of related rows
    HasMany {
        parent: ModelMeta,
        related: ModelMeta,
        foreign_key: String,
        local_key: String,
    },
    /// `parent.foreign_key == related.owner_key`
    BelongsTo {
        parent: ModelMeta,
        related: ModelMeta,
        foreign_key: String,
        owner_key: String,
    },
    /// `pivot.foreign_key == parent pk`, `pivot.related_key == related pk`
    BelongsToMany {
        parent: ModelMeta,
        related: ModelMeta,
        pivot_table: String,
        foreign_key: String,
        related_key: String,
    },
}

impl Relation {
    pub fn has_one(parent: ModelMeta, related: ModelMeta, foreign_key: &str, local_key: &str) -> Self {
        Relation::HasOne {
            parent,
            related,
            foreign_key: foreign_key.to_string(),
            local_key: local_key.to_string(),
        }
    }

    pub fn has_many(parent: ModelMeta, related: ModelMeta, foreign_key: &str, local_key: &str) -> Self {
        Relation::HasMany {
            parent,
            related,
            foreign_key: foreign_key.to_string(),
            local_key: local_key.to_string(),
        }
    }

    pub fn belongs_to(parent: ModelMeta, related: ModelMeta, foreign_key: &str, owner_key: &str) -> Self {
        Relation::BelongsTo {
            parent,
            related,
            foreign_key: foreign_key.to_string(),
            owner_key: owner_key.to_string(),
        }
    }

    pub fn belongs_to_many(
        parent: ModelMeta,
        related: ModelMeta,
        pivot_table: &str,
        foreign_key: &str,
        related_key: &str,
    ) -> Self {
        Relation::BelongsToMany {
            parent,
            related,
            pivot_table: pivot_table.to_string(),
            foreign_key: foreign_key.to_string(),
            related_key: related_key.to_string(),
        }
    }

    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::HasOne { .. } => RelationKind::HasOne,
            Relation::HasMany { .. } => RelationKind::HasMany,
            Relation::BelongsTo { .. } => RelationKind::BelongsTo,
            Relation::BelongsToMany { .. } => RelationKind::BelongsToMany,
        }
    }

    /// The declaring model
    pub fn parent(&self) -> ModelMeta {
        match self {
            Relation::HasOne { parent, .. }
            | Relation::HasMany { parent, .. }
            | Relation::BelongsTo { parent, .. }
            | Relation::BelongsToMany { parent, .. } => *parent,
        }
    }

    /// The model the relation resolves to
    pub fn related(&self) -> ModelMeta {
        match self {
            Relation::HasOne { related, .. }
            | Relation::HasMany { related, .. }
            | Relation::BelongsTo { related, .. }
            | Relation::BelongsToMany { related, .. } => *related,
        }
    }

    /// Column on the parent rows whose values are collected as batch keys
    pub fn parent_key(&self) -> &str {
        match self {
            Relation::HasOne { local_key, .. } | Relation::HasMany { local_key, .. } => local_key,
            Relation::BelongsTo { foreign_key, .. } => foreign_key,
            Relation::BelongsToMany { parent, .. } => parent.primary_key,
        }
    }

    /// Reject descriptors with a blank key or pivot table name
    pub fn validate(&self) -> Result<(), RelationshipError> {
        let names: Vec<(&str, &str)> = match self {
            Relation::HasOne { foreign_key, local_key, .. }
            | Relation::HasMany { foreign_key, local_key, .. } => {
                vec![("foreign key", foreign_key.as_str()), ("local key", local_key.as_str())]
            }
            Relation::BelongsTo { foreign_key, owner_key, .. } => {
                vec![("foreign key", foreign_key.as_str()), ("owner key", owner_key.as_str())]
            }
            Relation::BelongsToMany {
                pivot_table,
                foreign_key,
                related_key,
                ..
            } => vec![
                ("pivot table", pivot_table.as_str()),
                ("foreign key", foreign_key.as_str()),
                ("related key", related_key.as_str()),
            ],
        };

        match names.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(RelationshipError::InvalidConfiguration(format!(
                "{} {} -> {} has an empty {}",
                self.kind(),
                self.parent().model_name(),
                self.related().model_name(),
                field
            ))),
            None => Ok(()),
        }
    }
}
