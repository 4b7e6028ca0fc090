//! Eager Loading System - batched relation resolution
//!
//! Each requested relation costs one statement (two for `BelongsToMany`)
//! whatever the number of parent rows: keys are collected from the parents,
//! the related rows are fetched with a single `IN` filter, grouped by key in
//! memory and attached back. Nested paths are resolved once per level over
//! the flat set of fetched related rows, before they are handed out to the
//! parents.
//!
//! Requests run one after another and nesting is depth-first; nothing here
//! issues statements concurrently.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::types::{Relation, RelationKind};
use crate::backends::{ConnectionGateway, DatabaseValue, Row};
use crate::error::{ModelResult, RelationshipError};
use crate::model::{ModelMeta, Record, Related};
use crate::query::with::split_relation_path;
use crate::query::{QueryBuilder, RelationConstraint, RelationRequest};

/// Boxed so resolution can recurse through nested builders
pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = ModelResult<Vec<Record>>> + Send + 'a>>;

/// Check that every requested path names declared relations, level by level
pub fn validate_requests(entity: ModelMeta, requests: &[RelationRequest]) -> ModelResult<()> {
    for request in requests {
        let relation = declared(entity, request.name())?;
        for path in request.nested() {
            validate_path(relation.related(), path)?;
        }
    }
    Ok(())
}

fn validate_path(entity: ModelMeta, path: &str) -> ModelResult<()> {
    let Some((name, rest)) = split_relation_path(path) else {
        return Ok(());
    };
    let relation = declared(entity, &name)?;
    match rest {
        Some(rest) => validate_path(relation.related(), &rest),
        None => Ok(()),
    }
}

fn declared(entity: ModelMeta, name: &str) -> ModelResult<Relation> {
    let relation = entity.relation(name).ok_or_else(|| RelationshipError::NotDeclared {
        model: entity.model_name().to_string(),
        relation: name.to_string(),
    })?;
    relation.validate()?;
    Ok(relation)
}

/// Attach every requested relation to `rows`
///
/// Rows come back in input order, each carrying one entry per
/// request: a sequence (possibly empty) for collection kinds, an optional
/// record otherwise.
pub fn load_relations<'a>(
    entity: ModelMeta,
    mut rows: Vec<Record>,
    requests: Vec<RelationRequest>,
    gateway: &'a dyn ConnectionGateway,
) -> LoadFuture<'a> {
    Box::pin(async move {
        for request in requests {
            let relation = declared(entity, request.name())?;
            resolve_relation(&relation, &mut rows, request, gateway).await?;
        }
        Ok(rows)
    })
}

async fn resolve_relation(
    relation: &Relation,
    rows: &mut [Record],
    request: RelationRequest,
    gateway: &dyn ConnectionGateway,
) -> ModelResult<()> {
    let RelationRequest {
        name,
        nested,
        constraint,
        nested_constraints,
    } = request;
    let shape = RelatedQuery {
        constraint,
        nested,
        nested_constraints,
    };
    let kind = relation.kind();
    let keys = collect_keys(rows.iter(), relation.parent_key());

    debug!(
        relation = %name,
        kind = %kind,
        parents = rows.len(),
        keys = keys.len(),
        "Resolving relation"
    );

    if keys.is_empty() {
        debug!(relation = %name, "No keys collected, skipping relation query");
        attach_empty(rows, &name, kind);
        return Ok(());
    }

    match relation {
        Relation::HasOne {
            related,
            foreign_key,
            local_key,
            ..
        }
        | Relation::HasMany {
            related,
            foreign_key,
            local_key,
            ..
        } => {
            let children = fetch_related(*related, foreign_key, keys, shape, gateway).await?;
            let groups = group_by_key(children, foreign_key);
            attach_groups(rows, &name, kind, local_key, &groups);
        }
        Relation::BelongsTo {
            related,
            foreign_key,
            owner_key,
            ..
        } => {
            let owners = fetch_related(*related, owner_key, keys, shape, gateway).await?;
            let groups = group_by_key(owners, owner_key);
            attach_groups(rows, &name, kind, foreign_key, &groups);
        }
        Relation::BelongsToMany {
            parent,
            related,
            pivot_table,
            foreign_key,
            related_key,
        } => {
            let pivots = fetch_pivot_rows(pivot_table, foreign_key, &keys, gateway).await?;
            if pivots.is_empty() {
                debug!(relation = %name, pivot = %pivot_table, "No pivot rows matched");
                attach_empty(rows, &name, kind);
                return Ok(());
            }

            let related_keys = collect_row_keys(pivots.iter(), related_key);
            let records = if related_keys.is_empty() {
                Vec::new()
            } else {
                fetch_related(*related, related.primary_key, related_keys, shape, gateway).await?
            };

            let mut by_key: HashMap<String, Record> = HashMap::new();
            for record in records {
                if let Some(key) = record.attribute(related.primary_key).and_then(relation_key) {
                    by_key.entry(key).or_insert(record);
                }
            }

            let mut groups: HashMap<String, Vec<Record>> = HashMap::new();
            for pivot in pivots {
                let Some(owner) = pivot.get(foreign_key.as_str()).and_then(relation_key) else {
                    continue;
                };
                let target = pivot.get(related_key.as_str()).and_then(relation_key);
                match target.and_then(|key| by_key.get(&key)) {
                    Some(record) => groups
                        .entry(owner)
                        .or_default()
                        .push(record.clone().with_pivot(pivot)),
                    None => warn!(
                        relation = %name,
                        pivot = %pivot_table,
                        "Pivot row references a missing related record, dropping it"
                    ),
                }
            }

            attach_groups(rows, &name, kind, parent.primary_key, &groups);
        }
    }

    Ok(())
}

/// What a request adds to the related query beyond the key filter
struct RelatedQuery {
    constraint: Option<RelationConstraint>,
    nested: Vec<String>,
    nested_constraints: Vec<(String, RelationConstraint)>,
}

/// Run the related query for one batch of keys
///
/// The caller's constraint shapes the query and the key filter is scoped
/// around it, so no `OR` in the constraint reaches rows of other parents.
/// Nested paths, with their own constraints, are resolved against the whole
/// fetched batch.
async fn fetch_related(
    related: ModelMeta,
    column: &str,
    keys: Vec<(String, JsonValue)>,
    shape: RelatedQuery,
    gateway: &dyn ConnectionGateway,
) -> ModelResult<Vec<Record>> {
    let RelatedQuery {
        constraint,
        nested,
        nested_constraints,
    } = shape;

    let mut query = QueryBuilder::new(related);
    if let Some(constraint) = constraint {
        query = constraint(query);
    }

    let values: Vec<DatabaseValue> = keys
        .into_iter()
        .map(|(_, value)| DatabaseValue::from_json(value))
        .collect();
    let records = query.scope_where_in(column, values).get(gateway).await?;

    if nested.is_empty() || records.is_empty() {
        return Ok(records);
    }

    let mut nested_query = QueryBuilder::new(related).with(nested);
    for (path, constraint) in nested_constraints {
        nested_query = nested_query.with_boxed_constraint(&path, constraint);
    }
    nested_query.bind_to(records).get(gateway).await
}

async fn fetch_pivot_rows(
    pivot_table: &str,
    foreign_key: &str,
    keys: &[(String, JsonValue)],
    gateway: &dyn ConnectionGateway,
) -> ModelResult<Vec<Row>> {
    let placeholders = vec!["?"; keys.len()].join(", ");
    let sql = format!(
        "SELECT * FROM {} WHERE {} IN ({})",
        pivot_table, foreign_key, placeholders
    );
    let params: Vec<DatabaseValue> = keys
        .iter()
        .map(|(_, value)| DatabaseValue::from_json(value.clone()))
        .collect();

    debug!(sql = %sql, params = params.len(), "Executing pivot query");
    gateway.fetch_all(&sql, &params).await
}

fn attach_empty(rows: &mut [Record], name: &str, kind: RelationKind) {
    for row in rows {
        row.set_relation(name, empty_value(kind));
    }
}

fn empty_value(kind: RelationKind) -> Related {
    if kind.is_collection() {
        Related::Many(Vec::new())
    } else {
        Related::One(None)
    }
}

/// Hand each parent its group, matched on the parent's `key_column`
fn attach_groups(
    rows: &mut [Record],
    name: &str,
    kind: RelationKind,
    key_column: &str,
    groups: &HashMap<String, Vec<Record>>,
) {
    for row in rows {
        let group = row
            .attribute(key_column)
            .and_then(relation_key)
            .and_then(|key| groups.get(&key).map(|group| (key, group)));

        let related = match group {
            None => empty_value(kind),
            Some((_, group)) if kind.is_collection() => Related::Many(group.clone()),
            Some((key, group)) => {
                if group.len() > 1 {
                    warn!(
                        relation = %name,
                        key = %key,
                        matches = group.len(),
                        "Several rows matched a single-valued relation, keeping the first"
                    );
                }
                Related::One(group.first().cloned().map(Box::new))
            }
        };
        row.set_relation(name, related);
    }
}

/// Distinct non-null values of `column`, in first-seen order
fn collect_keys<'r>(records: impl Iterator<Item = &'r Record>, column: &str) -> Vec<(String, JsonValue)> {
    dedup_keys(records.filter_map(|record| record.attribute(column)))
}

fn collect_row_keys<'r>(rows: impl Iterator<Item = &'r Row>, column: &str) -> Vec<(String, JsonValue)> {
    dedup_keys(rows.filter_map(|row| row.get(column)))
}

fn dedup_keys<'v>(values: impl Iterator<Item = &'v JsonValue>) -> Vec<(String, JsonValue)> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for value in values {
        if let Some(key) = relation_key(value) {
            if seen.insert(key.clone()) {
                keys.push((key, value.clone()));
            }
        }
    }
    keys
}

/// Group records by the normalised value of `column`, keeping fetch order
fn group_by_key(records: Vec<Record>, column: &str) -> HashMap<String, Vec<Record>> {
    let mut groups: HashMap<String, Vec<Record>> = HashMap::new();
    for record in records {
        if let Some(key) = record.attribute(column).and_then(relation_key) {
            groups.entry(key).or_default().push(record);
        }
    }
    groups
}

/// Normalise a key value so `7`, `7.0` and `"7"` land in the same group
///
/// `null` never matches anything.
pub(crate) fn relation_key(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                        Some((f as i64).to_string())
                    }
                    _ => Some(n.to_string()),
                }
            }
        }
        other => Some(other.to_string()),
    }
}
