//! Query Builder WITH Methods - Eager loading requests
//!
//! `with("posts.comments")` becomes one request for `posts` carrying the
//! nested path `comments`. Requests are keyed by their top-level relation
//! name, so `with(["posts.comments", "posts.tags"])` still resolves `posts`
//! with a single statement.

use std::fmt;

use super::builder::QueryBuilder;

/// Filter applied to the related query before it runs
pub type RelationConstraint = Box<dyn FnOnce(QueryBuilder) -> QueryBuilder + Send>;

/// One top-level relation to resolve after the base statement
pub struct RelationRequest {
    pub(crate) name: String,
    pub(crate) nested: Vec<String>,
    pub(crate) constraint: Option<RelationConstraint>,
    /// Constraints for nested paths, keyed by the path below this relation
    pub(crate) nested_constraints: Vec<(String, RelationConstraint)>,
}

impl RelationRequest {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nested: Vec::new(),
            constraint: None,
            nested_constraints: Vec::new(),
        }
    }

    /// Relation name as declared on the model
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remaining dotted paths to resolve on the related model
    pub fn nested(&self) -> &[String] {
        &self.nested
    }

    pub fn has_constraint(&self) -> bool {
        self.constraint.is_some()
    }

    /// Nested paths that carry their own constraint
    pub fn constrained_paths(&self) -> impl Iterator<Item = &str> {
        self.nested_constraints.iter().map(|(path, _)| path.as_str())
    }
}

impl fmt::Debug for RelationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationRequest")
            .field("name", &self.name)
            .field("nested", &self.nested)
            .field("constraint", &self.constraint.is_some())
            .field("constrained_paths", &self.constrained_paths().collect::<Vec<_>>())
            .finish()
    }
}

/// Anything `with` accepts: one dotted path or a collection of them
pub trait IntoRelationPaths {
    fn into_relation_paths(self) -> Vec<String>;
}

impl IntoRelationPaths for &str {
    fn into_relation_paths(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoRelationPaths for String {
    fn into_relation_paths(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoRelationPaths for &String {
    fn into_relation_paths(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl IntoRelationPaths for Vec<&str> {
    fn into_relation_paths(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoRelationPaths for Vec<String> {
    fn into_relation_paths(self) -> Vec<String> {
        self
    }
}

impl IntoRelationPaths for &[&str] {
    fn into_relation_paths(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoRelationPaths for [&str; N] {
    fn into_relation_paths(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

/// Split `a.b.c` into `("a", Some("b.c"))`, dropping empty segments
pub(crate) fn split_relation_path(path: &str) -> Option<(String, Option<String>)> {
    let mut segments = path.split('.').map(str::trim).filter(|s| !s.is_empty());
    let head = segments.next()?.to_string();
    let rest: Vec<&str> = segments.collect();
    let nested = (!rest.is_empty()).then(|| rest.join("."));
    Some((head, nested))
}

impl QueryBuilder {
    /// Eager load one or more relations, dotted paths resolve nested relations
    pub fn with<R: IntoRelationPaths>(mut self, relations: R) -> Self {
        for path in relations.into_relation_paths() {
            self.push_relation(&path, None);
        }
        self
    }

    /// Eager load a relation whose query is filtered by `constraint`
    ///
    /// The constraint receives the related model's builder; the key filter
    /// is ANDed around whatever it adds. On a dotted path the constraint
    /// applies to the last segment, and the earlier segments load
    /// unconstrained.
    pub fn with_constraint<F>(self, relation: &str, constraint: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder + Send + 'static,
    {
        self.with_boxed_constraint(relation, Box::new(constraint))
    }

    pub(crate) fn with_boxed_constraint(mut self, relation: &str, constraint: RelationConstraint) -> Self {
        self.push_relation(relation, Some(constraint));
        self
    }

    /// Add conditional eager loading
    pub fn with_when<R: IntoRelationPaths>(self, condition: bool, relations: R) -> Self {
        if condition {
            self.with(relations)
        } else {
            self
        }
    }

    /// Pending relation requests, in the order they were first named
    pub fn relation_requests(&self) -> &[RelationRequest] {
        &self.relations
    }

    fn push_relation(&mut self, path: &str, constraint: Option<RelationConstraint>) {
        let Some((name, nested)) = split_relation_path(path) else {
            return;
        };

        let index = match self.relations.iter().position(|r| r.name == name) {
            Some(index) => index,
            None => {
                self.relations.push(RelationRequest::new(&name));
                self.relations.len() - 1
            }
        };

        let request = &mut self.relations[index];
        match (nested, constraint) {
            (Some(nested), constraint) => {
                if !request.nested.contains(&nested) {
                    request.nested.push(nested.clone());
                }
                if let Some(constraint) = constraint {
                    request.nested_constraints.retain(|(path, _)| *path != nested);
                    request.nested_constraints.push((nested, constraint));
                }
            }
            (None, Some(constraint)) => request.constraint = Some(constraint),
            (None, None) => {}
        }
    }
}
