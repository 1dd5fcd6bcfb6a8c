//! Symbolic field references
//!
//! A `FieldRef` names "the value on model X reachable via path P" without
//! stringly-typed paths. References are built through `RefPath`, a fluent
//! builder that checks every segment against the schema the moment it is
//! added, so a reference that exists is always structurally valid. Member
//! paths (`RefPath::member`) scope a reference to one member of a composed
//! model; resolution then descends into that member first. `FieldRef::new`
//! skips the walk for paths assembled at runtime; the binding target
//! re-checks those when it builds.

use std::fmt;
use std::sync::Arc;

use crate::error::DefinitionError;
use crate::schema::{FieldType, ModelSchema};

/// An immutable symbolic path to a field.
///
/// Equality ignores the member namespace: two references to the same root
/// field path compare equal.
#[derive(Clone)]
pub struct FieldRef {
    root: Arc<ModelSchema>,
    namespace: Option<String>,
    segments: Vec<String>,
}

impl FieldRef {
    /// Assemble a reference without walking the type graph. Useful when
    /// paths come from configuration rather than code. Targets re-check
    /// every segment when they bind the reference, so a bad path still
    /// fails at definition time with the full diagnostic.
    pub fn new(
        root: &Arc<ModelSchema>,
        segments: impl IntoIterator<Item = impl Into<String>>,
    ) -> FieldRef {
        FieldRef {
            root: Arc::clone(root),
            namespace: None,
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The model the path starts on. For member references this is the
    /// member's model, not the composed owner.
    pub fn root(&self) -> &Arc<ModelSchema> {
        &self.root
    }

    /// Member name on the composed owner, when scoped.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Name of the field this reference ultimately points at.
    pub fn leaf(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// First hop: the field read off the root model.
    pub fn head(&self) -> &str {
        self.segments
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl PartialEq for FieldRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root) && self.segments == other.segments
    }
}

impl Eq for FieldRef {}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}.{}", ns, self.segments.join(".")),
            None => write!(f, "{}.{}", self.root.name(), self.segments.join(".")),
        }
    }
}

impl fmt::Debug for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldRef({self})")
    }
}

/// Fluent, schema-checked path builder. Each step either extends the path
/// or fails immediately naming the model and the attempted field.
pub struct RefPath {
    root: Arc<ModelSchema>,
    namespace: Option<String>,
    segments: Vec<String>,
    cursor: FieldType,
}

impl RefPath {
    /// Begin a path at a declared field of `schema`.
    pub fn start(schema: &Arc<ModelSchema>, field: &str) -> Result<RefPath, DefinitionError> {
        let def = schema
            .field(field)
            .ok_or_else(|| DefinitionError::UnknownPathField {
                owner: schema.name().to_string(),
                field: field.to_string(),
                available: schema.field_names(),
            })?;
        Ok(RefPath {
            root: Arc::clone(schema),
            namespace: None,
            segments: vec![field.to_string()],
            cursor: def.ty().clone(),
        })
    }

    /// Begin a path at a field of one declared member of a composed model.
    /// The resulting reference roots at the member's model and carries the
    /// member name as namespace.
    pub fn member(
        schema: &Arc<ModelSchema>,
        member: &str,
        field: &str,
    ) -> Result<RefPath, DefinitionError> {
        let member_schema =
            schema
                .members()
                .get(member)
                .ok_or_else(|| DefinitionError::UnknownMember {
                    aggregate: schema.name().to_string(),
                    member: member.to_string(),
                    available: schema.members().keys().cloned().collect(),
                })?;
        let def = member_schema
            .field(field)
            .ok_or_else(|| DefinitionError::UnknownPathField {
                owner: member_schema.name().to_string(),
                field: field.to_string(),
                available: member_schema.field_names(),
            })?;
        Ok(RefPath {
            root: Arc::clone(member_schema),
            namespace: Some(member.to_string()),
            segments: vec![field.to_string()],
            cursor: def.ty().clone(),
        })
    }

    /// Extend the path one segment deeper.
    pub fn then(mut self, field: &str) -> Result<RefPath, DefinitionError> {
        let Some(model) = self.cursor.as_model().cloned() else {
            return Err(DefinitionError::PathIntoScalar {
                path: self.display_path(),
                field: field.to_string(),
                kind: self.cursor.to_string(),
            });
        };
        let def = model
            .field(field)
            .ok_or_else(|| DefinitionError::UnknownPathField {
                owner: model.name().to_string(),
                field: field.to_string(),
                available: model.field_names(),
            })?;
        self.segments.push(field.to_string());
        self.cursor = def.ty().clone();
        Ok(self)
    }

    /// Declared type of the segment the path currently ends on.
    pub fn cursor(&self) -> &FieldType {
        &self.cursor
    }

    pub fn into_ref(self) -> FieldRef {
        FieldRef {
            root: self.root,
            namespace: self.namespace,
            segments: self.segments,
        }
    }

    fn display_path(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.segments.join(".")),
            None => format!("{}.{}", self.root.name(), self.segments.join(".")),
        }
    }
}

impl fmt::Debug for RefPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefPath({})", self.display_path())
    }
}

impl From<RefPath> for FieldRef {
    fn from(path: RefPath) -> Self {
        path.into_ref()
    }
}
