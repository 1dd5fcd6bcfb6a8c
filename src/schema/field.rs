//! Field declarations
//!
//! A `FieldDef` declares one field on a model schema: its name, its
//! `FieldType`, an optional default, and the `auto`/`private` markers.
//! Required vs optional classification falls out of the default: a field
//! with no default (and no auto marker) must be supplied at construction.

use std::fmt;
use std::sync::Arc;

use crate::schema::ModelSchema;
use crate::value::Value;

/// Declared type of a field.
#[derive(Debug, Clone)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Str,
    DateTime,
    /// Accepts any value, including null and unassigned
    Any,
    /// Nested record of the given schema
    Model(Arc<ModelSchema>),
    /// Homogeneous list
    List(Box<FieldType>),
    /// Inner type or null
    Nullable(Box<FieldType>),
}

impl FieldType {
    /// Whether a runtime value fits this declared type. No coercion:
    /// ints are not floats, null only fits nullable types.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::Any, _) => true,
            (FieldType::Nullable(_), Value::Null) => true,
            (FieldType::Nullable(inner), v) => inner.accepts(v),
            (_, Value::Unassigned) => false,
            (FieldType::Bool, Value::Bool(_)) => true,
            (FieldType::Int, Value::Int(_)) => true,
            (FieldType::Float, Value::Float(_)) => true,
            (FieldType::Str, Value::Str(_)) => true,
            (FieldType::DateTime, Value::DateTime(_)) => true,
            (FieldType::List(inner), Value::List(items)) => {
                items.iter().all(|item| inner.accepts(item))
            }
            (FieldType::Model(schema), Value::Record(record)) => {
                Arc::ptr_eq(schema, record.schema())
            }
            _ => false,
        }
    }

    /// The model schema behind this type, unwrapping nullable.
    pub fn as_model(&self) -> Option<&Arc<ModelSchema>> {
        match self {
            FieldType::Model(schema) => Some(schema),
            FieldType::Nullable(inner) => inner.as_model(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => write!(f, "bool"),
            FieldType::Int => write!(f, "int"),
            FieldType::Float => write!(f, "float"),
            FieldType::Str => write!(f, "str"),
            FieldType::DateTime => write!(f, "datetime"),
            FieldType::Any => write!(f, "any"),
            FieldType::Model(schema) => write!(f, "'{}'", schema.name()),
            FieldType::List(inner) => write!(f, "list<{inner}>"),
            FieldType::Nullable(inner) => write!(f, "option<{inner}>"),
        }
    }
}

/// One declared field on a model.
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    ty: FieldType,
    default: Option<Value>,
    auto: bool,
    private: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            auto: false,
            private: false,
        }
    }

    /// Give the field a default, making it optional at construction.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark as auto-managed: infrastructure assigns it, inbound schemas
    /// leave it out of derived field sets, missing values become the
    /// unassigned sentinel.
    pub fn auto(mut self) -> Self {
        self.auto = true;
        self
    }

    /// Mark as private: never exported, never exposable through a view.
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_auto(&self) -> bool {
        self.auto
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Required means: no default and not auto-managed.
    pub fn is_required(&self) -> bool {
        !self.auto && self.default.is_none()
    }
}
