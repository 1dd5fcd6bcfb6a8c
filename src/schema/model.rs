//! Model schemas
//!
//! A `ModelSchema` is the structural description of one domain type:
//! its declared fields, the required/optional/auto/private classification
//! (`FieldIndex`), and, for composed models, the member table. Schemas are
//! built once through `ModelBuilder`, validated, then frozen behind an
//! `Arc` - the `Arc` identity is the type identity everywhere else in the
//! engine.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::error::DefinitionError;
use crate::schema::FieldDef;
use crate::schema::FieldType;

/// Cached field classification, computed once per schema.
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    required: BTreeSet<String>,
    optional: BTreeSet<String>,
    auto: BTreeSet<String>,
    private: BTreeSet<String>,
}

impl FieldIndex {
    fn classify(fields: &[FieldDef]) -> Self {
        let mut index = FieldIndex::default();
        for field in fields {
            let name = field.name().to_string();
            if field.is_required() {
                index.required.insert(name.clone());
            } else {
                // auto fields carry the unassigned sentinel as a default
                index.optional.insert(name.clone());
            }
            if field.is_auto() {
                index.auto.insert(name.clone());
            }
            if field.is_private() {
                index.private.insert(name);
            }
        }
        index
    }

    /// Fields that must be supplied at construction.
    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// Fields with a default (auto fields included).
    pub fn optional(&self) -> &BTreeSet<String> {
        &self.optional
    }

    /// Infrastructure-managed fields.
    pub fn auto(&self) -> &BTreeSet<String> {
        &self.auto
    }

    /// Fields that never leave the process through an export.
    pub fn private(&self) -> &BTreeSet<String> {
        &self.private
    }
}

/// Immutable structural description of a domain type.
pub struct ModelSchema {
    name: String,
    fields: Vec<FieldDef>,
    index: FieldIndex,
    members: BTreeMap<String, Arc<ModelSchema>>,
}

impl ModelSchema {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            fields: Vec::new(),
            members: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Sorted field names, for error hints.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.iter().map(|f| f.name().to_string()).collect();
        names.sort();
        names
    }

    pub fn index(&self) -> &FieldIndex {
        &self.index
    }

    pub fn is_auto(&self, name: &str) -> bool {
        self.index.auto.contains(name)
    }

    pub fn is_private(&self, name: &str) -> bool {
        self.index.private.contains(name)
    }

    /// Member table; non-empty only for composed models.
    pub fn members(&self) -> &BTreeMap<String, Arc<ModelSchema>> {
        &self.members
    }

    pub fn is_composed(&self) -> bool {
        !self.members.is_empty()
    }
}

impl fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchema")
            .field("name", &self.name)
            .field("fields", &self.field_names())
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for `ModelSchema`. `build()` is the definition-time gate:
/// duplicate names and ill-typed defaults are rejected here, and the
/// `FieldIndex` is computed exactly once.
pub struct ModelBuilder {
    name: String,
    fields: Vec<FieldDef>,
    members: BTreeMap<String, Arc<ModelSchema>>,
}

impl ModelBuilder {
    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.push(def);
        self
    }

    /// Declare a named member of a composed model. The member becomes a
    /// required model-typed field of the same name.
    pub fn member(mut self, name: impl Into<String>, schema: &Arc<ModelSchema>) -> Self {
        let name = name.into();
        self.fields
            .push(FieldDef::new(name.clone(), FieldType::Model(Arc::clone(schema))));
        self.members.insert(name, Arc::clone(schema));
        self
    }

    pub fn build(self) -> Result<Arc<ModelSchema>, DefinitionError> {
        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if !seen.insert(field.name().to_string()) {
                return Err(DefinitionError::DuplicateField {
                    owner: self.name,
                    field: field.name().to_string(),
                });
            }
            if let Some(default) = field.default() {
                if !field.ty().accepts(default) {
                    return Err(DefinitionError::FieldSpecConflict {
                        target: self.name,
                        field: field.name().to_string(),
                        detail: format!(
                            "default of kind {} does not match declared type {}",
                            default.kind(),
                            field.ty()
                        ),
                    });
                }
            }
        }
        let index = FieldIndex::classify(&self.fields);
        Ok(Arc::new(ModelSchema {
            name: self.name,
            fields: self.fields,
            index,
            members: self.members,
        }))
    }
}
