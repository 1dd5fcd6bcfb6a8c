//! Live domain records
//!
//! A `Record` is a fully-populated instance of a `ModelSchema`. It is
//! constructed through `Record::new`, which enforces the schema: unknown
//! keys are rejected, required fields must be present (every missing name
//! reported in one error), values are type-checked, optional fields fall
//! back to their defaults and auto fields to the unassigned sentinel.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::InstanceError;
use crate::schema::ModelSchema;
use crate::value::{Value, ValueMap};

/// An immutable instance of a model schema.
#[derive(Clone)]
pub struct Record {
    schema: Arc<ModelSchema>,
    values: ValueMap,
}

impl Record {
    /// Construct a record, enforcing the schema.
    pub fn new(schema: &Arc<ModelSchema>, mut values: ValueMap) -> Result<Record, InstanceError> {
        if let Some(unknown) = values.keys().find(|key| !schema.has_field(key)) {
            return Err(InstanceError::UnknownField {
                model: schema.name().to_string(),
                field: unknown.clone(),
                available: schema.field_names(),
            });
        }

        let mut out = ValueMap::new();
        let mut missing = Vec::new();
        for field in schema.fields() {
            match values.remove(field.name()) {
                Some(value) => {
                    if field.is_auto() && value.is_unassigned() {
                        out.insert(field.name().to_string(), value);
                        continue;
                    }
                    if !field.ty().accepts(&value) {
                        return Err(InstanceError::TypeMismatch {
                            model: schema.name().to_string(),
                            field: field.name().to_string(),
                            expected: field.ty().to_string(),
                            got: value.kind(),
                        });
                    }
                    out.insert(field.name().to_string(), value);
                }
                None if field.is_auto() => {
                    out.insert(field.name().to_string(), Value::Unassigned);
                }
                None => match field.default() {
                    Some(default) => {
                        out.insert(field.name().to_string(), default.clone());
                    }
                    None => missing.push(field.name().to_string()),
                },
            }
        }
        if !missing.is_empty() {
            return Err(InstanceError::MissingFields {
                model: schema.name().to_string(),
                missing,
            });
        }

        Ok(Record {
            schema: Arc::clone(schema),
            values: out,
        })
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// Read one field. Every declared field is present after construction,
    /// so `None` means the name is not declared at all.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    /// Full value set, private and auto fields included.
    pub fn to_values(&self) -> ValueMap {
        self.values.clone()
    }

    /// External representation: every non-private field, in declaration
    /// order, unassigned rendered as null.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("schema", &self.schema.name())
            .field("values", &self.values)
            .finish()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields: Vec<_> = self
            .schema
            .fields()
            .iter()
            .filter(|f| !f.is_private())
            .collect();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for field in fields {
            let value = self.values.get(field.name()).unwrap_or(&Value::Null);
            map.serialize_entry(field.name(), value)?;
        }
        map.end()
    }
}
