//! Accepted input instances
//!
//! `accept` narrows a raw payload down to the declared fields; the
//! result remembers exactly which fields were set. `to_record` builds a
//! fresh record from that (overrides win and are checked strictly),
//! `apply_to` rewrites an existing record, touching only the fields the
//! payload actually carried.

use std::sync::Arc;

use crate::error::InstanceError;
use crate::inbound::spec::InputSchema;
use crate::schema::{ModelSchema, Record};
use crate::value::ValueMap;

impl InputSchema {
    /// Narrow a payload to this input's declared fields.
    ///
    /// Undeclared keys are dropped without comment - an input reduces,
    /// it does not police. Declared values type-check against the model
    /// field they write; fields with no model counterpart are kept
    /// as-is. An explicitly unassigned value counts as absent, so
    /// callers can forward sentinel-bearing maps as-is.
    pub fn accept(&self, mut payload: ValueMap) -> Result<InputInstance, InstanceError> {
        let mut values = ValueMap::new();
        let mut missing = Vec::new();
        for slot in self.slots() {
            let supplied = payload
                .remove(&slot.name)
                .filter(|value| !value.is_unassigned());
            let value = match supplied {
                Some(value) => value,
                // Absence stays observable on partial inputs; defaults
                // only take part in full construction.
                None if self.is_partial() => continue,
                None => match &slot.default {
                    Some(default) => default.clone(),
                    None => {
                        missing.push(slot.name.clone());
                        continue;
                    }
                },
            };
            if let Some(def) = self.model().field(&slot.target) {
                if !def.ty().accepts(&value) {
                    return Err(InstanceError::TypeMismatch {
                        model: self.name().to_string(),
                        field: slot.name.clone(),
                        expected: def.ty().to_string(),
                        got: value.kind(),
                    });
                }
            }
            values.insert(slot.target.clone(), value);
        }
        if !missing.is_empty() {
            return Err(InstanceError::MissingFields {
                model: self.name().to_string(),
                missing,
            });
        }
        Ok(InputInstance {
            input: self.name().to_string(),
            model: Arc::clone(self.model()),
            values,
        })
    }
}

/// The explicitly-set slice of one accepted payload, keyed by the model
/// fields it writes (or the declared name, for fields the model lacks).
#[derive(Clone, Debug)]
pub struct InputInstance {
    input: String,
    model: Arc<ModelSchema>,
    values: ValueMap,
}

impl InputInstance {
    /// Name of the input this payload came through.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn model(&self) -> &Arc<ModelSchema> {
        &self.model
    }

    /// Accepted values, keyed by the model field they write - or by the
    /// declared name itself for fields the model lacks.
    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    pub fn is_set(&self, target: &str) -> bool {
        self.values.contains_key(target)
    }

    /// Build a fresh record from the accepted values.
    ///
    /// Overrides win over payload values and may set any model field,
    /// excluded and private ones included - that is the service-side
    /// door. An override naming an unknown field is an error, unlike
    /// payload keys.
    pub fn to_record(&self, overrides: ValueMap) -> Result<Record, InstanceError> {
        // Instance-only extras stop here; records hold model fields.
        let mut merged: ValueMap = self
            .values
            .iter()
            .filter(|(target, _)| self.model.field(target).is_some())
            .map(|(target, value)| (target.clone(), value.clone()))
            .collect();
        for (key, value) in overrides {
            if self.model.field(&key).is_none() {
                return Err(InstanceError::UnknownField {
                    model: self.model.name().to_string(),
                    field: key,
                    available: self.model.field_names(),
                });
            }
            merged.insert(key, value);
        }
        Record::new(&self.model, merged)
    }

    /// Rewrite `record` with the explicitly-set values, leaving every
    /// other field as it was. Returns a new record.
    pub fn apply_to(&self, record: &Record) -> Result<Record, InstanceError> {
        if !Arc::ptr_eq(record.schema(), &self.model) {
            return Err(InstanceError::ModelMismatch {
                input: self.input.clone(),
                expected: self.model.name().to_string(),
                got: record.schema().name().to_string(),
            });
        }
        let mut merged = record.to_values();
        for (key, value) in &self.values {
            if self.model.field(key).is_some() {
                merged.insert(key.clone(), value.clone());
            }
        }
        Record::new(&self.model, merged)
    }
}
