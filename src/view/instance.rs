//! Projected view instances
//!
//! A `ViewInstance` is the finished product of a projection: an immutable
//! bag of named values plus the set of fields hidden by visibility
//! predicates. Hidden fields stay readable through the accessors - they
//! only disappear from the serialized representation.

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::Value;

/// One field slot on a projected instance.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewValue {
    Plain(Value),
    Nested(ViewInstance),
    NestedList(Vec<ViewInstance>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewInstance {
    view: String,
    values: BTreeMap<String, ViewValue>,
    hidden: BTreeSet<String>,
}

impl ViewInstance {
    pub(crate) fn new(
        view: String,
        values: BTreeMap<String, ViewValue>,
        hidden: BTreeSet<String>,
    ) -> ViewInstance {
        ViewInstance { view, values, hidden }
    }

    /// Name of the view this instance was projected through.
    pub fn view(&self) -> &str {
        &self.view
    }

    pub fn get(&self, field: &str) -> Option<&ViewValue> {
        self.values.get(field)
    }

    /// Plain value of a field, when it holds one.
    pub fn value(&self, field: &str) -> Option<&Value> {
        match self.values.get(field) {
            Some(ViewValue::Plain(value)) => Some(value),
            _ => None,
        }
    }

    /// Nested instance of a field, when it holds one.
    pub fn nested(&self, field: &str) -> Option<&ViewInstance> {
        match self.values.get(field) {
            Some(ViewValue::Nested(instance)) => Some(instance),
            _ => None,
        }
    }

    pub fn is_hidden(&self, field: &str) -> bool {
        self.hidden.contains(field)
    }

    /// Visible fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &ViewValue)> {
        self.values
            .iter()
            .filter(|(name, _)| !self.hidden.contains(*name))
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Serialized representation with hidden fields stripped, nested
    /// instances rendered recursively.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for ViewInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let visible: Vec<_> = self.fields().collect();
        let mut map = serializer.serialize_map(Some(visible.len()))?;
        for (name, value) in visible {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for ViewValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ViewValue::Plain(value) => value.serialize(serializer),
            ViewValue::Nested(instance) => instance.serialize(serializer),
            ViewValue::NestedList(instances) => serializer.collect_seq(instances),
        }
    }
}
