//! Runtime path resolution
//!
//! Walks a validated `FieldRef` against a live `Record`. Namespace-aware:
//! member references descend into the member record first. Definition-time
//! validation already proved the path against the schemas, so failures here
//! mean drift between a schema and a live value; they are fatal and carry
//! the reference, the failing segment and what it was sought on.

use crate::error::BuildError;
use crate::reference::FieldRef;
use crate::schema::Record;
use crate::value::Value;

fn record_label(record: &Record) -> String {
    format!("'{}' record", record.schema().name())
}

/// Resolve a reference against a record, returning the leaf value.
/// Side-effect-free; the record is never mutated.
pub fn resolve(record: &Record, reference: &FieldRef) -> Result<Value, BuildError> {
    let segments = reference.segments();

    let mut cursor: &Record = match reference.namespace() {
        Some(ns) => match record.get(ns) {
            Some(Value::Record(member)) => member,
            Some(Value::Null) => {
                return Err(BuildError::NullSegment {
                    reference: reference.to_string(),
                    segment: ns.to_string(),
                })
            }
            Some(other) => {
                return Err(BuildError::MissingSegment {
                    reference: reference.to_string(),
                    segment: segments.first().cloned().unwrap_or_default(),
                    on: other.kind(),
                })
            }
            None => {
                return Err(BuildError::MissingSegment {
                    reference: reference.to_string(),
                    segment: ns.to_string(),
                    on: record_label(record),
                })
            }
        },
        None => record,
    };

    for (i, segment) in segments.iter().enumerate() {
        let value = cursor
            .get(segment)
            .ok_or_else(|| BuildError::MissingSegment {
                reference: reference.to_string(),
                segment: segment.clone(),
                on: record_label(cursor),
            })?;
        if i + 1 == segments.len() {
            return Ok(value.clone());
        }
        cursor = match value {
            Value::Record(inner) => inner,
            Value::Null => {
                return Err(BuildError::NullSegment {
                    reference: reference.to_string(),
                    segment: segment.clone(),
                })
            }
            other => {
                return Err(BuildError::MissingSegment {
                    reference: reference.to_string(),
                    segment: segments[i + 1].clone(),
                    on: other.kind(),
                })
            }
        };
    }

    Err(BuildError::MissingSegment {
        reference: reference.to_string(),
        segment: String::new(),
        on: record_label(record),
    })
}
