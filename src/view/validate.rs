//! Definition-time validation for view declarations.
//!
//! Every rule here fires at `build()`, never at projection. The errors
//! carry enough context to fix the declaration without reading source:
//! the available field list, the model a bad segment was looked up on,
//! and the traversed prefix of a reference path.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::DefinitionError;
use crate::reference::FieldRef;
use crate::schema::{FieldType, ModelSchema};
use crate::view::spec::{FieldOrigin, ViewField, ViewShape};

pub(crate) fn check_view(
    name: &str,
    source: &Arc<ModelSchema>,
    fields: &[ViewField],
) -> Result<(), DefinitionError> {
    check_duplicates(name, fields)?;
    for field in fields {
        check_field(name, source, field)?;
    }
    check_required_coverage(name, source, fields)?;
    Ok(())
}

fn check_duplicates(name: &str, fields: &[ViewField]) -> Result<(), DefinitionError> {
    let mut seen = BTreeSet::new();
    for field in fields {
        if !seen.insert(field.name()) {
            return Err(DefinitionError::DuplicateField {
                owner: name.to_string(),
                field: field.name().to_string(),
            });
        }
    }
    Ok(())
}

fn check_field(
    name: &str,
    source: &Arc<ModelSchema>,
    field: &ViewField,
) -> Result<(), DefinitionError> {
    match field.origin() {
        FieldOrigin::Computed(_) => check_computed(name, field)?,
        FieldOrigin::Source => check_source_field(name, source, field)?,
        FieldOrigin::Mapped(reference) => check_mapped(name, source, field, reference)?,
    }
    check_default(name, field)
}

/// Computed fields own their value outright, so the resolution-side
/// modifiers make no sense on them.
fn check_computed(name: &str, field: &ViewField) -> Result<(), DefinitionError> {
    let conflict = |detail: &str| DefinitionError::FieldSpecConflict {
        target: name.to_string(),
        field: field.name().to_string(),
        detail: detail.to_string(),
    };
    if field.transform().is_some() {
        return Err(conflict("a computed field cannot also declare a transform"));
    }
    if field.visibility().is_some() {
        return Err(conflict(
            "a computed field cannot carry a visibility predicate - compute the value conditionally instead",
        ));
    }
    if !matches!(field.shape(), ViewShape::Value(_)) {
        return Err(conflict("a computed field cannot project into a nested view"));
    }
    Ok(())
}

fn check_source_field(
    name: &str,
    source: &Arc<ModelSchema>,
    field: &ViewField,
) -> Result<(), DefinitionError> {
    let Some(def) = source.field(field.name()) else {
        // A default makes the field satisfiable without the source,
        // typically by a before-hook.
        if field.default().is_some() {
            return Ok(());
        }
        return Err(DefinitionError::UnknownField {
            target: name.to_string(),
            field: field.name().to_string(),
            source_model: source.name().to_string(),
            available: source.field_names(),
        });
    };
    if source.is_private(field.name()) {
        return Err(DefinitionError::PrivateField {
            target: name.to_string(),
            field: field.name().to_string(),
            source_field: field.name().to_string(),
            model: source.name().to_string(),
        });
    }
    check_nested_shape(name, field, Some(def.ty()))
}

fn check_mapped(
    name: &str,
    source: &Arc<ModelSchema>,
    field: &ViewField,
    reference: &FieldRef,
) -> Result<(), DefinitionError> {
    match reference.namespace() {
        // A member reference must name a member of this view's source.
        Some(ns) => {
            let bound = source.members().get(ns).is_some_and(|m| Arc::ptr_eq(m, reference.root()));
            if !bound {
                return Err(DefinitionError::WrongSource {
                    target: name.to_string(),
                    field: field.name().to_string(),
                    referenced: reference.root().name().to_string(),
                    bound: source.name().to_string(),
                });
            }
            if source.is_private(ns) {
                return Err(DefinitionError::PrivateField {
                    target: name.to_string(),
                    field: field.name().to_string(),
                    source_field: ns.to_string(),
                    model: source.name().to_string(),
                });
            }
        }
        None => {
            if !Arc::ptr_eq(reference.root(), source) {
                return Err(DefinitionError::WrongSource {
                    target: name.to_string(),
                    field: field.name().to_string(),
                    referenced: reference.root().name().to_string(),
                    bound: source.name().to_string(),
                });
            }
        }
    }
    let leaf = walk_reference(name, field, reference)?;
    check_nested_shape(name, field, Some(&leaf))
}

/// Re-walk the reference path against the type graph. `RefPath` already
/// checked each hop at declaration, but the schemas it was built against
/// may not be the ones this view is bound to.
fn walk_reference(
    name: &str,
    field: &ViewField,
    reference: &FieldRef,
) -> Result<FieldType, DefinitionError> {
    // A reference that names no field cannot resolve to anything.
    if reference.segments().is_empty() {
        return Err(DefinitionError::FieldSpecConflict {
            target: name.to_string(),
            field: field.name().to_string(),
            detail: "reference has no segments".to_string(),
        });
    }
    let mut model = Arc::clone(reference.root());
    let mut traversed = reference.root().name().to_string();
    let mut cursor: Option<FieldType> = None;
    for (i, segment) in reference.segments().iter().enumerate() {
        if i > 0 {
            let prev = cursor.take().unwrap_or(FieldType::Any);
            match prev.as_model() {
                Some(next) => model = Arc::clone(next),
                None => {
                    return Err(DefinitionError::PathIntoScalar {
                        path: traversed,
                        field: segment.clone(),
                        kind: prev.to_string(),
                    });
                }
            }
        }
        let Some(def) = model.field(segment) else {
            return Err(DefinitionError::InvalidSegment {
                target: name.to_string(),
                field: field.name().to_string(),
                segment: segment.clone(),
                on_type: model.name().to_string(),
                traversed: traversed.clone(),
                available: model.field_names(),
            });
        };
        if model.is_private(segment) {
            return Err(DefinitionError::PrivateField {
                target: name.to_string(),
                field: field.name().to_string(),
                source_field: segment.clone(),
                model: model.name().to_string(),
            });
        }
        traversed.push('.');
        traversed.push_str(segment);
        cursor = Some(def.ty().clone());
    }
    Ok(cursor.unwrap_or(FieldType::Any))
}

/// Nested-view shapes must line up with the type the field resolves to.
fn check_nested_shape(
    name: &str,
    field: &ViewField,
    resolved: Option<&FieldType>,
) -> Result<(), DefinitionError> {
    let expected = match field.shape() {
        ViewShape::Value(_) => return Ok(()),
        ViewShape::View(nested) => nested,
        ViewShape::ViewList(nested) => nested,
    };
    let Some(resolved) = resolved else {
        return Ok(());
    };
    let base = match field.shape() {
        ViewShape::ViewList(_) => match unwrap_nullable(resolved) {
            FieldType::List(inner) => inner.as_model(),
            _ => None,
        },
        _ => resolved.as_model(),
    };
    match base {
        Some(model) if Arc::ptr_eq(model, expected.source()) => Ok(()),
        _ => Err(DefinitionError::NestedSourceMismatch {
            target: name.to_string(),
            field: field.name().to_string(),
            expected: expected.source().name().to_string(),
            found: resolved.to_string(),
        }),
    }
}

fn unwrap_nullable(ty: &FieldType) -> &FieldType {
    match ty {
        FieldType::Nullable(inner) => inner,
        other => other,
    }
}

fn check_default(name: &str, field: &ViewField) -> Result<(), DefinitionError> {
    let Some(default) = field.default() else {
        return Ok(());
    };
    match field.shape() {
        ViewShape::Value(ty) => {
            if ty.accepts(default) {
                Ok(())
            } else {
                Err(DefinitionError::FieldSpecConflict {
                    target: name.to_string(),
                    field: field.name().to_string(),
                    detail: format!(
                        "default of kind {} does not match declared type {ty}",
                        default.kind()
                    ),
                })
            }
        }
        _ => Err(DefinitionError::FieldSpecConflict {
            target: name.to_string(),
            field: field.name().to_string(),
            detail: "a default cannot stand in for a nested view".to_string(),
        }),
    }
}

/// Every required source field must be reachable from some declared
/// field. All gaps are reported in one error.
fn check_required_coverage(
    name: &str,
    source: &Arc<ModelSchema>,
    fields: &[ViewField],
) -> Result<(), DefinitionError> {
    let mut covered = BTreeSet::new();
    for field in fields {
        match field.origin() {
            FieldOrigin::Source | FieldOrigin::Computed(_) => {
                covered.insert(field.name().to_string());
            }
            FieldOrigin::Mapped(reference) => {
                let head = match reference.namespace() {
                    Some(ns) => ns.to_string(),
                    None => reference.head().to_string(),
                };
                covered.insert(head);
            }
        }
    }
    let missing: Vec<String> = source
        .index()
        .required()
        .iter()
        .filter(|f| !source.is_private(f.as_str()) && !covered.contains(f.as_str()))
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DefinitionError::MissingRequired {
            target: name.to_string(),
            source_model: source.name().to_string(),
            missing,
        })
    }
}
