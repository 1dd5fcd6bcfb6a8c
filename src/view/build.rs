//! Projection pipeline
//!
//! `project` walks a fixed sequence: source check, context check,
//! before-hooks, reference resolution, computed fields, construction
//! against the declared shapes, visibility, then after-hooks. Values
//! settle in a fixed precedence: hook output wins over resolution and
//! arrives past the field's transform, and a declared default fills
//! anything still empty. An error at any stage
//! aborts the projection; an after-hook error discards the instance it
//! was handed.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::BuildError;
use crate::resolve::resolve;
use crate::schema::Record;
use crate::value::{Value, ValueMap};
use crate::view::instance::{ViewInstance, ViewValue};
use crate::view::spec::{
    AfterHook, BeforeHook, Compute, FieldOrigin, Transform, ViewField, ViewSchema, ViewShape,
};

impl ViewSchema {
    /// Project one record into an instance of this view.
    pub fn project(
        &self,
        source: &Record,
        ctx: Option<&dyn Any>,
    ) -> Result<ViewInstance, BuildError> {
        if !Arc::ptr_eq(source.schema(), self.source()) {
            return Err(BuildError::SourceMismatch {
                view: self.name().to_string(),
                expected: self.source().name().to_string(),
                got: source.schema().name().to_string(),
            });
        }
        if self.requires_context() && ctx.is_none() {
            return Err(BuildError::ContextRequired {
                view: self.name().to_string(),
            });
        }
        let pre = self.run_before(source, ctx)?;
        let mut values = BTreeMap::new();
        self.resolve_fields(source, &pre, ctx, &mut values)?;
        self.compute_fields(source, ctx, &mut values)?;
        self.construct(&mut values)?;
        let instance = ViewInstance::new(
            self.name().to_string(),
            values,
            self.hidden_fields(ctx),
        );
        self.run_after(&instance, ctx)?;
        Ok(instance)
    }

    /// Project a batch in input order, stopping at the first failure.
    pub fn project_all(
        &self,
        sources: &[Record],
        ctx: Option<&dyn Any>,
    ) -> Result<Vec<ViewInstance>, BuildError> {
        sources.iter().map(|record| self.project(record, ctx)).collect()
    }

    fn run_before(&self, source: &Record, ctx: Option<&dyn Any>) -> Result<ValueMap, BuildError> {
        let mut merged = ValueMap::new();
        for hook in self.before_hooks() {
            let supplied = match hook {
                BeforeHook::Plain(f) => f(source),
                BeforeHook::WithContext(f) => f(source, ctx),
            }
            .map_err(|e| BuildError::BeforeHook {
                view: self.name().to_string(),
                source: e,
            })?;
            // Keys without a declared field are dropped. Later hooks
            // overwrite earlier ones.
            for (key, value) in supplied {
                if self.field(&key).is_some() {
                    merged.insert(key, value);
                }
            }
        }
        Ok(merged)
    }

    fn resolve_fields(
        &self,
        source: &Record,
        pre: &ValueMap,
        ctx: Option<&dyn Any>,
        values: &mut BTreeMap<String, ViewValue>,
    ) -> Result<(), BuildError> {
        for field in self.fields() {
            let from_hook = pre.get(field.name());
            let resolved = match field.origin() {
                FieldOrigin::Computed(_) => continue,
                FieldOrigin::Source => from_hook.or_else(|| source.get(field.name())).cloned(),
                FieldOrigin::Mapped(reference) => match from_hook {
                    Some(supplied) => Some(supplied.clone()),
                    None => Some(resolve(source, reference)?),
                },
            };
            // A by-name field absent from the source is left for its
            // default at construction.
            let Some(raw) = resolved else { continue };
            // Transforms cover resolution; a hook's value is already
            // final and is only fitted to the declared shape.
            let transformed = if from_hook.is_some() {
                raw
            } else {
                match field.transform() {
                    Some(Transform::Plain(f)) => f(raw),
                    Some(Transform::WithContext(f)) => f(raw, ctx),
                    None => raw,
                }
            };
            let shaped = self.shape_value(field, transformed, ctx)?;
            values.insert(field.name().to_string(), shaped);
        }
        Ok(())
    }

    /// Fit a resolved value to the field's declared shape, projecting
    /// nested views recursively. Runs after any transform, so a
    /// transform can massage a record before its nested view sees it.
    fn shape_value(
        &self,
        field: &ViewField,
        value: Value,
        ctx: Option<&dyn Any>,
    ) -> Result<ViewValue, BuildError> {
        let mismatch = |expected: String, got: String| BuildError::ShapeMismatch {
            view: self.name().to_string(),
            field: field.name().to_string(),
            expected,
            got,
        };
        match field.shape() {
            ViewShape::Value(_) => Ok(ViewValue::Plain(value)),
            ViewShape::View(nested) => match value {
                Value::Record(record) => Ok(ViewValue::Nested(nested.project(&record, ctx)?)),
                Value::Null => Ok(ViewValue::Plain(Value::Null)),
                other => Err(mismatch(
                    format!("a '{}' record", nested.source().name()),
                    other.kind(),
                )),
            },
            ViewShape::ViewList(nested) => match value {
                Value::List(items) => {
                    let mut projected = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Value::Record(record) => projected.push(nested.project(&record, ctx)?),
                            other => {
                                return Err(mismatch(
                                    format!("a list of '{}' records", nested.source().name()),
                                    other.kind(),
                                ))
                            }
                        }
                    }
                    Ok(ViewValue::NestedList(projected))
                }
                Value::Null => Ok(ViewValue::Plain(Value::Null)),
                other => Err(mismatch(
                    format!("a list of '{}' records", nested.source().name()),
                    other.kind(),
                )),
            },
        }
    }

    fn compute_fields(
        &self,
        source: &Record,
        ctx: Option<&dyn Any>,
        values: &mut BTreeMap<String, ViewValue>,
    ) -> Result<(), BuildError> {
        for field in self.fields() {
            let FieldOrigin::Computed(compute) = field.origin() else {
                continue;
            };
            let value = match compute {
                Compute::Plain(f) => f(source),
                Compute::WithContext(f) => f(source, ctx),
            }
            .map_err(|e| BuildError::Computed {
                view: self.name().to_string(),
                field: field.name().to_string(),
                source: e,
            })?;
            values.insert(field.name().to_string(), ViewValue::Plain(value));
        }
        Ok(())
    }

    /// Fill defaults, then hold every slot against its declared shape.
    fn construct(&self, values: &mut BTreeMap<String, ViewValue>) -> Result<(), BuildError> {
        for field in self.fields() {
            match values.get(field.name()) {
                None => {
                    let Some(default) = field.default() else {
                        return Err(BuildError::MissingValue {
                            view: self.name().to_string(),
                            field: field.name().to_string(),
                        });
                    };
                    values.insert(field.name().to_string(), ViewValue::Plain(default.clone()));
                }
                Some(value) => self.check_shape(field, value)?,
            }
        }
        Ok(())
    }

    fn check_shape(&self, field: &ViewField, value: &ViewValue) -> Result<(), BuildError> {
        let mismatch = |expected: String, got: String| BuildError::ShapeMismatch {
            view: self.name().to_string(),
            field: field.name().to_string(),
            expected,
            got,
        };
        match (field.shape(), value) {
            (ViewShape::Value(ty), ViewValue::Plain(v)) => {
                if ty.accepts(v) {
                    Ok(())
                } else {
                    Err(mismatch(ty.to_string(), v.kind()))
                }
            }
            (ViewShape::View(_), ViewValue::Nested(_))
            | (ViewShape::View(_), ViewValue::Plain(Value::Null))
            | (ViewShape::ViewList(_), ViewValue::NestedList(_))
            | (ViewShape::ViewList(_), ViewValue::Plain(Value::Null)) => Ok(()),
            (ViewShape::View(nested), other) | (ViewShape::ViewList(nested), other) => Err(
                mismatch(format!("a projected '{}' view", nested.name()), describe(other)),
            ),
            (ViewShape::Value(ty), other) => Err(mismatch(ty.to_string(), describe(other))),
        }
    }

    fn hidden_fields(&self, ctx: Option<&dyn Any>) -> BTreeSet<String> {
        let mut hidden = BTreeSet::new();
        for field in self.fields() {
            let Some(predicate) = field.visibility() else {
                continue;
            };
            // No context at all means every guarded field is hidden.
            let visible = match ctx {
                Some(c) => predicate(c),
                None => false,
            };
            if !visible {
                hidden.insert(field.name().to_string());
            }
        }
        hidden
    }

    fn run_after(&self, instance: &ViewInstance, ctx: Option<&dyn Any>) -> Result<(), BuildError> {
        for hook in self.after_hooks() {
            match hook {
                AfterHook::Plain(f) => f(instance),
                AfterHook::WithContext(f) => f(instance, ctx),
            }
            .map_err(|e| BuildError::AfterHook {
                view: self.name().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }
}

fn describe(value: &ViewValue) -> String {
    match value {
        ViewValue::Plain(v) => v.kind(),
        ViewValue::Nested(instance) => format!("a projected '{}' view", instance.view()),
        ViewValue::NestedList(_) => "a list of projected views".to_string(),
    }
}
