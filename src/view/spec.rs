//! View schemas
//!
//! A `ViewSchema` declares an outward-facing representation of one source
//! model: an ordered set of `ViewField`s plus before/after hooks. The
//! builder's `build()` call is the definition-time gate - every mapping
//! rule is checked there, so a `ViewSchema` value is always valid.
//!
//! Callables declare what they receive through their variant: the `…_with`
//! constructors opt a computed field, transform or hook into the optional
//! context argument. There is no signature sniffing at call time.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{DefinitionError, HookError};
use crate::reference::FieldRef;
use crate::schema::{FieldType, ModelSchema, Record};
use crate::value::{Value, ValueMap};
use crate::view::instance::ViewInstance;
use crate::view::validate;

/// Computed-field callable, by declared capability.
pub enum Compute {
    Plain(Box<dyn Fn(&Record) -> Result<Value, HookError> + Send + Sync>),
    WithContext(Box<dyn Fn(&Record, Option<&dyn Any>) -> Result<Value, HookError> + Send + Sync>),
}

/// Value transform, by declared capability.
pub enum Transform {
    Plain(Box<dyn Fn(Value) -> Value + Send + Sync>),
    WithContext(Box<dyn Fn(Value, Option<&dyn Any>) -> Value + Send + Sync>),
}

/// Pre-construction hook returning extra field values.
pub enum BeforeHook {
    Plain(Box<dyn Fn(&Record) -> Result<ValueMap, HookError> + Send + Sync>),
    WithContext(Box<dyn Fn(&Record, Option<&dyn Any>) -> Result<ValueMap, HookError> + Send + Sync>),
}

/// Post-construction hook inspecting the finished instance.
pub enum AfterHook {
    Plain(Box<dyn Fn(&ViewInstance) -> Result<(), HookError> + Send + Sync>),
    WithContext(Box<dyn Fn(&ViewInstance, Option<&dyn Any>) -> Result<(), HookError> + Send + Sync>),
}

/// Where a view field's value comes from. Exactly one origin per field.
pub enum FieldOrigin {
    /// Same-name read off the source record
    Source,
    /// Resolved through a symbolic reference
    Mapped(FieldRef),
    /// Produced by a callable
    Computed(Compute),
}

/// Declared shape of the finished field.
pub enum ViewShape {
    Value(FieldType),
    /// Recursively projected nested view
    View(Arc<ViewSchema>),
    /// Element-wise projection over a list
    ViewList(Arc<ViewSchema>),
}

/// One declared field on a view.
pub struct ViewField {
    name: String,
    origin: FieldOrigin,
    shape: ViewShape,
    default: Option<Value>,
    transform: Option<Transform>,
    visible: Option<Box<dyn Fn(&dyn Any) -> bool + Send + Sync>>,
}

impl ViewField {
    /// Pass-through field, read off the source by the same name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: FieldOrigin::Source,
            shape: ViewShape::Value(FieldType::Any),
            default: None,
            transform: None,
            visible: None,
        }
    }

    /// Field mapped through a reference.
    pub fn mapped(name: impl Into<String>, reference: impl Into<FieldRef>) -> Self {
        Self {
            origin: FieldOrigin::Mapped(reference.into()),
            ..Self::new(name)
        }
    }

    /// Field computed from the source record.
    pub fn computed(
        name: impl Into<String>,
        f: impl Fn(&Record) -> Result<Value, HookError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            origin: FieldOrigin::Computed(Compute::Plain(Box::new(f))),
            ..Self::new(name)
        }
    }

    /// Field computed from the source record and the optional context.
    pub fn computed_with(
        name: impl Into<String>,
        f: impl Fn(&Record, Option<&dyn Any>) -> Result<Value, HookError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            origin: FieldOrigin::Computed(Compute::WithContext(Box::new(f))),
            ..Self::new(name)
        }
    }

    /// Constrain the value shape. The default is `any`.
    pub fn typed(mut self, ty: FieldType) -> Self {
        self.shape = ViewShape::Value(ty);
        self
    }

    /// Project the resolved record through a nested view.
    pub fn as_view(mut self, view: &Arc<ViewSchema>) -> Self {
        self.shape = ViewShape::View(Arc::clone(view));
        self
    }

    /// Project every element of the resolved list through a nested view.
    pub fn as_view_list(mut self, view: &Arc<ViewSchema>) -> Self {
        self.shape = ViewShape::ViewList(Arc::clone(view));
        self
    }

    /// Fallback value when neither hooks nor resolution produce one. A
    /// field with a default is exempt from the same-name existence check,
    /// which lets before-hooks populate fields the source does not have.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Rewrites the resolved value. Hook-supplied values pass through
    /// untransformed.
    pub fn with_transform(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.transform = Some(Transform::Plain(Box::new(f)));
        self
    }

    pub fn with_context_transform(
        mut self,
        f: impl Fn(Value, Option<&dyn Any>) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Transform::WithContext(Box::new(f)));
        self
    }

    /// Hide the field from the exported representation unless the
    /// predicate passes. No context at projection time means hidden.
    pub fn visible_when(mut self, p: impl Fn(&dyn Any) -> bool + Send + Sync + 'static) -> Self {
        self.visible = Some(Box::new(p));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.origin, FieldOrigin::Computed(_))
    }

    pub(crate) fn origin(&self) -> &FieldOrigin {
        &self.origin
    }

    pub(crate) fn shape(&self) -> &ViewShape {
        &self.shape
    }

    pub(crate) fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub(crate) fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    pub(crate) fn visibility(&self) -> Option<&(dyn Fn(&dyn Any) -> bool + Send + Sync)> {
        self.visible.as_deref()
    }
}

impl fmt::Debug for ViewField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origin = match &self.origin {
            FieldOrigin::Source => "source".to_string(),
            FieldOrigin::Mapped(r) => format!("mapped({r})"),
            FieldOrigin::Computed(_) => "computed".to_string(),
        };
        f.debug_struct("ViewField")
            .field("name", &self.name)
            .field("origin", &origin)
            .finish()
    }
}

/// An immutable, validated view declaration.
pub struct ViewSchema {
    name: String,
    source: Arc<ModelSchema>,
    fields: Vec<ViewField>,
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
    require_context: bool,
}

impl ViewSchema {
    pub fn builder(name: impl Into<String>, source: &Arc<ModelSchema>) -> ViewBuilder {
        ViewBuilder {
            name: name.into(),
            source: Arc::clone(source),
            fields: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            require_context: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Arc<ModelSchema> {
        &self.source
    }

    pub fn fields(&self) -> &[ViewField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&ViewField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn requires_context(&self) -> bool {
        self.require_context
    }

    pub(crate) fn before_hooks(&self) -> &[BeforeHook] {
        &self.before
    }

    pub(crate) fn after_hooks(&self) -> &[AfterHook] {
        &self.after
    }
}

impl fmt::Debug for ViewSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSchema")
            .field("name", &self.name)
            .field("source", &self.source.name())
            .field("fields", &self.fields.iter().map(ViewField::name).collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for `ViewSchema`. `build()` runs the full definition-time
/// validation pass; a failed build leaves nothing behind.
pub struct ViewBuilder {
    pub(crate) name: String,
    pub(crate) source: Arc<ModelSchema>,
    pub(crate) fields: Vec<ViewField>,
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
    require_context: bool,
}

impl ViewBuilder {
    pub fn field(mut self, field: ViewField) -> Self {
        self.fields.push(field);
        self
    }

    /// Register a pre-construction hook. Hooks run in registration order
    /// and later hooks win on key collisions.
    pub fn before(
        mut self,
        f: impl Fn(&Record) -> Result<ValueMap, HookError> + Send + Sync + 'static,
    ) -> Self {
        self.before.push(BeforeHook::Plain(Box::new(f)));
        self
    }

    pub fn before_with(
        mut self,
        f: impl Fn(&Record, Option<&dyn Any>) -> Result<ValueMap, HookError> + Send + Sync + 'static,
    ) -> Self {
        self.before.push(BeforeHook::WithContext(Box::new(f)));
        self
    }

    /// Register a post-construction hook. An error from one discards the
    /// built instance.
    pub fn after(
        mut self,
        f: impl Fn(&ViewInstance) -> Result<(), HookError> + Send + Sync + 'static,
    ) -> Self {
        self.after.push(AfterHook::Plain(Box::new(f)));
        self
    }

    pub fn after_with(
        mut self,
        f: impl Fn(&ViewInstance, Option<&dyn Any>) -> Result<(), HookError> + Send + Sync + 'static,
    ) -> Self {
        self.after.push(AfterHook::WithContext(Box::new(f)));
        self
    }

    /// Fail projection when no context is supplied.
    pub fn require_context(mut self) -> Self {
        self.require_context = true;
        self
    }

    pub fn build(self) -> Result<Arc<ViewSchema>, DefinitionError> {
        validate::check_view(&self.name, &self.source, &self.fields)?;
        Ok(Arc::new(ViewSchema {
            name: self.name,
            source: self.source,
            fields: self.fields,
            before: self.before,
            after: self.after,
            require_context: self.require_context,
        }))
    }
}
