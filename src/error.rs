//! Error types for Vantage
//!
//! Three `thiserror` enums, scoped by the phase that can fail:
//! - `DefinitionError`: raised while declaring schemas, views and inputs.
//!   A mapping that fails here never becomes a usable schema value.
//! - `BuildError`: raised while projecting a record through a view.
//! - `InstanceError`: raised while constructing a record or accepting
//!   input values. The inbound path surfaces these as-is.

use thiserror::Error;

/// Error type returned by user-supplied hooks and computed fields.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Definition-time mapping errors. Always fatal, always raised before any
/// instance of the broken mapping can exist.
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// Same field name declared twice on one schema
    #[error("duplicate field '{field}' on '{owner}'")]
    DuplicateField { owner: String, field: String },

    /// Member lookup on a model that does not declare it
    #[error("no member '{member}' declared on '{aggregate}' - declared members: {available:?}")]
    UnknownMember {
        aggregate: String,
        member: String,
        available: Vec<String>,
    },

    /// Reference path names a field its current model does not have
    #[error("'{field}' does not exist on '{owner}' - available fields: {available:?}")]
    UnknownPathField {
        owner: String,
        field: String,
        available: Vec<String>,
    },

    /// Reference path tries to chain past a field with no fields of its own
    #[error("cannot chain '{field}' after '{path}': {kind} values have no fields")]
    PathIntoScalar {
        path: String,
        field: String,
        kind: String,
    },

    /// Reference roots at a model the target is not bound to
    #[error("field '{field}' on '{target}' references '{referenced}' but the bound source is '{bound}' - declare a member of type '{referenced}' on a composed source to map across models")]
    WrongSource {
        target: String,
        field: String,
        referenced: String,
        bound: String,
    },

    /// Reference path re-walk failed on a segment
    #[error("field '{field}' on '{target}': '{segment}' does not exist on '{on_type}' (at '{traversed}.{segment}') - available fields: {available:?}")]
    InvalidSegment {
        target: String,
        field: String,
        segment: String,
        on_type: String,
        traversed: String,
        available: Vec<String>,
    },

    /// By-name field (or rename/exclusion target) missing on the source
    #[error("field '{field}' on '{target}' does not exist on source '{source_model}' - available fields: {available:?}")]
    UnknownField {
        target: String,
        field: String,
        source_model: String,
        available: Vec<String>,
    },

    /// A view field resolves to a private source field
    #[error("field '{field}' on '{target}' exposes private field '{source_field}' of '{model}' - private fields cannot appear in views")]
    PrivateField {
        target: String,
        field: String,
        source_field: String,
        model: String,
    },

    /// Required source fields with no representation on the view
    #[error("view '{target}' does not cover required fields of '{source_model}': {missing:?} - map them by name or reference, or give them defaults on the source")]
    MissingRequired {
        target: String,
        source_model: String,
        missing: Vec<String>,
    },

    /// Incompatible markers on one field spec
    #[error("field '{field}' on '{target}': {detail}")]
    FieldSpecConflict {
        target: String,
        field: String,
        detail: String,
    },

    /// Nested view bound to a different model than the source field holds
    #[error("field '{field}' on '{target}' builds a view of '{expected}' but the source field holds {found}")]
    NestedSourceMismatch {
        target: String,
        field: String,
        expected: String,
        found: String,
    },

    /// Input schemas only remap direct fields
    #[error("field '{field}' on input '{target}' maps through '{path}' - input mappings must reference direct source fields")]
    DeepInputPath {
        target: String,
        field: String,
        path: String,
    },

    /// Required model fields an input neither declares nor leaves to overrides
    #[error("input '{target}' does not cover required fields of '{source_model}': {missing:?} - declare them, exclude them for overrides, or default them on the model")]
    InputUncovered {
        target: String,
        source_model: String,
        missing: Vec<String>,
    },
}

/// Call-time projection failures.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Record handed to a view bound to a different source
    #[error("cannot project a '{got}' record through view '{view}' - bound source is '{expected}'")]
    SourceMismatch {
        view: String,
        expected: String,
        got: String,
    },

    /// View declared `require_context` and none was supplied
    #[error("view '{view}' requires a context - none was supplied")]
    ContextRequired { view: String },

    /// A validated path no longer resolves against the live value
    #[error("cannot resolve '{reference}': '{segment}' does not exist on {on}")]
    MissingSegment {
        reference: String,
        segment: String,
        on: String,
    },

    /// Null encountered before the final path segment
    #[error("cannot resolve '{reference}': '{segment}' is null mid-path")]
    NullSegment { reference: String, segment: String },

    /// No hook, resolution, computation or default produced a value
    #[error("no value produced for field '{field}' on view '{view}'")]
    MissingValue { view: String, field: String },

    /// Value does not fit the declared shape of the view field
    #[error("field '{field}' on view '{view}' expected {expected}, got {got}")]
    ShapeMismatch {
        view: String,
        field: String,
        expected: String,
        got: String,
    },

    /// A before-hook returned an error
    #[error("before-hook failed for view '{view}': {source}")]
    BeforeHook {
        view: String,
        #[source]
        source: HookError,
    },

    /// A computed field returned an error
    #[error("computed field '{field}' on view '{view}' failed: {source}")]
    Computed {
        view: String,
        field: String,
        #[source]
        source: HookError,
    },

    /// An after-hook returned an error; the built instance is discarded
    #[error("after-hook failed for view '{view}': {source}")]
    AfterHook {
        view: String,
        #[source]
        source: HookError,
    },
}

/// Record and input construction failures.
#[derive(Error, Debug)]
pub enum InstanceError {
    /// Value supplied for a field the schema does not declare
    #[error("no field '{field}' on '{model}' - available fields: {available:?}")]
    UnknownField {
        model: String,
        field: String,
        available: Vec<String>,
    },

    /// Required fields left without a value, all listed at once
    #[error("missing required fields for '{model}': {missing:?}")]
    MissingFields { model: String, missing: Vec<String> },

    /// Value does not match the declared field type
    #[error("field '{field}' on '{model}' expected {expected}, got {got}")]
    TypeMismatch {
        model: String,
        field: String,
        expected: String,
        got: String,
    },

    /// Input applied to a record of a different model
    #[error("cannot apply input '{input}' to a '{got}' record - bound model is '{expected}'")]
    ModelMismatch {
        input: String,
        expected: String,
        got: String,
    },
}
