//! Outward-facing projections of domain records.

mod build;
mod instance;
mod spec;
mod validate;

pub use instance::{ViewInstance, ViewValue};
pub use spec::{
    AfterHook, BeforeHook, Compute, FieldOrigin, Transform, ViewBuilder, ViewField, ViewSchema,
    ViewShape,
};
