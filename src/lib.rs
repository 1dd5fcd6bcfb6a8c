//! Vantage - declarative views and inputs over domain models
//!
//! Vantage maps one set of domain records onto the representations the
//! outside world sees and sends. A `ModelSchema` describes the domain
//! side; a `ViewSchema` projects records outward through named, typed,
//! possibly computed fields; an `InputSchema` narrows inbound payloads
//! to the fields callers may actually write. Every mapping rule is
//! checked when the schema is built, so a projection that starts can
//! only fail on the values it meets, never on its own wiring.

pub mod error;
pub mod inbound;
pub mod reference;
pub mod resolve;
pub mod schema;
pub mod value;
pub mod view;

// Re-exports for convenience
pub use error::{BuildError, DefinitionError, HookError, InstanceError};
pub use inbound::{InputField, InputInstance, InputSchema};
pub use reference::{FieldRef, RefPath};
pub use resolve::resolve;
pub use schema::{FieldDef, FieldType, ModelSchema, Record};
pub use value::{Value, ValueMap};
pub use view::{ViewField, ViewInstance, ViewSchema, ViewValue};
