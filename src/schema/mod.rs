//! Schema layer: field declarations, model schemas and live records
//!
//! `ModelSchema` carries the structural metadata the rest of the engine
//! validates against; `Record` is a constructed instance of one.

mod field;
mod model;
mod record;

pub use field::{FieldDef, FieldType};
pub use model::{FieldIndex, ModelBuilder, ModelSchema};
pub use record::Record;
