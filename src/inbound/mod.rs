//! Write-side reduction of external payloads into domain records.

mod instance;
mod spec;

pub use instance::InputInstance;
pub use spec::{InputBuilder, InputField, InputSchema};
