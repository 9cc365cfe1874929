// Structured generation: schema descriptors, prompt rendering, and the
// parse/repair resolver that turns model text into schema-conforming values.

pub mod resolver;
pub mod schema;
pub mod template;

pub use resolver::{resolve_as, ResolutionFailure};
pub use schema::SchemaSpec;
pub use template::{render, TemplateError};
