//! Conversion engine.

mod engine;

pub use engine::{convert_by_schema, SchemaConverter};
