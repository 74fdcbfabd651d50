//! schemaconv - schema-driven structural value conversion
//!
//! Given an input value (a mapping, an attribute-bearing object behind an
//! adapter, a sequence, or a scalar) and a declarative schema tree, produce
//! a normalized output value matching the schema's shape.
//!
//! - Explicit target types, runtime-type dispatch (`typeOf`), and
//!   name-pattern dispatch (`patternProperties`)
//! - Pre/post conversion hooks resolved from a registry at compile time
//! - A version gate run once per compiled schema, before any value moves
//!
//! ```
//! use schemaconv::{convert_by_schema, Value};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "dict",
//!     "properties": {"id": "integer", "name": "string"}
//! });
//! let input = Value::from(json!({"id": "7", "name": 42, "ignored": true}));
//! let out = convert_by_schema(&input, &schema).unwrap();
//! assert_eq!(out, Value::from(json!({"id": 7, "name": "42"})));
//! ```

pub mod convert;
pub mod errors;
pub mod hooks;
pub mod schema;
pub mod value;

pub use convert::{convert_by_schema, SchemaConverter};
pub use errors::{ConvertError, ConvertResult, SchemaError, SchemaResult};
pub use hooks::{HookFn, HookPhase, HookRegistry};
pub use schema::{DeclaredType, RawSchema, SchemaNode};
pub use value::{ObjectAccess, Value};
