//! Schema subsystem: raw trees, compiled nodes, encodings, version gate.
//!
//! - Decoding a raw tree never validates; all checks happen at compile
//! - Compiled nodes are immutable and shareable across conversions
//! - Only the root version is gated; children inherit it

mod encoding;
mod node;
mod raw;
mod version;

pub use encoding::{DecodePolicy, Encoding};
pub use node::{DeclaredType, NamedHook, Property, Resolved, SchemaNode, TypeArm, TypeDispatch};
pub use raw::{RawHooks, RawSchema, RawTable};
pub use version::{is_supported, ENGINE_VERSION};
