//! Object adapter interface.
//!
//! Attribute-bearing values enter the converter behind this trait: the
//! engine depends only on get-by-name, set-by-name, and name enumeration,
//! never on a concrete object representation.

use std::fmt;

use super::types::Value;

/// Key-style access over an attribute-bearing object.
///
/// `object` conversion reads fields through this trait, and `typeOf`
/// dispatch consults [`ObjectAccess::type_names`] to resolve a child schema
/// by runtime type.
pub trait ObjectAccess: fmt::Debug {
    /// Type names for this object, most specific first (for example
    /// `["admin", "user"]`). The first name is the object's exact type;
    /// the rest act as supertypes during `typeOf` dispatch.
    fn type_names(&self) -> Vec<&'static str>;

    /// Field value by name, `None` when the field cannot be resolved.
    fn get(&self, name: &str) -> Option<Value>;

    /// All resolvable field names, declared and dynamic.
    fn names(&self) -> Vec<String>;

    /// Assign a field by name, returning whether the assignment was
    /// accepted. The converter itself never writes through the adapter;
    /// this exists for callers that reuse the adapter as a mutable view.
    fn set(&self, _name: &str, _value: Value) -> bool {
        false
    }
}
