//! The value universe the converter reads and produces.
//!
//! Wider than JSON on purpose: inputs may carry raw bytes, date-times,
//! adapter-backed objects, and zero-argument producers, all of which the
//! original conversion semantics address.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;

use super::object::ObjectAccess;

/// A zero-argument value producer, resolvable by the `func_result` hook.
#[derive(Clone)]
pub struct Thunk(Arc<dyn Fn() -> Value>);

impl Thunk {
    pub fn new(f: impl Fn() -> Value + 'static) -> Self {
        Thunk(Arc::new(f))
    }

    /// Produce the wrapped value.
    pub fn call(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk(..)")
    }
}

/// An input or output value.
///
/// Conversion never mutates values in place; every converter produces a
/// fresh value. `Object` and `Func` compare by identity, everything else
/// structurally.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Dict(BTreeMap<String, Value>),
    DateTime(NaiveDateTime),
    Object(Arc<dyn ObjectAccess>),
    Func(Thunk),
}

impl Value {
    /// Wrap an attribute-bearing object behind its adapter.
    pub fn object(obj: impl ObjectAccess + 'static) -> Value {
        Value::Object(Arc::new(obj))
    }

    /// Wrap a zero-argument producer.
    pub fn func(f: impl Fn() -> Value + 'static) -> Value {
        Value::Func(Thunk::new(f))
    }

    /// Canonical runtime-type name, the exact-match key for `typeOf`
    /// dispatch. Objects report their own primary type name.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
            Value::DateTime(_) => "datetime",
            Value::Object(obj) => obj.type_names().first().copied().unwrap_or("object"),
            Value::Func(_) => "function",
        }
    }

    /// Whether this value's type matches `name` exactly or as a supertype:
    /// `number` covers integers and floats, `object` covers any
    /// adapter-backed value, and an object matches each name in its type
    /// chain. Booleans additionally count as integers.
    pub fn is_a(&self, name: &str) -> bool {
        if name == self.kind() {
            return true;
        }
        match self {
            Value::Int(_) | Value::Float(_) => name == "number",
            Value::Bool(_) => name == "integer" || name == "number",
            Value::Object(obj) => {
                name == "object" || obj.type_names().iter().any(|n| *n == name)
            }
            _ => false,
        }
    }

    /// Truthiness used by the `boolean` converter: null, zero, and empty
    /// containers are false, everything else true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Dict(map) => !map.is_empty(),
            _ => true,
        }
    }

    /// Text form used by the `string` converter for non-string values.
    pub fn render_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(Value::render_text).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Dict(map) => {
                let parts: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.render_text()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Value::Object(obj) => {
                format!("<{}>", obj.type_names().first().copied().unwrap_or("object"))
            }
            Value::Func(_) => "<function>".to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Func(a), Value::Func(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Dict(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Value {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Null.kind(), "null");
        assert_eq!(Value::Bool(true).kind(), "boolean");
        assert_eq!(Value::Int(1).kind(), "integer");
        assert_eq!(Value::Float(1.5).kind(), "float");
        assert_eq!(Value::String("x".into()).kind(), "string");
        assert_eq!(Value::Bytes(vec![0]).kind(), "bytes");
        assert_eq!(Value::Array(vec![]).kind(), "array");
        assert_eq!(Value::Dict(BTreeMap::new()).kind(), "dict");
        assert_eq!(Value::func(|| Value::Null).kind(), "function");
    }

    #[test]
    fn test_is_a_supertypes() {
        assert!(Value::Int(1).is_a("integer"));
        assert!(Value::Int(1).is_a("number"));
        assert!(Value::Float(1.0).is_a("number"));
        assert!(!Value::String("1".into()).is_a("number"));
        // booleans behave as integers for dispatch
        assert!(Value::Bool(true).is_a("integer"));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(Value::Int(5).is_truthy());
        assert!(Value::String("x".into()).is_truthy());
        assert!(Value::Array(vec![Value::Null]).is_truthy());
    }

    #[test]
    fn test_render_text() {
        assert_eq!(Value::Null.render_text(), "null");
        assert_eq!(Value::Bool(true).render_text(), "true");
        assert_eq!(Value::Int(42).render_text(), "42");
        assert_eq!(Value::String("hi".into()).render_text(), "hi");
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::Int(2)]).render_text(),
            "[1, 2]"
        );
    }

    #[test]
    fn test_from_json_tree() {
        let value = Value::from(json!({
            "a": 1,
            "b": [true, 2.5],
            "c": null
        }));
        let Value::Dict(map) = value else {
            panic!("expected a dict");
        };
        assert_eq!(map["a"], Value::Int(1));
        assert_eq!(
            map["b"],
            Value::Array(vec![Value::Bool(true), Value::Float(2.5)])
        );
        assert_eq!(map["c"], Value::Null);
    }

    #[test]
    fn test_func_identity_equality() {
        let f = Value::func(|| Value::Int(1));
        assert_eq!(f, f.clone());
        assert_ne!(f, Value::func(|| Value::Int(1)));
    }
}
