//! The conversion engine.
//!
//! One recursive entry point walks (value, node) pairs: pre-convert hooks,
//! the type-specific converter, post-convert hooks. Conversion never
//! mutates the compiled schema, so one converter serves any number of
//! concurrent conversions.

use std::collections::BTreeMap;

use crate::errors::{ConvertError, ConvertResult, SchemaError};
use crate::hooks::HookRegistry;
use crate::schema::{DeclaredType, RawSchema, Resolved, SchemaNode};
use crate::value::{ObjectAccess, Value};

/// Schema-driven converter: compiled once, reusable for any number of
/// conversions.
///
/// Construction compiles the schema and runs the version gate; an
/// out-of-range root version fails here, before any value is touched.
#[derive(Debug)]
pub struct SchemaConverter {
    root: SchemaNode,
}

impl SchemaConverter {
    /// Compile `schema` against the built-in hook registry.
    pub fn new(schema: &serde_json::Value) -> ConvertResult<SchemaConverter> {
        Self::with_hooks(schema, &HookRegistry::default())
    }

    /// Compile `schema` against a caller-supplied hook registry.
    pub fn with_hooks(
        schema: &serde_json::Value,
        hooks: &HookRegistry,
    ) -> ConvertResult<SchemaConverter> {
        let raw = RawSchema::from_value(schema)?;
        let root = SchemaNode::compile(&raw, hooks)?;
        if !root.check_version() {
            return Err(SchemaError::Version(root.version().to_string()).into());
        }
        Ok(SchemaConverter { root })
    }

    /// The compiled root node.
    pub fn schema(&self) -> &SchemaNode {
        &self.root
    }

    /// Convert `value` into the shape the schema describes.
    pub fn convert(&self, value: &Value) -> ConvertResult<Value> {
        self.convert_node(value, &self.root)
    }

    fn convert_node(&self, value: &Value, node: &SchemaNode) -> ConvertResult<Value> {
        // pre-convert hooks compose left to right, each feeding the next
        let hooked;
        let value = if node.pre_hooks().is_empty() {
            value
        } else {
            let mut current = value.clone();
            for hook in node.pre_hooks() {
                current = (hook.func)(current, node)?;
            }
            hooked = current;
            &hooked
        };

        let mut result = match node.declared_type() {
            Some(DeclaredType::String) => self.convert_string(value, node)?,
            Some(DeclaredType::Integer) => convert_integer(value)?,
            Some(DeclaredType::Float) => Value::Float(convert_float(value)?),
            Some(DeclaredType::Boolean) => Value::Bool(value.is_truthy()),
            Some(DeclaredType::Number) => convert_number(value)?,
            Some(DeclaredType::Dict) | Some(DeclaredType::Object) => {
                self.convert_mapping(value, node)?
            }
            Some(DeclaredType::Array) => self.convert_array(value, node)?,
            Some(DeclaredType::Null) => Value::Null,
            Some(DeclaredType::Raw) => value.clone(),
            None => self.convert_auto(value, node)?,
        };

        for hook in node.post_hooks() {
            result = (hook.func)(result, node)?;
        }
        Ok(result)
    }

    fn convert_string(&self, value: &Value, node: &SchemaNode) -> ConvertResult<Value> {
        let Some(encoding) = node.encoding() else {
            // decoding disabled: byte-level passthrough
            return Ok(value.clone());
        };
        match value {
            Value::String(_) => Ok(value.clone()),
            Value::Bytes(bytes) => Ok(Value::String(
                encoding.decode(bytes, node.decode_policy())?,
            )),
            other => Ok(Value::String(other.render_text())),
        }
    }

    /// `dict` and `object` conversion share one algorithm; the only
    /// difference in the source model is the attribute adapter, which
    /// [`Value::Object`] already carries.
    fn convert_mapping(&self, value: &Value, node: &SchemaNode) -> ConvertResult<Value> {
        let source = match value {
            Value::Dict(map) => KeySource::Dict(map),
            Value::Object(obj) => KeySource::Object(obj.as_ref()),
            _ => return Err(field_type_error("dict", value)),
        };

        let mut result = BTreeMap::new();

        // pattern phase: scan every input key, first matching pattern wins
        if node.has_pattern_properties() {
            for key in source.keys() {
                if let Resolved::Node(child) = node.pattern_property(&key, true)? {
                    let Some(item) = source.get(&key) else {
                        continue;
                    };
                    result.insert(key, self.convert_node(&item, child)?);
                }
            }
        }

        // property phase: declaration order, skipping output keys the
        // pattern phase already produced
        if let Some(props) = node.properties() {
            for prop in props {
                if result.contains_key(&prop.name) {
                    continue;
                }
                let item =
                    source
                        .get(prop.source_key())
                        .ok_or_else(|| ConvertError::FieldMiss {
                            field: prop.source_key().to_string(),
                            section: "input",
                        })?;
                result.insert(prop.name.clone(), self.convert_node(&item, &prop.node)?);
            }
        }

        Ok(Value::Dict(result))
    }

    fn convert_array(&self, value: &Value, node: &SchemaNode) -> ConvertResult<Value> {
        // no items schema configured: the result is always empty
        let Some(child) = node.items() else {
            return Ok(Value::Array(Vec::new()));
        };
        let items = match value {
            Value::Array(items) => items,
            _ => return Err(field_type_error("array", value)),
        };
        let mut result = Vec::with_capacity(items.len());
        for item in items {
            result.push(self.convert_node(item, child)?);
        }
        Ok(Value::Array(result))
    }

    /// Auto-dispatch when no type is declared: route through `typeOf`,
    /// fall back to null.
    fn convert_auto(&self, value: &Value, node: &SchemaNode) -> ConvertResult<Value> {
        match node.type_of(value, true)? {
            Resolved::Node(child) => self.convert_node(value, child),
            Resolved::Disabled | Resolved::Undefined => Ok(Value::Null),
        }
    }
}

/// One-call convenience: compile `schema`, gate its version, convert
/// `value` through the built-in hook registry.
pub fn convert_by_schema(value: &Value, schema: &serde_json::Value) -> ConvertResult<Value> {
    SchemaConverter::new(schema)?.convert(value)
}

/// A key-addressable view over the two mapping-shaped inputs.
enum KeySource<'a> {
    Dict(&'a BTreeMap<String, Value>),
    Object(&'a dyn ObjectAccess),
}

impl<'a> KeySource<'a> {
    fn keys(&self) -> Vec<String> {
        match self {
            KeySource::Dict(map) => map.keys().cloned().collect(),
            KeySource::Object(obj) => obj.names(),
        }
    }

    fn get(&self, key: &str) -> Option<Value> {
        match self {
            KeySource::Dict(map) => map.get(key).cloned(),
            KeySource::Object(obj) => obj.get(key),
        }
    }
}

/// `integer` conversion: native coercion, truncating floats.
fn convert_integer(value: &Value) -> ConvertResult<Value> {
    let n = match value {
        Value::Int(n) => *n,
        Value::Bool(b) => *b as i64,
        Value::Float(f) => float_to_int(*f).ok_or_else(|| field_type_error("integer", value))?,
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| field_type_error("integer", value))?,
        _ => return Err(field_type_error("integer", value)),
    };
    Ok(Value::Int(n))
}

fn convert_float(value: &Value) -> ConvertResult<f64> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(f) => Ok(*f),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| field_type_error("float", value)),
        _ => Err(field_type_error("float", value)),
    }
}

/// `number` conversion: float coercion, narrowed to an integer whenever
/// the float form has no fractional part.
fn convert_number(value: &Value) -> ConvertResult<Value> {
    let f = convert_float(value)?;
    if f.is_finite() && f.fract() == 0.0 {
        if let Some(n) = float_to_int(f) {
            return Ok(Value::Int(n));
        }
    }
    Ok(Value::Float(f))
}

fn float_to_int(f: f64) -> Option<i64> {
    // upper bound is exclusive: 2^63 itself is not representable as i64,
    // and i64::MAX rounds up to exactly 2^63 as f64
    if f.is_finite() && f >= -(2f64.powi(63)) && f < 2f64.powi(63) {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

fn field_type_error(target: &'static str, value: &Value) -> ConvertError {
    ConvertError::FieldType {
        target,
        kind: value.kind(),
        detail: value.render_text(),
    }
}
