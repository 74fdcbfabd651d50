//! Compiled schema nodes and their lookup strategies.
//!
//! Compilation is two-phase: decode the raw tree, then [`SchemaNode::compile`]
//! resolves types, children, patterns, encodings, and hooks into an
//! immutable node graph. Inheritance (version, description, encoding,
//! decode policy) is resolved top-down during compile, so compiled nodes
//! carry no parent links and are freely shareable read-only across
//! conversions.

use std::fmt;

use regex::Regex;

use crate::errors::{ConvertError, ConvertResult, SchemaError, SchemaResult};
use crate::hooks::{HookFn, HookPhase, HookRegistry};
use crate::value::Value;

use super::encoding::{DecodePolicy, Encoding};
use super::raw::{RawSchema, RawTable};
use super::version;

/// The closed set of target types a schema node may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    String,
    Integer,
    Float,
    Boolean,
    Number,
    Dict,
    Object,
    Array,
    Null,
    Raw,
}

impl DeclaredType {
    /// Resolve a type by name.
    pub fn parse(name: &str) -> SchemaResult<DeclaredType> {
        match name {
            "string" => Ok(DeclaredType::String),
            "integer" => Ok(DeclaredType::Integer),
            "float" => Ok(DeclaredType::Float),
            "boolean" => Ok(DeclaredType::Boolean),
            "number" => Ok(DeclaredType::Number),
            "dict" => Ok(DeclaredType::Dict),
            "object" => Ok(DeclaredType::Object),
            "array" => Ok(DeclaredType::Array),
            "null" => Ok(DeclaredType::Null),
            "raw" => Ok(DeclaredType::Raw),
            _ => Err(SchemaError::UnknownType(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DeclaredType::String => "string",
            DeclaredType::Integer => "integer",
            DeclaredType::Float => "float",
            DeclaredType::Boolean => "boolean",
            DeclaredType::Number => "number",
            DeclaredType::Dict => "dict",
            DeclaredType::Object => "object",
            DeclaredType::Array => "array",
            DeclaredType::Null => "null",
            DeclaredType::Raw => "raw",
        }
    }
}

/// A named output property and the node that produces it.
#[derive(Debug, Clone)]
pub struct Property {
    /// Output key
    pub name: String,
    /// Input key to read, when it differs from the output key
    pub source: Option<String>,
    pub node: SchemaNode,
}

impl Property {
    /// The input key this property reads.
    pub fn source_key(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }
}

/// One `typeOf` dispatch arm: the type names it covers and its child node.
#[derive(Debug, Clone)]
pub struct TypeArm {
    pub names: Vec<String>,
    pub node: SchemaNode,
}

/// Ordered `typeOf` arms plus the mandatory fallback child.
#[derive(Debug, Clone)]
pub struct TypeDispatch {
    pub arms: Vec<TypeArm>,
    pub default: Box<SchemaNode>,
}

/// A resolved hook with its registry name kept for diagnostics.
#[derive(Clone)]
pub struct NamedHook {
    pub name: String,
    pub func: HookFn,
}

impl fmt::Debug for NamedHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamedHook({})", self.name)
    }
}

/// Outcome of a child-node lookup on a compiled node.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    /// The strategy is not configured on this node at all
    Disabled,
    /// Configured, but nothing matched
    Undefined,
    Node(&'a SchemaNode),
}

impl<'a> Resolved<'a> {
    /// The matched node, if any.
    pub fn node(self) -> Option<&'a SchemaNode> {
        match self {
            Resolved::Node(n) => Some(n),
            _ => None,
        }
    }
}

/// One compiled schema fragment.
///
/// Immutable after [`SchemaNode::compile`]; conversion only reads it.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    version: String,
    description: Option<String>,
    declared_type: Option<DeclaredType>,
    items: Option<Box<SchemaNode>>,
    properties: Option<Vec<Property>>,
    pattern_properties: Option<Vec<(Regex, SchemaNode)>>,
    type_dispatch: Option<TypeDispatch>,
    /// `None` means decoding is disabled for this subtree
    encoding: Option<Encoding>,
    decode_policy: DecodePolicy,
    pre_hooks: Vec<NamedHook>,
    post_hooks: Vec<NamedHook>,
}

impl SchemaNode {
    /// Compile a raw schema tree into an immutable node graph, resolving
    /// hook names against `hooks`.
    pub fn compile(raw: &RawSchema, hooks: &HookRegistry) -> SchemaResult<SchemaNode> {
        Self::compile_with(raw, hooks, None)
    }

    fn compile_with(
        raw: &RawSchema,
        hooks: &HookRegistry,
        parent: Option<&SchemaNode>,
    ) -> SchemaResult<SchemaNode> {
        let shorthand;
        let table: &RawTable = match raw {
            RawSchema::Shorthand(name) => {
                shorthand = RawTable {
                    type_name: Some(name.clone()),
                    ..RawTable::default()
                };
                &shorthand
            }
            RawSchema::Table(t) => t,
        };

        // inherited scalar fields resolve before any child compiles, so
        // children see the effective values
        let version = table
            .version
            .clone()
            .or_else(|| parent.map(|p| p.version.clone()))
            .unwrap_or_else(|| version::ENGINE_VERSION.to_string());

        let description = table
            .description
            .clone()
            .or_else(|| parent.and_then(|p| p.description.clone()));

        let encoding = match &table.encoding {
            Some(Some(name)) => Some(Encoding::parse(name)?),
            Some(None) => None,
            None => match parent {
                Some(p) => p.encoding,
                None => Some(Encoding::Utf8),
            },
        };

        let decode_policy = match &table.decode_errors {
            Some(name) => DecodePolicy::parse(name)?,
            None => parent.map(|p| p.decode_policy).unwrap_or_default(),
        };

        let declared_type = match &table.type_name {
            Some(name) => Some(DeclaredType::parse(name)?),
            None => None,
        };

        let (pre_hooks, post_hooks) = match &table.hook {
            Some(h) => (
                resolve_hooks(&h.pre_convert, hooks, HookPhase::Pre)?,
                resolve_hooks(&h.post_convert, hooks, HookPhase::Post)?,
            ),
            None => (Vec::new(), Vec::new()),
        };

        let mut node = SchemaNode {
            version,
            description,
            declared_type,
            items: None,
            properties: None,
            pattern_properties: None,
            type_dispatch: None,
            encoding,
            decode_policy,
            pre_hooks,
            post_hooks,
        };

        if let Some(items) = &table.items {
            let child = Self::compile_with(items, hooks, Some(&node))?;
            node.items = Some(Box::new(child));
        }

        if let Some(props) = &table.properties {
            let mut compiled = Vec::with_capacity(props.len());
            for (name, raw_child) in props {
                let raw_child = RawSchema::from_value(raw_child)?;
                let source = raw_child.source().map(str::to_string);
                let child = Self::compile_with(&raw_child, hooks, Some(&node))?;
                compiled.push(Property {
                    name: name.clone(),
                    source,
                    node: child,
                });
            }
            node.properties = Some(compiled);
        }

        if let Some(pats) = &table.pattern_properties {
            let mut compiled = Vec::with_capacity(pats.len());
            for (pattern, raw_child) in pats {
                let regex = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                let raw_child = RawSchema::from_value(raw_child)?;
                let child = Self::compile_with(&raw_child, hooks, Some(&node))?;
                compiled.push((regex, child));
            }
            node.pattern_properties = Some(compiled);
        }

        if let Some(type_of) = &table.type_of {
            let mut arms = Vec::new();
            let mut default = None;
            for (key, raw_child) in type_of {
                let raw_child = RawSchema::from_value(raw_child)?;
                let child = Self::compile_with(&raw_child, hooks, Some(&node))?;
                if key == "default" {
                    default = Some(child);
                    continue;
                }
                let names: Vec<String> = key
                    .split(',')
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .collect();
                if names.is_empty() {
                    return Err(SchemaError::Malformed(format!(
                        "empty typeOf key '{}'",
                        key
                    )));
                }
                arms.push(TypeArm { names, node: child });
            }
            let default = match default {
                Some(d) => d,
                // an omitted default falls back to plain string conversion
                None => Self::compile_with(
                    &RawSchema::Shorthand("string".to_string()),
                    hooks,
                    Some(&node),
                )?,
            };
            node.type_dispatch = Some(TypeDispatch {
                arms,
                default: Box::new(default),
            });
        }

        Ok(node)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn declared_type(&self) -> Option<DeclaredType> {
        self.declared_type
    }

    /// Child node for sequence elements, when configured.
    pub fn items(&self) -> Option<&SchemaNode> {
        self.items.as_deref()
    }

    /// Declared properties in declaration order, when configured.
    pub fn properties(&self) -> Option<&[Property]> {
        self.properties.as_deref()
    }

    pub fn has_pattern_properties(&self) -> bool {
        self.pattern_properties.is_some()
    }

    /// Effective encoding; `None` means decoding is disabled.
    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    pub fn decode_policy(&self) -> DecodePolicy {
        self.decode_policy
    }

    pub fn pre_hooks(&self) -> &[NamedHook] {
        &self.pre_hooks
    }

    pub fn post_hooks(&self) -> &[NamedHook] {
        &self.post_hooks
    }

    /// Whether this node's version falls in the engine's accepted range.
    /// Gated on the root only; children inherit the validated version.
    pub fn check_version(&self) -> bool {
        version::is_supported(&self.version)
    }

    /// Child node registered under `name` in `properties`.
    pub fn property(&self, name: &str, lenient: bool) -> ConvertResult<Resolved<'_>> {
        let Some(props) = &self.properties else {
            return Ok(Resolved::Disabled);
        };
        match props.iter().find(|p| p.name == name) {
            Some(p) => Ok(Resolved::Node(&p.node)),
            None if lenient => Ok(Resolved::Undefined),
            None => Err(ConvertError::FieldMiss {
                field: name.to_string(),
                section: "properties",
            }),
        }
    }

    /// First pattern arm matching `name`, in declaration order. Matching is
    /// an unanchored search; write `^`/`$` in the pattern to anchor.
    pub fn pattern_property(&self, name: &str, lenient: bool) -> ConvertResult<Resolved<'_>> {
        let Some(pats) = &self.pattern_properties else {
            if lenient {
                return Ok(Resolved::Disabled);
            }
            return Err(ConvertError::FieldMiss {
                field: name.to_string(),
                section: "patternProperties",
            });
        };
        Ok(pats
            .iter()
            .find(|(rex, _)| rex.is_match(name))
            .map(|(_, node)| Resolved::Node(node))
            .unwrap_or(Resolved::Undefined))
    }

    /// Child node for `value`'s runtime type: exact kind match first, then
    /// a declared-order supertype scan, then the default arm.
    pub fn type_of(&self, value: &Value, lenient: bool) -> ConvertResult<Resolved<'_>> {
        let Some(dispatch) = &self.type_dispatch else {
            if lenient {
                return Ok(Resolved::Disabled);
            }
            return Err(ConvertError::FieldMiss {
                field: value.kind().to_string(),
                section: "typeOf",
            });
        };

        let kind = value.kind();
        for arm in &dispatch.arms {
            if arm.names.iter().any(|n| n == kind) {
                return Ok(Resolved::Node(&arm.node));
            }
        }
        for arm in &dispatch.arms {
            if arm.names.iter().any(|n| value.is_a(n)) {
                return Ok(Resolved::Node(&arm.node));
            }
        }
        Ok(Resolved::Node(&dispatch.default))
    }
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_name = self
            .declared_type
            .map(|t| t.name())
            .unwrap_or("auto");
        match &self.description {
            Some(d) => write!(f, "<Schema {}: {}>", type_name, d),
            None => write!(f, "<Schema {}>", type_name),
        }
    }
}

fn resolve_hooks(
    names: &[String],
    registry: &HookRegistry,
    phase: HookPhase,
) -> SchemaResult<Vec<NamedHook>> {
    names
        .iter()
        .map(|name| {
            registry
                .lookup(phase, name)
                .map(|func| NamedHook {
                    name: name.clone(),
                    func,
                })
                .ok_or_else(|| SchemaError::UnknownHook {
                    phase: phase.as_str(),
                    name: name.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(schema: serde_json::Value) -> SchemaResult<SchemaNode> {
        let raw = RawSchema::from_value(&schema)?;
        SchemaNode::compile(&raw, &HookRegistry::default())
    }

    #[test]
    fn test_defaults_for_empty_schema() {
        let node = compile(json!({})).unwrap();
        assert_eq!(node.version(), version::ENGINE_VERSION);
        assert_eq!(node.declared_type(), None);
        assert!(node.items().is_none());
        assert!(node.properties().is_none());
        assert!(!node.has_pattern_properties());
        assert_eq!(node.encoding(), Some(Encoding::Utf8));
        assert_eq!(node.decode_policy(), DecodePolicy::Strict);
        assert!(node.pre_hooks().is_empty());
        assert!(node.check_version());
    }

    #[test]
    fn test_shorthand_matches_full_form() {
        let short = compile(json!({"type": "array", "items": "string"})).unwrap();
        let full = compile(json!({"type": "array", "items": {"type": "string"}})).unwrap();
        assert_eq!(
            short.items().unwrap().declared_type(),
            full.items().unwrap().declared_type()
        );
    }

    #[test]
    fn test_version_inherits_into_children() {
        let node = compile(json!({
            "version": "0.0.0.0",
            "type": "array",
            "items": {"type": "string"}
        }))
        .unwrap();
        assert_eq!(node.version(), "0.0.0.0");
        assert_eq!(node.items().unwrap().version(), "0.0.0.0");
        assert!(!node.check_version());

        let node = compile(json!({
            "version": "0.2",
            "type": "array",
            "items": {"version": "0.3", "type": "string"}
        }))
        .unwrap();
        assert_eq!(node.items().unwrap().version(), "0.3");
    }

    #[test]
    fn test_encoding_inheritance_and_disable() {
        let node = compile(json!({
            "type": "dict",
            "encoding": "latin-1",
            "properties": {
                "a": "string",
                "b": {"type": "string", "encoding": null},
                "c": {"type": "string", "encoding": "ascii"}
            }
        }))
        .unwrap();
        let props = node.properties().unwrap();
        assert_eq!(props[0].node.encoding(), Some(Encoding::Latin1));
        assert_eq!(props[1].node.encoding(), None);
        assert_eq!(props[2].node.encoding(), Some(Encoding::Ascii));
    }

    #[test]
    fn test_unknown_type_fails_compile() {
        let err = compile(json!({"type": "quaternion"})).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType(ref n) if n == "quaternion"));
    }

    #[test]
    fn test_invalid_pattern_fails_compile() {
        let err = compile(json!({
            "type": "dict",
            "patternProperties": {"[unclosed": "string"}
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn test_unknown_hook_fails_compile() {
        let err = compile(json!({
            "type": "string",
            "hook": {"pre-convert": ["no_such_hook"]}
        }))
        .unwrap_err();
        assert!(
            matches!(err, SchemaError::UnknownHook { phase: "pre-convert", ref name } if name == "no_such_hook")
        );
    }

    #[test]
    fn test_property_lookup_contract() {
        let node = compile(json!({
            "type": "dict",
            "properties": {"a": "integer"}
        }))
        .unwrap();

        assert!(node.property("a", false).unwrap().node().is_some());
        assert!(matches!(
            node.property("b", true).unwrap(),
            Resolved::Undefined
        ));
        assert!(matches!(
            node.property("b", false),
            Err(ConvertError::FieldMiss { .. })
        ));

        // no properties configured at all
        let bare = compile(json!({"type": "dict"})).unwrap();
        assert!(matches!(bare.property("a", false).unwrap(), Resolved::Disabled));
    }

    #[test]
    fn test_pattern_lookup_first_match_wins() {
        let node = compile(json!({
            "type": "dict",
            "patternProperties": {
                "^a": "string",
                "a$": "integer"
            }
        }))
        .unwrap();

        // "aa" matches both patterns; declaration order decides
        let resolved = node.pattern_property("aa", true).unwrap();
        assert_eq!(
            resolved.node().unwrap().declared_type(),
            Some(DeclaredType::String)
        );

        // unanchored search: "za" only matches the second pattern
        let resolved = node.pattern_property("za", true).unwrap();
        assert_eq!(
            resolved.node().unwrap().declared_type(),
            Some(DeclaredType::Integer)
        );

        assert!(matches!(
            node.pattern_property("zz", true).unwrap(),
            Resolved::Undefined
        ));
    }

    #[test]
    fn test_typeof_lookup_order() {
        let node = compile(json!({
            "typeOf": {
                "integer": "boolean",
                "float, string": "integer",
                "default": "null"
            }
        }))
        .unwrap();

        let pick = |v: &Value| {
            node.type_of(v, true)
                .unwrap()
                .node()
                .unwrap()
                .declared_type()
        };
        assert_eq!(pick(&Value::Int(5)), Some(DeclaredType::Boolean));
        assert_eq!(pick(&Value::Float(5.0)), Some(DeclaredType::Integer));
        assert_eq!(pick(&Value::String("7".into())), Some(DeclaredType::Integer));
        // nothing matches an array, the default arm catches it
        assert_eq!(pick(&Value::Array(vec![])), Some(DeclaredType::Null));
    }

    #[test]
    fn test_typeof_default_falls_back_to_string() {
        let node = compile(json!({
            "typeOf": {"integer": "boolean"}
        }))
        .unwrap();
        let resolved = node.type_of(&Value::Null, true).unwrap();
        assert_eq!(
            resolved.node().unwrap().declared_type(),
            Some(DeclaredType::String)
        );
    }

    #[test]
    fn test_typeof_disabled_contract() {
        let node = compile(json!({"type": "string"})).unwrap();
        assert!(matches!(
            node.type_of(&Value::Int(1), true).unwrap(),
            Resolved::Disabled
        ));
        assert!(matches!(
            node.type_of(&Value::Int(1), false),
            Err(ConvertError::FieldMiss { .. })
        ));
    }

    #[test]
    fn test_source_rename_extraction() {
        let node = compile(json!({
            "type": "dict",
            "properties": {
                "name": {"type": "string", "source": "user_name"}
            }
        }))
        .unwrap();
        let props = node.properties().unwrap();
        assert_eq!(props[0].name, "name");
        assert_eq!(props[0].source_key(), "user_name");
    }
}
