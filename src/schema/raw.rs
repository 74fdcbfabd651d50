//! Raw (uncompiled) schema trees.
//!
//! The converter accepts an already-decoded JSON schema tree; this module
//! gives it a typed shape. Unrecognized keys are skipped during
//! deserialization, which is the forward-compatibility contract: older
//! engines ignore newer fields.

use serde::{Deserialize, Deserializer};
use serde_json::Map;

use crate::errors::{SchemaError, SchemaResult};

/// One raw schema fragment: a bare type-name shorthand or a full key table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSchema {
    /// `"string"` is sugar for `{"type": "string"}`
    Shorthand(String),
    Table(Box<RawTable>),
}

impl RawSchema {
    /// Decode one raw fragment out of a JSON tree.
    pub fn from_value(value: &serde_json::Value) -> SchemaResult<RawSchema> {
        serde_json::from_value(value.clone()).map_err(|e| SchemaError::Malformed(e.to_string()))
    }

    /// The `source` rename declared on this fragment, if any.
    pub fn source(&self) -> Option<&str> {
        match self {
            RawSchema::Shorthand(_) => None,
            RawSchema::Table(t) => t.source.as_deref(),
        }
    }
}

/// The recognized schema keys.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTable {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    /// Input key to read when it differs from the output key
    pub source: Option<String>,
    /// Child schema for sequence elements
    pub items: Option<RawSchema>,
    /// Output key -> child schema, declaration order preserved
    pub properties: Option<Map<String, serde_json::Value>>,
    /// Pattern text -> child schema, declaration order preserved
    #[serde(rename = "patternProperties")]
    pub pattern_properties: Option<Map<String, serde_json::Value>>,
    /// Runtime-type names -> child schema; `default` is the fallback key
    #[serde(rename = "typeOf")]
    pub type_of: Option<Map<String, serde_json::Value>>,
    /// `None`: inherit; `Some(None)`: JSON null, decoding disabled;
    /// `Some(Some(name))`: named encoding
    #[serde(deserialize_with = "some_or_null")]
    pub encoding: Option<Option<String>>,
    #[serde(rename = "decoderrors")]
    pub decode_errors: Option<String>,
    pub hook: Option<RawHooks>,
}

/// Hook name lists per phase.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawHooks {
    #[serde(rename = "pre-convert")]
    pub pre_convert: Vec<String>,
    #[serde(rename = "post-convert")]
    pub post_convert: Vec<String>,
}

/// Keeps JSON `null` distinguishable from an absent key.
fn some_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
