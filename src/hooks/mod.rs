//! Hook pipeline: named value transformers run around a node's conversion.
//!
//! Hook names written in a schema resolve once, at compile time, against a
//! [`HookRegistry`]. The default registry carries the two built-in
//! pre-convert hooks; callers extend it for custom hooks. There is no
//! global hook table: each converter owns the registry it was compiled
//! against, so resolution is deterministic and test-isolated.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::ConvertResult;
use crate::schema::SchemaNode;
use crate::value::Value;

/// A pure value transformer attached to a schema node.
///
/// Pre-convert hooks run before type coercion, post-convert hooks after;
/// multiple hooks compose left to right, and a hook's failure propagates
/// unmodified.
pub type HookFn = Arc<dyn Fn(Value, &SchemaNode) -> ConvertResult<Value> + Send + Sync>;

/// Hook execution phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Pre,
    Post,
}

impl HookPhase {
    /// The schema key naming this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPhase::Pre => "pre-convert",
            HookPhase::Post => "post-convert",
        }
    }
}

/// Name -> transformer tables, one per phase.
pub struct HookRegistry {
    pre: HashMap<String, HookFn>,
    post: HashMap<String, HookFn>,
}

impl Default for HookRegistry {
    /// The built-in table: `format_date` and `func_result` pre-convert,
    /// nothing post-convert.
    fn default() -> Self {
        let mut registry = HookRegistry::empty();
        registry.register(HookPhase::Pre, "format_date", format_date);
        registry.register(HookPhase::Pre, "func_result", func_result);
        registry
    }
}

impl HookRegistry {
    /// A registry with no hooks, not even the built-ins.
    pub fn empty() -> Self {
        HookRegistry {
            pre: HashMap::new(),
            post: HashMap::new(),
        }
    }

    /// Register `hook` under `name` for `phase`, replacing any previous
    /// entry of that name.
    pub fn register<F>(&mut self, phase: HookPhase, name: impl Into<String>, hook: F)
    where
        F: Fn(Value, &SchemaNode) -> ConvertResult<Value> + Send + Sync + 'static,
    {
        self.table_mut(phase).insert(name.into(), Arc::new(hook));
    }

    /// The transformer registered under `name` for `phase`.
    pub fn lookup(&self, phase: HookPhase, name: &str) -> Option<HookFn> {
        self.table(phase).get(name).cloned()
    }

    fn table(&self, phase: HookPhase) -> &HashMap<String, HookFn> {
        match phase {
            HookPhase::Pre => &self.pre,
            HookPhase::Post => &self.post,
        }
    }

    fn table_mut(&mut self, phase: HookPhase) -> &mut HashMap<String, HookFn> {
        match phase {
            HookPhase::Pre => &mut self.pre,
            HookPhase::Post => &mut self.post,
        }
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pre: Vec<&str> = self.pre.keys().map(String::as_str).collect();
        let mut post: Vec<&str> = self.post.keys().map(String::as_str).collect();
        pre.sort_unstable();
        post.sort_unstable();
        f.debug_struct("HookRegistry")
            .field("pre", &pre)
            .field("post", &post)
            .finish()
    }
}

/// Built-in pre-convert hook: renders a date-time as ISO-8601 text.
/// Anything else passes through untouched.
fn format_date(value: Value, _schema: &SchemaNode) -> ConvertResult<Value> {
    match value {
        Value::DateTime(dt) => Ok(Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string())),
        other => Ok(other),
    }
}

/// Built-in pre-convert hook: resolves a zero-argument producer to its
/// produced value. Anything else passes through untouched.
fn func_result(value: Value, _schema: &SchemaNode) -> ConvertResult<Value> {
    match value {
        Value::Func(thunk) => Ok(thunk.call()),
        other => Ok(other),
    }
}
