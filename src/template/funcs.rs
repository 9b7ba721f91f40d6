// src/template/funcs.rs

//! Function namespace for templates

use super::exec::render_value;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Result returned by a template function; errors are plain messages
pub type FunctionResult = std::result::Result<Value, String>;

/// A callable template function
///
/// Functions are shared read-only between threads, so they must be `Send + Sync`.
pub type TemplateFn = Arc<dyn Fn(&[Value]) -> FunctionResult + Send + Sync>;

/// Flat name → function table consulted by `{{ name args... }}`
#[derive(Clone, Default)]
pub struct FunctionMap {
    funcs: BTreeMap<String, TemplateFn>,
}

impl FunctionMap {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace holding the generic helpers (`join`, `lower`, `upper`, `eq`, `not`)
    pub fn with_helpers() -> Self {
        let mut funcs = Self::new();
        funcs.insert("join", join);
        funcs.insert("lower", |args: &[Value]| {
            Ok(Value::String(string_arg(args, 0, "lower")?.to_lowercase()))
        });
        funcs.insert("upper", |args: &[Value]| {
            Ok(Value::String(string_arg(args, 0, "upper")?.to_uppercase()))
        });
        funcs.insert("eq", |args: &[Value]| {
            expect_args(args, 2, "eq")?;
            Ok(Value::Bool(render_value(&args[0]) == render_value(&args[1])))
        });
        funcs.insert("not", |args: &[Value]| {
            expect_args(args, 1, "not")?;
            Ok(Value::Bool(!super::exec::truthy(&args[0])))
        });
        funcs
    }

    /// Add a function, returning the one it replaced
    pub fn insert<F>(&mut self, name: &str, f: F) -> Option<TemplateFn>
    where
        F: Fn(&[Value]) -> FunctionResult + Send + Sync + 'static,
    {
        self.funcs.insert(name.to_string(), Arc::new(f))
    }

    /// Merge `other` into this namespace; entries from `other` win
    ///
    /// Returns the names that were shadowed.
    pub fn merge(&mut self, other: &FunctionMap) -> Vec<String> {
        let mut shadowed = Vec::new();
        for (name, f) in &other.funcs {
            if self.funcs.insert(name.clone(), Arc::clone(f)).is_some() {
                shadowed.push(name.clone());
            }
        }
        shadowed
    }

    pub fn get(&self, name: &str) -> Option<&TemplateFn> {
        self.funcs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    /// Function names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.funcs.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl fmt::Debug for FunctionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.funcs.keys()).finish()
    }
}

/// Fail unless exactly `n` arguments were passed
pub fn expect_args(args: &[Value], n: usize, name: &str) -> std::result::Result<(), String> {
    if args.len() != n {
        return Err(format!(
            "{name} expects {n} argument(s), got {}",
            args.len()
        ));
    }
    Ok(())
}

/// Argument `i` rendered as text; lists and maps are rejected
pub fn string_arg(args: &[Value], i: usize, name: &str) -> std::result::Result<String, String> {
    match args.get(i) {
        None => Err(format!("{name}: missing argument {}", i + 1)),
        Some(Value::Array(_)) | Some(Value::Object(_)) => {
            Err(format!("{name}: argument {} must be a scalar", i + 1))
        }
        Some(v) => Ok(render_value(v)),
    }
}

/// Flatten arguments into words: scalars stay single, lists spread out
pub fn words(args: &[Value]) -> Vec<String> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Value::Array(items) => out.extend(items.iter().map(render_value)),
            Value::Null => {}
            other => out.push(render_value(other)),
        }
    }
    out
}

/// `join list sep`
fn join(args: &[Value]) -> FunctionResult {
    expect_args(args, 2, "join")?;
    let sep = string_arg(args, 1, "join")?;
    match &args[0] {
        Value::Array(items) => Ok(Value::String(
            items.iter().map(render_value).collect::<Vec<_>>().join(&sep),
        )),
        other => Err(format!("join: expected a list, got {}", render_value(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_reports_shadowed() {
        let mut base = FunctionMap::with_helpers();
        let mut tool = FunctionMap::new();
        tool.insert("upper", |_: &[Value]| Ok(json!("shadowed")));
        tool.insert("fresh", |_: &[Value]| Ok(json!("new")));

        let shadowed = base.merge(&tool);
        assert_eq!(shadowed, vec!["upper"]);
        assert!(base.contains("fresh"));
        let upper = base.get("upper").unwrap();
        assert_eq!(upper(&[json!("x")]).unwrap(), json!("shadowed"));
    }

    #[test]
    fn test_join() {
        let helpers = FunctionMap::with_helpers();
        let join = helpers.get("join").unwrap();
        assert_eq!(join(&[json!(["a", "b", 3]), json!(",")]).unwrap(), json!("a,b,3"));
        assert!(join(&[json!("a"), json!(",")]).is_err());
        assert!(join(&[json!(["a"])]).is_err());
    }

    #[test]
    fn test_words_flattens_lists() {
        let args = [json!("a"), json!(["b", "c"]), Value::Null, json!(4)];
        assert_eq!(words(&args), vec!["a", "b", "c", "4"]);
    }
}
