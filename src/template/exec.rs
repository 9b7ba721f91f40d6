// src/template/exec.rs

//! Template evaluation

use super::error::{TemplateError, TemplateResult};
use super::funcs::FunctionMap;
use super::parse::{Command, Node, Operand, Pipeline};
use serde_json::Value;

/// Render a value as template output
///
/// Strings are emitted raw, null is empty, lists are joined with single
/// spaces and maps are written as JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(" "),
        Value::Object(_) => value.to_string(),
    }
}

/// Truth value used by `if` and `not`
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub(crate) struct Executor<'a> {
    funcs: &'a FunctionMap,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(funcs: &'a FunctionMap) -> Self {
        Self { funcs }
    }

    pub(crate) fn render(&self, nodes: &[Node], dot: &Value, out: &mut String) -> TemplateResult<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action(pipeline) => {
                    let value = self.pipeline(pipeline, dot)?;
                    out.push_str(&render_value(&value));
                }
                Node::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    if truthy(&self.pipeline(cond, dot)?) {
                        self.render(then, dot, out)?;
                    } else {
                        self.render(otherwise, dot, out)?;
                    }
                }
                Node::Range {
                    over,
                    body,
                    otherwise,
                } => {
                    let items: Vec<Value> = match self.pipeline(over, dot)? {
                        Value::Array(items) => items,
                        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
                        Value::Null => Vec::new(),
                        other => {
                            return Err(TemplateError::eval(format!(
                                "range can't iterate over {}",
                                render_value(&other)
                            )));
                        }
                    };
                    if items.is_empty() {
                        self.render(otherwise, dot, out)?;
                    }
                    for item in &items {
                        self.render(body, item, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn pipeline(&self, pipeline: &Pipeline, dot: &Value) -> TemplateResult<Value> {
        let mut piped: Option<Value> = None;
        for command in &pipeline.commands {
            piped = Some(self.command(command, dot, piped.take())?);
        }
        Ok(piped.unwrap_or(Value::Null))
    }

    fn command(&self, command: &Command, dot: &Value, piped: Option<Value>) -> TemplateResult<Value> {
        let (head, rest) = match command.operands.split_first() {
            Some(split) => split,
            None => return Err(TemplateError::eval("empty command")),
        };

        if let Operand::Ident(name) = head {
            let func = self
                .funcs
                .get(name)
                .ok_or_else(|| TemplateError::UnknownFunction(name.clone()))?;

            let mut args = Vec::with_capacity(rest.len() + 1);
            for operand in rest {
                args.push(self.operand(operand, dot)?);
            }
            args.extend(piped);

            return func(&args).map_err(|message| TemplateError::Function {
                name: name.clone(),
                message,
            });
        }

        if !rest.is_empty() || piped.is_some() {
            return Err(TemplateError::eval(
                "can't give arguments to a non-function value",
            ));
        }
        self.operand(head, dot)
    }

    fn operand(&self, operand: &Operand, dot: &Value) -> TemplateResult<Value> {
        match operand {
            Operand::Dot => Ok(dot.clone()),
            Operand::Field(path) => lookup(dot, path).cloned(),
            Operand::Str(s) => Ok(Value::String(s.clone())),
            Operand::Int(i) => Ok(Value::from(*i)),
            Operand::Bool(b) => Ok(Value::Bool(*b)),
            Operand::Ident(name) => {
                // Function used as an argument: call it without arguments
                self.command(
                    &Command {
                        operands: vec![Operand::Ident(name.clone())],
                    },
                    dot,
                    None,
                )
            }
            Operand::Sub(pipeline) => self.pipeline(pipeline, dot),
        }
    }
}

/// Follow a field chain; keys match exactly, then case-insensitively
fn lookup<'v>(value: &'v Value, path: &[String]) -> TemplateResult<&'v Value> {
    let mut current = value;
    for (depth, name) in path.iter().enumerate() {
        let Value::Object(map) = current else {
            return Err(TemplateError::eval(format!(
                "can't evaluate field {} of non-map value at .{}",
                name,
                path[..depth].join(".")
            )));
        };
        current = match map.get(name) {
            Some(v) => v,
            None => map
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
                .ok_or_else(|| {
                    TemplateError::eval(format!("no field {:?} at .{}", name, path[..=depth].join(".")))
                })?,
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_case_insensitive() {
        let ctx = json!({"version": "1.0.0", "data": {"variables": {"ext": "tar.xz"}}});
        assert_eq!(lookup(&ctx, &["Version".to_string()]).unwrap(), &json!("1.0.0"));
        assert_eq!(
            lookup(&ctx, &["data".into(), "variables".into(), "ext".into()]).unwrap(),
            &json!("tar.xz")
        );
        assert!(lookup(&ctx, &["missing".to_string()]).is_err());
        assert!(lookup(&ctx, &["version".into(), "x".into()]).is_err());
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&json!(null)), "");
        assert_eq!(render_value(&json!(["a", 1, true])), "a 1 true");
        assert_eq!(render_value(&json!({"a": 1})), "{\"a\":1}");
    }

    #[test]
    fn test_truthy() {
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!([])));
        assert!(!truthy(&json!(0)));
        assert!(truthy(&json!("x")));
        assert!(truthy(&json!({"a": 1})));
    }
}
