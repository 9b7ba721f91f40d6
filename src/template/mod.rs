// src/template/mod.rs

//! Text templates for recipe fields
//!
//! A small template language in the style of Go's `text/template`:
//!
//! ```text
//! https://example.com/{{ .name }}-{{ .version }}.tar.gz
//! {{ extract "foo" .version "tar.gz" }}
//! {{ if .data.configure_flags }}{{ join .data.configure_flags " " }}{{ end }}
//! {{ .data.variables.prefix | upper }}
//! ```
//!
//! The evaluation context is any [`Value`]; recipe templates are evaluated
//! against the raw recipe. Functions come from a [`FunctionMap`], built by the
//! caller from the preprocessor built-ins and the requested tools.

mod error;
mod exec;
mod funcs;
mod parse;

pub use error::{TemplateError, TemplateResult};
pub use exec::{render_value, truthy};
pub use funcs::{expect_args, string_arg, words, FunctionMap, FunctionResult, TemplateFn};
pub use serde_json::Value;

use exec::Executor;
use parse::Node;

/// A parsed template
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(text: &str) -> TemplateResult<Self> {
        Ok(Self {
            nodes: parse::parse(text)?,
        })
    }

    /// Evaluate against `context` using `funcs`
    pub fn render(&self, context: &Value, funcs: &FunctionMap) -> TemplateResult<String> {
        let mut out = String::new();
        Executor::new(funcs).render(&self.nodes, context, &mut out)?;
        Ok(out)
    }
}

/// Parse and render in one step
///
/// Text without any `{{` is returned unchanged without parsing.
pub fn expand(text: &str, context: &Value, funcs: &FunctionMap) -> TemplateResult<String> {
    if !text.contains("{{") {
        return Ok(text.to_string());
    }
    Template::parse(text)?.render(context, funcs)
}
