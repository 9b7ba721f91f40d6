// src/template/error.rs
//! Error types for template parsing and evaluation

use thiserror::Error;

/// Result type for template operations
pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

/// Errors raised while parsing or executing a template
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// Malformed template text
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Action calls a function missing from the namespace
    #[error("function {0:?} not defined")]
    UnknownFunction(String),

    /// A function returned an error
    #[error("error calling {name}: {message}")]
    Function { name: String, message: String },

    /// Evaluation failed (missing field, bad operand, ...)
    #[error("{0}")]
    Eval(String),
}

impl TemplateError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn eval(message: impl Into<String>) -> Self {
        Self::Eval(message.into())
    }
}
