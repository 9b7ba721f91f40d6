// src/tools/mod.rs

//! Build tools available to recipes
//!
//! A tool is a named capability a recipe opts into with `tools: [...]`.
//! It contributes template functions (merged into the preprocessor's
//! namespace) and build-time dependencies (appended to the recipe's own).
//!
//! Tools are immutable once registered and shared read-only through
//! [`ToolRegistry`].

mod registry;

pub use registry::ToolRegistry;

use crate::template::{FunctionMap, FunctionResult, Value};
use semver::Version;

/// Capability interface implemented by every tool
pub trait Tool: Send + Sync {
    /// Name recipes use to request the tool
    fn name(&self) -> &str;

    fn version(&self) -> &Version;

    /// Template functions the tool provides
    fn functions(&self) -> &FunctionMap;

    /// Build-time dependencies, appended verbatim to the recipe's list
    fn dependencies(&self) -> &[String];

    /// One-line description for `pkgcook tools`
    fn description(&self) -> &str {
        ""
    }
}

/// A tool assembled from plain data
///
/// ```ignore
/// let tool = StaticTool::new("meson", Version::new(1, 4, 0))
///     .with_dependency("meson")
///     .with_dependency("ninja")
///     .with_function("meson", |args| Ok(Value::from("meson setup build")));
/// ```
pub struct StaticTool {
    name: String,
    version: Version,
    description: String,
    functions: FunctionMap,
    dependencies: Vec<String>,
}

impl StaticTool {
    pub fn new(name: &str, version: Version) -> Self {
        Self {
            name: name.to_string(),
            version,
            description: String::new(),
            functions: FunctionMap::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_dependency(mut self, dependency: &str) -> Self {
        self.dependencies.push(dependency.to_string());
        self
    }

    pub fn with_function<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> FunctionResult + Send + Sync + 'static,
    {
        self.functions.insert(name, f);
        self
    }
}

impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &Version {
        &self.version
    }

    fn functions(&self) -> &FunctionMap {
        &self.functions
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    fn description(&self) -> &str {
        &self.description
    }
}
