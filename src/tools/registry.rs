// src/tools/registry.rs
//! Tool registry

use super::{StaticTool, Tool};
use crate::error::{Error, Result};
use crate::template::{words, Value};
use semver::Version;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry of tools, keyed by name
///
/// Built once, then passed by reference to the preprocessor. Lookups never
/// mutate it, so one registry can serve concurrent preprocessing calls.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Create a registry with all built-in tools
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        self.register(Arc::new(make_tool()));
        self.register(Arc::new(autotools_tool()));
        self.register(Arc::new(cmake_tool()));
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look a tool up by name
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))
    }

    /// Registered tool names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// All registered tools in name order
    pub fn tools(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ============================================================================
// Built-in Tools
// ============================================================================

/// Plain GNU make; the `make` template function itself is a preprocessor built-in
fn make_tool() -> StaticTool {
    StaticTool::new("make", Version::new(4, 4, 0))
        .with_description("GNU make")
        .with_dependency("make")
}

fn autotools_tool() -> StaticTool {
    StaticTool::new("autotools", Version::new(2, 72, 0))
        .with_description("GNU autoconf/automake/libtool")
        .with_dependency("autoconf")
        .with_dependency("automake")
        .with_dependency("libtool")
        .with_dependency("make")
        .with_function("autoreconf", |args: &[Value]| {
            let mut line = vec!["autoreconf".to_string(), "-fi".to_string()];
            line.extend(words(args));
            Ok(Value::String(line.join(" ")))
        })
}

fn cmake_tool() -> StaticTool {
    StaticTool::new("cmake", Version::new(3, 28, 0))
        .with_description("CMake configured out of tree in build/")
        .with_dependency("cmake")
        .with_dependency("make")
        .with_function("cmake", |args: &[Value]| {
            let mut line = vec![
                "cmake".to_string(),
                "-S".to_string(),
                ".".to_string(),
                "-B".to_string(),
                "build".to_string(),
                "-DCMAKE_INSTALL_PREFIX=/usr".to_string(),
            ];
            line.extend(words(args));
            Ok(Value::String(line.join(" ")))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = ToolRegistry::default();
        assert_eq!(registry.names(), vec!["autotools", "cmake", "make"]);
        assert!(registry.lookup("make").is_ok());

        let autotools = registry.lookup("autotools").unwrap();
        assert_eq!(
            autotools.dependencies(),
            ["autoconf", "automake", "libtool", "make"]
        );
        let autoreconf = autotools.functions().get("autoreconf").unwrap();
        assert_eq!(
            autoreconf(&[Value::from("-v")]).unwrap(),
            Value::from("autoreconf -fi -v")
        );
    }

    #[test]
    fn test_lookup_unknown_tool() {
        let registry = ToolRegistry::with_builtins();
        match registry.lookup("scons") {
            Err(Error::ToolNotFound(name)) => assert_eq!(name, "scons"),
            other => panic!("expected ToolNotFound, got {:?}", other.map(|t| t.name().to_string())),
        }
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StaticTool::new("x", Version::new(1, 0, 0))));
        registry.register(Arc::new(
            StaticTool::new("x", Version::new(2, 0, 0)).with_dependency("y"),
        ));
        let tool = registry.lookup("x").unwrap();
        assert_eq!(tool.version().major, 2);
        assert_eq!(tool.dependencies(), ["y"]);
    }

    #[test]
    fn test_cmake_function() {
        let registry = ToolRegistry::with_builtins();
        let cmake = registry.lookup("cmake").unwrap();
        let f = cmake.functions().get("cmake").unwrap();
        assert_eq!(
            f(&[Value::from("-DFOO=1")]).unwrap(),
            Value::from("cmake -S . -B build -DCMAKE_INSTALL_PREFIX=/usr -DFOO=1")
        );
    }
}
