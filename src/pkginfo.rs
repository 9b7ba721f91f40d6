// src/pkginfo.rs

//! Per-package metadata records (`.pkginfo`)
//!
//! Each output package gets a small YAML record in `out/<pkg>/.pkginfo`:
//!
//! ```yaml
//! Name: foo
//! Version: 1.0.0
//! Dependencies:
//! - libc
//! ```
//!
//! The generated Makefile carries the record base64 encoded, so the bytes
//! survive make and shell quoting untouched.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// File name of the record inside each package directory
pub const PKGINFO_FILE: &str = ".pkginfo";

/// Metadata for one output package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    /// Always present, even when empty
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl PackageInfo {
    pub fn new(name: &str, version: &str, dependencies: &[String]) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            dependencies: dependencies.to_vec(),
        }
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            Error::GenerationError(format!("Failed to serialize metadata for {}: {e}", self.name))
        })
    }

    /// YAML record, base64 encoded for embedding in the rule file
    pub fn to_base64(&self) -> Result<String> {
        Ok(BASE64.encode(self.to_yaml()?))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::ParseError(format!("Invalid package metadata: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_layout() {
        let info = PackageInfo::new("foo", "1.0.0", &["libc".to_string()]);
        let yaml = info.to_yaml().unwrap();
        assert_eq!(yaml, "Name: foo\nVersion: 1.0.0\nDependencies:\n- libc\n");
        assert_eq!(PackageInfo::from_yaml(&yaml).unwrap(), info);
    }

    #[test]
    fn test_empty_dependencies_kept() {
        let info = PackageInfo::new("foo-man", "1.0.0", &[]);
        assert!(info.to_yaml().unwrap().contains("Dependencies: []"));
    }

    #[test]
    fn test_base64_is_shell_safe() {
        let info = PackageInfo::new("foo", "1.0.0", &["a'b".to_string(), "$(rm -rf /)".to_string()]);
        let encoded = info.to_base64().unwrap();
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='));
        let decoded = String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap();
        assert_eq!(PackageInfo::from_yaml(&decoded).unwrap(), info);
    }
}
