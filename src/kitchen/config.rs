// src/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::error::{Error, Result};
use crate::rules::RuleConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// When sources are acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Fetch everything concurrently before the build runner starts
    #[default]
    Eager,
    /// Leave fetching to the generated fetch rules
    Deferred,
}

/// Configuration for the Kitchen
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// jobs = 8
/// single_shell = true
/// fetch = "deferred"
/// installer = "apk add --no-cache"
/// timeout_secs = 7200
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KitchenConfig {
    /// Parallel jobs passed to the build runner as `-j`
    pub jobs: u32,
    /// Run the build script in one shell session
    pub single_shell: bool,
    /// Eager or rule-driven source acquisition
    pub fetch: FetchMode,
    /// Command prefix that installs build dependencies
    pub installer: Option<String>,
    /// Build runner executable
    pub make: String,
    /// Kill the build runner after this many seconds
    pub timeout_secs: Option<u64>,
    /// Keep the scratch directory after cooking (for debugging)
    pub keep_builddir: bool,
    /// Show download progress bars
    pub progress: bool,
    /// Extra environment for the build runner
    pub env: BTreeMap<String, String>,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        Self {
            jobs,
            single_shell: false,
            fetch: FetchMode::Eager,
            installer: None,
            make: "make".to_string(),
            timeout_secs: None,
            keep_builddir: false,
            progress: false,
            env: BTreeMap::new(),
        }
    }
}

impl KitchenConfig {
    /// Parse a TOML configuration
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid kitchen config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(Error::ConfigError("jobs must be at least 1".to_string()));
        }
        if self.make.trim().is_empty() {
            return Err(Error::ConfigError("make program cannot be empty".to_string()));
        }
        if self.timeout_secs == Some(0) {
            return Err(Error::ConfigError("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Options for the rule generator
    pub fn rule_config(&self) -> RuleConfig {
        RuleConfig {
            single_shell: self.single_shell,
            installer: self.installer.clone(),
        }
    }
}

/// Result of cooking a recipe
#[derive(Debug)]
pub struct CookResult {
    /// Archive bytes per output package
    pub packages: BTreeMap<String, Vec<u8>>,
    /// Combined output of the build runner
    pub log: String,
    /// Scratch directory, when it was kept
    pub build_dir: Option<PathBuf>,
}
