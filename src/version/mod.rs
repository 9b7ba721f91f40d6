// src/version/mod.rs

//! Version handling for recipes
//!
//! Recipe versions are semantic versions. Authors commonly write shortened
//! forms, so parsing normalises them before handing off to `semver`:
//! - "1.2.3" → 1.2.3
//! - "v1.0" → 1.0.0
//! - "2" → 2.0.0
//! - "1.2.3-rc.1+build.5" → unchanged

use crate::error::{Error, Result};
use semver::Version;

/// Parse a recipe version string
pub fn parse_version(s: &str) -> Result<Version> {
    let trimmed = s.trim();
    let unprefixed = trimmed.strip_prefix('v').unwrap_or(trimmed);

    if let Ok(v) = Version::parse(unprefixed) {
        return Ok(v);
    }

    // Split off pre-release/build suffixes so only the numeric core is padded
    let suffix_at = unprefixed.find(['-', '+']).unwrap_or(unprefixed.len());
    let (core, suffix) = unprefixed.split_at(suffix_at);
    let parts: Vec<&str> = core.split('.').collect();

    let numeric = !parts.is_empty()
        && parts.len() < 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

    if numeric {
        let mut padded = parts.join(".");
        for _ in parts.len()..3 {
            padded.push_str(".0");
        }
        padded.push_str(suffix);
        if let Ok(v) = Version::parse(&padded) {
            return Ok(v);
        }
    }

    // Report the error semver gives for the original text
    let reason = match Version::parse(unprefixed) {
        Err(e) => e.to_string(),
        Ok(_) => "unrecognised version format".to_string(),
    };
    Err(Error::InvalidVersion {
        version: s.to_string(),
        reason,
    })
}
