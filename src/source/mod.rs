// src/source/mod.rs

//! Recipe sources
//!
//! A source is a URL whose scheme decides how it is acquired:
//!
//! | Scheme  | Acquisition                                          |
//! |---------|------------------------------------------------------|
//! | `https` | download to `sources/<basename>`                     |
//! | `git`   | clone to `sources/<basename without .git>`, then checkout `tag`/`checkout` |
//! | `file`  | copy `<recipe dir>/<path>` to `sources/<basename>`   |
//!
//! Plain `http` is always rejected. An `https` URL may pin its content with
//! a `#sha256=<hex>` fragment.

mod fetch;

pub use fetch::SourceFetcher;

use crate::error::{Error, Result};
pub use crate::layout::SOURCES_DIR;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// How a source is acquired
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum SourceKind {
    Https {
        #[serde(skip_serializing_if = "Option::is_none")]
        sha256: Option<String>,
    },
    Git {
        #[serde(skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
    },
    File,
}

/// A resolved source location
///
/// Only constructible through [`Source::parse`], so every value has an
/// acquirable scheme and a usable file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    url: Url,
    kind: SourceKind,
    file_name: String,
}

impl Source {
    /// Parse and classify a source string
    pub fn parse(text: &str) -> Result<Self> {
        let url = Url::parse(text.trim()).map_err(|e| Error::InvalidSource {
            url: text.to_string(),
            reason: e.to_string(),
        })?;

        let kind = match url.scheme() {
            "http" => return Err(Error::InsecureScheme(url.scheme().to_string())),
            "https" => SourceKind::Https {
                sha256: pinned_sha256(&url)?,
            },
            "git" => SourceKind::Git {
                reference: git_reference(&url)?,
            },
            "file" => SourceKind::File,
            other => return Err(Error::UnsupportedScheme(other.to_string())),
        };

        let file_name = derive_file_name(&url, &kind)?;
        Ok(Self {
            url,
            kind,
            file_name,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Name of the file or directory created under `sources/`
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Destination relative to the working directory
    pub fn dest(&self) -> PathBuf {
        Path::new(SOURCES_DIR).join(&self.file_name)
    }

    /// Address to hand to the transport: query and fragment removed
    ///
    /// For git the query carries the ref and must never reach `git clone`;
    /// for https the fragment carries the digest.
    pub fn fetch_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        if matches!(self.kind, SourceKind::Git { .. }) {
            url.set_query(None);
        }
        url.to_string()
    }

    /// Path of a `file:` source, resolved against the recipe directory
    ///
    /// The URL path is always taken relative to the recipe, even when written
    /// with a leading `/`.
    pub fn local_path(&self, recipe_dir: &Path) -> Option<PathBuf> {
        match self.kind {
            SourceKind::File => {
                let relative = self.url.path().trim_start_matches('/');
                Some(recipe_dir.join(relative))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

fn invalid(url: &Url, reason: impl Into<String>) -> Error {
    Error::InvalidSource {
        url: url.to_string(),
        reason: reason.into(),
    }
}

fn pinned_sha256(url: &Url) -> Result<Option<String>> {
    let Some(fragment) = url.fragment() else {
        return Ok(None);
    };
    let Some(digest) = fragment.strip_prefix("sha256=") else {
        return Err(invalid(url, format!("unrecognised fragment {fragment:?}")));
    };
    if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(url, "sha256 digest must be 64 hex characters"));
    }
    Ok(Some(digest.to_ascii_lowercase()))
}

fn git_reference(url: &Url) -> Result<Option<String>> {
    let mut reference: Option<String> = None;
    for (key, value) in url.query_pairs() {
        if key != "tag" && key != "checkout" {
            continue;
        }
        if value.is_empty() || value.starts_with('-') {
            return Err(invalid(url, format!("invalid {key} {value:?}")));
        }
        if let Some(existing) = &reference {
            if existing.as_str() != &*value {
                return Err(invalid(url, "conflicting tag/checkout parameters"));
            }
        }
        reference = Some(value.into_owned());
    }
    Ok(reference)
}

fn derive_file_name(url: &Url, kind: &SourceKind) -> Result<String> {
    let base = url
        .path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    let base = match kind {
        SourceKind::Git { .. } => base.strip_suffix(".git").unwrap_or(base),
        _ => base,
    };

    if base.is_empty() || base == "." || base == ".." {
        return Err(invalid(url, "URL path has no file name"));
    }
    Ok(base.to_string())
}
