// src/layout.rs

//! Names inside a working directory
//!
//! ```text
//! <work>/
//!   Makefile              rule graph (left out of source archives)
//!   script.sh             expanded build script
//!   .builddeps.list       one build dependency per line
//!   .builddeps.installed  sentinel: installer has run
//!   .build.done           sentinel: script has run
//!   .pkglist              one output package per line
//!   .version              package version
//!   sources/<file>        fetched sources
//!   out/<pkg>/            install tree of each output package
//!   out/<pkg>/.pkginfo    package metadata
//!   out/<pkg>.tar.gz      package archive
//! ```

pub const MAKEFILE: &str = "Makefile";
pub const SCRIPT_FILE: &str = "script.sh";
pub const BUILDDEPS_LIST: &str = ".builddeps.list";
pub const BUILDDEPS_SENTINEL: &str = ".builddeps.installed";
pub const BUILD_SENTINEL: &str = ".build.done";
pub const PACKAGE_LIST: &str = ".pkglist";
pub const VERSION_FILE: &str = ".version";
pub const SOURCES_DIR: &str = "sources";
pub const OUT_DIR: &str = "out";

/// `out/<pkg>`
pub fn package_dir(package: &str) -> String {
    format!("{OUT_DIR}/{package}")
}

/// `out/<pkg>/.pkginfo`
pub fn pkginfo_path(package: &str) -> String {
    format!("{OUT_DIR}/{package}/{}", crate::pkginfo::PKGINFO_FILE)
}

/// `out/<pkg>.tar.gz`
pub fn archive_path(package: &str) -> String {
    format!("{OUT_DIR}/{package}.tar.gz")
}
