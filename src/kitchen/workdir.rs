// src/kitchen/workdir.rs

//! Working directory setup and manifest files

use crate::error::{Error, Result};
use crate::layout::{
    package_dir, pkginfo_path, BUILDDEPS_LIST, PACKAGE_LIST, SCRIPT_FILE, SOURCES_DIR,
    VERSION_FILE,
};
use crate::recipe::PackageGenerator;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Create `sources/` and `out/<pkg>` for every output package
pub fn init_dirs(dir: &Path, generator: &PackageGenerator) -> Result<()> {
    create_dir(&dir.join(SOURCES_DIR))?;
    for package in generator.packages() {
        create_dir(&dir.join(package_dir(package.name())))?;
    }
    Ok(())
}

/// Write `.builddeps.list`, one dependency per line
pub fn write_builddeps(dir: &Path, generator: &PackageGenerator) -> Result<()> {
    write_file(&dir.join(BUILDDEPS_LIST), &lines(generator.build_dependencies()))
}

/// Files only the eager flow writes: the script, metadata and manifests
pub fn write_eager_files(dir: &Path, generator: &PackageGenerator) -> Result<()> {
    let script = dir.join(SCRIPT_FILE);
    write_file(&script, &generator.script_file())?;
    set_executable(&script)?;

    for package in generator.packages() {
        let yaml = generator.package_info(package).to_yaml()?;
        write_file(&dir.join(pkginfo_path(package.name())), &yaml)?;
    }

    let names: Vec<String> = generator
        .packages()
        .iter()
        .map(|p| p.name().to_string())
        .collect();
    write_file(&dir.join(PACKAGE_LIST), &lines(&names))?;
    write_file(&dir.join(VERSION_FILE), &format!("{}\n", generator.version()))?;
    Ok(())
}

fn lines(items: &[String]) -> String {
    items.iter().map(|item| format!("{item}\n")).collect()
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        Error::IoError(format!("Failed to create directory {}: {e}", path.display()))
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    debug!("Writing {}", path.display());
    fs::write(path, content)
        .map_err(|e| Error::IoError(format!("Failed to write {}: {e}", path.display())))
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700)).map_err(|e| {
        Error::IoError(format!("Failed to set permissions on {}: {e}", path.display()))
    })
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
